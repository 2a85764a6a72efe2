use super::compare::compare_resources;
use super::filter::KeyFilter;
use super::types::{AnalysisSummary, DiffRecord, DriftState, Report, ResourceCollection};
use anyhow::{Context, Result};
use serde_json::Value;

/// Cloud-driven drift analysis with a configurable comparison policy.
///
/// Produces one record per cloud resource, in cloud order. IaC resources with
/// no cloud counterpart are not reported.
#[derive(Debug, Clone, Default)]
pub struct DriftAnalyzer {
    filter: KeyFilter,
}

impl DriftAnalyzer {
    /// Create an analyzer with the given key filter
    pub fn new(filter: KeyFilter) -> Self {
        Self { filter }
    }

    /// The key filter in use
    pub fn filter(&self) -> &KeyFilter {
        &self.filter
    }

    /// Compare one cloud record with its IaC counterpart
    pub fn compare(&self, cloud: &Value, iac: Option<&Value>) -> DiffRecord {
        compare_resources(cloud, iac, &self.filter)
    }

    /// Compare every cloud resource against the IaC collection
    pub fn analyze(&self, cloud: &ResourceCollection, iac: &ResourceCollection) -> Vec<DiffRecord> {
        cloud
            .resources
            .iter()
            .map(|resource| self.compare(resource, find_match(resource, &iac.resources)))
            .collect()
    }

    /// Analyze both collections and summarize the result
    pub fn report(&self, cloud: &ResourceCollection, iac: &ResourceCollection) -> Report {
        let analysis = self.analyze(cloud, iac);
        let summary = summarize(&analysis);
        Report { analysis, summary }
    }
}

/// First IaC resource sharing the cloud resource's `type` and `id`.
///
/// A record lacking either field, or holding `null` in it, matches nothing.
pub fn find_match<'a>(cloud: &Value, candidates: &'a [Value]) -> Option<&'a Value> {
    let (resource_type, id) = identity(cloud)?;

    candidates
        .iter()
        .find(|candidate| identity(candidate) == Some((resource_type, id)))
}

fn identity(record: &Value) -> Option<(&Value, &Value)> {
    let fields = record.as_object()?;
    let resource_type = fields.get("type").filter(|v| !v.is_null())?;
    let id = fields.get("id").filter(|v| !v.is_null())?;
    Some((resource_type, id))
}

/// Count diff records per state
pub fn summarize(records: &[DiffRecord]) -> AnalysisSummary {
    let mut summary = AnalysisSummary::default();
    for record in records {
        summary.record(record.state);
    }
    summary
}

/// Recount a serialized report from its `State` labels.
///
/// Fails on the first record whose label is not a known state.
pub fn summarize_labels(analysis: &[Value]) -> Result<AnalysisSummary> {
    let mut summary = AnalysisSummary::default();

    for (index, record) in analysis.iter().enumerate() {
        let label = record
            .get("State")
            .and_then(Value::as_str)
            .with_context(|| format!("Analysis record {} has no State label", index))?;

        let state: DriftState = label
            .parse()
            .with_context(|| format!("Analysis record {} has an invalid State", index))?;

        summary.record(state);
    }

    Ok(summary)
}
