use super::analyze::display_summary;
use crate::context::Context;
use crate::drift::{AnalysisSummary, summarize_labels};
use crate::loader::load_json;
use anyhow::{Context as AnyhowContext, Result};
use serde_json::Value;
use std::path::Path;

pub struct SummaryCommand;

impl SummaryCommand {
    /// Recount a saved report from its per-record states
    pub fn execute(ctx: &Context, report_path: &Path) -> Result<AnalysisSummary> {
        let report = load_json(&*ctx.fs, report_path)?;

        let analysis = report
            .get("analysis")
            .and_then(Value::as_array)
            .with_context(|| {
                format!("Report has no analysis list: {}", report_path.display())
            })?;

        let summary = summarize_labels(analysis)
            .with_context(|| format!("Invalid report: {}", report_path.display()))?;

        ctx.output.section("Drift Report Summary");
        ctx.output
            .key_value("Report", &report_path.display().to_string());

        let stored = report
            .get("summary")
            .cloned()
            .and_then(|s| serde_json::from_value::<AnalysisSummary>(s).ok());
        match stored {
            Some(stored) if stored != summary => ctx.output.warning(
                "Stored summary does not match the analysis records; showing recomputed counts",
            ),
            Some(_) => {}
            None => ctx.output.dimmed("Report has no stored summary"),
        }

        display_summary(ctx, &summary);

        Ok(summary)
    }
}
