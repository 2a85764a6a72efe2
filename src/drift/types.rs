//! Data types for cloud vs IaC drift analysis
//!
//! Field names on the serialized types follow the report format consumed by
//! downstream tooling (`CloudResourceItem`, `ChangeLog`, ...).

use anyhow::{Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A set of resources as exported by a cloud inventory or an IaC plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceCollection {
    /// Resource records in source order. Missing or null reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub resources: Vec<Value>,
}

impl ResourceCollection {
    /// Number of resource records
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the collection holds no records
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Classification of a cloud resource against its IaC declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DriftState {
    /// Declared in IaC with identical normalized attributes
    Match,
    /// Declared in IaC but at least one attribute differs
    Modified,
    /// No IaC declaration shares the resource's type and id
    Missing,
}

impl DriftState {
    /// All states, in report order
    pub const ALL: [DriftState; 3] = [DriftState::Match, DriftState::Modified, DriftState::Missing];

    /// Get the label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftState::Match => "Match",
            DriftState::Modified => "Modified",
            DriftState::Missing => "Missing",
        }
    }

    /// Get the symbol for this state
    pub fn symbol(&self) -> &'static str {
        match self {
            DriftState::Match => "=",
            DriftState::Modified => "~",
            DriftState::Missing => "-",
        }
    }

    /// Whether this state counts as drift
    pub fn is_drift(&self) -> bool {
        !matches!(self, DriftState::Match)
    }
}

impl fmt::Display for DriftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DriftState {
    type Err = anyhow::Error;

    fn from_str(label: &str) -> Result<Self> {
        match label {
            "Match" => Ok(DriftState::Match),
            "Modified" => Ok(DriftState::Modified),
            "Missing" => Ok(DriftState::Missing),
            other => bail!("Unrecognized drift state '{}'", other),
        }
    }
}

/// One differing attribute path.
///
/// `None` means the path is absent on that side, which is distinct from a
/// present `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeEntry {
    pub key_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub cloud_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub iac_value: Option<Value>,
}

// A present field always deserializes to `Some`, even when it holds `null`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ChangeEntry {
    /// Create a change entry
    pub fn new(key_name: impl Into<String>, cloud_value: Option<Value>, iac_value: Option<Value>) -> Self {
        Self {
            key_name: key_name.into(),
            cloud_value,
            iac_value,
        }
    }
}

/// Result of comparing one cloud resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiffRecord {
    /// The cloud record exactly as loaded
    pub cloud_resource_item: Value,

    /// The matched IaC record exactly as loaded, or an empty mapping
    pub iac_resource_item: Value,

    pub state: DriftState,

    pub change_log: Vec<ChangeEntry>,
}

impl DiffRecord {
    /// Record for a cloud resource with no IaC counterpart
    pub fn missing(cloud: Value) -> Self {
        Self {
            cloud_resource_item: cloud,
            iac_resource_item: Value::Object(Map::new()),
            state: DriftState::Missing,
            change_log: Vec::new(),
        }
    }

    /// The `type` of the cloud resource, if it is a string
    pub fn resource_type(&self) -> Option<&str> {
        self.cloud_resource_item.get("type").and_then(Value::as_str)
    }

    /// The `id` of the cloud resource rendered as text
    pub fn resource_id(&self) -> Option<String> {
        match self.cloud_resource_item.get("id")? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Human-readable `type.id` address
    pub fn address(&self) -> String {
        format!(
            "{}.{}",
            self.resource_type().unwrap_or("(unknown type)"),
            self.resource_id().unwrap_or_else(|| "(unknown id)".to_string())
        )
    }
}

/// Count of diff records per state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    #[serde(rename = "Match", default)]
    pub matched: usize,

    #[serde(rename = "Modified", default)]
    pub modified: usize,

    #[serde(rename = "Missing", default)]
    pub missing: usize,
}

impl AnalysisSummary {
    /// Count one record in the given state
    pub fn record(&mut self, state: DriftState) {
        match state {
            DriftState::Match => self.matched += 1,
            DriftState::Modified => self.modified += 1,
            DriftState::Missing => self.missing += 1,
        }
    }

    /// Count for a single state
    pub fn count(&self, state: DriftState) -> usize {
        match state {
            DriftState::Match => self.matched,
            DriftState::Modified => self.modified,
            DriftState::Missing => self.missing,
        }
    }

    /// Total number of records counted
    pub fn total(&self) -> usize {
        self.matched + self.modified + self.missing
    }

    /// Number of records that are Modified or Missing
    pub fn drifted(&self) -> usize {
        self.modified + self.missing
    }
}

/// Full analysis output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub analysis: Vec<DiffRecord>,
    pub summary: AnalysisSummary,
}

impl Report {
    /// Whether any resource drifted from its declaration
    pub fn has_drift(&self) -> bool {
        self.summary.drifted() > 0
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
