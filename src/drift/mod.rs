//! Cloud vs IaC drift analysis engine
//!
//! Compares a snapshot of live cloud resources against the resources declared
//! by Infrastructure as Code and classifies each cloud resource.
//!
//! # Pipeline
//!
//! - **Matching**: each cloud resource is paired with the first IaC resource
//!   sharing its `type` and `id`
//! - **Flattening**: nested records become dot-joined attribute paths,
//!   skipping provider-managed keys (`arn`, `id`, `etag`, ...)
//! - **Normalization**: `"true"`/`true`, `"123"`/`123` and both tag encodings
//!   compare equal
//! - **Classification**: `Match`, `Modified` (with a change log) or `Missing`
//!
//! # Example
//!
//! ```ignore
//! use crate::drift::{DriftAnalyzer, ResourceCollection};
//!
//! let analyzer = DriftAnalyzer::default();
//! let report = analyzer.report(&cloud, &iac);
//!
//! println!("{}", report.to_json_pretty()?);
//! ```

mod analyzer;
mod compare;
mod filter;
mod flatten;
mod normalize;
mod types;

pub use analyzer::{DriftAnalyzer, summarize_labels};
pub use filter::KeyFilter;
pub use types::{AnalysisSummary, ChangeEntry, DiffRecord, DriftState, Report, ResourceCollection};
