pub mod analyze;
pub mod summary;

pub use analyze::{AnalyzeCommand, AnalyzeOptions, DEFAULT_OUTPUT_PATH};
pub use summary::SummaryCommand;
