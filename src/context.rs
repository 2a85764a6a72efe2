use crate::sink::{ReportSink, S3ReportSink};
use crate::traits::{FileSystem, Output, RealFileSystem, TerminalOutput};
#[cfg(test)]
use crate::{
    sink::MockReportSink,
    traits::{MockFileSystem, MockOutput},
};
use std::sync::Arc;

/// Application context that holds all dependencies for dependency injection
#[derive(Clone)]
pub struct Context {
    pub fs: Arc<dyn FileSystem>,
    pub output: Arc<dyn Output>,
    pub sink: Arc<dyn ReportSink>,
}

impl Context {
    /// Create a new context with real implementations (for production use)
    pub fn new() -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            output: Arc::new(TerminalOutput),
            sink: Arc::new(S3ReportSink::new()),
        }
    }

    /// Create a test context over concrete mocks, returning handles to them
    /// for assertions
    #[cfg(test)]
    pub fn test_with(
        fs: Arc<MockFileSystem>,
        output: Arc<MockOutput>,
        sink: Arc<MockReportSink>,
    ) -> Self {
        Self { fs, output, sink }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
