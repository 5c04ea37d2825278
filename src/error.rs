use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("browser init failed: {0}")]
    BrowserInit(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("script evaluation failed: {0}")]
    JavaScript(String),

    #[error("file error: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("result sink already closed")]
    SinkClosed,
}

impl ScraperError {
    /// Timeouts while waiting for optional elements are expected and non-fatal.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScraperError::Timeout(_))
    }
}
