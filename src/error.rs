//! Error types for the rendering gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Client-caused input problems. Always answered with 400.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    /// The `url` query parameter was absent or empty
    #[error("missing \"url\" query parameter")]
    MissingUrl,

    /// The URL did not parse, or its scheme is not http/https
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Why a browser process could not be started.
///
/// Only `BrowserNotFound` gates the single fallback launch attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    /// No compatible browser executable was found by the chosen strategy
    #[error("no compatible browser executable found: {0}")]
    BrowserNotFound(String),

    /// The executable was found but the process could not be started
    #[error("browser launch failed: {0}")]
    Failed(String),
}

/// Failures of the dynamic (browser) render path.
///
/// Variants exist for logging only; every one of them is answered with the
/// same generic 500 response.
#[derive(Error, Debug)]
pub enum RenderFailure {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    /// The page could not be loaded (timeout, DNS, TLS, HTTP error)
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The rendered document could not be read back from the page
    #[error("DOM extraction failed: {0}")]
    Extraction(String),

    /// Anything else, including a crashed render worker
    #[error("{0}")]
    Internal(String),
}

impl RenderFailure {
    /// Which step of the render failed, for log lines
    pub fn stage(&self) -> &'static str {
        match self {
            RenderFailure::Launch(_) => "launch",
            RenderFailure::Navigation(_) => "navigation",
            RenderFailure::Extraction(_) => "extraction",
            RenderFailure::Internal(_) => "internal",
        }
    }
}

/// Errors that can occur while handling a request
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    /// Static fetch failed at the network level or with a non-2xx status
    #[error("upstream fetch failed: {0}")]
    UpstreamFetchFailed(String),

    #[error(transparent)]
    Render(#[from] RenderFailure),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
