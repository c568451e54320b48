//! domhtml rendering gateway
//!
//! An HTTP gateway that, given a target URL, answers with the fully rendered
//! DOM of the page (after its scripts ran in headless Chrome) or, in static
//! mode, with the raw HTML fetched without script execution.
//!
//! # Features
//!
//! - **CDP Backend** (default): launches one headless Chrome per request via
//!   the Chrome DevTools Protocol
//! - **Adapter seam**: the render algorithm only talks to the [`Launcher`] and
//!   [`Session`] traits, so the browser backend is swappable
//! - **Scoped browsers**: every launched process is torn down before its
//!   request completes, on every exit path
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use domhtml::{cdp::CdpLauncher, Gateway, LaunchConfig, Mode, RenderRequest, StaticFetcher};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = StaticFetcher::new(std::time::Duration::from_secs(30))?;
//! let gateway = Gateway::new(fetcher, Arc::new(CdpLauncher), LaunchConfig::default());
//!
//! let reply = gateway
//!     .handle(RenderRequest::new(Some("https://example.com".into()), Mode::Browser))
//!     .await;
//! println!("{}", reply.status());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub mod error;
pub use error::{Error, InvalidInput, LaunchError, RenderFailure, Result};

pub mod validate;
pub use validate::{validate, ValidatedUrl};

// Static fetcher (no JS)
pub mod simple;
pub use simple::{StaticFetcher, StaticPage};

#[cfg(feature = "cdp")]
pub mod cdp;

// Render algorithm over the Launcher/Session seam
pub mod render;

// Runs the blocking render path on its own worker thread
pub mod async_api;

pub mod gateway;
pub use gateway::{Gateway, Mode, RenderRequest, Reply};

pub mod config;
pub mod logging;
pub mod server;

/// Configuration consumed by the browser launch step
///
/// Built once at startup from the process configuration and handed to every
/// dynamic render by value.
///
/// # Examples
///
/// ```
/// let cfg = domhtml::LaunchConfig::default();
/// assert!(cfg.sandbox);
/// assert!(cfg.chrome_path.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// Explicit browser executable used when default discovery finds nothing
    pub chrome_path: Option<PathBuf>,
    /// Whether Chrome runs with its sandbox (disable inside most containers)
    pub sandbox: bool,
    /// Upper bound for page navigation
    pub navigation_timeout: Duration,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            sandbox: true,
            navigation_timeout: Duration::from_millis(30000),
        }
    }
}

impl LaunchConfig {
    /// Strategy for the single retry after default discovery found no browser.
    pub fn fallback_strategy(&self) -> LaunchStrategy {
        match &self.chrome_path {
            Some(path) => LaunchStrategy::Executable(path.clone()),
            None => LaunchStrategy::Channel(Channel::Stable),
        }
    }
}

/// Named browser release channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// System-installed stable Chrome
    Stable,
}

/// How a launcher locates the browser executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchStrategy {
    /// Search the usual locations for any compatible browser
    Discover,
    /// Use the install location of a named release channel
    Channel(Channel),
    /// Use exactly this executable
    Executable(PathBuf),
}

impl fmt::Display for LaunchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchStrategy::Discover => f.write_str("default discovery"),
            LaunchStrategy::Channel(Channel::Stable) => f.write_str("stable channel"),
            LaunchStrategy::Executable(path) => write!(f, "executable {}", path.display()),
        }
    }
}

/// Starts headless browser processes.
///
/// Implementations must be shareable across requests; each call to `launch`
/// produces an independent process owned by the returned session.
pub trait Launcher: Send + Sync {
    /// Start one browser process using `strategy` to locate the executable
    fn launch(
        &self,
        strategy: &LaunchStrategy,
        config: &LaunchConfig,
    ) -> std::result::Result<Box<dyn Session>, LaunchError>;
}

/// One running browser process plus at most one page inside it.
pub trait Session: Send {
    /// Open the page that subsequent calls operate on
    fn open_page(&mut self) -> std::result::Result<(), RenderFailure>;

    /// Navigate the page and wait for the load to finish
    fn navigate(&mut self, url: &ValidatedUrl) -> std::result::Result<(), RenderFailure>;

    /// Serialized outer HTML of the document element, read inside the page
    fn outer_html(&mut self) -> std::result::Result<String, RenderFailure>;

    /// Close the page and terminate the process.
    ///
    /// Called at most once. Errors are reported but callers discard them.
    fn close(&mut self) -> std::result::Result<(), RenderFailure>;
}
