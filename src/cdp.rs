//! Chrome DevTools Protocol launcher (uses the `headless_chrome` crate)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::browser::default_executable;
use headless_chrome::browser::tab::Tab;
use headless_chrome::{Browser, LaunchOptions};
use log::debug;

use crate::validate::ValidatedUrl;
use crate::{Channel, LaunchConfig, LaunchError, LaunchStrategy, Launcher, RenderFailure, Session};

const OUTER_HTML_SCRIPT: &str = "document.documentElement.outerHTML";

// Headroom on top of the navigation bound before the CDP connection is
// considered idle and dropped.
const IDLE_HEADROOM: Duration = Duration::from_secs(30);

#[cfg(target_os = "linux")]
const STABLE_CHANNEL_PATHS: &[&str] = &[
    "/usr/bin/google-chrome-stable",
    "/usr/bin/google-chrome",
    "/opt/google/chrome/chrome",
];

#[cfg(target_os = "macos")]
const STABLE_CHANNEL_PATHS: &[&str] =
    &["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"];

#[cfg(target_os = "windows")]
const STABLE_CHANNEL_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const STABLE_CHANNEL_PATHS: &[&str] = &[];

/// Launches one headless Chrome process per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CdpLauncher;

impl CdpLauncher {
    /// Locate the executable for `strategy` without starting anything.
    pub fn resolve(strategy: &LaunchStrategy) -> Result<PathBuf, LaunchError> {
        match strategy {
            LaunchStrategy::Discover => default_executable().map_err(LaunchError::BrowserNotFound),
            LaunchStrategy::Channel(Channel::Stable) => STABLE_CHANNEL_PATHS
                .iter()
                .map(PathBuf::from)
                .find(|p| p.is_file())
                .ok_or_else(|| {
                    LaunchError::BrowserNotFound(
                        "no stable-channel Chrome installation found".into(),
                    )
                }),
            LaunchStrategy::Executable(path) if path.is_file() => Ok(path.clone()),
            LaunchStrategy::Executable(path) => Err(LaunchError::BrowserNotFound(format!(
                "{} does not exist",
                path.display()
            ))),
        }
    }
}

impl Launcher for CdpLauncher {
    fn launch(
        &self,
        strategy: &LaunchStrategy,
        config: &LaunchConfig,
    ) -> Result<Box<dyn Session>, LaunchError> {
        let path = Self::resolve(strategy)?;
        debug!("Launching headless Chrome via {} at {}", strategy, path.display());

        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(config.sandbox)
            .path(Some(path))
            .idle_browser_timeout(config.navigation_timeout + IDLE_HEADROOM)
            .build()
            .map_err(|e| LaunchError::Failed(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| LaunchError::Failed(format!("Failed to launch browser: {}", e)))?;

        Ok(Box::new(CdpSession {
            browser: Some(browser),
            tab: None,
            navigation_timeout: config.navigation_timeout,
        }))
    }
}

/// A launched Chrome process and the single tab used for one render.
///
/// Dropping the `Browser` handle kills the child process.
struct CdpSession {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    navigation_timeout: Duration,
}

impl CdpSession {
    fn tab(&self) -> Result<&Arc<Tab>, RenderFailure> {
        self.tab
            .as_ref()
            .ok_or_else(|| RenderFailure::Internal("No page open in browser session".into()))
    }
}

impl Session for CdpSession {
    fn open_page(&mut self) -> Result<(), RenderFailure> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| RenderFailure::Internal("Browser session already closed".into()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| RenderFailure::Internal(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(self.navigation_timeout);

        self.tab = Some(tab);
        Ok(())
    }

    fn navigate(&mut self, url: &ValidatedUrl) -> Result<(), RenderFailure> {
        let tab = self.tab()?;

        tab.navigate_to(url.as_str()).map_err(|e| {
            RenderFailure::Navigation(format!("Navigation to {} failed: {}", url, e))
        })?;

        tab.wait_until_navigated()
            .map_err(|e| RenderFailure::Navigation(format!("Wait for navigation failed: {}", e)))?;

        Ok(())
    }

    fn outer_html(&mut self) -> Result<String, RenderFailure> {
        let eval = self
            .tab()?
            .evaluate(OUTER_HTML_SCRIPT, false)
            .map_err(|e| RenderFailure::Extraction(format!("Evaluation failed: {}", e)))?;

        match eval.value {
            Some(serde_json::Value::String(html)) => Ok(html),
            Some(other) => Err(RenderFailure::Extraction(format!(
                "Expected a string from outerHTML, got {}",
                other
            ))),
            None => Err(RenderFailure::Extraction("No value returned from evaluation".into())),
        }
    }

    fn close(&mut self) -> Result<(), RenderFailure> {
        let closed = match self.tab.take() {
            Some(tab) => tab
                .close(false)
                .map(|_| ())
                .map_err(|e| RenderFailure::Internal(format!("Failed to close tab: {}", e))),
            None => Ok(()),
        };

        // Killing the process cannot fail from our side.
        drop(self.browser.take());
        closed
    }
}
