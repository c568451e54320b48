//! Dynamic rendering: launch, navigate, extract, tear down.
//!
//! Everything here is blocking; [`crate::async_api`] moves it off the
//! runtime. The launched session is owned by a [`SessionGuard`] from the
//! moment it exists, so teardown runs on every exit path, panics included.

use std::ops::{Deref, DerefMut};

use log::{debug, warn};

use crate::validate::ValidatedUrl;
use crate::{LaunchConfig, LaunchError, LaunchStrategy, Launcher, RenderFailure, Session};

/// Owns a launched session and closes it exactly once when dropped.
pub struct SessionGuard {
    session: Box<dyn Session>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn Session>) -> Self {
        Self { session }
    }
}

impl Deref for SessionGuard {
    type Target = dyn Session;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        // Teardown failures never replace the request's own outcome.
        if let Err(e) = self.session.close() {
            debug!("Ignoring browser teardown failure: {}", e);
        }
    }
}

/// Launch with default discovery, retrying once with the configured
/// fallback only when no browser executable was found.
pub fn launch_with_fallback(
    launcher: &dyn Launcher,
    config: &LaunchConfig,
) -> Result<Box<dyn Session>, LaunchError> {
    match launcher.launch(&LaunchStrategy::Discover, config) {
        Err(LaunchError::BrowserNotFound(reason)) => {
            let fallback = config.fallback_strategy();
            warn!("Default browser discovery failed ({}); retrying with {}", reason, fallback);
            launcher.launch(&fallback, config)
        }
        other => other,
    }
}

/// Render `url` in a fresh browser and return the post-script outer HTML.
pub fn render_dynamic(
    launcher: &dyn Launcher,
    url: &ValidatedUrl,
    config: &LaunchConfig,
) -> Result<String, RenderFailure> {
    let mut session = SessionGuard::new(launch_with_fallback(launcher, config)?);

    session.open_page()?;
    session.navigate(url)?;
    let html = session.outer_html()?;

    debug!("Rendered {} bytes of DOM from {}", html.len(), url);
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use crate::Channel;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Tally {
        live: AtomicUsize,
        closes: AtomicUsize,
        attempts: Mutex<Vec<LaunchStrategy>>,
    }

    struct FakeLauncher {
        tally: Arc<Tally>,
        discover: Option<LaunchError>,
        fallback: Option<LaunchError>,
        navigation_fails: bool,
    }

    impl FakeLauncher {
        fn new() -> Self {
            Self {
                tally: Arc::default(),
                discover: None,
                fallback: None,
                navigation_fails: false,
            }
        }
    }

    struct FakeSession {
        tally: Arc<Tally>,
        navigation_fails: bool,
    }

    impl Launcher for FakeLauncher {
        fn launch(
            &self,
            strategy: &LaunchStrategy,
            _config: &LaunchConfig,
        ) -> Result<Box<dyn Session>, LaunchError> {
            self.tally.attempts.lock().unwrap().push(strategy.clone());
            let planned = match strategy {
                LaunchStrategy::Discover => &self.discover,
                _ => &self.fallback,
            };
            if let Some(err) = planned {
                return Err(err.clone());
            }
            self.tally.live.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                tally: self.tally.clone(),
                navigation_fails: self.navigation_fails,
            }))
        }
    }

    impl Session for FakeSession {
        fn open_page(&mut self) -> Result<(), RenderFailure> {
            Ok(())
        }

        fn navigate(&mut self, _url: &ValidatedUrl) -> Result<(), RenderFailure> {
            if self.navigation_fails {
                return Err(RenderFailure::Navigation("net::ERR_NAME_NOT_RESOLVED".into()));
            }
            Ok(())
        }

        fn outer_html(&mut self) -> Result<String, RenderFailure> {
            Ok("<html><head></head><body></body></html>".into())
        }

        fn close(&mut self) -> Result<(), RenderFailure> {
            self.tally.closes.fetch_add(1, Ordering::SeqCst);
            self.tally.live.fetch_sub(1, Ordering::SeqCst);
            Err(RenderFailure::Internal("tab already gone".into()))
        }
    }

    fn url() -> ValidatedUrl {
        validate("http://example.com/").unwrap()
    }

    #[test]
    fn test_success_tears_down_and_ignores_close_error() {
        let launcher = FakeLauncher::new();
        let html = render_dynamic(&launcher, &url(), &LaunchConfig::default()).unwrap();

        assert!(html.starts_with("<html>"));
        assert_eq!(launcher.tally.closes.load(Ordering::SeqCst), 1);
        assert_eq!(launcher.tally.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_navigation_failure_still_tears_down() {
        let launcher = FakeLauncher {
            navigation_fails: true,
            ..FakeLauncher::new()
        };
        let err = render_dynamic(&launcher, &url(), &LaunchConfig::default()).unwrap_err();

        assert!(matches!(err, RenderFailure::Navigation(_)));
        assert_eq!(launcher.tally.closes.load(Ordering::SeqCst), 1);
        assert_eq!(launcher.tally.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_not_found_retries_once_with_fallback() {
        let launcher = FakeLauncher {
            discover: Some(LaunchError::BrowserNotFound("nothing on PATH".into())),
            ..FakeLauncher::new()
        };
        render_dynamic(&launcher, &url(), &LaunchConfig::default()).unwrap();

        let attempts = launcher.tally.attempts.lock().unwrap().clone();
        assert_eq!(
            attempts,
            vec![LaunchStrategy::Discover, LaunchStrategy::Channel(Channel::Stable)]
        );
    }

    #[test]
    fn test_other_launch_failures_are_not_retried() {
        let launcher = FakeLauncher {
            discover: Some(LaunchError::Failed("exec format error".into())),
            ..FakeLauncher::new()
        };
        let err = render_dynamic(&launcher, &url(), &LaunchConfig::default()).unwrap_err();

        assert!(matches!(err, RenderFailure::Launch(LaunchError::Failed(_))));
        assert_eq!(launcher.tally.attempts.lock().unwrap().len(), 1);
        assert_eq!(launcher.tally.closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failed_fallback_is_final() {
        let launcher = FakeLauncher {
            discover: Some(LaunchError::BrowserNotFound("nothing on PATH".into())),
            fallback: Some(LaunchError::BrowserNotFound("no stable channel".into())),
            ..FakeLauncher::new()
        };
        let err = render_dynamic(&launcher, &url(), &LaunchConfig::default()).unwrap_err();

        assert!(matches!(err, RenderFailure::Launch(LaunchError::BrowserNotFound(_))));
        assert_eq!(launcher.tally.attempts.lock().unwrap().len(), 2);
        assert_eq!(launcher.tally.live.load(Ordering::SeqCst), 0);
    }
}
