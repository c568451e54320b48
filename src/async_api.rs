//! Async facade over the blocking render path.
//!
//! Each dynamic render gets a dedicated worker thread that owns the browser
//! session for its whole life and reports back over a oneshot channel, so
//! the async runtime never blocks on Chrome. A panic on the worker drops the
//! reply channel (after the session guard has torn the browser down) and is
//! reported as an internal failure instead of taking the server with it.

use std::sync::Arc;
use std::thread;

use tokio::sync::oneshot;

use crate::render::render_dynamic;
use crate::validate::ValidatedUrl;
use crate::{LaunchConfig, Launcher, RenderFailure};

/// Render `url` on a fresh worker thread and await the outer HTML.
pub async fn render(
    launcher: Arc<dyn Launcher>,
    url: ValidatedUrl,
    config: LaunchConfig,
) -> Result<String, RenderFailure> {
    let (tx, rx) = oneshot::channel();

    thread::Builder::new()
        .name("domhtml-render".into())
        .spawn(move || {
            let res = render_dynamic(launcher.as_ref(), &url, &config);
            let _ = tx.send(res);
        })
        .map_err(|e| RenderFailure::Internal(format!("Failed to spawn render worker: {}", e)))?;

    rx.await.map_err(|e| {
        RenderFailure::Internal(format!("Render worker exited without a result: {}", e))
    })?
}
