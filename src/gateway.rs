//! Request-level controller for `/domhtml`.
//!
//! Validates the target, dispatches once on [`Mode`] to either the static
//! fetcher or the browser renderer, and classifies the outcome into a
//! [`Reply`]. Nothing here outlives a single request.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::validate::validate;
use crate::{
    async_api, Error, InvalidInput, LaunchConfig, Launcher, Result, StaticFetcher, StaticPage,
};

pub const MISSING_URL_MESSAGE: &str = "Missing \"url\" query parameter";
pub const INVALID_URL_MESSAGE: &str = "Invalid URL";
pub const UPSTREAM_FAILED_MESSAGE: &str = "Upstream fetch failed";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
pub const NOT_FOUND_MESSAGE: &str = "Not Found";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
/// Static-mode content type when the upstream sent none
const TEXT_HTML: &str = "text/html";

/// How the target document is acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Plain GET, no script execution
    Static,
    /// Full render in headless Chrome
    Browser,
}

impl Mode {
    /// `useBrowser=1` selects the browser; anything else is static.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("1") => Mode::Browser,
            _ => Mode::Static,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Static => f.write_str("static"),
            Mode::Browser => f.write_str("browser"),
        }
    }
}

/// One incoming `/domhtml` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub raw_url: Option<String>,
    pub mode: Mode,
}

impl RenderRequest {
    pub fn new(raw_url: Option<String>, mode: Mode) -> Self {
        Self { raw_url, mode }
    }

    /// Build from decoded query parameters (`url`, `useBrowser`)
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        Self {
            raw_url: params.get("url").cloned(),
            mode: Mode::from_flag(params.get("useBrowser").map(String::as_str)),
        }
    }
}

/// JSON envelope for a successful browser render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomHtml {
    #[serde(rename = "domHTML")]
    pub dom_html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Body {
    Html(StaticPage),
    DomHtml(DomHtml),
    Health,
    Text(&'static str),
}

/// Status plus body of a gateway response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    status: StatusCode,
    body: Body,
}

impl Reply {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Upstream bytes from a static fetch, passed through untouched
    pub fn html(page: StaticPage) -> Self {
        Self {
            status: StatusCode::OK,
            body: Body::Html(page),
        }
    }

    /// Rendered DOM wrapped in `{"domHTML": ...}`
    pub fn dom_html(html: String) -> Self {
        Self {
            status: StatusCode::OK,
            body: Body::DomHtml(DomHtml { dom_html: html }),
        }
    }

    pub fn health() -> Self {
        Self {
            status: StatusCode::OK,
            body: Body::Health,
        }
    }

    pub fn not_found() -> Self {
        Self::text(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
    }

    fn text(status: StatusCode, message: &'static str) -> Self {
        Self {
            status,
            body: Body::Text(message),
        }
    }

    /// Classify a failure and log it at the level its class deserves.
    ///
    /// Only fixed messages reach the client; details stay in the log.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::InvalidInput(InvalidInput::MissingUrl) => {
                debug!("Rejected request: {}", err);
                Self::text(StatusCode::BAD_REQUEST, MISSING_URL_MESSAGE)
            }
            Error::InvalidInput(InvalidInput::InvalidUrl(_)) => {
                debug!("Rejected request: {}", err);
                Self::text(StatusCode::BAD_REQUEST, INVALID_URL_MESSAGE)
            }
            Error::UpstreamFetchFailed(_) => {
                warn!("{}", err);
                Self::text(StatusCode::BAD_GATEWAY, UPSTREAM_FAILED_MESSAGE)
            }
            Error::Render(failure) => {
                error!("Dynamic render failed at {} stage: {}", failure.stage(), failure);
                Self::text(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
            Error::ConfigError(_) | Error::Io(_) => {
                error!("{}", err);
                Self::text(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            Body::Html(page) => {
                let content_type = page
                    .content_type
                    .unwrap_or_else(|| HeaderValue::from_static(TEXT_HTML));
                (self.status, [(CONTENT_TYPE, content_type)], page.body).into_response()
            }
            Body::DomHtml(envelope) => (self.status, Json(envelope)).into_response(),
            Body::Health => (self.status, Json(serde_json::json!({ "ok": true }))).into_response(),
            Body::Text(message) => {
                (self.status, [(CONTENT_TYPE, TEXT_PLAIN)], message).into_response()
            }
        }
    }
}

/// The render orchestrator.
///
/// Holds only immutable, process-wide collaborators; all per-request state
/// lives on the stack of [`Gateway::handle`].
pub struct Gateway {
    fetcher: StaticFetcher,
    launcher: Arc<dyn Launcher>,
    launch_config: LaunchConfig,
}

impl Gateway {
    pub fn new(
        fetcher: StaticFetcher,
        launcher: Arc<dyn Launcher>,
        launch_config: LaunchConfig,
    ) -> Self {
        Self {
            fetcher,
            launcher,
            launch_config,
        }
    }

    /// Handle one request end to end. Never fails; every error becomes a reply.
    pub async fn handle(&self, request: RenderRequest) -> Reply {
        let started = Instant::now();
        info!(
            "domhtml request mode={} url={}",
            request.mode,
            request.raw_url.as_deref().unwrap_or("<missing>")
        );

        let reply = match self.dispatch(request).await {
            Ok(reply) => reply,
            Err(err) => Reply::from_error(&err),
        };

        info!(
            "domhtml response status={} elapsed_ms={}",
            reply.status.as_u16(),
            started.elapsed().as_millis()
        );
        reply
    }

    async fn dispatch(&self, request: RenderRequest) -> Result<Reply> {
        let raw = request
            .raw_url
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .ok_or(InvalidInput::MissingUrl)?;
        let url = validate(raw)?;

        match request.mode {
            Mode::Static => {
                let page = self.fetcher.fetch(&url).await?;
                Ok(Reply::html(page))
            }
            Mode::Browser => {
                let launcher = self.launcher.clone();
                let html = async_api::render(launcher, url, self.launch_config.clone()).await?;
                Ok(Reply::dom_html(html))
            }
        }
    }
}
