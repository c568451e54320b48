//! Shared helpers for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use domhtml::{
    Gateway, LaunchConfig, LaunchError, LaunchStrategy, Launcher, RenderFailure, Session,
    StaticFetcher, ValidatedUrl,
};
use tiny_http::{Header, Response, Server};
use tower::ServiceExt;

/// Serve `body` with `status` for every request, forever. Returns the base URL.
pub fn start_upstream(status: u16, body: &'static str) -> String {
    start_upstream_bytes(status, "text/html; charset=utf-8", body.as_bytes())
}

/// Like [`start_upstream`], with raw bytes and an explicit `Content-Type`
pub fn start_upstream_bytes(
    status: u16,
    content_type: &'static str,
    body: &'static [u8],
) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let header = format!("Content-Type: {}", content_type)
                .parse::<Header>()
                .unwrap();
            let response = Response::from_data(body)
                .with_status_code(status)
                .with_header(header);
            let _ = request.respond(response);
        }
    });

    format!("http://{}", addr)
}

/// A URL on a port nothing listens on
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    format!("http://{}/", listener.local_addr().unwrap())
}

pub fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub fn router_with(launcher: Arc<dyn Launcher>) -> Router {
    let fetcher = StaticFetcher::new(Duration::from_secs(5)).unwrap();
    let gateway = Gateway::new(fetcher, launcher, LaunchConfig::default());
    domhtml::server::router(Arc::new(gateway))
}

/// Issue a request against the router without binding a socket
pub async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, String, String) {
    let (status, content_type, bytes) = call_raw(app, method, uri).await;
    (status, content_type, String::from_utf8(bytes).unwrap())
}

/// Like [`call`], returning the body bytes undecoded
pub async fn call_raw(app: Router, method: &str, uri: &str) -> (StatusCode, String, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, content_type, bytes.to_vec())
}

/// Where a fake session should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    OpenPage,
    Navigation,
    Extraction,
    Panic,
    Close,
}

/// Counts launches and live sessions so tests can assert nothing leaks.
#[derive(Default)]
pub struct ProcessTable {
    pub launches: AtomicUsize,
    pub live: AtomicUsize,
    pub closes: AtomicUsize,
    pub attempts: Mutex<Vec<LaunchStrategy>>,
}

impl ProcessTable {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn attempts(&self) -> Vec<LaunchStrategy> {
        self.attempts.lock().unwrap().clone()
    }
}

pub struct FakeLauncher {
    pub table: Arc<ProcessTable>,
    pub discover: Option<LaunchError>,
    pub fallback: Option<LaunchError>,
    pub fault: Fault,
    pub html: &'static str,
}

impl FakeLauncher {
    pub fn new(html: &'static str) -> Self {
        Self {
            table: Arc::default(),
            discover: None,
            fallback: None,
            fault: Fault::None,
            html,
        }
    }
}

impl Launcher for FakeLauncher {
    fn launch(
        &self,
        strategy: &LaunchStrategy,
        _config: &LaunchConfig,
    ) -> Result<Box<dyn Session>, LaunchError> {
        self.table.attempts.lock().unwrap().push(strategy.clone());
        let planned = match strategy {
            LaunchStrategy::Discover => &self.discover,
            _ => &self.fallback,
        };
        if let Some(err) = planned {
            return Err(err.clone());
        }

        self.table.launches.fetch_add(1, Ordering::SeqCst);
        self.table.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            table: self.table.clone(),
            fault: self.fault,
            html: self.html,
        }))
    }
}

struct FakeSession {
    table: Arc<ProcessTable>,
    fault: Fault,
    html: &'static str,
}

impl Session for FakeSession {
    fn open_page(&mut self) -> Result<(), RenderFailure> {
        match self.fault {
            Fault::OpenPage => Err(RenderFailure::Internal("target crashed".into())),
            _ => Ok(()),
        }
    }

    fn navigate(&mut self, _url: &ValidatedUrl) -> Result<(), RenderFailure> {
        match self.fault {
            Fault::Navigation => Err(RenderFailure::Navigation("net::ERR_FAILED".into())),
            _ => Ok(()),
        }
    }

    fn outer_html(&mut self) -> Result<String, RenderFailure> {
        match self.fault {
            Fault::Extraction => Err(RenderFailure::Extraction("context destroyed".into())),
            Fault::Panic => panic!("injected fault after launch"),
            _ => Ok(self.html.to_string()),
        }
    }

    fn close(&mut self) -> Result<(), RenderFailure> {
        self.table.closes.fetch_add(1, Ordering::SeqCst);
        self.table.live.fetch_sub(1, Ordering::SeqCst);
        match self.fault {
            Fault::Close => Err(RenderFailure::Internal("websocket already closed".into())),
            _ => Ok(()),
        }
    }
}
