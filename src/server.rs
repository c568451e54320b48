//! HTTP surface: routing, listener and graceful shutdown.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use log::info;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::gateway::{Gateway, RenderRequest, Reply};
use crate::Result;

/// Build the router: `GET /domhtml`, `GET /health`, and `404 Not Found` for
/// every other path or method.
pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/domhtml", get(dom_html).fallback(not_found))
        .route("/health", get(health).fallback(not_found))
        .fallback(not_found)
        .with_state(gateway)
}

async fn dom_html(
    State(gateway): State<Arc<Gateway>>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    gateway.handle(RenderRequest::from_query(&params)).await
}

async fn health() -> Reply {
    Reply::health()
}

async fn not_found() -> Reply {
    Reply::not_found()
}

/// Bind the configured address and serve until Ctrl-C or SIGTERM.
pub async fn serve(config: &Config, gateway: Arc<Gateway>) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr()?).await?;
    info!("Server is running on http://{}", listener.local_addr()?);

    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received; draining in-flight requests");
}
