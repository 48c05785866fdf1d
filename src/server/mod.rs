//! HTTP surface.
//!
//! [`build`] assembles the router:
//! - `POST /api/convert` and `GET /api/health`
//! - JSON body ceiling (8 MiB by default)
//! - CORS (wildcard unless origins are configured)
//! - request tracing, and panic-to-500 mapping so an unexpected failure still answers
//!   `{ "error": ... }`

mod error;
mod routes;
mod state;

pub use error::ServerError;
pub use routes::{convert, health};
pub use state::AppState;

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Router;
use polyglot_forge_core::contract::Generator;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::load_config::{AppConfig, ServerSection};

/// Build the complete [`Router`] for the application.
pub fn build(state: Arc<AppState>, server: &ServerSection) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(cors_layer(server))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

fn cors_layer(server: &ServerSection) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();

    let cors = CorsLayer::new().allow_headers(AnyOrigin).allow_methods(AnyOrigin);
    if origins.is_empty() {
        cors.allow_origin(AnyOrigin)
    } else {
        cors.allow_origin(origins)
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "unexpected failure during conversion".to_owned()
    };
    ServerError::Internal(message).into_response()
}

/// Bind and serve until SIGINT/SIGTERM.
pub async fn serve(config: &AppConfig, generator: Arc<dyn Generator>) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(generator, config.batch_settings()));
    let app = build(state, &config.server);

    let addr: SocketAddr = config.bind_address().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "[SERVER] HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("[SERVER] HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
