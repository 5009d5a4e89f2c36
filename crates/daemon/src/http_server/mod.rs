use axum::Router;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

use common::rpc::RPC_PREFIX;

mod config;
mod handlers;
mod health;
pub mod rpc;

pub use config::Config;

use crate::ServiceState;

const STATUS_PREFIX: &str = "/_status";

/// All daemon routes: `/_status/*` probes and `/rpc/:method`
pub fn router(state: ServiceState) -> Router {
    Router::new()
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .nest(RPC_PREFIX, rpc::router(state.clone()))
        .fallback(handlers::not_found_handler)
        .with_state(state)
}

/// Run the RPC HTTP server until `shutdown_rx` fires.
pub async fn run_rpc(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let log_level = config.log_level;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let router = router(state).layer(trace_layer);

    tracing::info!(addr = ?listen_addr, "RPC server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use common::config::P2pConfig;
    use common::requests::peer;
    use common::testkit::{sample_repo, CallLog, RecordingFactory, RecordingRegistry};

    use super::*;

    async fn app() -> Router {
        let log = CallLog::default();
        let state = ServiceState::from_parts(
            sample_repo().await,
            Arc::new(RecordingRegistry::new(log.clone())),
            Arc::new(RecordingFactory::new(log)),
            P2pConfig::default(),
        )
        .unwrap();
        router(state)
    }

    #[tokio::test]
    async fn test_empty_body_means_no_params() {
        let request = Request::post(format!("{}/{}", RPC_PREFIX, peer::INFO))
            .body(Body::empty())
            .unwrap();
        let response = app().await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let request = Request::post(format!("{}/{}", RPC_PREFIX, peer::INFO))
            .body(Body::from("{not json"))
            .unwrap();
        let response = app().await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rpc_only_accepts_post() {
        let request = Request::get(format!("{}/{}", RPC_PREFIX, peer::INFO))
            .body(Body::empty())
            .unwrap();
        let response = app().await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
