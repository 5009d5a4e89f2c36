//! Shared test utilities for remote dispatch tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::Value;
use url::Url;

use common::rpc::{RpcClient, WireError};

/// Stand-in daemon that answers procedures from a script and records every
///  call it receives.
#[derive(Clone, Default)]
pub struct ScriptedDaemon {
    replies: Arc<Mutex<HashMap<String, Result<Value, WireError>>>>,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl ScriptedDaemon {
    pub fn reply(&self, method: &str, output: Value) -> &Self {
        self.replies.lock().insert(method.to_string(), Ok(output));
        self
    }

    pub fn fail(&self, method: &str, error: WireError) -> &Self {
        self.replies.lock().insert(method.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|(m, _)| m == method).count()
    }

    /// Serve on an ephemeral loopback port and return a client for it
    pub async fn serve(&self) -> RpcClient {
        let router = Router::new()
            .route("/rpc/:method", post(handler))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        RpcClient::new(&Url::parse(&format!("http://{}", addr)).unwrap()).unwrap()
    }
}

async fn handler(
    State(daemon): State<ScriptedDaemon>,
    Path(method): Path<String>,
    Json(params): Json<Value>,
) -> Response {
    daemon.calls.lock().push((method.clone(), params));
    match daemon.replies.lock().get(&method).cloned() {
        Some(Ok(output)) => (StatusCode::OK, Json(output)).into_response(),
        Some(Err(error)) => (StatusCode::BAD_REQUEST, Json(error)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(WireError::new("unknown_method", method)),
        )
            .into_response(),
    }
}
