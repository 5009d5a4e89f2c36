//! Remote-call endpoint: `POST /rpc/<Domain>Requests.<Operation>`.
//!
//! The body is the operation's JSON params; a `200` carries its JSON
//!  output and any other status carries a `WireError`. Every procedure runs
//!  through the same local request objects the CLI uses in process, so a
//!  forwarded call fails exactly the way a local one would.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use common::requests::{
    dataset, log, peer, profile, registry, render, search, selection, RequestError,
};

use crate::request_set::RequestSet;
use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/:method", post(handler))
        .with_state(state)
}

#[tracing::instrument(skip(state, body))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(method): Path<String>,
    body: Bytes,
) -> Response {
    let params = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(params) => params,
            Err(e) => return RpcFailure(RequestError::InvalidParams(e.to_string())).into_response(),
        }
    };

    match dispatch(state.requests(), &method, params).await {
        Ok(output) => (StatusCode::OK, Json(output)).into_response(),
        Err(e) => {
            tracing::debug!(%method, "request failed: {}", e);
            RpcFailure(e).into_response()
        }
    }
}

/// Run `method` against `requests`, decoding params and encoding the output
pub async fn dispatch(
    requests: &RequestSet,
    method: &str,
    params: Value,
) -> Result<Value, RequestError> {
    match method {
        dataset::LIST => reply(requests.datasets.list(&decode(params)?).await?),
        dataset::GET => reply(requests.datasets.get(&decode(params)?).await?),
        dataset::SAVE => reply(requests.datasets.save(&decode(params)?).await?),
        dataset::RENAME => reply(requests.datasets.rename(&decode(params)?).await?),
        dataset::REMOVE => reply(requests.datasets.remove(&decode(params)?).await?),

        log::LOG => reply(requests.log.log(&decode(params)?).await?),

        peer::INFO => reply(requests.peers.info().await?),
        peer::LIST => reply(requests.peers.list(&decode(params)?).await?),

        profile::GET_PROFILE => reply(requests.profile.get_profile().await?),
        profile::SAVE_PROFILE => reply(requests.profile.save_profile(&decode(params)?).await?),

        registry::PUBLISH => reply(requests.registry.publish(&decode(params)?).await?),
        registry::UNPUBLISH => reply(requests.registry.unpublish(&decode(params)?).await?),
        registry::STATUS => reply(requests.registry.status(&decode(params)?).await?),

        render::RENDER => reply(requests.render.render(&decode(params)?).await?),
        search::SEARCH => reply(requests.search.search(&decode(params)?).await?),
        selection::SELECT => reply(requests.selection.select(&decode(params)?).await?),

        _ => Err(RequestError::UnknownMethod(method.to_string())),
    }
}

fn decode<T: DeserializeOwned>(params: Value) -> Result<T, RequestError> {
    serde_json::from_value(params).map_err(|e| RequestError::InvalidParams(e.to_string()))
}

fn reply<T: Serialize>(output: T) -> Result<Value, RequestError> {
    serde_json::to_value(output).map_err(|e| RequestError::Internal(e.to_string()))
}

/// A failed request on its way back to the caller
#[derive(Debug)]
pub struct RpcFailure(pub RequestError);

impl RpcFailure {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RequestError::EmptyRef | RequestError::InvalidParams(_) | RequestError::Path(_) => {
                StatusCode::BAD_REQUEST
            }
            RequestError::NotFound(_) | RequestError::UnknownMethod(_) => StatusCode::NOT_FOUND,
            RequestError::Exists(_) => StatusCode::CONFLICT,
            RequestError::PinningNotSupported => StatusCode::NOT_IMPLEMENTED,
            RequestError::Registry(_)
            | RequestError::Node(_)
            | RequestError::Repo(_)
            | RequestError::Rpc(_)
            | RequestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RpcFailure {
    fn into_response(self) -> Response {
        (self.status(), Json(self.0.to_wire())).into_response()
    }
}
