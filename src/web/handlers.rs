//! HTTP request handlers

use super::state::AppState;
use crate::error::SearchError;
use crate::network::{connectivity_report, NetReport};
use crate::query::Payload;
use crate::results::normalize::to_json;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Query parameters copied verbatim into the payload
const PASSTHROUGH_PARAMS: &[&str] = &[
    "language",
    "time_range",
    "pageno",
    "safesearch",
    "max_results",
];

/// Build a payload from GET query parameters.
///
/// The query comes from `q`, or `query` when `q` is absent. `engines` is a
/// comma separated list.
pub fn payload_from_query(params: &HashMap<String, String>) -> Payload {
    let mut payload = Payload::new();

    if let Some(q) = params.get("q").or_else(|| params.get("query")) {
        payload.insert("query".to_string(), Value::String(q.clone()));
    }

    if let Some(engines) = params.get("engines") {
        let names: Vec<Value> = engines
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| Value::String(e.to_string()))
            .collect();
        payload.insert("engines".to_string(), Value::Array(names));
    }

    for key in PASSTHROUGH_PARAMS {
        if let Some(value) = params.get(*key) {
            payload.insert(key.to_string(), Value::String(value.clone()));
        }
    }

    payload
}

/// Build a payload from a POST body. Anything but a JSON object is empty.
pub fn payload_from_body(body: &[u8]) -> Payload {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            debug!("Request body is not a JSON object");
            Payload::new()
        }
        Err(e) => {
            debug!("Request body is not valid JSON: {}", e);
            Payload::new()
        }
    }
}

/// Search via query parameters
pub async fn websearch_get(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    run_search(state, payload_from_query(&params)).await
}

/// Search via JSON body
pub async fn websearch_post(State(state): State<AppState>, body: Bytes) -> Response {
    run_search(state, payload_from_body(&body)).await
}

async fn run_search(state: AppState, payload: Payload) -> Response {
    let span = info_span!("websearch", request_id = %Uuid::new_v4());

    async move {
        let outcome = state
            .orchestrator
            .search(&payload)
            .await
            .and_then(|response| {
                let count = response.results.len();
                to_json(&response).map(|body| (count, body))
            });

        match outcome {
            Ok((count, body)) => {
                info!("Search returned {} results", count);
                (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response()
            }
            Err(e) => error_response(e),
        }
    }
    .instrument(span)
    .await
}

fn error_response(err: SearchError) -> Response {
    if err.is_client_error() {
        warn!("Rejected search request: {}", err);
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": err.to_string() }))).into_response();
    }

    error!("Search failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "search_failed", "detail": err.to_string() })),
    )
        .into_response()
}

/// Liveness probe
pub async fn ping() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Outbound DNS and HTTP reachability
pub async fn netcheck(State(state): State<AppState>) -> Json<NetReport> {
    Json(connectivity_report(&state.client).await)
}
