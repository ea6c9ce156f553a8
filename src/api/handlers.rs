//! Route handlers for the query API.
//!
//! Each named view implies a fixed bucket duration; `start`/`end` bound the
//! scan. Error bodies are always `{"error": "<message>"}` and the status
//! codes (200 / 404 / 500) mirror the legacy API exactly, including 500 for
//! validation failures.

use crate::monitor_core::bucket::BucketDuration;
use crate::monitor_core::store::MeasurementStore;
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared handler state: one store handle serialized across request tasks.
pub struct AppState {
    pub store: Mutex<MeasurementStore>,
}

pub type SharedState = Arc<AppState>;

type Params = HashMap<String, String>;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Liveness probe: empty 200 body.
pub async fn root() -> &'static str {
    ""
}

/// Single most recent raw sample, as `[timestamp, value]`.
pub async fn latest(State(state): State<SharedState>) -> Response {
    let result = state.store.lock().unwrap().latest_raw();
    match result {
        Ok(Some((timestamp, value))) => Json(json!([timestamp, value])).into_response(),
        Ok(None) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "No data"),
        Err(e) => {
            log::error!("❌ Latest lookup failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn all(State(state): State<SharedState>, Query(params): Query<Params>) -> Response {
    series(state, params, BucketDuration::Raw).await
}

pub async fn minutes(State(state): State<SharedState>, Query(params): Query<Params>) -> Response {
    series(state, params, BucketDuration::Minute).await
}

pub async fn hours(State(state): State<SharedState>, Query(params): Query<Params>) -> Response {
    series(state, params, BucketDuration::Hour).await
}

pub async fn days(State(state): State<SharedState>, Query(params): Query<Params>) -> Response {
    series(state, params, BucketDuration::Day).await
}

/// Shared bounded-view implementation: validate `start`/`end`, then scan the
/// store at the view's implied granularity.
async fn series(state: SharedState, params: Params, bucket: BucketDuration) -> Response {
    let start = match params.get("start") {
        None => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "'start' parameter missing from request.",
            )
        }
        Some(raw) => match raw.parse::<i64>() {
            Ok(start) => start,
            Err(_) => {
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "'start' parameter could not be converted to an integer.",
                )
            }
        },
    };

    let end = match params.get("end") {
        None => None,
        Some(raw) => match raw.parse::<i64>() {
            Ok(end) => Some(end),
            Err(_) => {
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "'end' parameter could not be converted to an integer.",
                )
            }
        },
    };

    let result = state.store.lock().unwrap().select_range(bucket, start, end);
    match result {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => {
            log::error!("❌ Range query ({}) failed: {}", bucket.as_str(), e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Any path outside the registered table.
pub async fn unsupported(uri: Uri) -> Response {
    let location = uri.path().trim_start_matches('/');
    error_response(
        StatusCode::NOT_FOUND,
        format!("Unsupported Request: {}", location),
    )
}
