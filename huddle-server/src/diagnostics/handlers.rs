use crate::SignalingService;
use crate::diagnostics::store::DEFAULT_QUERY_LIMIT;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use huddle_core::DiagnosticRecord;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct DiagnosticsQuery {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub limit: Option<usize>,
}

pub async fn post_diagnostics(
    State(service): State<SignalingService>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Ok(record) = serde_json::from_slice::<DiagnosticRecord>(&body) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "bad request" }))).into_response();
    };

    let stored = service
        .diagnostics()
        .push(record, client_ip(&headers))
        .await;

    let session: String = stored.session_id.chars().take(8).collect();
    match &stored.error {
        Some(err) => info!(
            "[DIAG] {} | {} | {} | {} | ERR: {}",
            stored.event_type, session, stored.client_ip, stored.details, err
        ),
        None => info!(
            "[DIAG] {} | {} | {} | {}",
            stored.event_type, session, stored.client_ip, stored.details
        ),
    }

    Json(json!({ "ok": true })).into_response()
}

pub async fn get_diagnostics(
    State(service): State<SignalingService>,
    Query(query): Query<DiagnosticsQuery>,
) -> impl IntoResponse {
    let page = service
        .diagnostics()
        .query(
            query.event_type.as_deref(),
            query.limit.unwrap_or(DEFAULT_QUERY_LIMIT),
        )
        .await;
    Json(page)
}

fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or("unknown")
        .to_owned()
}
