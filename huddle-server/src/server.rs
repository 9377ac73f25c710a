use crate::config::ServerConfig;
use crate::credentials::{CredentialService, credentials_handler};
use crate::diagnostics::{DiagnosticsStore, get_diagnostics, post_diagnostics};
use crate::room::RoomHandle;
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::Method;
use axum::routing::get;
use axum::{Json, response::IntoResponse};
use huddle_core::utils::{CREDENTIALS_PATH, DIAGNOSTICS_PATH, SIGNALING_PATH};
use serde_json::json;
use std::future::Future;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

pub fn build_router(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route(SIGNALING_PATH, get(ws_handler))
        .route(CREDENTIALS_PATH, get(credentials_handler))
        .route(
            DIAGNOSTICS_PATH,
            get(get_diagnostics).post(post_diagnostics),
        )
        .route("/healthz", get(health_handler))
        .layer(cors)
        .with_state(service)
}

async fn health_handler(State(service): State<SignalingService>) -> impl IntoResponse {
    match service.room().members().await {
        Ok(members) => Json(json!({ "ok": true, "participants": members.len() })),
        Err(e) => {
            warn!("Health check could not reach the room: {}", e);
            Json(json!({ "ok": false }))
        }
    }
}

/// Run the relay until `shutdown` resolves, then stop the room.
pub async fn serve<F>(config: ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (room, room_task) = RoomHandle::spawn();
    let credentials =
        CredentialService::new(config.metered_api_key.clone(), config.metered_base_url());
    let service = SignalingService::new(room, credentials, DiagnosticsStore::default());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Signaling relay listening on http://{}", addr);

    axum::serve(listener, build_router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Relay server failed")?;

    // Upgraded sockets are not tracked by graceful shutdown; they end with the room.
    room_task.abort();
    let _ = room_task.await;
    info!("Relay stopped");
    Ok(())
}
