use crate::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientSignal, PeerId, RelaySignal};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let peer_id = PeerId::new();
    info!("New WebSocket connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<RelaySignal>();

    if let Err(e) = service.room().connect(peer_id, tx).await {
        error!("Cannot register {}: {:?}", peer_id, e);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(signal) = rx.recv().await {
            let json = match serde_json::to_string(&signal) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize relay frame: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientSignal>(&text) {
                        Ok(signal) => {
                            if let Err(e) = service.room().relay(peer_id, signal).await {
                                error!("Room died: {}", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid frame from {}: {}", peer_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    let _ = service.room().disconnect(peer_id).await;
    info!("WebSocket disconnected: {}", peer_id);
}
