use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientSignal, RelaySignal};
use std::net::SocketAddr;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::signal_helpers::SIGNAL_TIMEOUT_MS;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Real WebSocket client speaking the relay protocol.
pub struct WsTestClient {
    stream: WsStream,
}

impl WsTestClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let url = format!("ws://{}/ws", addr);
        let (stream, _) = connect_async(url.as_str())
            .await
            .context("Failed to open WebSocket")?;
        Ok(Self { stream })
    }

    pub async fn send(&mut self, signal: &ClientSignal) -> Result<()> {
        let json = serde_json::to_string(signal)?;
        self.send_raw(json).await
    }

    pub async fn send_raw(&mut self, text: String) -> Result<()> {
        self.stream
            .send(Message::Text(text))
            .await
            .context("Failed to send frame")
    }

    pub async fn next(&mut self) -> Result<RelaySignal> {
        let deadline = Duration::from_millis(SIGNAL_TIMEOUT_MS);
        loop {
            let msg = tokio::time::timeout(deadline, self.stream.next())
                .await
                .context("Timeout waiting for relay frame")?
                .context("Socket closed")??;

            if let Message::Text(text) = msg {
                return serde_json::from_str(&text).context("Relay sent an invalid frame");
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await.context("Failed to close socket")
    }
}
