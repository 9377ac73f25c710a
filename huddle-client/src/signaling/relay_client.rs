use crate::signaling::signaling_output::SignalingOutput;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientSignal, IceCandidate, PeerId, RelaySignal, SessionDescription};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Bounded reconnect with linearly growing, capped delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl ReconnectPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        (self.initial_delay * attempt.max(1)).min(self.max_delay)
    }
}

#[derive(Debug, Error)]
pub enum RelayClientError {
    #[error("could not reach relay: {0}")]
    Connect(#[source] tungstenite::Error),
    #[error("relay socket failed: {0}")]
    Socket(#[source] tungstenite::Error),
    #[error("malformed frame: {0}")]
    Frame(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Connected,
    Signal(RelaySignal),
    /// The socket dropped. A reconnect follows unless attempts run out.
    Disconnected,
    /// Every reconnect attempt failed. No further events follow.
    GaveUp,
}

/// Cloneable sender for addressed frames.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    outbound_tx: mpsc::UnboundedSender<ClientSignal>,
}

impl RelayHandle {
    pub fn send(&self, signal: ClientSignal) {
        let target = signal.target();
        if self.outbound_tx.send(signal).is_err() {
            debug!("Relay client stopped, dropping frame for {}", target);
        }
    }
}

#[async_trait]
impl SignalingOutput for RelayHandle {
    async fn send_offer(&self, to: PeerId, description: SessionDescription) {
        self.send(ClientSignal::Offer { to, description });
    }

    async fn send_answer(&self, to: PeerId, description: SessionDescription) {
        self.send(ClientSignal::Answer { to, description });
    }

    async fn send_ice(&self, to: PeerId, candidate: IceCandidate) {
        self.send(ClientSignal::IceCandidate { to, candidate });
    }
}

/// Persistent connection to the signaling relay.
pub struct RelayClient {
    url: String,
    policy: ReconnectPolicy,
    outbound_rx: mpsc::UnboundedReceiver<ClientSignal>,
    events_tx: mpsc::UnboundedSender<RelayEvent>,
}

enum SessionEnd {
    /// Socket closed or errored.
    Dropped,
    /// Every `RelayHandle` is gone, or nobody listens for events.
    Shutdown,
}

impl RelayClient {
    /// Start the client task. Dropping every [`RelayHandle`] stops it.
    pub fn spawn(
        url: impl Into<String>,
        policy: ReconnectPolicy,
    ) -> (RelayHandle, mpsc::UnboundedReceiver<RelayEvent>, JoinHandle<()>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let client = RelayClient {
            url: url.into(),
            policy,
            outbound_rx,
            events_tx,
        };
        let task = tokio::spawn(client.run());

        (RelayHandle { outbound_tx }, events_rx, task)
    }

    async fn run(mut self) {
        let mut failures = 0u32;

        loop {
            match connect(&self.url).await {
                Ok(stream) => {
                    info!("Connected to relay at {}", self.url);
                    failures = 0;

                    // Frames queued while offline address a membership that no longer exists.
                    let mut stale = 0usize;
                    while self.outbound_rx.try_recv().is_ok() {
                        stale += 1;
                    }
                    if stale > 0 {
                        debug!("Discarded {} stale outbound frame(s)", stale);
                    }

                    if !self.emit(RelayEvent::Connected) {
                        return;
                    }

                    match self.session(stream).await {
                        SessionEnd::Shutdown => {
                            info!("Relay client shutting down");
                            return;
                        }
                        SessionEnd::Dropped => {
                            warn!("Relay connection lost");
                            if !self.emit(RelayEvent::Disconnected) {
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("Relay connection to {} failed: {}", self.url, e);
                }
            }

            failures += 1;
            if failures > self.policy.max_attempts {
                warn!(
                    "Giving up on relay after {} attempts",
                    self.policy.max_attempts
                );
                self.emit(RelayEvent::GaveUp);
                return;
            }

            let delay = self.policy.delay(failures);
            debug!("Reconnecting to relay in {:?} (attempt {})", delay, failures);
            tokio::time::sleep(delay).await;
        }
    }

    async fn session(&mut self, stream: WsStream) -> SessionEnd {
        let (mut sink, mut source) = stream.split();

        loop {
            tokio::select! {
                outbound = self.outbound_rx.recv() => {
                    let Some(signal) = outbound else {
                        let _ = sink.close().await;
                        return SessionEnd::Shutdown;
                    };
                    let frame = match encode(&signal) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!("Dropping frame for {}: {}", signal.target(), e);
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(frame).await {
                        debug!("{}", RelayClientError::Socket(e));
                        return SessionEnd::Dropped;
                    }
                }

                inbound = source.next() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            match decode(&text) {
                                Ok(signal) => {
                                    if !self.emit(RelayEvent::Signal(signal)) {
                                        return SessionEnd::Shutdown;
                                    }
                                }
                                Err(e) => warn!("Invalid frame from relay: {}", e),
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => return SessionEnd::Dropped,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            debug!("{}", RelayClientError::Socket(e));
                            return SessionEnd::Dropped;
                        }
                    }
                }
            }
        }
    }

    fn emit(&self, event: RelayEvent) -> bool {
        self.events_tx.send(event).is_ok()
    }
}

async fn connect(url: &str) -> Result<WsStream, RelayClientError> {
    let (stream, _) = connect_async(url)
        .await
        .map_err(RelayClientError::Connect)?;
    Ok(stream)
}

fn encode(signal: &ClientSignal) -> Result<Message, RelayClientError> {
    Ok(Message::Text(serde_json::to_string(signal)?))
}

fn decode(text: &str) -> Result<RelaySignal, RelayClientError> {
    Ok(serde_json::from_str(text)?)
}
