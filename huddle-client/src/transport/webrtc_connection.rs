use crate::link::ConnectivityStatus;
use crate::media::{LocalTrack, MediaKind};
use crate::render::RemoteTrack;
use crate::transport::connection::{
    ConnectionFactory, ConnectionRequest, ConnectionStats, MediaConnection,
};
use crate::transport::events::{LinkEventKind, LinkEvents};
use anyhow::{Context, Result};
use async_trait::async_trait;
use huddle_core::{IceCandidate, IceServerConfig, PeerId, SessionDescription};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::stats::StatsReportType;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Opens [`WebRtcConnection`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebRtcConnectionFactory;

#[async_trait]
impl ConnectionFactory for WebRtcConnectionFactory {
    async fn open(&self, request: ConnectionRequest) -> Result<Arc<dyn MediaConnection>> {
        let connection = WebRtcConnection::open(request).await?;
        Ok(Arc::new(connection))
    }
}

pub struct WebRtcConnection {
    pub peer_id: PeerId,
    pub peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcConnection {
    pub async fn open(request: ConnectionRequest) -> Result<Self> {
        let ConnectionRequest {
            peer,
            generation,
            profile,
            tracks,
            receive_only,
            events,
        } = request;

        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: profile.ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        debug!(
            "Opened connection to {} (generation {}, profile {})",
            peer, generation, profile.name
        );

        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let events = state_events.clone();
                Box::pin(async move {
                    info!(
                        "Connection state for {} (generation {}): {:?}",
                        events.peer(),
                        events.generation(),
                        s
                    );
                    events.emit(LinkEventKind::Connectivity(status_from(s)));
                })
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                events.emit(LinkEventKind::LocalCandidate(IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                }));
            })
        }));

        let track_events = events;
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let events = track_events.clone();
            Box::pin(async move {
                debug!("Remote {} track from {}", track.kind(), events.peer());
                events.emit(LinkEventKind::RemoteTrack(Arc::new(WebRtcRemoteTrack {
                    track,
                })));
            })
        }));

        for track in &tracks {
            let sender = peer_connection
                .add_track(track.source() as Arc<dyn TrackLocal + Send + Sync>)
                .await
                .with_context(|| format!("adding {} track", track.kind()))?;

            tokio::spawn(async move {
                let mut rtcp_buf = vec![0u8; 1500];
                while let Ok((_, _)) = sender.read(&mut rtcp_buf).await {}
            });
        }

        // Receive every kind we do not send, so viewers and single-device
        // participants still get the others' media.
        for kind in [MediaKind::Audio, MediaKind::Video] {
            if receive_only || !tracks.iter().any(|t| t.kind() == kind) {
                let init = RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                };
                peer_connection
                    .add_transceiver_from_kind(kind.codec_type(), Some(init))
                    .await
                    .with_context(|| format!("adding {} receiver", kind))?;
            }
        }

        Ok(Self {
            peer_id: peer,
            peer_connection,
        })
    }
}

#[async_trait]
impl MediaConnection for WebRtcConnection {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn accept_offer(&self, offer: SessionDescription) -> Result<SessionDescription> {
        let desc = RTCSessionDescription::offer(offer.sdp)?;
        self.peer_connection.set_remote_description(desc).await?;

        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn apply_answer(&self, answer: SessionDescription) -> Result<()> {
        let desc = RTCSessionDescription::answer(answer.sdp)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn replace_track(&self, track: &LocalTrack) -> Result<bool> {
        let wanted = track.kind().codec_type();

        for sender in self.peer_connection.get_senders().await {
            let Some(current) = sender.track().await else {
                continue;
            };
            if current.kind() != wanted {
                continue;
            }
            sender
                .replace_track(Some(track.source() as Arc<dyn TrackLocal + Send + Sync>))
                .await?;
            return Ok(true);
        }

        Ok(false)
    }

    async fn stats(&self) -> Result<ConnectionStats> {
        let mut stats = ConnectionStats {
            status: status_from(self.peer_connection.connection_state()),
            ..Default::default()
        };

        let reports = self.peer_connection.get_stats().await;
        for report in reports.reports.values() {
            if let StatsReportType::CandidatePair(pair) = report
                && pair.nominated
            {
                stats.bytes_sent = pair.bytes_sent;
                stats.bytes_received = pair.bytes_received;
                stats.round_trip_time = Some(Duration::from_secs_f64(
                    pair.current_round_trip_time.max(0.0),
                ));
            }
        }

        Ok(stats)
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// A track received over a [`WebRtcConnection`].
pub struct WebRtcRemoteTrack {
    track: Arc<TrackRemote>,
}

impl WebRtcRemoteTrack {
    pub fn inner(&self) -> Arc<TrackRemote> {
        Arc::clone(&self.track)
    }
}

impl RemoteTrack for WebRtcRemoteTrack {
    fn id(&self) -> String {
        self.track.id()
    }

    fn stream_id(&self) -> String {
        self.track.stream_id()
    }

    fn kind(&self) -> Option<MediaKind> {
        MediaKind::from_codec_type(self.track.kind())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
        ..Default::default()
    }
}

fn status_from(state: RTCPeerConnectionState) -> ConnectivityStatus {
    match state {
        RTCPeerConnectionState::Connecting => ConnectivityStatus::Connecting,
        RTCPeerConnectionState::Connected => ConnectivityStatus::Connected,
        RTCPeerConnectionState::Disconnected => ConnectivityStatus::Disconnected,
        RTCPeerConnectionState::Failed => ConnectivityStatus::Failed,
        RTCPeerConnectionState::Closed => ConnectivityStatus::Closed,
        _ => ConnectivityStatus::New,
    }
}
