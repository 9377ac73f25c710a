use crate::model::peer::PeerId;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    #[serde(deserialize_with = "one_or_many")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: &str) -> Self {
        Self {
            urls: vec![url.to_owned()],
            username: None,
            credential: None,
        }
    }

    pub fn turn(url: &str, username: &str, credential: &str) -> Self {
        Self {
            urls: vec![url.to_owned()],
            username: Some(username.to_owned()),
            credential: Some(credential.to_owned()),
        }
    }
}

// Credential providers send `urls` either as one string or as a list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Urls {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Urls::deserialize(deserializer)? {
        Urls::One(url) => vec![url],
        Urls::Many(urls) => urls,
    })
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Trickled connectivity candidate, in the browser's `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default)]
    pub username_fragment: Option<String>,
}

/// Frames a participant sends to the relay. Always addressed.
///
/// Carries no sender field. The relay stamps it from its own session table;
/// a `from` key sent by a client is ignored on decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientSignal {
    Offer {
        to: PeerId,
        description: SessionDescription,
    },
    Answer {
        to: PeerId,
        description: SessionDescription,
    },
    IceCandidate {
        to: PeerId,
        candidate: IceCandidate,
    },
}

/// Frames the relay sends to a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum RelaySignal {
    Welcome(PeerId),
    ExistingUsers(Vec<PeerId>),
    UserJoined(PeerId),
    UserLeft(PeerId),
    Offer {
        from: PeerId,
        description: SessionDescription,
    },
    Answer {
        from: PeerId,
        description: SessionDescription,
    },
    IceCandidate {
        from: PeerId,
        candidate: IceCandidate,
    },
}

impl ClientSignal {
    pub fn target(&self) -> PeerId {
        match self {
            ClientSignal::Offer { to, .. }
            | ClientSignal::Answer { to, .. }
            | ClientSignal::IceCandidate { to, .. } => *to,
        }
    }

    /// Turn an addressed frame into the frame delivered to its target,
    /// with `from` set to the relay's record of the sender.
    pub fn stamp(self, from: PeerId) -> (PeerId, RelaySignal) {
        match self {
            ClientSignal::Offer { to, description } => {
                (to, RelaySignal::Offer { from, description })
            }
            ClientSignal::Answer { to, description } => {
                (to, RelaySignal::Answer { from, description })
            }
            ClientSignal::IceCandidate { to, candidate } => {
                (to, RelaySignal::IceCandidate { from, candidate })
            }
        }
    }
}
