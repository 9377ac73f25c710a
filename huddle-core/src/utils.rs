pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_3: &str = "stun:stun2.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_4: &str = "stun:stun3.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_5: &str = "stun:stun4.l.google.com:19302";

pub const CLOUDFLARE_STUN_ADDR: &str = "stun:stun.cloudflare.com:3478";

pub const OPENRELAY_STUN_ADDR: &str = "stun:openrelay.metered.ca:80";
pub const OPENRELAY_TURN_ADDRS: [&str; 3] = [
    "turn:openrelay.metered.ca:80",
    "turn:openrelay.metered.ca:443",
    "turn:openrelay.metered.ca:443?transport=tcp",
];
pub const OPENRELAY_USERNAME: &str = "openrelayproject";
pub const OPENRELAY_CREDENTIAL: &str = "openrelayproject";

pub const PUBLIC_STUN_ADDRS: [&str; 9] = [
    "stun:global.stun.twilio.com:3478",
    "stun:stun.ekiga.net",
    "stun:stun.ideasip.com",
    "stun:stun.schlund.de",
    "stun:stun.voiparound.com",
    "stun:stun.voipbuster.com",
    "stun:stun.voipstunt.com",
    "stun:stun.sipgate.net",
    "stun:stun.stunprotocol.org:3478",
];

/// Path the relay serves its WebSocket endpoint on.
pub const SIGNALING_PATH: &str = "/ws";
pub const CREDENTIALS_PATH: &str = "/api/turn-credentials";
pub const DIAGNOSTICS_PATH: &str = "/api/diagnostics";

pub const DEFAULT_RELAY_PORT: u16 = 4057;
