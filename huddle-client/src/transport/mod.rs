mod connection;
mod events;
mod webrtc_connection;

pub use connection::*;
pub use events::*;
pub use webrtc_connection::*;
