pub mod ws_client;

pub use signal_helpers::*;
pub use test_session::*;
pub use ws_client::*;
