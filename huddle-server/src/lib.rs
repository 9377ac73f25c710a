mod config;
mod credentials;
mod diagnostics;
mod room;
mod server;
mod signaling;

pub use config::*;
pub use credentials::*;
pub use diagnostics::*;
pub use room::*;
pub use server::*;
pub use signaling::*;
