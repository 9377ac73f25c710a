pub use huddle_core::PeerId;

pub mod model {
    pub use huddle_core::model::*;
}

pub mod utils {
    pub use huddle_core::utils::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use huddle_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use huddle_client::*;
}
