pub mod engine_harness;
pub mod mock_outputs;

pub use engine_harness::*;
pub use mock_connection::*;
pub use mock_outputs::*;
pub use relay_server::*;
pub use scripted_media::*;
