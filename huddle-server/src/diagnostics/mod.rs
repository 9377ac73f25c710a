mod handlers;
mod store;

pub use handlers::*;
pub use store::*;
