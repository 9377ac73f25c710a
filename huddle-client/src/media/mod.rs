mod session;
mod source;
mod track;

pub use session::*;
pub use source::*;
pub use track::*;
