pub mod forward;
pub mod proxy;

pub use forward::*;
pub use proxy::*;
