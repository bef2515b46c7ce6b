pub mod encoder;
pub mod selector;
pub mod session;
pub mod sink;
pub mod traits;
