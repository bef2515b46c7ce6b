pub mod parse;
pub mod process_frame;
pub mod request;
pub mod runtime;
