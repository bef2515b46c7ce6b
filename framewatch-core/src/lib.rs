pub mod config;
pub mod prompts;
pub mod settings;
pub mod types;
pub use config::*;
pub use prompts::*;
pub use settings::*;
pub use types::*;
