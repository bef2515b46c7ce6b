pub mod analyzer;
pub mod config_store;
pub mod defaults;
pub mod runtime_engine;
pub mod secrets;
