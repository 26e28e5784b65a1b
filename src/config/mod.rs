//! Service configuration: the YAML file (`service`, `settings`), its loader
//! and validator, and the runtime key/value settings (`env_settings`).

pub mod env_settings;
pub mod proc_loader;
pub mod proc_validator;
pub mod service;
pub mod settings;

pub use service::{CacheConfig, ServiceConfig, WrikeConfig};
