//! Wrike REST API facade: OAuth flow, authenticated requests with refresh
//! and retry, resource calls and the mapping of their payloads.

pub mod client;
pub mod error;
pub mod groups;
pub mod models;
pub mod oauth;
pub mod resources;
pub mod roles;

pub use client::WrikeClient;
pub use error::ApiError;
pub use models::WrikeResponse;
