//! # Wrike Tools Library
//!
//! OAuth2 token lifecycle for the Wrike API, a TTL cache for API
//! responses and user lookups, and the axum routes that expose both.
//!
//! Modules:
//! - `tokens` — token model, in-memory store, env override and manager
//! - `cache` — generic TTL cache, user cache and the cleanup task
//! - `wrike` — REST client with refresh-and-retry, OAuth2 flow, resources
//! - `config` — YAML service config and runtime env settings
//! - `server` — axum routers for auth, API proxies, settings and exports
//! - `export` — CSV rendering and invitation CSV parsing

pub mod cache;
pub mod config;
pub mod export;
pub mod helpers;
pub mod observability;
pub mod resilience;
pub mod server;
pub mod tokens;
pub mod utils;
pub mod wrike;

#[cfg(test)]
mod tests;

pub use crate::config::ServiceConfig;
