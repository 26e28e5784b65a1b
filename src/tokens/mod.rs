//! OAuth2 token lifecycle: storage, precedence between token sources and
//! validity checks. Network calls live in `crate::wrike`.

pub mod manager;
pub mod memory_store;
pub mod providers;
pub mod token;

pub use manager::TokenManager;
pub use token::{Token, TokenResponse, TokenStatus};
