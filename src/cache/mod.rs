//! In-memory caching: a generic TTL map, the identity (user) view over it,
//! and the background sweep.

pub mod sweeper;
pub mod ttl_cache;
pub mod user_cache;

pub use ttl_cache::{CacheEntry, CacheStatus, TtlCache};
pub use user_cache::{CachedUser, UserCache};
