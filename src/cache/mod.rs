//! Client-side cache for API responses
//!
//! Holds previously fetched record sets (and derived analytics snapshots) in
//! memory so that reads within the TTL skip the network, and so that expired
//! data can still be served while the API is unreachable.

pub mod key;
pub mod store;

use std::time::Duration;

/// Validity window of a cached payload.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60); // 5 min

// Re-export main types
pub use key::{cache_key, key_prefix};
pub use store::{CacheEntry, TtlCache};
