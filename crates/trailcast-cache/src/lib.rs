//! Transient caching for Trailcast
//!
//! A bounded TTL cache with stale-while-revalidate semantics and single-flight
//! de-duplication, plus the coordinate/date key that scopes condition lookups
//! to a coarse map tile.

pub mod key;
pub mod swr;

pub use key::TileKey;
pub use swr::{CacheError, SwrCache};
