//! # linkcache
//!
//! Fixed-capacity recency cache built on `linklist`.
//!
//! ## Architecture
//! - **Recency list**: `IndexedList` of keys, most recent at the head
//! - **Lookup**: the list's value index finds a key's node in O(1)
//! - **Entries**: AHash map from key to value
//! - **Sharing**: `SharedCache` puts the whole cache behind one mutex

#![warn(missing_docs)]

mod recency;
mod shared;
mod stats;

pub use recency::RecencyCache;
pub use shared::SharedCache;
pub use stats::{CacheStats, StatsSnapshot};
