//! In-memory response cache with replayed in-flight results.
//!
//! Entries are keyed by opaque strings and expire by age measured from
//! insertion. A size bound evicts the oldest entry. Every stored payload is a
//! [`SharedResult`], so a request that is still running is joined rather than
//! repeated.

pub mod clock;
pub mod response_cache;
pub mod shared;

pub use clock::{Clock, ManualClock, SystemClock};
pub use response_cache::{CacheConfig, CacheStats, ResponseCache};
pub use shared::SharedResult;
