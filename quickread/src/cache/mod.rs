//! Session-scoped response cache.
//!
//! Avoids a second backend call for a chunk that was already generated under the same
//! action, media, model and language. Only successful results are stored; the dispatcher
//! enforces that, the cache itself stores whatever it is given.

mod key;
mod response;

pub use key::CacheKey;
pub use response::{ResponseCache, RESPONSE_CACHE_CAPACITY};
