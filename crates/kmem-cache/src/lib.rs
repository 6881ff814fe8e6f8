//! # kmem-cache
//!
//! The process-wide response cache. Entries expire after a fixed TTL and
//! count their hits; a background sweeper drops expired entries and evicts
//! the least-read half of the rest.

pub mod keys;
pub mod memory;

pub use memory::MemoryCache;
