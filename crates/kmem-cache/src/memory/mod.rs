//! In-process cache backed by a sharded concurrent map.

pub mod store;

pub use store::MemoryCache;
