//! Core traits defined in `kmem-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheStore;
