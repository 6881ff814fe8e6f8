//! Built-in job implementations.

pub mod cleanup;
pub mod thumbnail;

pub use cleanup::CleanupJob;
pub use thumbnail::ThumbnailJob;
