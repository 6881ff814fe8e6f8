//! # kmem-database
//!
//! PostgreSQL connection management and the store implementations behind
//! the [`FileStore`] and [`UserStore`] seams.

pub mod connection;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use repositories::{PgFileStore, PgUserStore};
pub use store::{FileStore, UserStore};
