//! PostgreSQL-backed store implementations.

pub mod file;
pub mod user;

pub use file::PgFileStore;
pub use user::PgUserStore;

/// SQLSTATE for `unique_violation`.
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

/// Whether a sqlx error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}
