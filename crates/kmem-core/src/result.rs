//! Convenience result type alias for kmem.

use crate::error::AppError;

/// A specialized `Result` type for kmem operations.
pub type AppResult<T> = Result<T, AppError>;
