//! Convenience result type alias for StayHub.

use crate::error::AppError;

/// A specialized `Result` type for StayHub operations.
pub type AppResult<T> = Result<T, AppError>;
