//! Result type alias for EpochScript operations

use crate::error::EpochError;

/// Standard Result type for EpochScript operations
pub type Result<T> = std::result::Result<T, EpochError>;
