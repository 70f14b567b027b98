//! Crate-level error type and lock recovery helpers.
//!
//! Errors never cross the expansion cache boundary; this type is used by
//! configuration loading and the command-line tool.

use std::sync::PoisonError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::mapping::SegmentMapError;

#[derive(Debug, Error)]
pub enum UtsushiError {
    /// Settings could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Expander output carried an invalid segment mapping
    #[error("Invalid segment mapping: {0}")]
    SegmentMap(#[from] SegmentMapError),

    /// Expander output could not be parsed
    #[error("Invalid expansion output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Offset or URI rejected by a conversion
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type UtsushiResult<T> = Result<T, UtsushiError>;

impl UtsushiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        UtsushiError::InvalidInput(message.into())
    }
}

/// Recover the guard from a poisoned lock instead of propagating the panic.
pub trait LockResultExt<T> {
    /// The context names the operation that hit the poisoned lock.
    fn recover_poison(self, context: &str) -> T;
}

impl<T> LockResultExt<T> for Result<T, PoisonError<T>> {
    fn recover_poison(self, context: &str) -> T {
        match self {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!(
                    target: "utsushi::lock_recovery",
                    "Recovered from poisoned lock in {}",
                    context
                );
                poisoned.into_inner()
            }
        }
    }
}
