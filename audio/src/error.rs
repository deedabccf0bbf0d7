use thiserror::Error;

use crate::pool::MemoryPool;

/// Errors returned by audio and feature-extraction operations.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("invalid mfcc config: {0}")]
    InvalidConfig(String),

    #[error("allocation of {what} ({bytes} bytes) failed: {reason}")]
    Alloc {
        what: &'static str,
        bytes: usize,
        reason: String,
    },

    #[error("no pool can hold {what} ({bytes} bytes), tried {tried:?}")]
    PoolExhausted {
        what: &'static str,
        bytes: usize,
        tried: Vec<MemoryPool>,
    },

    #[error("shape mismatch for {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
}
