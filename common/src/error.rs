//! Error types shared across the workspace.

use thiserror::Error;

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur when configuring or verifying an index.
///
/// Duplicate inserts and missing keys are not errors; they are reported
/// through plain return values.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The requested order cannot produce well-formed splits and merges.
    #[error("order {order} is outside the supported range {min}..={max}")]
    InvalidOrder {
        order: usize,
        min: usize,
        max: usize,
    },

    /// A caller supplied parameter is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A structural invariant does not hold.
    #[error("tree corrupted: {0}")]
    Corruption(String),
}
