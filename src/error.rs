// src/error.rs
use thiserror::Error;

/// Library-wide error for digest construction.
///
/// Codec failures live in [`crate::tdigest::wire::WireError`]; this type only covers the
/// validating ingest paths (`add`, `add_many`, `from_values`, `try_build`).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TdError {
    /// User tried to insert NaN/±inf through a validating API.
    /// `context` pinpoints where it came from (e.g., "sample value").
    #[error(
        "tdigest: non-finite values are not allowed ({context}). \
hint: clean your data or drop NaN/±inf before building the digest"
    )]
    NonFiniteInput { context: &'static str },

    /// Compression must be finite and > 0 for a digest built through `try_build`.
    #[error("tdigest: invalid compression {value}. hint: compression must be finite and > 0")]
    InvalidCompression { value: f64 },
}

pub type TdResult<T> = Result<T, TdError>;
