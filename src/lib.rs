//! Compact "small encoding" codec for t-digest summaries.
//!
//! The wire format is big-endian: a version tag (`2`), the compression
//! parameter, the centroid count, delta-encoded `f32` means and finally
//! varint-encoded centroid counts. See [`tdigest::wire`] for the layout.
mod error;
pub mod tdigest;

pub use error::{TdError, TdResult};
pub use tdigest::wire::{WireError, WireResult};
