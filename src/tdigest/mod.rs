pub mod centroids;
pub mod varint;
pub mod wire;

#[cfg(test)]
pub(crate) mod test_helpers;

// Internal building blocks
mod compressor;
mod tdigest;

// Public surface
pub use centroids::Centroid;
pub use tdigest::{TDigest, TDigestBuilder, DEFAULT_COMPRESSION};
