// src/tdigest/wire.rs
//
// TDigest "small encoding" wire codec (version 2).
//
// Layout (big-endian, sequential):
//
//   i32            : encoding version = 2
//   f64            : compression
//   i32            : centroid count N
//   N x f32        : mean deltas (mean[i] - mean[i-1], mean[-1] = 0.0)
//   N x varint u32 : centroid counts (see varint.rs)
//
// Bytes after the last varint are never inspected.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;
use tracing::{debug, warn};

use crate::tdigest::varint::{decode_uint, encode_uint, uint_len, MAX_VARINT_BYTES};
use crate::tdigest::TDigest;

/// The only encoding version this codec reads or writes.
pub const SMALL_ENCODING: i32 = 2;

/// Byte order for every fixed-width field.
pub type WireEndian = BigEndian;

/// Fixed prefix: version (4) + compression (8) + centroid count (4).
pub const HEADER_LEN: usize = 4 + 8 + 4;

/// Upper bound on delta slots reserved up front from an untrusted count.
const MAX_PREALLOC_DELTAS: usize = 4096;

#[derive(Debug, Error)]
pub enum WireError {
    /// Read/write failure of the underlying stream; truncation is `UnexpectedEof`.
    #[error("tdigest wire i/o: {0}")]
    Io(#[from] io::Error),
    #[error("unsupported encoding version: {0}")]
    UnsupportedVersion(i32),
    #[error("varint encoding overflow: {0} needs more than {} bytes", MAX_VARINT_BYTES)]
    EncodingOverflow(u32),
    #[error("varint decoding overflow: value looks too big for 32 bits")]
    DecodingOverflow,
    #[error("negative centroid count: {0}")]
    NegativeCentroidCount(i32),
    #[error("too many centroids for the small encoding: {0}")]
    TooManyCentroids(usize),
}

pub type WireResult<T> = Result<T, WireError>;

/* ============================
 * Encode
 * ============================ */

/// Exact size of `encode_digest(td)` without encoding anything.
pub fn encoded_len(td: &TDigest) -> usize {
    HEADER_LEN
        + 4 * td.len()
        + td
            .ordered_centroids()
            .map(|c| uint_len(c.count()))
            .sum::<usize>()
}

/// Stream the small encoding of `td` into `w`.
///
/// On error the sink may hold a partial encoding; callers must discard it.
pub fn encode_to<W: Write + ?Sized>(td: &TDigest, w: &mut W) -> WireResult<()> {
    let n = i32::try_from(td.len()).map_err(|_| WireError::TooManyCentroids(td.len()))?;

    w.write_i32::<WireEndian>(SMALL_ENCODING)?;
    w.write_f64::<WireEndian>(td.compression())?;
    w.write_i32::<WireEndian>(n)?;

    // Deltas are taken against the previous exact f64 mean, never a rounded one.
    let mut prev = 0.0_f64;
    for c in td.ordered_centroids() {
        let mean = c.mean();
        w.write_f32::<WireEndian>((mean - prev) as f32)?;
        prev = mean;
    }

    for c in td.ordered_centroids() {
        encode_uint(w, c.count())?;
    }
    Ok(())
}

/// Encode `td` into a fresh buffer.
pub fn encode_digest(td: &TDigest) -> WireResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(encoded_len(td));
    encode_to(td, &mut buf)?;
    debug!(
        centroids = td.len(),
        compression = td.compression(),
        bytes = buf.len(),
        "encoded tdigest"
    );
    Ok(buf)
}

/* ============================
 * Decode
 * ============================ */

/// Read one small-encoding digest from `r`, consuming exactly its bytes.
pub fn decode_from<R: Read + ?Sized>(r: &mut R) -> WireResult<TDigest> {
    let version = r.read_i32::<WireEndian>()?;
    if version != SMALL_ENCODING {
        warn!(version, "rejecting tdigest with unsupported encoding version");
        return Err(WireError::UnsupportedVersion(version));
    }

    let compression = r.read_f64::<WireEndian>()?;
    let mut td = TDigest::new(compression);

    let raw_count = r.read_i32::<WireEndian>()?;
    let n = usize::try_from(raw_count).map_err(|_| {
        warn!(raw_count, "rejecting tdigest with negative centroid count");
        WireError::NegativeCentroidCount(raw_count)
    })?;

    let mut deltas: Vec<f32> = Vec::with_capacity(n.min(MAX_PREALLOC_DELTAS));
    for _ in 0..n {
        deltas.push(r.read_f32::<WireEndian>()?);
    }

    let mut x = 0.0_f64;
    for delta in deltas {
        let count = decode_uint(r)?;
        let mean = x + f64::from(delta);
        td.insert_weighted(mean, count);
        x = mean;
    }

    debug!(centroids = n, compression, "decoded tdigest");
    Ok(td)
}

/// Decode a digest from the front of `bytes`.
pub fn decode_digest(bytes: &[u8]) -> WireResult<TDigest> {
    let mut r = bytes;
    decode_from(&mut r)
}
