// src/tdigest/tdigest.rs
use ordered_float::OrderedFloat;

use crate::tdigest::centroids::{is_sorted_by_mean, Centroid};
use crate::tdigest::compressor::compress;
use crate::tdigest::wire::{decode_digest, encode_digest, WireResult};
use crate::{TdError, TdResult};

/// Compression used when the builder is not told otherwise.
pub const DEFAULT_COMPRESSION: f64 = 100.0;

/// Smallest centroid capacity, whatever the compression says.
const MIN_CAPACITY: usize = 2;

/// A t-digest: a compression parameter plus centroids kept in ascending mean order.
///
/// - `compression` is opaque to the codec; it is written and read back verbatim.
/// - Centroid counts are integers (`u32`), which is what the small encoding stores.
/// - Insertion compresses once the centroid count exceeds `ceil(2 * compression)`.
#[derive(Debug, PartialEq, Clone)]
pub struct TDigest {
    compression: f64,
    centroids: Vec<Centroid>,
}

impl Default for TDigest {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION)
    }
}

#[inline]
fn ensure_finite_values(values: &[f64]) -> TdResult<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(TdError::NonFiniteInput {
            context: "sample value",
        });
    }
    Ok(())
}

/* =============================================================================
 * Builder
 * ============================================================================= */

/// Builder for [`TDigest`].
///
/// Use the builder when you want to:
/// - construct an empty digest with a chosen compression, or
/// - seed a digest with *existing centroids* (in any order).
#[derive(Debug, Clone)]
pub struct TDigestBuilder {
    compression: f64,
    init_centroids: Option<Vec<Centroid>>,
}
impl Default for TDigestBuilder {
    fn default() -> Self {
        Self {
            compression: DEFAULT_COMPRESSION,
            init_centroids: None,
        }
    }
}
impl TDigestBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression parameter.
    #[inline]
    pub fn compression(mut self, c: f64) -> Self {
        self.compression = c;
        self
    }

    /// Seed with centroids. They are folded in through [`TDigest::insert_weighted`],
    /// so equal means coalesce and capacity is respected.
    #[inline]
    pub fn with_centroids(mut self, centroids: Vec<Centroid>) -> Self {
        self.init_centroids = Some(centroids);
        self
    }

    /// Build without validating the compression. This is what the decoder uses: whatever
    /// compression the buffer carries is kept as-is.
    pub fn build(self) -> TDigest {
        let mut td = TDigest {
            compression: self.compression,
            centroids: Vec::new(),
        };
        if let Some(mut cents) = self.init_centroids {
            cents.sort();
            for c in cents {
                td.insert_weighted(c.mean(), c.count());
            }
        }
        td
    }

    /// Build, rejecting a non-finite or non-positive compression.
    pub fn try_build(self) -> TdResult<TDigest> {
        if !self.compression.is_finite() || self.compression <= 0.0 {
            return Err(TdError::InvalidCompression {
                value: self.compression,
            });
        }
        Ok(self.build())
    }
}

/* =============================================================================
 * Digest
 * ============================================================================= */

impl TDigest {
    /// Empty digest with the given compression.
    #[inline]
    pub fn new(compression: f64) -> Self {
        Self::builder().compression(compression).build()
    }

    /// Entry point for fluent construction.
    #[inline]
    pub fn builder() -> TDigestBuilder {
        TDigestBuilder::default()
    }

    #[inline]
    pub fn compression(&self) -> f64 {
        self.compression
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    /// Borrow the centroids (ascending by mean).
    #[inline]
    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    /// Lazy pass over the centroids in ascending mean order.
    ///
    /// Each call starts a fresh pass; the encoder walks it twice (means, then counts).
    #[inline]
    pub fn ordered_centroids(&self) -> impl ExactSizeIterator<Item = Centroid> + '_ {
        self.centroids.iter().copied()
    }

    /// Sum of all centroid counts.
    #[inline]
    pub fn total_count(&self) -> u64 {
        self.centroids.iter().map(|c| u64::from(c.count())).sum()
    }

    /// Centroid count above which insertion triggers a compression pass.
    pub(crate) fn capacity(&self) -> usize {
        let c = self.compression;
        if c.is_nan() || c <= 0.0 {
            return MIN_CAPACITY;
        }
        // `as` saturates, so an infinite compression means "never compress".
        ((2.0 * c).ceil() as usize).max(MIN_CAPACITY)
    }

    /// Fold `weight` observations of `value` into the digest.
    ///
    /// Accepts any `f64` (the decoder feeds it whatever the buffer holds). A zero weight is a
    /// no-op. An exact mean match folds into the existing centroid; a count that would overflow
    /// `u32` spills into a sibling centroid at the same mean.
    pub fn insert_weighted(&mut self, value: f64, weight: u32) {
        if weight == 0 {
            return;
        }
        let key = OrderedFloat::from(value);

        // Ascending inserts (the decode path) land at the end without a search.
        let idx = match self.centroids.last() {
            Some(last) if last.mean_key() < key => self.centroids.len(),
            None => 0,
            _ => self.centroids.partition_point(|c| c.mean_key() < key),
        };

        let spill = match self.centroids.get_mut(idx) {
            Some(c) if c.mean_key() == key => c.absorb(weight),
            _ => weight,
        };
        if spill > 0 {
            self.centroids.insert(idx, Centroid::new(value, spill));
        }

        if self.centroids.len() > self.capacity() {
            self.centroids = compress(&self.centroids, self.compression, self.capacity() / 2);
        }
        debug_assert!(is_sorted_by_mean(&self.centroids));
    }

    /// Add one finite observation.
    pub fn add(&mut self, value: f64) -> TdResult<()> {
        ensure_finite_values(&[value])?;
        self.insert_weighted(value, 1);
        Ok(())
    }

    /// Add a batch of finite observations. Nothing is inserted if any value is rejected.
    pub fn add_many<A: AsRef<[f64]>>(&mut self, values: A) -> TdResult<()> {
        let values = values.as_ref();
        ensure_finite_values(values)?;
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        for v in sorted {
            self.insert_weighted(v, 1);
        }
        Ok(())
    }

    /// Build from **unsorted** finite values.
    pub fn from_values(values: &[f64], compression: f64) -> TdResult<TDigest> {
        let mut td = Self::builder().compression(compression).try_build()?;
        td.add_many(values)?;
        Ok(td)
    }

    /// Encode with the small (version 2) encoding.
    #[inline]
    pub fn to_bytes(&self) -> WireResult<Vec<u8>> {
        encode_digest(self)
    }

    /// Decode a small-encoding buffer. Trailing bytes are ignored.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> WireResult<TDigest> {
        decode_digest(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn means(td: &TDigest) -> Vec<f64> {
        td.ordered_centroids().map(|c| c.mean()).collect()
    }
    fn counts(td: &TDigest) -> Vec<u32> {
        td.ordered_centroids().map(|c| c.count()).collect()
    }

    #[test]
    fn inserts_keep_ascending_order_and_coalesce_equal_means() {
        let mut td = TDigest::new(100.0);
        td.insert_weighted(5.0, 1);
        td.insert_weighted(1.0, 2);
        td.insert_weighted(3.0, 4);
        td.insert_weighted(1.0, 3);

        assert_eq!(means(&td), vec![1.0, 3.0, 5.0]);
        assert_eq!(counts(&td), vec![5, 4, 1]);
        assert_eq!(td.total_count(), 10);
    }

    #[test]
    fn zero_weight_insert_is_noop() {
        let mut td = TDigest::new(100.0);
        td.insert_weighted(1.0, 0);
        assert!(td.is_empty());
    }

    #[test]
    fn count_overflow_spills_into_sibling_centroid() {
        let mut td = TDigest::new(100.0);
        td.insert_weighted(2.0, u32::MAX);
        td.insert_weighted(2.0, 10);
        assert_eq!(td.len(), 2);
        assert_eq!(td.total_count(), u64::from(u32::MAX) + 10);
        assert!(td.ordered_centroids().all(|c| c.mean() == 2.0));
    }

    #[test]
    fn insertion_accepts_nan_without_panicking() {
        let mut td = TDigest::new(100.0);
        td.insert_weighted(f64::NAN, 1);
        td.insert_weighted(1.0, 1);
        td.insert_weighted(f64::NAN, 2);
        assert_eq!(td.len(), 2);
        assert_eq!(td.centroids()[0].mean(), 1.0);
        assert_eq!(td.centroids()[1].count(), 3);
    }

    #[test]
    fn capacity_tracks_compression() {
        assert_eq!(TDigest::new(100.0).capacity(), 200);
        assert_eq!(TDigest::new(0.3).capacity(), MIN_CAPACITY);
        assert_eq!(TDigest::new(-5.0).capacity(), MIN_CAPACITY);
        assert_eq!(TDigest::new(f64::NAN).capacity(), MIN_CAPACITY);
        assert_eq!(TDigest::new(f64::INFINITY).capacity(), usize::MAX);
    }

    #[test]
    fn compresses_once_capacity_is_exceeded() {
        let mut td = TDigest::new(10.0);
        for i in 0..1_000 {
            td.insert_weighted(i as f64, 1);
            assert!(td.len() <= td.capacity());
        }
        assert_eq!(td.total_count(), 1_000);
        assert!(is_sorted_by_mean(td.centroids()));
    }

    #[test]
    fn ordered_centroids_is_restartable() {
        let td = TDigest::builder()
            .compression(50.0)
            .with_centroids(vec![Centroid::new(2.0, 1), Centroid::new(1.0, 2)])
            .build();
        let first: Vec<Centroid> = td.ordered_centroids().collect();
        let second: Vec<Centroid> = td.ordered_centroids().collect();
        assert_eq!(first, second);
        assert_eq!(td.ordered_centroids().len(), 2);
        assert_eq!(first[0].mean(), 1.0);
    }

    #[test]
    fn validating_paths_reject_non_finite_input() {
        let mut td = TDigest::new(100.0);
        assert!(matches!(
            td.add(f64::INFINITY),
            Err(TdError::NonFiniteInput { .. })
        ));
        assert!(td.add_many(vec![1.0, f64::NAN]).is_err());
        assert!(td.is_empty(), "rejected batch must not be partially inserted");
        assert!(TDigest::from_values(&[1.0, f64::NEG_INFINITY], 100.0).is_err());
    }

    #[test]
    fn try_build_rejects_bad_compression() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                TDigest::builder().compression(bad).try_build(),
                Err(TdError::InvalidCompression { .. })
            ));
        }
        assert!(TDigest::builder().compression(25.0).try_build().is_ok());
    }

    #[test]
    fn from_values_counts_every_sample() {
        let td = TDigest::from_values(&[3.0, 1.0, 2.0, 1.0], 100.0).expect("digest");
        assert_eq!(means(&td), vec![1.0, 2.0, 3.0]);
        assert_eq!(counts(&td), vec![2, 1, 1]);
    }
}
