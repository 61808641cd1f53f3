use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A centroid summarizes a cluster in the digest: a mean and an integer count.
///
/// Means use a total order (`OrderedFloat`), so a digest decoded from garbage that carries
/// NaN means still sorts deterministically instead of poisoning comparisons.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Centroid {
    mean: OrderedFloat<f64>,
    count: u32,
}

impl PartialOrd for Centroid {
    fn partial_cmp(&self, other: &Centroid) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Centroid {
    fn cmp(&self, other: &Centroid) -> Ordering {
        // Means are unique inside a digest; ties fall back to count for a total order.
        self.mean
            .cmp(&other.mean)
            .then_with(|| self.count.cmp(&other.count))
    }
}

impl Centroid {
    #[inline]
    pub fn new(mean: f64, count: u32) -> Self {
        Centroid {
            mean: OrderedFloat::from(mean),
            count,
        }
    }

    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean.into_inner()
    }
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }
    #[inline]
    pub(crate) fn mean_key(&self) -> OrderedFloat<f64> {
        self.mean
    }

    /// Fold `weight` more observations at exactly this mean.
    ///
    /// Returns the part of `weight` that did not fit into `u32`; the caller spills it into a
    /// sibling centroid.
    #[inline]
    pub(crate) fn absorb(&mut self, weight: u32) -> u32 {
        let room = u32::MAX - self.count;
        let taken = weight.min(room);
        self.count += taken;
        weight - taken
    }
}

/// Non-strictly increasing by mean (allows equal means).
#[inline]
pub fn is_sorted_by_mean(cs: &[Centroid]) -> bool {
    cs.windows(2).all(|w| w[0].mean_key() <= w[1].mean_key())
}
