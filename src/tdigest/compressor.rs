use std::f64::consts::LN_2;

use tracing::trace;

use crate::tdigest::centroids::Centroid;

const KLIMIT_TOL: f64 = 1e-12;

/// k2 (logistic) scale: `q → k` with `d` (the compression) as denominator.
///
/// More resolution near the tails, coarser clusters in the middle.
#[inline]
fn q_to_k(q: f64, d: f64) -> f64 {
    let eps = 1e-15;
    let qq = q.clamp(eps, 1.0 - eps);
    (d / (4.0 * LN_2)) * (qq / (1.0 - qq)).ln()
}

/// Running cluster: integer count, weighted mean sum, and the mean span it covers.
#[derive(Debug, Clone, Copy)]
struct Accum {
    count: u32,
    mw_sum: f64,
    first_mean: f64,
    last_mean: f64,
    members: usize,
}

impl Accum {
    fn start(c: &Centroid) -> Self {
        Accum {
            count: c.count(),
            mw_sum: f64::from(c.count()) * c.mean(),
            first_mean: c.mean(),
            last_mean: c.mean(),
            members: 1,
        }
    }

    #[inline]
    fn can_take(&self, c: &Centroid) -> bool {
        self.count.checked_add(c.count()).is_some()
    }

    fn push(&mut self, c: &Centroid) {
        self.count += c.count();
        self.mw_sum += f64::from(c.count()) * c.mean();
        self.last_mean = c.mean();
        self.members += 1;
    }

    fn finish(&self) -> Centroid {
        if self.members == 1 {
            return Centroid::new(self.first_mean, self.count);
        }
        // Rounding must not push the mean outside the members' span (keeps output sorted).
        let mean = (self.mw_sum / f64::from(self.count))
            .max(self.first_mean)
            .min(self.last_mean);
        Centroid::new(mean, self.count)
    }
}

/// Greedy left-to-right merge: a cluster grows while its k-span stays ≤ 1.
fn klimit_merge(items: &[Centroid], d: f64) -> Vec<Centroid> {
    let Some(first) = items.first() else {
        return Vec::new();
    };
    let total_w: f64 = items.iter().map(|c| f64::from(c.count())).sum();

    let mut clusters: Vec<Centroid> = Vec::with_capacity(items.len());
    let mut done_w = 0.0_f64;
    let mut acc = Accum::start(first);
    let mut k_left = q_to_k(0.0, d);

    for c in &items[1..] {
        let q_r = (done_w + f64::from(acc.count) + f64::from(c.count())) / total_w;
        let fits = q_to_k(q_r, d) - k_left <= 1.0 + KLIMIT_TOL;
        if fits && acc.can_take(c) {
            acc.push(c);
        } else {
            done_w += f64::from(acc.count);
            clusters.push(acc.finish());
            acc = Accum::start(c);
            k_left = q_to_k(done_w / total_w, d);
        }
    }
    clusters.push(acc.finish());
    clusters
}

/// Cap to at most `buckets` clusters of roughly equal count (cumulative thresholds).
fn bucketize_equal_weight(cs: &[Centroid], buckets: usize) -> Vec<Centroid> {
    debug_assert!(buckets > 0);
    let Some(first) = cs.first() else {
        return Vec::new();
    };
    let total: u128 = cs.iter().map(|c| u128::from(c.count())).sum();
    let b = buckets as u128;

    let mut out = Vec::with_capacity(buckets);
    let mut cum: u128 = u128::from(first.count());
    let mut acc = Accum::start(first);

    for c in &cs[1..] {
        let reached = cum * b >= (out.len() as u128 + 1) * total;
        if reached || !acc.can_take(c) {
            out.push(acc.finish());
            acc = Accum::start(c);
        } else {
            acc.push(c);
        }
        cum += u128::from(c.count());
    }
    out.push(acc.finish());
    out
}

/// Compress ascending centroids: k-limit merge, then cap to `target` clusters.
///
/// Total count is preserved exactly and the output stays ascending by mean.
pub(crate) fn compress(cs: &[Centroid], compression: f64, target: usize) -> Vec<Centroid> {
    let d = if compression.is_finite() && compression > 0.0 {
        compression
    } else {
        1.0
    };
    let mut out = klimit_merge(cs, d);
    let target = target.max(1);
    if out.len() > target {
        out = bucketize_equal_weight(&out, target);
    }
    trace!(
        before = cs.len(),
        after = out.len(),
        compression,
        "tdigest compression pass"
    );
    out
}
