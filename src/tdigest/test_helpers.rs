use crate::tdigest::{Centroid, TDigest};

/// Digest seeded with `(mean, count)` pairs, in any order.
pub fn digest_of(compression: f64, pairs: &[(f64, u32)]) -> TDigest {
    TDigest::builder()
        .compression(compression)
        .with_centroids(pairs.iter().map(|&(m, c)| Centroid::new(m, c)).collect())
        .build()
}

/// Decoded means may drift by the f32 rounding of each delta along the chain.
/// The bound is `2^-24 * Σ|Δ|` plus a little for the f64 accumulation.
pub fn assert_means_close(label: &str, expected: &TDigest, got: &TDigest) {
    assert_eq!(expected.len(), got.len(), "{}: centroid count differs", label);
    let mut prev = 0.0_f64;
    let mut chain = 0.0_f64;
    for (i, (e, g)) in expected
        .ordered_centroids()
        .zip(got.ordered_centroids())
        .enumerate()
    {
        chain += (e.mean() - prev).abs();
        prev = e.mean();
        let tol = chain * 1.2e-7 + 1e-9 * (1.0 + e.mean().abs());
        assert!(
            (e.mean() - g.mean()).abs() <= tol,
            "{}: mean[{}] expected ~= {:.12}, got {:.12}, tol={:.3e}",
            label,
            i,
            e.mean(),
            g.mean(),
            tol
        );
        assert_eq!(e.count(), g.count(), "{}: count[{}] differs", label, i);
    }
}
