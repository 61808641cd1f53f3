//! tdigest-testdata
//! Seeded synthetic centroid sets shared by benches and tests.
//! Each set is ascending by mean with unique means and counts ≥ 1.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};

/// Shapes of synthetic centroid sets.
#[derive(Clone, Copy, Debug)]
pub enum CentroidShape {
    /// Means evenly spread over \[0,1), unit counts.
    UniformUnit,
    /// Gaussian means, counts peaking in the middle like a compressed digest.
    NormalPeaked,
    /// Heavy right tail (exponential means), mixed small and huge counts.
    HeavyTail,
    /// Negative and positive means straddling zero with tiny gaps.
    ZeroStraddle,
}

/// Generate up to `n` `(mean, count)` pairs for the chosen shape.
///
/// Duplicate means produced by the sampler are dropped, so the result may be slightly shorter
/// than `n` for the random shapes.
pub fn gen_centroids(kind: CentroidShape, n: usize, seed: u64) -> Vec<(f64, u32)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out: Vec<(f64, u32)> = Vec::with_capacity(n);

    match kind {
        CentroidShape::UniformUnit => {
            for i in 0..n {
                out.push((i as f64 / n as f64, 1));
            }
        }
        CentroidShape::NormalPeaked => {
            let normal = Normal::new(0.0, 1.0).unwrap();
            let mut means: Vec<f64> = (0..n).map(|_| normal.sample(&mut rng)).collect();
            means.sort_by(|a, b| a.total_cmp(b));
            for (i, m) in means.into_iter().enumerate() {
                let q = (i as f64 + 0.5) / n as f64;
                let peak = (4.0 * q * (1.0 - q) * 500.0).ceil() as u32;
                out.push((m, peak.max(1) + rng.random_range(0..3)));
            }
        }
        CentroidShape::HeavyTail => {
            let exp = Exp::new(0.01).unwrap();
            let mut means: Vec<f64> = (0..n).map(|_| exp.sample(&mut rng)).collect();
            means.sort_by(|a, b| a.total_cmp(b));
            for m in means {
                let count = if rng.random_bool(0.1) {
                    rng.random_range(1_000_000..u32::MAX)
                } else {
                    rng.random_range(1..128)
                };
                out.push((m, count));
            }
        }
        CentroidShape::ZeroStraddle => {
            let mut x = -(n as f64) * 1e-3;
            for _ in 0..n {
                x += rng.random_range(1e-6..2e-3);
                out.push((x, rng.random_range(1..20)));
            }
        }
    }
    out.dedup_by(|b, a| a.0 == b.0);
    out
}
