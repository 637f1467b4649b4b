use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};

/// Row indices for a shuffled train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a seeded RNG and cut off `ceil(n * test_fraction)` rows for testing.
///
/// The fraction is clamped to `[0, 1]`. The same `(n, test_fraction, seed)` always yields the
/// same partition.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> SplitIndices {
    let fraction = if test_fraction.is_finite() {
        test_fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let n_test = ((n as f64) * fraction).ceil() as usize;
    let n_test = n_test.min(n);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let train = indices.split_off(n_test);
    SplitIndices {
        train,
        test: indices,
    }
}
