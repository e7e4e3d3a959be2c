//! Interval fuzzing sources.
//!
//! Long intervals get a small random perturbation so cohorts of cards
//! reviewed together do not stay bunched on the same calendar day. The
//! source is injected into the engine so tests can pin the draw to a
//! fixed value or disable it.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Half-width of the fuzz window: intervals are perturbed by up to ±5%.
pub const FUZZ_RANGE: f64 = 0.05;

/// Supplies perturbation factors for interval fuzzing.
pub trait FuzzSource {
    /// Next perturbation factor, in `[-0.05, 0.05]`.
    fn factor(&mut self) -> f64;
}

/// Uniformly random fuzz backed by a seedable generator.
pub struct RandomFuzz {
    rng: StdRng,
}

impl RandomFuzz {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl FuzzSource for RandomFuzz {
    fn factor(&mut self) -> f64 {
        self.rng.gen_range(-FUZZ_RANGE..=FUZZ_RANGE)
    }
}

/// Disables fuzzing entirely. Used for interval previews and for tests
/// that need exact intervals.
pub struct NoFuzz;

impl FuzzSource for NoFuzz {
    fn factor(&mut self) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fuzz_is_zero() {
        assert_eq!(NoFuzz.factor(), 0.0);
    }

    #[test]
    fn test_random_fuzz_stays_in_range() {
        let mut fuzz = RandomFuzz::from_seed(7);
        for _ in 0..1000 {
            let f = fuzz.factor();
            assert!((-FUZZ_RANGE..=FUZZ_RANGE).contains(&f));
        }
    }

    #[test]
    fn test_seeded_fuzz_is_reproducible() {
        let mut a = RandomFuzz::from_seed(42);
        let mut b = RandomFuzz::from_seed(42);
        for _ in 0..10 {
            assert_eq!(a.factor(), b.factor());
        }
    }
}
