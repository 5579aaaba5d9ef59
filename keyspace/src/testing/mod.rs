use rand::SeedableRng;
use rand::rngs::StdRng;

/// A deterministic generator for tests.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// `length` distinct values from `0..range`, unsorted.
pub fn random_unique_array(rng: &mut StdRng, length: usize, range: i32) -> Vec<i32> {
    crate::simulation::random_unique_array(rng, length, range)
}
