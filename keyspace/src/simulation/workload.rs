//! Workload generator for deterministic simulation testing.
//!
//! Generates random but reproducible sequences of B+tree operations, and
//! random integer arrays for exercising the intersect engine.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Configuration for workload generation.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Probability of a put (0.0 - 1.0).
    pub put_rate: f64,
    /// Probability of a remove; the rest are lookups.
    pub remove_rate: f64,
    /// Maximum key length in bytes.
    pub max_key_length: usize,
    /// Size of the key pool. A smaller pool means more duplicates and hits.
    pub key_pool_size: usize,
    /// Restrict key bytes to a few values so keys share prefixes.
    pub narrow_alphabet: bool,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            put_rate: 0.5,
            remove_rate: 0.3,
            max_key_length: 6,
            key_pool_size: 200,
            narrow_alphabet: true,
        }
    }
}

/// A single B+tree operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Put { key: Vec<u8>, value: u32 },
    Remove { key: Vec<u8> },
    Get { key: Vec<u8> },
    Next { key: Vec<u8> },
    Previous { key: Vec<u8> },
}

impl Operation {
    #[must_use]
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. }
            | Self::Remove { key }
            | Self::Get { key }
            | Self::Next { key }
            | Self::Previous { key } => key,
        }
    }
}

/// Generator for random [`Operation`] sequences.
///
/// Produces the same sequence for the same seed and configuration.
pub struct WorkloadGenerator {
    rng: StdRng,
    config: WorkloadConfig,
    /// Pool of keys for reuse (promotes duplicates and removals of live keys).
    key_pool: Vec<Vec<u8>>,
    next_value: u32,
}

impl WorkloadGenerator {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, WorkloadConfig::default())
    }

    #[must_use]
    pub fn with_config(seed: u64, config: WorkloadConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let key_pool = (0..config.key_pool_size.max(1))
            .map(|_| random_key(&mut rng, config.max_key_length, config.narrow_alphabet))
            .collect();

        Self {
            rng,
            config,
            key_pool,
            next_value: 0,
        }
    }

    /// Generate the next operation.
    pub fn next_operation(&mut self) -> Operation {
        let key = self.random_pool_key();
        let roll = self.rng.random::<f64>();

        if roll < self.config.put_rate {
            self.next_value = self.next_value.wrapping_add(1);
            Operation::Put {
                key,
                value: self.next_value,
            }
        } else if roll < self.config.put_rate + self.config.remove_rate {
            Operation::Remove { key }
        } else {
            match self.rng.random_range(0..3) {
                0 => Operation::Get { key },
                1 => Operation::Next { key },
                _ => Operation::Previous { key },
            }
        }
    }

    fn random_pool_key(&mut self) -> Vec<u8> {
        let index = self.rng.random_range(0..self.key_pool.len());
        self.key_pool[index].clone()
    }
}

impl Iterator for WorkloadGenerator {
    type Item = Operation;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_operation())
    }
}

/// A non-empty random key. Zero bytes are allowed.
fn random_key(rng: &mut StdRng, max_length: usize, narrow_alphabet: bool) -> Vec<u8> {
    let length = rng.random_range(1..=max_length.max(1));
    (0..length)
        .map(|_| {
            if narrow_alphabet {
                rng.random_range(0..4u8)
            } else {
                rng.random::<u8>()
            }
        })
        .collect()
}

/// `length` distinct values from `0..range` in random order.
///
/// Returns fewer than `length` values if the range is too small.
pub fn random_unique_array<R: Rng + ?Sized>(rng: &mut R, length: usize, range: i32) -> Vec<i32> {
    let mut values: Vec<i32> = (0..range.max(0)).collect();
    values.shuffle(rng);
    values.truncate(length);
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_deterministic() {
        let first: Vec<Operation> = WorkloadGenerator::new(12345).take(100).collect();
        let second: Vec<Operation> = WorkloadGenerator::new(12345).take(100).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_generator_mix() {
        let operations: Vec<Operation> = WorkloadGenerator::new(1).take(1000).collect();

        let puts = operations
            .iter()
            .filter(|op| matches!(op, Operation::Put { .. }))
            .count();
        let removes = operations
            .iter()
            .filter(|op| matches!(op, Operation::Remove { .. }))
            .count();
        assert!(puts > 300 && puts < 700, "puts: {puts}");
        assert!(removes > 100 && removes < 500, "removes: {removes}");
        assert!(operations.iter().all(|op| !op.key().is_empty()));
    }

    #[test]
    fn test_random_unique_array() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut values = random_unique_array(&mut rng, 50, 100);
        assert_eq!(values.len(), 50);

        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), 50);
        assert!(values.iter().all(|v| (0..100).contains(v)));

        assert_eq!(random_unique_array(&mut rng, 10, 4).len(), 4);
        assert!(random_unique_array(&mut rng, 10, -1).is_empty());
    }
}
