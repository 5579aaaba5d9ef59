//! Benchmark configuration module.
//!
//! This module provides configuration loading for the `keyspace` binary from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `KEYSPACE_SEED`: Seed for the workload generator (default: `1`)
//! - `KEYSPACE_ENTRY_COUNT`: Number of entries per phase (default: `10000`)
//! - `KEYSPACE_VALUE_RANGE`: Values are drawn from `0..range` (default: `100000`)
//! - `KEYSPACE_NODE_CAPACITY`: B+tree node capacity (default: `8`)
//! - `KEYSPACE_WILDCARD_MIN`: Minimum normalized wildcard length (default: `2`)
//! - `KEYSPACE_WILDCARD_MAX`: Maximum normalized wildcard length (default: `32`)
//!
//! # Invariants
//!
//! - `node_capacity` is at least [`MIN_NODE_CAPACITY`]
//! - `value_range` is positive
//! - `wildcard_min <= wildcard_max` and `wildcard_max` is positive

use std::str::FromStr;

use serde::Serialize;

use crate::bptree::{DEFAULT_NODE_CAPACITY, MIN_NODE_CAPACITY};

/// Benchmark configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchConfig {
    /// Seed for every random choice the benchmark makes.
    pub seed: u64,
    /// Number of entries inserted in each phase.
    pub entry_count: usize,
    /// Exclusive upper bound for generated values.
    pub value_range: i32,
    /// Maximum keys per B+tree node.
    pub node_capacity: usize,
    /// Minimum normalized wildcard string length.
    pub wildcard_min: usize,
    /// Maximum normalized wildcard string length.
    pub wildcard_max: usize,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            seed: Self::DEFAULT_SEED,
            entry_count: Self::DEFAULT_ENTRY_COUNT,
            value_range: Self::DEFAULT_VALUE_RANGE,
            node_capacity: DEFAULT_NODE_CAPACITY,
            wildcard_min: Self::DEFAULT_WILDCARD_MIN,
            wildcard_max: Self::DEFAULT_WILDCARD_MAX,
        }
    }
}

impl BenchConfig {
    pub const DEFAULT_SEED: u64 = 1;
    pub const DEFAULT_ENTRY_COUNT: usize = 10_000;
    pub const DEFAULT_VALUE_RANGE: i32 = 100_000;
    pub const DEFAULT_WILDCARD_MIN: usize = 2;
    pub const DEFAULT_WILDCARD_MAX: usize = 32;

    /// Load configuration from environment variables.
    ///
    /// Unset variables take their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            seed: load(&lookup, "KEYSPACE_SEED", defaults.seed)?,
            entry_count: load(&lookup, "KEYSPACE_ENTRY_COUNT", defaults.entry_count)?,
            value_range: load(&lookup, "KEYSPACE_VALUE_RANGE", defaults.value_range)?,
            node_capacity: load(&lookup, "KEYSPACE_NODE_CAPACITY", defaults.node_capacity)?,
            wildcard_min: load(&lookup, "KEYSPACE_WILDCARD_MIN", defaults.wildcard_min)?,
            wildcard_max: load(&lookup, "KEYSPACE_WILDCARD_MAX", defaults.wildcard_max)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.node_capacity < MIN_NODE_CAPACITY {
            return Err(invalid(
                "KEYSPACE_NODE_CAPACITY",
                format!("must be at least {MIN_NODE_CAPACITY}"),
            ));
        }
        if self.value_range <= 0 {
            return Err(invalid("KEYSPACE_VALUE_RANGE", "must be positive".to_string()));
        }
        if self.wildcard_max == 0 {
            return Err(invalid("KEYSPACE_WILDCARD_MAX", "must be positive".to_string()));
        }
        if self.wildcard_min > self.wildcard_max {
            return Err(invalid(
                "KEYSPACE_WILDCARD_MIN",
                format!("must not exceed KEYSPACE_WILDCARD_MAX ({})", self.wildcard_max),
            ));
        }
        Ok(())
    }
}

/// Parse `name` if set, otherwise return `default`.
fn load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| invalid(name, format!("'{value}' is not a valid number"))),
        None => Ok(default),
    }
}

fn invalid(name: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = BenchConfig::from_lookup(lookup_from(&[])).expect("load config");
        assert_eq!(config, BenchConfig::default());
        assert_eq!(config.node_capacity, 8);
        assert_eq!(config.entry_count, 10_000);
    }

    #[test]
    fn test_overrides() {
        let config = BenchConfig::from_lookup(lookup_from(&[
            ("KEYSPACE_SEED", "99"),
            ("KEYSPACE_ENTRY_COUNT", " 500 "),
            ("KEYSPACE_NODE_CAPACITY", "16"),
        ]))
        .expect("load config");

        assert_eq!(config.seed, 99);
        assert_eq!(config.entry_count, 500);
        assert_eq!(config.node_capacity, 16);
        assert_eq!(config.wildcard_max, BenchConfig::DEFAULT_WILDCARD_MAX);
    }

    #[test]
    fn test_unparsable_value() {
        let error = BenchConfig::from_lookup(lookup_from(&[("KEYSPACE_SEED", "abc")]))
            .expect_err("should fail");
        assert_eq!(
            error.to_string(),
            "invalid value for KEYSPACE_SEED: 'abc' is not a valid number"
        );
    }

    #[test]
    fn test_inconsistent_values() {
        let small_capacity = BenchConfig::from_lookup(lookup_from(&[("KEYSPACE_NODE_CAPACITY", "2")]));
        assert!(matches!(
            small_capacity,
            Err(ConfigError::InvalidValue { ref name, .. }) if name == "KEYSPACE_NODE_CAPACITY"
        ));

        let inverted = BenchConfig::from_lookup(lookup_from(&[
            ("KEYSPACE_WILDCARD_MIN", "10"),
            ("KEYSPACE_WILDCARD_MAX", "4"),
        ]));
        assert!(inverted.is_err());

        let empty_range = BenchConfig::from_lookup(lookup_from(&[("KEYSPACE_VALUE_RANGE", "0")]));
        assert!(empty_range.is_err());
    }

    #[test]
    fn test_config_error_display_invalid() {
        let error = ConfigError::InvalidValue {
            name: "TEST_VAR".to_string(),
            message: "bad value".to_string(),
        };
        assert_eq!(error.to_string(), "invalid value for TEST_VAR: bad value");
    }
}
