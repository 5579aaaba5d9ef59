//! Numeric range index.
//!
//! Maps `i32` values to sets of ids. Values are stored as 4-byte big-endian
//! keys in a B+tree with numeric ordering, so a range query is a single walk
//! along the leaf chain.

use std::fmt;

use crate::bptree::{BPlusTree, IntegerKeys, TreeError, decode_integer_key, encode_integer_key};
use crate::integer::IntegerArray;

/// A range query over indexed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeQuery {
    /// Values strictly greater than the bound.
    GreaterThan(i32),
    /// Values strictly less than the bound.
    LessThan(i32),
    /// Values within `[min, max]`, both ends inclusive.
    Between(i32, i32),
}

impl RangeQuery {
    /// Whether `value` satisfies the query.
    #[must_use]
    pub const fn contains(self, value: i32) -> bool {
        match self {
            Self::GreaterThan(bound) => value > bound,
            Self::LessThan(bound) => value < bound,
            Self::Between(min, max) => min <= value && value <= max,
        }
    }
}

impl fmt::Display for RangeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GreaterThan(_) => write!(f, "Greater Than"),
            Self::LessThan(_) => write!(f, "Less Than"),
            Self::Between(..) => write!(f, "Between"),
        }
    }
}

/// A named index from values to id sets.
#[derive(Debug)]
pub struct RangeIndex {
    name: String,
    index: BPlusTree<IntegerArray, IntegerKeys>,
    id_count: usize,
}

impl RangeIndex {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: BPlusTree::with_comparator(IntegerKeys),
            id_count: 0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Number of distinct values.
    #[must_use]
    pub const fn value_count(&self) -> usize {
        self.index.leaf_count()
    }

    /// Number of `(value, id)` pairs.
    #[must_use]
    pub const fn id_count(&self) -> usize {
        self.id_count
    }

    /// Record `id` under `value`. Adding an existing pair is a no-op.
    pub fn put(&mut self, value: i32, id: i32) -> Result<(), RangeIndexError> {
        let key = encode_integer_key(value);
        if let Some(bucket) = self.index.get_mut(&key) {
            if bucket.put(id).is_ok() {
                self.id_count += 1;
            }
            return Ok(());
        }

        self.index
            .put(&key, IntegerArray::from_sorted_unique(vec![id]))?;
        self.id_count += 1;
        Ok(())
    }

    /// Remove `id` from `value`, dropping the value once no ids remain.
    pub fn remove(&mut self, value: i32, id: i32) -> Result<(), RangeIndexError> {
        let key = encode_integer_key(value);
        let bucket = self
            .index
            .get_mut(&key)
            .ok_or(RangeIndexError::NotFound { value, id })?;
        bucket
            .remove(id)
            .map_err(|_| RangeIndexError::NotFound { value, id })?;
        self.id_count -= 1;

        if bucket.is_empty() {
            self.index.remove(&key)?;
            tracing::debug!(index = %self.name, value, "pruned empty bucket");
        }
        Ok(())
    }

    /// Ids recorded under exactly `value`.
    #[must_use]
    pub fn get(&self, value: i32) -> Option<&[i32]> {
        self.index
            .get(&encode_integer_key(value))
            .map(IntegerArray::as_slice)
    }

    /// Every id whose value satisfies `query`, ascending and without repeats.
    pub fn search(&self, query: RangeQuery) -> Result<Vec<i32>, RangeIndexError> {
        let entries = match query {
            RangeQuery::GreaterThan(bound) => self.index.iter_after(&encode_integer_key(bound)),
            RangeQuery::LessThan(_) => self.index.iter(),
            RangeQuery::Between(min, max) => {
                if min > max {
                    tracing::warn!(index = %self.name, min, max, "invalid range bounds");
                    return Err(RangeIndexError::InvalidBounds { min, max });
                }
                self.index.iter_from(&encode_integer_key(min))
            }
        };

        let ids: IntegerArray = entries
            .map_while(|(key, bucket)| {
                let value = decode_integer_key(key)?;
                query.contains(value).then_some(bucket)
            })
            .flatten()
            .copied()
            .collect();

        tracing::trace!(index = %self.name, %query, matches = ids.len(), "range search");
        Ok(ids.into_vec())
    }
}

/// Errors that can occur when using a range index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeIndexError {
    /// `min` is greater than `max`.
    InvalidBounds { min: i32, max: i32 },
    /// The id is not recorded under the value.
    NotFound { value: i32, id: i32 },
    /// Tree error.
    Tree(TreeError),
}

impl fmt::Display for RangeIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBounds { min, max } => {
                write!(f, "invalid range: min {min} is greater than max {max}")
            }
            Self::NotFound { value, id } => write!(f, "id {id} not found under value {value}"),
            Self::Tree(e) => write!(f, "tree error: {e}"),
        }
    }
}

impl std::error::Error for RangeIndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tree(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TreeError> for RangeIndexError {
    fn from(e: TreeError) -> Self {
        Self::Tree(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::seeded_rng;
    use rand::Rng;

    fn accuracy_index() -> RangeIndex {
        let mut index = RangeIndex::new("accuracy");
        for (value, id) in [(5, 105), (10, 110), (15, 115), (15, 215), (20, 120), (25, 125)] {
            index.put(value, id).expect("put");
        }
        index
    }

    #[test]
    fn test_greater_than_is_strict() {
        let index = accuracy_index();
        assert_eq!(
            index.search(RangeQuery::GreaterThan(15)).expect("search"),
            vec![120, 125]
        );
    }

    #[test]
    fn test_less_than_is_strict() {
        let index = accuracy_index();
        assert_eq!(
            index.search(RangeQuery::LessThan(15)).expect("search"),
            vec![105, 110]
        );
    }

    #[test]
    fn test_between_is_inclusive() {
        let index = accuracy_index();
        assert_eq!(
            index.search(RangeQuery::Between(10, 20)).expect("search"),
            vec![110, 115, 120, 215]
        );
        assert_eq!(
            index.search(RangeQuery::Between(15, 15)).expect("search"),
            vec![115, 215]
        );
        assert_eq!(
            index.search(RangeQuery::Between(11, 14)).expect("search"),
            Vec::<i32>::new()
        );
    }

    #[test]
    fn test_between_rejects_inverted_bounds() {
        let index = accuracy_index();
        assert_eq!(
            index.search(RangeQuery::Between(20, 10)),
            Err(RangeIndexError::InvalidBounds { min: 20, max: 10 })
        );
    }

    #[test]
    fn test_negative_values_sort_numerically() {
        let mut index = RangeIndex::new("signed");
        for value in [-50, -1, 0, 1, 50] {
            index.put(value, value + 1000).expect("put");
        }

        assert_eq!(
            index.search(RangeQuery::LessThan(0)).expect("search"),
            vec![950, 999]
        );
        assert_eq!(
            index.search(RangeQuery::GreaterThan(-1)).expect("search"),
            vec![1000, 1001, 1050]
        );
        assert!(index
            .search(RangeQuery::GreaterThan(i32::MAX))
            .expect("search")
            .is_empty());
    }

    #[test]
    fn test_put_is_idempotent() {
        let mut index = accuracy_index();
        index.put(15, 115).expect("repeat put");

        assert_eq!(index.value_count(), 5);
        assert_eq!(index.id_count(), 6);
        assert_eq!(index.get(15), Some(&[115, 215][..]));
    }

    #[test]
    fn test_remove_prunes_empty_bucket() {
        let mut index = accuracy_index();

        index.remove(15, 115).expect("remove");
        assert_eq!(index.get(15), Some(&[215][..]));
        assert_eq!(index.value_count(), 5);

        index.remove(15, 215).expect("remove");
        assert_eq!(index.get(15), None);
        assert_eq!(index.value_count(), 4);
        assert_eq!(index.id_count(), 4);
    }

    #[test]
    fn test_remove_missing_leaves_index_unchanged() {
        let mut index = accuracy_index();

        assert_eq!(
            index.remove(15, 999),
            Err(RangeIndexError::NotFound { value: 15, id: 999 })
        );
        assert_eq!(
            index.remove(16, 115),
            Err(RangeIndexError::NotFound { value: 16, id: 115 })
        );
        assert_eq!(index.value_count(), 5);
        assert_eq!(index.id_count(), 6);
    }

    #[test]
    fn test_name() {
        let mut index = RangeIndex::new("first");
        assert_eq!(index.name(), "first");
        index.set_name("second");
        assert_eq!(index.name(), "second");
    }

    #[test]
    fn test_query_display() {
        assert_eq!(RangeQuery::GreaterThan(1).to_string(), "Greater Than");
        assert_eq!(RangeQuery::LessThan(1).to_string(), "Less Than");
        assert_eq!(RangeQuery::Between(1, 2).to_string(), "Between");
    }

    #[test]
    fn test_random_queries_match_scan() {
        let mut rng = seeded_rng(42);
        let mut index = RangeIndex::new("random");
        let mut pairs = Vec::new();
        for id in 0..500 {
            let value = rng.random_range(-200..200);
            index.put(value, id).expect("put");
            pairs.push((value, id));
        }

        for _ in 0..50 {
            let a = rng.random_range(-250..250);
            let b = rng.random_range(a..=250);
            for query in [
                RangeQuery::GreaterThan(a),
                RangeQuery::LessThan(a),
                RangeQuery::Between(a, b),
            ] {
                let mut expected: Vec<i32> = pairs
                    .iter()
                    .filter(|(value, _)| query.contains(*value))
                    .map(|(_, id)| *id)
                    .collect();
                expected.sort_unstable();
                assert_eq!(index.search(query).expect("search"), expected, "{query} {a} {b}");
            }
        }
    }
}
