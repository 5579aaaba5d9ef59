//! Sorted, duplicate-free integer arrays.
//!
//! Used as posting lists: the range and wildcard indexes store one per key,
//! and the intersect engine produces one as its result.

use std::fmt;
use std::ops::Deref;

/// A sorted set of `i32` values backed by a contiguous buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IntegerArray {
    values: Vec<i32>,
}

impl IntegerArray {
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Wrap a buffer the caller guarantees is strictly ascending.
    pub(crate) fn from_sorted_unique(values: Vec<i32>) -> Self {
        debug_assert!(values.windows(2).all(|w| w[0] < w[1]));
        Self { values }
    }

    /// Insert `value` in order, returning its position.
    pub fn put(&mut self, value: i32) -> Result<usize, IntegerArrayError> {
        match self.values.binary_search(&value) {
            Ok(_) => Err(IntegerArrayError::Duplicate(value)),
            Err(position) => {
                self.values.insert(position, value);
                Ok(position)
            }
        }
    }

    /// Insert every value of `values`, skipping ones already present.
    ///
    /// Returns how many were added.
    pub fn put_all(&mut self, values: &[i32]) -> usize {
        let before = self.values.len();
        self.values.extend_from_slice(values);
        self.values.sort_unstable();
        self.values.dedup();
        self.values.len() - before
    }

    pub fn remove(&mut self, value: i32) -> Result<(), IntegerArrayError> {
        let position = self
            .values
            .binary_search(&value)
            .map_err(|_| IntegerArrayError::NotFound(value))?;
        self.values.remove(position);
        Ok(())
    }

    /// Position of `value`, if present.
    #[must_use]
    pub fn contains(&self, value: i32) -> Option<usize> {
        self.values.binary_search(&value).ok()
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<i32> {
        self.values.get(position).copied()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[i32] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, i32> {
        self.values.iter()
    }

    /// Check that values are strictly ascending.
    #[must_use]
    pub fn is_sane(&self) -> bool {
        self.values.windows(2).all(|w| w[0] < w[1])
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<i32> {
        self.values
    }
}

impl Deref for IntegerArray {
    type Target = [i32];

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl<'a> IntoIterator for &'a IntegerArray {
    type Item = &'a i32;
    type IntoIter = std::slice::Iter<'a, i32>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl FromIterator<i32> for IntegerArray {
    fn from_iter<T: IntoIterator<Item = i32>>(iter: T) -> Self {
        let mut values: Vec<i32> = iter.into_iter().collect();
        values.sort_unstable();
        values.dedup();
        Self { values }
    }
}

impl From<IntegerArray> for Vec<i32> {
    fn from(array: IntegerArray) -> Self {
        array.values
    }
}

/// Errors that can occur when modifying an integer array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerArrayError {
    /// The value is already present.
    Duplicate(i32),
    /// The value is not present.
    NotFound(i32),
}

impl fmt::Display for IntegerArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(value) => write!(f, "value {value} already present"),
            Self::NotFound(value) => write!(f, "value {value} not found"),
        }
    }
}

impl std::error::Error for IntegerArrayError {}
