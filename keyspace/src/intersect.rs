//! Boolean set operations over sorted integer arrays.
//!
//! An [`Intersect`] holds an ordered list of entries. Each entry is either
//! borrowed from the caller (never mutated by the engine) or owned by it.
//! Once every entry is sorted the engine is ready and can compute AND, OR
//! and NOT across all entries. The result is kept in the engine until the
//! next operation.

use std::borrow::Cow;
use std::fmt;

use crate::integer::IntegerArray;

/// Lifecycle of an [`Intersect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectState {
    /// Entries may be unsorted.
    Init,
    /// Every entry is sorted.
    Ready,
    /// A result has been computed.
    Done,
}

impl fmt::Display for IntersectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Ready => write!(f, "ready"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Boolean operation across all entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    /// Values present in every entry.
    And,
    /// Values present in any entry.
    Or,
    /// Values present in some entry but missing from another.
    Not,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Not => write!(f, "not"),
        }
    }
}

/// How membership in another entry is tested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Walk both arrays with a cursor each.
    #[default]
    Linear,
    /// Binary search the other array, never probing below the last match.
    Binary,
}

/// Input to [`binary_search`].
#[derive(Debug)]
pub enum SearchMode<'a> {
    /// The array is already ascending.
    Sorted(&'a [i32]),
    /// Sort the caller's buffer in place, then search it.
    Manipulate(&'a mut [i32]),
    /// Search an unsorted array without touching it.
    Transparent(&'a [i32]),
}

/// Find `target`, returning its index in the searched array.
///
/// For [`SearchMode::Manipulate`] the index refers to the buffer after it has
/// been sorted. For [`SearchMode::Transparent`] it refers to the caller's
/// original ordering.
#[must_use]
pub fn binary_search(mode: SearchMode<'_>, target: i32) -> Option<usize> {
    match mode {
        SearchMode::Sorted(values) => values.binary_search(&target).ok(),
        SearchMode::Manipulate(values) => {
            values.sort_unstable();
            values.binary_search(&target).ok()
        }
        SearchMode::Transparent(values) => {
            let mut order: Vec<usize> = (0..values.len()).collect();
            order.sort_unstable_by_key(|&i| values[i]);
            order
                .binary_search_by(|&i| values[i].cmp(&target))
                .ok()
                .map(|position| order[position])
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<'a> {
    values: Cow<'a, [i32]>,
    is_sorted: bool,
}

/// Integer set algebra engine.
#[derive(Debug, Clone)]
pub struct Intersect<'a> {
    entries: Vec<Entry<'a>>,
    state: IntersectState,
    result: IntegerArray,
}

impl Default for Intersect<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Intersect<'a> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            state: IntersectState::Init,
            result: IntegerArray::new(),
        }
    }

    /// Append a copy of `values` as a new entry, returning its index.
    pub fn put_array(&mut self, values: &[i32]) -> Result<usize, IntersectError> {
        self.push_entry(Cow::Owned(values.to_vec()))
    }

    /// Append `values` by reference.
    ///
    /// The engine never writes to a borrowed entry. Sorting an unsorted one
    /// makes a private copy first.
    pub fn put_borrowed(&mut self, values: &'a [i32]) -> Result<usize, IntersectError> {
        self.push_entry(Cow::Borrowed(values))
    }

    /// Append `values` as a new entry, taking ownership.
    pub fn put_owned(&mut self, values: Vec<i32>) -> Result<usize, IntersectError> {
        self.push_entry(Cow::Owned(values))
    }

    fn push_entry(&mut self, values: Cow<'a, [i32]>) -> Result<usize, IntersectError> {
        if values.is_empty() {
            tracing::warn!("rejecting empty intersect entry");
            return Err(IntersectError::EmptyArray);
        }
        self.entries.push(Entry {
            values,
            is_sorted: false,
        });
        self.state = IntersectState::Init;
        Ok(self.entries.len() - 1)
    }

    /// Append one value to `entry`, creating empty entries up to it as needed.
    pub fn put(&mut self, entry: usize, value: i32) {
        if entry >= self.entries.len() {
            self.entries.resize_with(entry + 1, || Entry {
                values: Cow::Owned(Vec::new()),
                is_sorted: false,
            });
        }
        let target = &mut self.entries[entry];
        target.values.to_mut().push(value);
        target.is_sorted = false;
        self.state = IntersectState::Init;
    }

    /// Value at `position` within `entry`.
    pub fn get(&self, entry: usize, position: usize) -> Result<Option<i32>, IntersectError> {
        Ok(self.entry(entry)?.values.get(position).copied())
    }

    pub fn entry_len(&self, entry: usize) -> Result<usize, IntersectError> {
        Ok(self.entry(entry)?.values.len())
    }

    pub fn get_array(&self, entry: usize) -> Result<&[i32], IntersectError> {
        Ok(self.entry(entry)?.values.as_ref())
    }

    /// Whether `entry` still refers to the caller's buffer.
    pub fn is_borrowed(&self, entry: usize) -> Result<bool, IntersectError> {
        Ok(matches!(self.entry(entry)?.values, Cow::Borrowed(_)))
    }

    #[must_use]
    pub const fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn state(&self) -> IntersectState {
        self.state
    }

    /// Whether there is at least one entry and every entry is sorted.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|entry| entry.is_sorted)
    }

    /// Sort every entry that is not yet sorted.
    pub fn sort(&mut self) {
        for entry in &mut self.entries {
            if !entry.is_sorted && !entry.values.is_sorted() {
                entry.values.to_mut().sort_unstable();
            }
            entry.is_sorted = true;
        }
        self.refresh_state();
    }

    /// Declare every entry sorted without checking.
    ///
    /// Results are unspecified if an entry is in fact out of order.
    pub fn mark_sorted(&mut self) {
        for entry in &mut self.entries {
            entry.is_sorted = true;
        }
        self.refresh_state();
    }

    fn refresh_state(&mut self) {
        if self.is_ready() {
            self.state = IntersectState::Ready;
        }
    }

    /// Run `op` across all entries.
    pub fn exec(
        &mut self,
        op: BooleanOp,
        strategy: SearchStrategy,
    ) -> Result<&IntegerArray, IntersectError> {
        match op {
            BooleanOp::And => self.exec_and(strategy),
            BooleanOp::Or => self.exec_or(),
            BooleanOp::Not => self.exec_not(strategy),
        }
    }

    /// Values present in every entry.
    pub fn exec_and(&mut self, strategy: SearchStrategy) -> Result<&IntegerArray, IntersectError> {
        self.ensure_ready(BooleanOp::And)?;
        let values = self.intersection(strategy);
        Ok(self.finish(values))
    }

    /// Values present in any entry.
    pub fn exec_or(&mut self) -> Result<&IntegerArray, IntersectError> {
        self.ensure_ready(BooleanOp::Or)?;
        let values = self.union();
        Ok(self.finish(values))
    }

    /// Values present in at least one entry and missing from at least one
    /// other. With a single entry the result is empty.
    pub fn exec_not(&mut self, strategy: SearchStrategy) -> Result<&IntegerArray, IntersectError> {
        self.ensure_ready(BooleanOp::Not)?;
        let common = self.intersection(strategy);
        let values = match strategy {
            SearchStrategy::Linear => difference_linear(&self.union(), &common),
            SearchStrategy::Binary => difference_binary(&self.union(), &common),
        };
        Ok(self.finish(values))
    }

    /// Result of the last operation.
    #[must_use]
    pub const fn result(&self) -> &IntegerArray {
        &self.result
    }

    #[must_use]
    pub fn result_copy(&self) -> Vec<i32> {
        self.result.as_slice().to_vec()
    }

    fn entry(&self, entry: usize) -> Result<&Entry<'a>, IntersectError> {
        self.entries
            .get(entry)
            .ok_or(IntersectError::UnknownEntry(entry))
    }

    fn ensure_ready(&self, op: BooleanOp) -> Result<(), IntersectError> {
        if self.is_ready() {
            Ok(())
        } else {
            tracing::warn!(%op, state = %self.state, "intersect entries not sorted");
            Err(IntersectError::NotReady)
        }
    }

    fn finish(&mut self, values: Vec<i32>) -> &IntegerArray {
        self.result = IntegerArray::from_sorted_unique(values);
        self.state = IntersectState::Done;
        &self.result
    }

    fn intersection(&self, strategy: SearchStrategy) -> Vec<i32> {
        // Drive from the shortest entry; the result can be no longer.
        let Some(shortest) = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| entry.values.len())
            .map(|(i, _)| i)
        else {
            return Vec::new();
        };

        let mut values = dedup_sorted(&self.entries[shortest].values);
        for (i, entry) in self.entries.iter().enumerate() {
            if i == shortest || values.is_empty() {
                continue;
            }
            values = match strategy {
                SearchStrategy::Linear => intersect_linear(&values, &entry.values),
                SearchStrategy::Binary => intersect_binary(&values, &entry.values),
            };
        }
        values
    }

    /// K-way merge of all entries.
    fn union(&self) -> Vec<i32> {
        let total = self.entries.iter().map(|entry| entry.values.len()).sum();
        let mut values = Vec::with_capacity(total);
        let mut cursors = vec![0usize; self.entries.len()];

        loop {
            let low = self
                .entries
                .iter()
                .zip(&cursors)
                .filter_map(|(entry, &cursor)| entry.values.get(cursor))
                .min()
                .copied();
            let Some(low) = low else {
                break;
            };

            values.push(low);
            for (entry, cursor) in self.entries.iter().zip(cursors.iter_mut()) {
                while entry.values.get(*cursor) == Some(&low) {
                    *cursor += 1;
                }
            }
        }
        values
    }
}

fn dedup_sorted(values: &[i32]) -> Vec<i32> {
    let mut unique = values.to_vec();
    unique.dedup();
    unique
}

fn push_unique(values: &mut Vec<i32>, value: i32) {
    if values.last() != Some(&value) {
        values.push(value);
    }
}

fn intersect_linear(left: &[i32], right: &[i32]) -> Vec<i32> {
    let mut values = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);
    while let (Some(&a), Some(&b)) = (left.get(i), right.get(j)) {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                push_unique(&mut values, a);
                i += 1;
                j += 1;
            }
        }
    }
    values
}

fn intersect_binary(candidates: &[i32], other: &[i32]) -> Vec<i32> {
    let mut values = Vec::with_capacity(candidates.len());
    let mut threshold = 0;
    for &candidate in candidates {
        let Some(remaining) = other.get(threshold..) else {
            break;
        };
        match remaining.binary_search(&candidate) {
            Ok(position) => {
                push_unique(&mut values, candidate);
                threshold += position + 1;
            }
            Err(position) => threshold += position,
        }
    }
    values
}

fn difference_linear(all: &[i32], excluded: &[i32]) -> Vec<i32> {
    let mut values = Vec::with_capacity(all.len());
    let mut j = 0;
    for &value in all {
        while excluded.get(j).is_some_and(|&e| e < value) {
            j += 1;
        }
        if excluded.get(j) != Some(&value) {
            values.push(value);
        }
    }
    values
}

fn difference_binary(all: &[i32], excluded: &[i32]) -> Vec<i32> {
    all.iter()
        .copied()
        .filter(|value| excluded.binary_search(value).is_err())
        .collect()
}

/// Errors that can occur when using the intersect engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectError {
    /// Entries must hold at least one value.
    EmptyArray,
    /// An operation was requested before every entry was sorted.
    NotReady,
    /// No entry exists at this index.
    UnknownEntry(usize),
}

impl fmt::Display for IntersectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyArray => write!(f, "entry must not be empty"),
            Self::NotReady => write!(f, "entries are not sorted"),
            Self::UnknownEntry(entry) => write!(f, "no entry at index {entry}"),
        }
    }
}

impl std::error::Error for IntersectError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{random_unique_array, seeded_rng};

    const ARRAY_ONE: [i32; 10] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
    const ARRAY_TWO: [i32; 5] = [1, 3, 5, 7, 9];

    fn borrowed_pair() -> Intersect<'static> {
        let mut intersect = Intersect::new();
        intersect.put_borrowed(&ARRAY_ONE).expect("put one");
        intersect.put_borrowed(&ARRAY_TWO).expect("put two");
        intersect.sort();
        intersect
    }

    #[test]
    fn test_and_or_not_triangle() {
        for strategy in [SearchStrategy::Linear, SearchStrategy::Binary] {
            let mut intersect = borrowed_pair();
            assert_eq!(intersect.state(), IntersectState::Ready);

            let and = intersect.exec_and(strategy).expect("and");
            assert_eq!(and.as_slice(), &[1, 3, 5, 7, 9]);

            let or = intersect.exec_or().expect("or");
            assert_eq!(or.as_slice(), &ARRAY_ONE);

            let not = intersect.exec_not(strategy).expect("not");
            assert_eq!(not.as_slice(), &[0, 2, 4, 6, 8]);
            assert_eq!(intersect.state(), IntersectState::Done);
        }
    }

    #[test]
    fn test_borrowed_entries_untouched() {
        let values = [9, 3, 5];
        let sorted = [1, 2, 3];
        let mut intersect = Intersect::new();
        intersect.put_borrowed(&values).expect("put");
        intersect.put_borrowed(&sorted).expect("put");
        intersect.sort();

        // Unsorted borrowed entries get a private copy; sorted ones stay borrowed
        assert_eq!(intersect.is_borrowed(0), Ok(false));
        assert_eq!(intersect.is_borrowed(1), Ok(true));
        assert_eq!(intersect.get_array(0), Ok(&[3, 5, 9][..]));
        assert_eq!(values, [9, 3, 5]);
    }

    #[test]
    fn test_exec_requires_ready() {
        let mut intersect = Intersect::new();
        assert_eq!(intersect.exec_or().err(), Some(IntersectError::NotReady));

        intersect.put_array(&[3, 1, 2]).expect("put");
        assert!(!intersect.is_ready());
        assert_eq!(
            intersect.exec_and(SearchStrategy::Linear).err(),
            Some(IntersectError::NotReady)
        );

        intersect.sort();
        assert!(intersect.is_ready());
        assert_eq!(intersect.result_copy(), Vec::<i32>::new());
        intersect
            .exec(BooleanOp::And, SearchStrategy::Linear)
            .expect("and");
        assert_eq!(intersect.result_copy(), vec![1, 2, 3]);
    }

    #[test]
    fn test_new_entry_resets_readiness() {
        let mut intersect = borrowed_pair();
        intersect.put_array(&[4, 2]).expect("put");
        assert_eq!(intersect.state(), IntersectState::Init);
        assert!(!intersect.is_ready());

        intersect.mark_sorted();
        assert_eq!(intersect.state(), IntersectState::Ready);
    }

    #[test]
    fn test_empty_array_rejected() {
        let mut intersect = Intersect::new();
        assert_eq!(intersect.put_array(&[]), Err(IntersectError::EmptyArray));
        assert_eq!(intersect.put_owned(Vec::new()), Err(IntersectError::EmptyArray));
        assert_eq!(intersect.entry_count(), 0);
    }

    #[test]
    fn test_entry_accessors() {
        let mut intersect = Intersect::new();
        assert_eq!(intersect.put_array(&[10, 20]), Ok(0));
        assert_eq!(intersect.put_owned(vec![30]), Ok(1));

        assert_eq!(intersect.entry_len(0), Ok(2));
        assert_eq!(intersect.get(0, 1), Ok(Some(20)));
        assert_eq!(intersect.get(0, 2), Ok(None));
        assert_eq!(intersect.get(5, 0), Err(IntersectError::UnknownEntry(5)));
        assert_eq!(intersect.entry_len(2), Err(IntersectError::UnknownEntry(2)));
    }

    #[test]
    fn test_put_value_creates_entries() {
        let mut intersect = Intersect::new();
        intersect.put(2, 7);
        intersect.put(2, 3);

        assert_eq!(intersect.entry_count(), 3);
        assert_eq!(intersect.entry_len(0), Ok(0));
        assert_eq!(intersect.get_array(2), Ok(&[7, 3][..]));

        intersect.put(0, 3);
        intersect.put(1, 3);
        intersect.sort();
        let and = intersect.exec_and(SearchStrategy::Binary).expect("and");
        assert_eq!(and.as_slice(), &[3]);
    }

    #[test]
    fn test_single_entry() {
        let mut intersect = Intersect::new();
        intersect.put_array(&[5, 1, 5, 3]).expect("put");
        intersect.sort();

        assert_eq!(intersect.exec_and(SearchStrategy::Linear).expect("and").as_slice(), &[1, 3, 5]);
        assert_eq!(intersect.exec_or().expect("or").as_slice(), &[1, 3, 5]);
        assert!(intersect.exec_not(SearchStrategy::Linear).expect("not").is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let mut intersect = Intersect::new();
        intersect.put_array(&[1, 1, 2, 4, 4]).expect("put");
        intersect.put_array(&[1, 4, 4, 4, 6]).expect("put");
        intersect.sort();

        for strategy in [SearchStrategy::Linear, SearchStrategy::Binary] {
            assert_eq!(intersect.exec_and(strategy).expect("and").as_slice(), &[1, 4]);
            assert_eq!(intersect.exec_not(strategy).expect("not").as_slice(), &[2, 6]);
        }
        assert_eq!(intersect.exec_or().expect("or").as_slice(), &[1, 2, 4, 6]);
    }

    #[test]
    fn test_strategies_agree_on_random_input() {
        let mut rng = seeded_rng(7);
        for _ in 0..20 {
            let mut intersect = Intersect::new();
            for _ in 0..3 {
                intersect
                    .put_owned(random_unique_array(&mut rng, 64, 128))
                    .expect("put");
            }
            intersect.sort();

            let linear = intersect.exec_and(SearchStrategy::Linear).expect("and").clone();
            let binary = intersect.exec_and(SearchStrategy::Binary).expect("and").clone();
            assert_eq!(linear, binary);
            assert!(linear.is_sane());

            let or = intersect.exec_or().expect("or").clone();
            for value in &linear {
                assert!(or.contains(*value).is_some());
            }
        }
    }

    #[test]
    fn test_binary_search_single_element() {
        let mut buffer = [5];
        assert_eq!(binary_search(SearchMode::Sorted(&[5]), 5), Some(0));
        assert_eq!(binary_search(SearchMode::Sorted(&[5]), 0), None);
        assert_eq!(binary_search(SearchMode::Manipulate(&mut buffer), 5), Some(0));
        assert_eq!(binary_search(SearchMode::Manipulate(&mut buffer), 0), None);
        assert_eq!(binary_search(SearchMode::Transparent(&[5]), 5), Some(0));
        assert_eq!(binary_search(SearchMode::Transparent(&[5]), 0), None);
    }

    #[test]
    fn test_binary_search_unsorted_modes() {
        let original = [40, 10, 30, 20];

        // Transparent reports the position in the caller's ordering
        assert_eq!(binary_search(SearchMode::Transparent(&original), 30), Some(2));
        assert_eq!(binary_search(SearchMode::Transparent(&original), 25), None);

        // Manipulate sorts the buffer and reports the sorted position
        let mut buffer = original;
        assert_eq!(binary_search(SearchMode::Manipulate(&mut buffer), 30), Some(2));
        assert_eq!(buffer, [10, 20, 30, 40]);
        assert_eq!(binary_search(SearchMode::Manipulate(&mut buffer), 40), Some(3));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(IntersectState::Init.to_string(), "init");
        assert_eq!(IntersectState::Ready.to_string(), "ready");
        assert_eq!(IntersectState::Done.to_string(), "done");
    }
}
