//! Substring index over normalized strings.
//!
//! Every string is normalized to lowercase printable ASCII before use. A
//! standard entry indexes the whole string plus each of its proper prefixes
//! and suffixes, so a lookup of any leading or trailing fragment finds the
//! ids of every string it came from.

use std::fmt;

use crate::bptree::{BPlusTree, TreeError};
use crate::integer::IntegerArray;
use crate::intersect::{BooleanOp, Intersect, IntersectError, SearchStrategy};

/// Which keys a string contributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WildcardKind {
    /// The full string plus every prefix and suffix within the thresholds.
    #[default]
    Standard,
    /// Only the full string.
    Exact,
}

/// Index from normalized strings and their fragments to id sets.
#[derive(Debug)]
pub struct WildcardIndex {
    min_length: usize,
    max_length: usize,
    ticks: u64,
    index: BPlusTree<IntegerArray>,
}

impl WildcardIndex {
    /// Create an index accepting normalized strings of `min_length` to
    /// `max_length` bytes. Longer input is truncated to `max_length`.
    pub fn new(min_length: usize, max_length: usize) -> Result<Self, WildcardIndexError> {
        check_thresholds(min_length, max_length)?;
        Ok(Self {
            min_length,
            max_length,
            ticks: 0,
            index: BPlusTree::new(),
        })
    }

    pub fn set_string_thresholds(
        &mut self,
        min_length: usize,
        max_length: usize,
    ) -> Result<(), WildcardIndexError> {
        check_thresholds(min_length, max_length)?;
        self.min_length = min_length;
        self.max_length = max_length;
        Ok(())
    }

    #[must_use]
    pub const fn min_length(&self) -> usize {
        self.min_length
    }

    #[must_use]
    pub const fn max_length(&self) -> usize {
        self.max_length
    }

    /// Number of `get`, `put`, `remove` and `search` calls so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of distinct keys in the index.
    #[must_use]
    pub const fn index_count(&self) -> usize {
        self.index.leaf_count()
    }

    #[must_use]
    pub const fn index_depth(&self) -> usize {
        self.index.depth()
    }

    /// Normalize `input` the way every operation does.
    ///
    /// Control and non-ASCII bytes become spaces, letters are lowercased,
    /// digits are kept and other punctuation is dropped.
    pub fn normalize(&self, input: &str) -> Result<Vec<u8>, WildcardIndexError> {
        let mut normalized = Vec::with_capacity(input.len().min(self.max_length));
        for &byte in input.as_bytes() {
            if normalized.len() >= self.max_length {
                break;
            }
            match byte {
                b' ' | 0..=31 | 127..=u8::MAX => normalized.push(b' '),
                b'A'..=b'Z' => normalized.push(byte.to_ascii_lowercase()),
                b'a'..=b'z' | b'0'..=b'9' => normalized.push(byte),
                _ => {}
            }
        }

        if normalized.len() < self.min_length.max(1) {
            tracing::debug!(length = normalized.len(), "normalized string out of bounds");
            return Err(WildcardIndexError::OutOfBounds {
                length: normalized.len(),
            });
        }
        Ok(normalized)
    }

    /// Ids stored under the normalized form of `input`.
    pub fn get(&mut self, input: &str) -> Option<&[i32]> {
        self.ticks += 1;
        self.lookup(input)
    }

    fn lookup(&self, input: &str) -> Option<&[i32]> {
        let key = self.normalize(input).ok()?;
        self.index.get(&key).map(IntegerArray::as_slice)
    }

    /// Index `id` under `input` and, for [`WildcardKind::Standard`], under
    /// every derived fragment.
    ///
    /// Fails with [`WildcardIndexError::DuplicateId`] if the full string
    /// already held `id`; fragments are still brought up to date.
    pub fn put(&mut self, kind: WildcardKind, input: &str, id: i32) -> Result<(), WildcardIndexError> {
        self.ticks += 1;
        let normalized = self.normalize(input)?;

        let added = self.add_posting(&normalized, id)?;
        if kind == WildcardKind::Standard {
            for fragment in fragments(&normalized, self.min_length) {
                self.add_posting(fragment, id)?;
            }
        }

        if added {
            Ok(())
        } else {
            Err(WildcardIndexError::DuplicateId(id))
        }
    }

    /// Remove `id` from `input` and from every fragment derived from it.
    ///
    /// Keys left without ids are dropped from the index.
    pub fn remove(&mut self, input: &str, id: i32) -> Result<(), WildcardIndexError> {
        self.ticks += 1;
        let normalized = self.normalize(input)?;

        if !self.remove_posting(&normalized, id)? {
            return Err(WildcardIndexError::NotFound(id));
        }
        for fragment in fragments(&normalized, self.min_length) {
            self.remove_posting(fragment, id)?;
        }
        Ok(())
    }

    /// Combine the id sets of several terms.
    ///
    /// A term with no entry contributes an empty set.
    pub fn search(&mut self, terms: &[&str], op: BooleanOp) -> Result<Vec<i32>, WildcardIndexError> {
        self.ticks += 1;
        let this = &*self;

        let mut intersect = Intersect::new();
        let mut missing = false;
        for term in terms {
            match this.lookup(term) {
                Some(ids) => {
                    intersect.put_borrowed(ids)?;
                }
                None => missing = true,
            }
        }

        let op = match (op, missing) {
            (BooleanOp::And, true) => return Ok(Vec::new()),
            // Nothing is common to every term, so NOT keeps the whole union.
            (BooleanOp::Not, true) => BooleanOp::Or,
            _ => op,
        };
        if intersect.entry_count() == 0 {
            return Ok(Vec::new());
        }

        // Posting lists are kept sorted.
        intersect.mark_sorted();
        let result = intersect.exec(op, SearchStrategy::Binary)?;
        Ok(result.as_slice().to_vec())
    }

    /// Returns whether `id` was newly added.
    fn add_posting(&mut self, key: &[u8], id: i32) -> Result<bool, TreeError> {
        if let Some(ids) = self.index.get_mut(key) {
            return Ok(ids.put(id).is_ok());
        }
        self.index
            .put(key, IntegerArray::from_sorted_unique(vec![id]))?;
        Ok(true)
    }

    /// Returns whether `id` was present.
    fn remove_posting(&mut self, key: &[u8], id: i32) -> Result<bool, TreeError> {
        let Some(ids) = self.index.get_mut(key) else {
            return Ok(false);
        };
        if ids.remove(id).is_err() {
            return Ok(false);
        }
        if ids.is_empty() {
            self.index.remove(key)?;
        }
        Ok(true)
    }
}

fn check_thresholds(min_length: usize, max_length: usize) -> Result<(), WildcardIndexError> {
    if max_length == 0 || min_length > max_length {
        tracing::warn!(min_length, max_length, "invalid wildcard thresholds");
        return Err(WildcardIndexError::InvalidThresholds {
            min: min_length,
            max: max_length,
        });
    }
    Ok(())
}

/// Proper suffixes, longest first, then proper prefixes, longest first.
///
/// Fragments shorter than `min_length` (or empty) are skipped.
fn fragments(normalized: &[u8], min_length: usize) -> impl Iterator<Item = &[u8]> {
    let floor = min_length.max(1);
    let length = normalized.len();
    let suffixes = (1..length)
        .map(move |start| &normalized[start..])
        .take_while(move |suffix| suffix.len() >= floor);
    let prefixes = (floor..length).rev().map(move |end| &normalized[..end]);
    suffixes.chain(prefixes)
}

/// Errors that can occur when using a wildcard index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WildcardIndexError {
    /// `min` is greater than `max`, or `max` is zero.
    InvalidThresholds { min: usize, max: usize },
    /// The normalized string is shorter than the minimum length.
    OutOfBounds { length: usize },
    /// The id was already indexed under the full string.
    DuplicateId(i32),
    /// The id is not indexed under the full string.
    NotFound(i32),
    /// Tree error.
    Tree(TreeError),
    /// Intersect error.
    Intersect(IntersectError),
}

impl fmt::Display for WildcardIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidThresholds { min, max } => {
                write!(f, "invalid string thresholds: min {min}, max {max}")
            }
            Self::OutOfBounds { length } => {
                write!(f, "normalized string length {length} is out of bounds")
            }
            Self::DuplicateId(id) => write!(f, "id {id} already indexed"),
            Self::NotFound(id) => write!(f, "id {id} not indexed"),
            Self::Tree(e) => write!(f, "tree error: {e}"),
            Self::Intersect(e) => write!(f, "intersect error: {e}"),
        }
    }
}

impl std::error::Error for WildcardIndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tree(e) => Some(e),
            Self::Intersect(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TreeError> for WildcardIndexError {
    fn from(e: TreeError) -> Self {
        Self::Tree(e)
    }
}

impl From<IntersectError> for WildcardIndexError {
    fn from(e: IntersectError) -> Self {
        Self::Intersect(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> WildcardIndex {
        WildcardIndex::new(2, 16).expect("create index")
    }

    #[test]
    fn test_normalize() {
        let index = WildcardIndex::new(1, 64).expect("create index");

        assert_eq!(index.normalize("Hello, World!").expect("normalize"), b"hello world");
        assert_eq!(index.normalize("\tab").expect("normalize"), b" ab");
        assert_eq!(index.normalize("R2-D2").expect("normalize"), b"r2d2");
        // Each byte of a multi-byte character becomes a space
        assert_eq!(index.normalize("café").expect("normalize"), b"caf  ");
    }

    #[test]
    fn test_normalize_bounds() {
        let index = WildcardIndex::new(3, 4).expect("create index");

        assert_eq!(index.normalize("abcdefg").expect("normalize"), b"abcd");
        assert_eq!(
            index.normalize("a!"),
            Err(WildcardIndexError::OutOfBounds { length: 1 })
        );
        assert_eq!(
            index.normalize("..."),
            Err(WildcardIndexError::OutOfBounds { length: 0 })
        );
    }

    #[test]
    fn test_invalid_thresholds() {
        assert_eq!(
            WildcardIndex::new(5, 2).err(),
            Some(WildcardIndexError::InvalidThresholds { min: 5, max: 2 })
        );
        assert!(WildcardIndex::new(0, 0).is_err());

        let mut index = index();
        assert!(index.set_string_thresholds(9, 3).is_err());
        assert_eq!(index.min_length(), 2);
        index.set_string_thresholds(1, 8).expect("set thresholds");
        assert_eq!((index.min_length(), index.max_length()), (1, 8));
    }

    #[test]
    fn test_fragments() {
        let keys: Vec<&[u8]> = fragments(b"abcd", 2).collect();
        assert_eq!(keys, vec![&b"bcd"[..], b"cd", b"abc", b"ab"]);

        // Zero minimum still skips empty fragments
        let keys: Vec<&[u8]> = fragments(b"ab", 0).collect();
        assert_eq!(keys, vec![&b"b"[..], b"a"]);

        assert_eq!(fragments(b"abc", 3).count(), 0);
    }

    #[test]
    fn test_standard_put_indexes_fragments() {
        let mut index = index();
        index.put(WildcardKind::Standard, "ABCD", 1).expect("put");

        assert_eq!(index.index_count(), 5);
        for key in ["abcd", "bcd", "cd", "abc", "ab"] {
            assert_eq!(index.get(key), Some(&[1][..]), "{key}");
        }
        assert_eq!(index.get("bc"), None);
        assert_eq!(index.get("d"), None);
    }

    #[test]
    fn test_exact_put_indexes_full_string_only() {
        let mut index = index();
        index.put(WildcardKind::Exact, "abcd", 1).expect("put");

        assert_eq!(index.index_count(), 1);
        assert_eq!(index.get("ABCD"), Some(&[1][..]));
        assert_eq!(index.get("abc"), None);
    }

    #[test]
    fn test_duplicate_id() {
        let mut index = index();
        index.put(WildcardKind::Standard, "abcd", 1).expect("put");

        assert_eq!(
            index.put(WildcardKind::Standard, "abcd", 1),
            Err(WildcardIndexError::DuplicateId(1))
        );
        assert_eq!(index.index_count(), 5);
        assert_eq!(index.get("bcd"), Some(&[1][..]));
    }

    #[test]
    fn test_shared_fragments() {
        let mut index = index();
        index.put(WildcardKind::Standard, "abcd", 1).expect("put");
        index.put(WildcardKind::Standard, "bcde", 2).expect("put");

        assert_eq!(index.get("bcd"), Some(&[1, 2][..]));

        index.remove("abcd", 1).expect("remove");
        assert_eq!(index.get("bcd"), Some(&[2][..]));
        assert_eq!(index.get("abcd"), None);
        assert_eq!(index.get("cd"), None);
        assert_eq!(index.index_count(), 5);
    }

    #[test]
    fn test_remove_prunes_everything() {
        let mut index = WildcardIndex::new(1, 16).expect("create index");
        index.put(WildcardKind::Standard, "aaa", 7).expect("put");
        assert_eq!(index.index_count(), 3);

        index.remove("aaa", 7).expect("remove");
        assert_eq!(index.index_count(), 0);
        assert_eq!(index.remove("aaa", 7), Err(WildcardIndexError::NotFound(7)));
    }

    #[test]
    fn test_search() {
        let mut index = index();
        index.put(WildcardKind::Standard, "apple", 1).expect("put");
        index.put(WildcardKind::Standard, "apply", 2).expect("put");
        index.put(WildcardKind::Standard, "maple", 3).expect("put");

        assert_eq!(index.search(&["appl", "ple"], BooleanOp::And), Ok(vec![1]));
        assert_eq!(index.search(&["appl", "ple"], BooleanOp::Or), Ok(vec![1, 2, 3]));
        assert_eq!(index.search(&["appl", "ple"], BooleanOp::Not), Ok(vec![2, 3]));

        // Missing terms
        assert_eq!(index.search(&["appl", "zzz"], BooleanOp::And), Ok(vec![]));
        assert_eq!(index.search(&["appl", "zzz"], BooleanOp::Not), Ok(vec![1, 2]));
        assert_eq!(index.search(&[], BooleanOp::Or), Ok(vec![]));
    }

    #[test]
    fn test_ticks() {
        let mut index = index();
        index.put(WildcardKind::Exact, "abc", 1).expect("put");
        let _ = index.get("abc");
        let _ = index.get("!");
        index.remove("abc", 1).expect("remove");
        assert_eq!(index.ticks(), 4);
    }
}
