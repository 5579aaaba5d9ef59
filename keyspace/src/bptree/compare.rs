//! Key comparators for the B+tree.
//!
//! Keys are raw byte buffers of a given length, not C strings: embedded zero
//! bytes are legal and significant. The default ordering is unsigned
//! lexicographic comparison with shorter-is-less on a common prefix.

use std::cmp::Ordering;

/// Size of an encoded integer key in bytes.
pub const INTEGER_KEY_SIZE: usize = 4;

/// Orders two byte-string keys.
///
/// The tree relies on this being a total order: the same pair of keys must
/// always compare the same way for the lifetime of the tree.
pub trait KeyComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// Unsigned byte-wise ordering, shorter key first on a shared prefix.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Lexicographic;

impl KeyComparator for Lexicographic {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        // Slice ordering on u8 is exactly memcmp with a length tiebreak.
        a.cmp(b)
    }
}

/// Numeric ordering for keys produced by [`encode_integer_key`].
///
/// Keys that are not exactly [`INTEGER_KEY_SIZE`] bytes long sort after every
/// integer key, in lexicographic order among themselves.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IntegerKeys;

impl KeyComparator for IntegerKeys {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        match (decode_integer_key(a), decode_integer_key(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }
}

/// Adapts a plain comparison function into a [`KeyComparator`].
#[derive(Debug, Clone, Copy)]
pub struct CompareFn<F>(pub F);

impl<F> KeyComparator for CompareFn<F>
where
    F: Fn(&[u8], &[u8]) -> Ordering,
{
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        (self.0)(a, b)
    }
}

/// Encode an integer as a 4-byte big-endian key.
#[must_use]
pub const fn encode_integer_key(value: i32) -> [u8; INTEGER_KEY_SIZE] {
    value.to_be_bytes()
}

/// Decode a key produced by [`encode_integer_key`].
///
/// Returns `None` if the key is not exactly [`INTEGER_KEY_SIZE`] bytes.
#[must_use]
pub fn decode_integer_key(key: &[u8]) -> Option<i32> {
    <[u8; INTEGER_KEY_SIZE]>::try_from(key)
        .ok()
        .map(i32::from_be_bytes)
}
