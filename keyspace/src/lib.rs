// Layers, bottom up:
//  - bptree: ordered byte-key map with pluggable key order
//  - integer: sorted unique i32 sets used as posting lists
//  - intersect: AND / OR / NOT over several sorted sets
//  - range_index: i32 value -> ids, with range queries
//  - wildcard_index: normalized string fragments -> ids
//
// simulation drives the tree against a BTreeMap model; the keyspace binary
// benchmarks every layer.

pub mod bptree;
pub mod config;
pub mod integer;
pub mod intersect;
pub mod range_index;
pub mod simulation;
pub mod wildcard_index;

#[cfg(test)]
mod testing;

pub use bptree::{BPlusTree, TreeError};
pub use integer::IntegerArray;
pub use intersect::{BooleanOp, Intersect, SearchStrategy};
pub use range_index::{RangeIndex, RangeQuery};
pub use wildcard_index::{WildcardIndex, WildcardKind};
