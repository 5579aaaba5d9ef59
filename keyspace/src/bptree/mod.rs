//! B+tree index keyed by arbitrary byte strings.
//!
//! # Structure
//!
//! The tree consists of:
//! - Internal nodes: store separator keys and child ids
//! - Leaf nodes: store key-value pairs, doubly-linked for ordered scans
//!
//! Nodes hold at most [`DEFAULT_NODE_CAPACITY`] keys unless a different
//! capacity is chosen at construction. Keys are compared with a
//! [`KeyComparator`]; the default is unsigned byte order.
//!
//! # Usage
//!
//! ```
//! use keyspace::bptree::{BPlusTree, TreeError};
//!
//! let mut tree = BPlusTree::new();
//! tree.put(b"apple", 1).unwrap();
//! tree.put(b"pear", 2).unwrap();
//!
//! assert_eq!(tree.put(b"apple", 3), Err(TreeError::DuplicateKey));
//! assert_eq!(tree.get(b"apple"), Some(&1));
//!
//! let keys: Vec<&[u8]> = tree.iter().map(|(key, _)| key).collect();
//! assert_eq!(keys, vec![&b"apple"[..], &b"pear"[..]]);
//! ```

mod compare;
mod node;
mod tree;

pub use compare::{
    CompareFn, INTEGER_KEY_SIZE, IntegerKeys, KeyComparator, Lexicographic, decode_integer_key,
    encode_integer_key,
};
pub use node::{NodeError, NodeId, NodeType};
pub use tree::{
    BPlusTree, DEFAULT_NODE_CAPACITY, Iter, MIN_NODE_CAPACITY, TreeError, TreeExport,
};
