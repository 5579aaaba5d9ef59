//! B+tree node types.
//!
//! Nodes live in an arena owned by the tree and refer to each other by
//! [`NodeId`]:
//! - Internal nodes: store separator keys and child ids
//! - Leaf nodes: store key-value pairs, doubly-linked for ordered scans

use std::fmt;

use crate::bptree::compare::KeyComparator;

/// Arena slot of a node.
pub type NodeId = usize;

/// An owned byte-string key.
pub type Key = Box<[u8]>;

/// Node type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal,
    Leaf,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::Leaf => write!(f, "leaf"),
        }
    }
}

/// A tree node.
#[derive(Debug)]
pub enum Node<V> {
    Internal(InternalNode),
    Leaf(LeafNode<V>),
}

impl<V> Node<V> {
    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        match self {
            Self::Internal(_) => NodeType::Internal,
            Self::Leaf(_) => NodeType::Leaf,
        }
    }

    /// Number of keys held by the node (entries for a leaf).
    #[must_use]
    pub fn key_count(&self) -> usize {
        match self {
            Self::Internal(node) => node.keys.len(),
            Self::Leaf(node) => node.entries.len(),
        }
    }

    pub const fn as_leaf(&self) -> Result<&LeafNode<V>, NodeError> {
        match self {
            Self::Leaf(leaf) => Ok(leaf),
            Self::Internal(_) => Err(NodeError::WrongNodeType),
        }
    }

    pub const fn as_leaf_mut(&mut self) -> Result<&mut LeafNode<V>, NodeError> {
        match self {
            Self::Leaf(leaf) => Ok(leaf),
            Self::Internal(_) => Err(NodeError::WrongNodeType),
        }
    }

    pub const fn as_internal(&self) -> Result<&InternalNode, NodeError> {
        match self {
            Self::Internal(node) => Ok(node),
            Self::Leaf(_) => Err(NodeError::WrongNodeType),
        }
    }

    pub const fn as_internal_mut(&mut self) -> Result<&mut InternalNode, NodeError> {
        match self {
            Self::Internal(node) => Ok(node),
            Self::Leaf(_) => Err(NodeError::WrongNodeType),
        }
    }
}

/// An internal (non-leaf) node.
///
/// Stores N separator keys and N+1 child ids.
/// `Child[i]` contains keys < `Key[i]`
/// `Child[i+1]` contains keys >= `Key[i]`
#[derive(Debug, Default)]
pub struct InternalNode {
    /// Separator keys in ascending order.
    pub keys: Vec<Key>,
    /// Child ids. `children.len()` == `keys.len()` + 1
    pub children: Vec<NodeId>,
}

impl InternalNode {
    /// Create an internal node with two children around one separator.
    #[must_use]
    pub fn with_children(left_child: NodeId, key: Key, right_child: NodeId) -> Self {
        Self {
            keys: vec![key],
            children: vec![left_child, right_child],
        }
    }

    /// Find the child index for a given key.
    pub fn find_child_index<C: KeyComparator + ?Sized>(&self, cmp: &C, key: &[u8]) -> usize {
        match self.keys.binary_search_by(|probe| cmp.compare(probe, key)) {
            Ok(i) => i + 1, // Exact match, go right
            Err(i) => i,
        }
    }

    /// Child id at `index`.
    pub fn child(&self, index: usize) -> Result<NodeId, NodeError> {
        self.children
            .get(index)
            .copied()
            .ok_or_else(|| NodeError::Corrupt(format!("no child at index {index}")))
    }

    /// Mutable access to the separator at `index`.
    pub fn key_mut(&mut self, index: usize) -> Result<&mut Key, NodeError> {
        self.keys
            .get_mut(index)
            .ok_or_else(|| NodeError::Corrupt(format!("no separator at index {index}")))
    }

    /// Insert a separator and its right child after the child at `index` split.
    pub fn insert_at(&mut self, index: usize, key: Key, right_child: NodeId) {
        self.keys.insert(index, key);
        self.children.insert(index + 1, right_child);
    }

    /// Split the node, returning the median key and the new right node.
    ///
    /// The median moves up to the parent and is kept by neither half.
    pub fn split(&mut self) -> Result<(Key, Self), NodeError> {
        let mid = self.keys.len() / 2;

        // Right node gets keys and children after median
        let right_keys = self.keys.split_off(mid + 1);
        let right_children = self.children.split_off(mid + 1);

        // Remove median key from left node
        let median_key = self
            .keys
            .pop()
            .ok_or_else(|| NodeError::Corrupt("split of an empty internal node".to_string()))?;

        Ok((
            median_key,
            Self {
                keys: right_keys,
                children: right_children,
            },
        ))
    }
}

/// A key-value entry in a leaf node.
#[derive(Debug)]
pub struct LeafEntry<V> {
    pub key: Key,
    pub value: V,
}

/// A leaf node.
///
/// Stores key-value pairs and links to sibling leaves.
#[derive(Debug)]
pub struct LeafNode<V> {
    /// Entries in sorted order by key.
    pub entries: Vec<LeafEntry<V>>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
}

impl<V> Default for LeafNode<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> LeafNode<V> {
    /// Create a new empty, unlinked leaf.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            prev: None,
            next: None,
        }
    }

    /// Find the index where a key should be inserted (or exists).
    pub fn find_index<C: KeyComparator + ?Sized>(
        &self,
        cmp: &C,
        key: &[u8],
    ) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|entry| cmp.compare(&entry.key, key))
    }

    /// Get a value by key.
    pub fn get<C: KeyComparator + ?Sized>(&self, cmp: &C, key: &[u8]) -> Option<&V> {
        self.find_index(cmp, key)
            .ok()
            .map(|i| &self.entries[i].value)
    }

    /// Split the node, returning the split key and the new right node.
    ///
    /// The right node inherits this node's `next` link; the caller wires up
    /// `prev` once the right node has an id.
    pub fn split(&mut self) -> Result<(Key, Self), NodeError> {
        let mid = self.entries.len() / 2;

        // Right node gets entries from mid onwards
        let right_entries = self.entries.split_off(mid);
        let split_key = right_entries
            .first()
            .map(|entry| entry.key.clone())
            .ok_or_else(|| NodeError::Corrupt("split of an empty leaf".to_string()))?;

        Ok((
            split_key,
            Self {
                entries: right_entries,
                prev: None,
                next: self.next,
            },
        ))
    }
}

/// Errors that can occur when working with tree nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// A node id does not refer to a live node.
    MissingNode(NodeId),
    /// Wrong node type for operation.
    WrongNodeType,
    /// A structural invariant does not hold.
    Corrupt(String),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNode(id) => write!(f, "node {id} does not exist"),
            Self::WrongNodeType => write!(f, "wrong node type for operation"),
            Self::Corrupt(message) => write!(f, "corrupt tree: {message}"),
        }
    }
}

impl std::error::Error for NodeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bptree::compare::Lexicographic;

    fn key(byte: u8) -> Key {
        vec![byte].into_boxed_slice()
    }

    fn leaf_with(keys: impl IntoIterator<Item = u8>) -> LeafNode<u8> {
        let mut node = LeafNode::new();
        node.entries = keys
            .into_iter()
            .map(|i| LeafEntry { key: key(i), value: i })
            .collect();
        node
    }

    #[test]
    fn test_leaf_node_lookup() {
        let node = leaf_with([1, 3, 5]);

        assert_eq!(node.get(&Lexicographic, &[3]), Some(&3));
        assert_eq!(node.get(&Lexicographic, &[4]), None);
        assert_eq!(node.find_index(&Lexicographic, &[4]), Err(2));
        assert_eq!(node.find_index(&Lexicographic, &[0]), Err(0));
        // A longer key sharing a prefix sorts after the shorter one
        assert_eq!(node.find_index(&Lexicographic, &[3, 0]), Err(2));
    }

    #[test]
    fn test_internal_node_find_child() {
        let node = InternalNode {
            keys: vec![key(10), key(20), key(30)],
            children: vec![100, 200, 300, 400],
        };

        // Key less than first key -> first child
        assert_eq!(node.find_child_index(&Lexicographic, &[5]), 0);

        // Key equal to first key -> second child
        assert_eq!(node.find_child_index(&Lexicographic, &[10]), 1);

        // Key between first and second -> second child
        assert_eq!(node.find_child_index(&Lexicographic, &[15]), 1);

        // Key greater than all -> last child
        assert_eq!(node.find_child_index(&Lexicographic, &[35]), 3);

        // A longer key sharing a separator's prefix sorts after it
        assert_eq!(node.find_child_index(&Lexicographic, &[10, 0]), 1);
    }

    #[test]
    fn test_leaf_node_split() {
        let mut node = leaf_with(0..9);
        node.next = Some(77);

        let (split_key, right) = node.split().expect("split");

        assert_eq!(node.entries.len(), 4);
        assert_eq!(right.entries.len(), 5);
        // Split key should be first key of right node
        assert_eq!(split_key, right.entries[0].key);
        assert_eq!(right.next, Some(77));
        assert_eq!(right.prev, None);
    }

    #[test]
    fn test_internal_node_split() {
        let mut node = InternalNode::default();
        for i in 0..9u8 {
            node.keys.push(key(i));
            node.children.push(NodeId::from(i));
        }
        node.children.push(9); // N+1 children

        let (median_key, right) = node.split().expect("split");

        // Median key is promoted and kept by neither half
        assert_eq!(&*median_key, &[4]);
        assert_eq!(node.keys.len(), 4);
        assert_eq!(node.children.len(), 5);
        assert_eq!(right.keys.len(), 4);
        assert_eq!(right.children.len(), 5);
        assert_eq!(right.children[0], 5);
    }

    #[test]
    fn test_wrong_node_type() {
        let node: Node<u8> = Node::Internal(InternalNode::default());
        assert_eq!(node.node_type(), NodeType::Internal);
        assert_eq!(node.as_leaf().err(), Some(NodeError::WrongNodeType));
        assert!(node.as_internal().is_ok());
    }
}
