//! In-memory B+tree keyed by byte strings.
//!
//! Nodes are kept in an arena (`Vec<Option<Node<V>>>`) and addressed by
//! [`NodeId`]. Freed slots are recycled. Values live only in leaves; leaves
//! are doubly linked so ordered scans never go back through the parents.

use std::fmt;

use crate::bptree::compare::{KeyComparator, Lexicographic};
use crate::bptree::node::{InternalNode, Key, LeafEntry, LeafNode, Node, NodeError, NodeId};

/// Default maximum number of keys per node.
pub const DEFAULT_NODE_CAPACITY: usize = 8;

/// Smallest capacity for which splits leave both halves non-empty.
pub const MIN_NODE_CAPACITY: usize = 3;

type FreeFunction<V> = Box<dyn FnMut(V) + Send>;

/// An ordered map from byte-string keys to values of type `V`.
pub struct BPlusTree<V, C = Lexicographic> {
    nodes: Vec<Option<Node<V>>>,
    free_slots: Vec<NodeId>,
    root: NodeId,
    depth: usize,
    leaf_count: usize,
    capacity: usize,
    comparator: C,
    free_function: Option<FreeFunction<V>>,
    debug_mode: bool,
}

impl<V> BPlusTree<V, Lexicographic> {
    /// Create an empty tree with lexicographic key order.
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(Lexicographic)
    }

    /// Create an empty tree with a custom node capacity.
    pub fn with_capacity(capacity: usize) -> Result<Self, TreeError> {
        Self::with_capacity_and_comparator(capacity, Lexicographic)
    }
}

impl<V> Default for BPlusTree<V, Lexicographic> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, C> BPlusTree<V, C> {
    /// Number of entries in the tree.
    #[must_use]
    pub const fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Number of internal levels above the leaves; 0 while the root is a leaf.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Maximum number of keys per node.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Install a function that receives every value the tree releases.
    ///
    /// It runs on `remove`, `clear`, and when the tree is dropped. Without
    /// one, released values are simply dropped.
    pub fn set_free_function(&mut self, free_function: impl FnMut(V) + Send + 'static) {
        self.free_function = Some(Box::new(free_function));
    }

    /// Toggle trace-level dumps of nodes touched by splits, merges and borrows.
    pub const fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
    }

    /// Remove every entry, passing each value to the free-function.
    pub fn clear(&mut self) {
        self.release_all();
        self.root = self.alloc(Node::Leaf(LeafNode::new()));
        tracing::debug!("tree cleared");
    }

    /// Consume the tree, releasing every value.
    pub fn free(self) {
        drop(self);
    }

    /// Iterate over all entries in key order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, V, C> {
        let mut current = self.root;
        while let Some(Node::Internal(internal)) = self.nodes.get(current).and_then(Option::as_ref)
        {
            match internal.children.first() {
                Some(&child) => current = child,
                None => break,
            }
        }
        Iter {
            tree: self,
            leaf: Some(current),
            index: 0,
        }
    }

    /// Export every entry in key order.
    ///
    /// Keys are copied out; values are borrowed from the tree.
    #[must_use]
    pub fn to_array(&self) -> TreeExport<'_, V> {
        let mut export = TreeExport {
            keys: Vec::with_capacity(self.leaf_count),
            values: Vec::with_capacity(self.leaf_count),
        };
        for (key, value) in self {
            export.keys.push(key.to_vec());
            export.values.push(value);
        }
        export
    }

    fn release_all(&mut self) {
        let nodes = std::mem::take(&mut self.nodes);
        self.free_slots.clear();
        self.depth = 0;
        self.leaf_count = 0;
        for node in nodes.into_iter().flatten() {
            if let Node::Leaf(leaf) = node {
                for entry in leaf.entries {
                    self.release_value(entry.value);
                }
            }
        }
    }

    fn release_value(&mut self, value: V) {
        if let Some(free_function) = self.free_function.as_mut() {
            free_function(value);
        }
    }

    fn alloc(&mut self, node: Node<V>) -> NodeId {
        if let Some(id) = self.free_slots.pop() {
            self.nodes[id] = Some(node);
            id
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn release(&mut self, id: NodeId) -> Result<Node<V>, NodeError> {
        let node = self
            .nodes
            .get_mut(id)
            .and_then(Option::take)
            .ok_or(NodeError::MissingNode(id))?;
        self.free_slots.push(id);
        Ok(node)
    }

    fn node(&self, id: NodeId) -> Result<&Node<V>, NodeError> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(NodeError::MissingNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node<V>, NodeError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(NodeError::MissingNode(id))
    }

    fn leaf(&self, id: NodeId) -> Result<&LeafNode<V>, NodeError> {
        self.node(id)?.as_leaf()
    }

    fn leaf_mut(&mut self, id: NodeId) -> Result<&mut LeafNode<V>, NodeError> {
        self.node_mut(id)?.as_leaf_mut()
    }

    fn internal(&self, id: NodeId) -> Result<&InternalNode, NodeError> {
        self.node(id)?.as_internal()
    }

    fn internal_mut(&mut self, id: NodeId) -> Result<&mut InternalNode, NodeError> {
        self.node_mut(id)?.as_internal_mut()
    }
}

impl<V, C: KeyComparator> BPlusTree<V, C> {
    /// Create an empty tree ordered by `comparator`.
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            nodes: vec![Some(Node::Leaf(LeafNode::new()))],
            free_slots: Vec::new(),
            root: 0,
            depth: 0,
            leaf_count: 0,
            capacity: DEFAULT_NODE_CAPACITY,
            comparator,
            free_function: None,
            debug_mode: false,
        }
    }

    /// Create an empty tree with a custom node capacity and key order.
    pub fn with_capacity_and_comparator(capacity: usize, comparator: C) -> Result<Self, TreeError> {
        if capacity < MIN_NODE_CAPACITY {
            tracing::warn!(capacity, "node capacity below minimum");
            return Err(TreeError::InvalidCapacity(capacity));
        }
        let mut tree = Self::with_comparator(comparator);
        tree.capacity = capacity;
        Ok(tree)
    }

    /// Insert a new entry.
    ///
    /// Fails with [`TreeError::DuplicateKey`] if the key is already present;
    /// the tree is left unchanged and `value` is dropped.
    pub fn put(&mut self, key: &[u8], value: V) -> Result<(), TreeError> {
        if key.is_empty() {
            tracing::warn!("rejecting empty key");
            return Err(TreeError::EmptyKey);
        }
        if self.contains_key(key) {
            return Err(TreeError::DuplicateKey);
        }

        let root = self.root;
        if let Some((separator, right)) = self.insert_into(root, key.into(), value)? {
            self.grow_root(separator, right);
        }
        self.leaf_count += 1;
        Ok(())
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let leaf_id = self.find_leaf(key).ok()?;
        self.leaf(leaf_id).ok()?.get(&self.comparator, key)
    }

    /// Look up a value by key for in-place modification.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let leaf_id = self.find_leaf(key).ok()?;
        let index = self
            .leaf(leaf_id)
            .ok()?
            .find_index(&self.comparator, key)
            .ok()?;
        self.leaf_mut(leaf_id)
            .ok()?
            .entries
            .get_mut(index)
            .map(|entry| &mut entry.value)
    }

    #[must_use]
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Remove an entry, handing its value to the free-function.
    pub fn remove(&mut self, key: &[u8]) -> Result<(), TreeError> {
        let value = self.take(key)?;
        self.release_value(value);
        Ok(())
    }

    /// Remove an entry and return its value to the caller.
    ///
    /// The free-function is not invoked.
    pub fn take(&mut self, key: &[u8]) -> Result<V, TreeError> {
        if !self.contains_key(key) {
            return Err(TreeError::NotFound);
        }

        let root = self.root;
        let value = self.remove_from(root, key)?;
        self.leaf_count -= 1;
        self.shrink_root()?;
        Ok(value)
    }

    /// The entry with the smallest key strictly greater than `key`.
    ///
    /// `key` itself does not have to be present.
    #[must_use]
    pub fn get_next(&self, key: &[u8]) -> Option<(&[u8], &V)> {
        self.iter_after(key).next()
    }

    /// The entry with the largest key strictly less than `key`.
    #[must_use]
    pub fn get_previous(&self, key: &[u8]) -> Option<(&[u8], &V)> {
        let leaf_id = self.find_leaf(key).ok()?;
        let leaf = self.leaf(leaf_id).ok()?;
        let index = match leaf.find_index(&self.comparator, key) {
            Ok(i) | Err(i) => i,
        };

        let entry = if index > 0 {
            leaf.entries.get(index - 1)
        } else {
            self.leaf(leaf.prev?).ok()?.entries.last()
        }?;
        Some((&*entry.key, &entry.value))
    }

    /// Iterate in key order starting at the first key `>= key`.
    #[must_use]
    pub fn iter_from(&self, key: &[u8]) -> Iter<'_, V, C> {
        self.iter_at(key, false)
    }

    /// Iterate in key order starting at the first key `> key`.
    #[must_use]
    pub fn iter_after(&self, key: &[u8]) -> Iter<'_, V, C> {
        self.iter_at(key, true)
    }

    fn iter_at(&self, key: &[u8], exclusive: bool) -> Iter<'_, V, C> {
        let Ok(leaf_id) = self.find_leaf(key) else {
            return Iter {
                tree: self,
                leaf: None,
                index: 0,
            };
        };
        let index = self.leaf(leaf_id).map_or(0, |leaf| {
            match leaf.find_index(&self.comparator, key) {
                Ok(i) if exclusive => i + 1,
                Ok(i) | Err(i) => i,
            }
        });
        Iter {
            tree: self,
            leaf: Some(leaf_id),
            index,
        }
    }

    /// Walk the whole tree and check every structural invariant.
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut leaves = Vec::new();
        let count = self.validate_node(self.root, None, None, 0, &mut leaves)?;
        if count != self.leaf_count {
            return Err(corrupt(format!(
                "counted {count} entries, expected {}",
                self.leaf_count
            )));
        }

        for (i, &id) in leaves.iter().enumerate() {
            let leaf = self.leaf(id)?;
            let expected_prev = i.checked_sub(1).and_then(|j| leaves.get(j).copied());
            let expected_next = leaves.get(i + 1).copied();
            if leaf.prev != expected_prev || leaf.next != expected_next {
                return Err(corrupt(format!("leaf {id} has broken sibling links")));
            }
        }
        Ok(())
    }

    fn validate_node(
        &self,
        id: NodeId,
        lower: Option<&[u8]>,
        upper: Option<&[u8]>,
        level: usize,
        leaves: &mut Vec<NodeId>,
    ) -> Result<usize, TreeError> {
        let node = self.node(id)?;
        let keys: Vec<&[u8]> = match node {
            Node::Internal(internal) => internal.keys.iter().map(|key| &**key).collect(),
            Node::Leaf(leaf) => leaf.entries.iter().map(|entry| &*entry.key).collect(),
        };

        if keys.len() > self.capacity {
            return Err(corrupt(format!("node {id} holds {} keys", keys.len())));
        }
        if id != self.root && keys.len() < self.capacity / 2 {
            return Err(corrupt(format!("node {id} is underfull")));
        }
        for pair in keys.windows(2) {
            if self.comparator.compare(pair[0], pair[1]).is_ge() {
                return Err(corrupt(format!("node {id} keys out of order")));
            }
        }
        if lower
            .zip(keys.first())
            .is_some_and(|(lower, first)| self.comparator.compare(first, lower).is_lt())
        {
            return Err(corrupt(format!("node {id} has a key below its separator")));
        }
        if upper
            .zip(keys.last())
            .is_some_and(|(upper, last)| self.comparator.compare(last, upper).is_ge())
        {
            return Err(corrupt(format!("node {id} has a key above its separator")));
        }

        match node {
            Node::Leaf(leaf) => {
                if level != self.depth {
                    return Err(corrupt(format!("leaf {id} at level {level}")));
                }
                leaves.push(id);
                Ok(leaf.entries.len())
            }
            Node::Internal(internal) => {
                if level >= self.depth {
                    return Err(corrupt(format!("internal node {id} at leaf level")));
                }
                if internal.keys.is_empty() || internal.children.len() != internal.keys.len() + 1
                {
                    return Err(corrupt(format!("node {id} has a bad child count")));
                }
                let mut count = 0;
                for (i, &child) in internal.children.iter().enumerate() {
                    let child_lower = if i == 0 {
                        lower
                    } else {
                        internal.keys.get(i - 1).map(|key| &**key)
                    };
                    let child_upper = internal.keys.get(i).map(|key| &**key).or(upper);
                    count += self.validate_node(child, child_lower, child_upper, level + 1, leaves)?;
                }
                Ok(count)
            }
        }
    }

    fn find_leaf(&self, key: &[u8]) -> Result<NodeId, NodeError> {
        let mut current = self.root;
        loop {
            match self.node(current)? {
                Node::Internal(internal) => {
                    current = internal.child(internal.find_child_index(&self.comparator, key))?;
                }
                Node::Leaf(_) => return Ok(current),
            }
        }
    }

    /// Insert below `node_id`, returning the separator and new right sibling
    /// if `node_id` had to split.
    fn insert_into(
        &mut self,
        node_id: NodeId,
        key: Key,
        value: V,
    ) -> Result<Option<(Key, NodeId)>, TreeError> {
        let child = match self.node(node_id)? {
            Node::Internal(internal) => {
                let index = internal.find_child_index(&self.comparator, &key);
                Some((index, internal.child(index)?))
            }
            Node::Leaf(_) => None,
        };

        let Some((index, child_id)) = child else {
            return self.insert_into_leaf(node_id, key, value);
        };
        let Some((separator, right_id)) = self.insert_into(child_id, key, value)? else {
            return Ok(None);
        };

        let capacity = self.capacity;
        let internal = self.internal_mut(node_id)?;
        internal.insert_at(index, separator, right_id);
        if internal.keys.len() <= capacity {
            return Ok(None);
        }

        let (median, right) = internal.split()?;
        let right_id = self.alloc(Node::Internal(right));
        self.trace_split(node_id, right_id);
        Ok(Some((median, right_id)))
    }

    fn insert_into_leaf(
        &mut self,
        leaf_id: NodeId,
        key: Key,
        value: V,
    ) -> Result<Option<(Key, NodeId)>, TreeError> {
        let capacity = self.capacity;
        let Err(index) = self.leaf(leaf_id)?.find_index(&self.comparator, &key) else {
            return Err(TreeError::DuplicateKey);
        };
        let leaf = self.leaf_mut(leaf_id)?;
        leaf.entries.insert(index, LeafEntry { key, value });
        if leaf.entries.len() <= capacity {
            return Ok(None);
        }

        let (split_key, mut right) = leaf.split()?;
        let old_next = leaf.next;
        right.prev = Some(leaf_id);
        let right_id = self.alloc(Node::Leaf(right));
        self.leaf_mut(leaf_id)?.next = Some(right_id);
        if let Some(next_id) = old_next {
            self.leaf_mut(next_id)?.prev = Some(right_id);
        }
        self.trace_split(leaf_id, right_id);
        Ok(Some((split_key, right_id)))
    }

    fn grow_root(&mut self, separator: Key, right: NodeId) {
        let new_root = InternalNode::with_children(self.root, separator, right);
        self.root = self.alloc(Node::Internal(new_root));
        self.depth += 1;
        tracing::debug!(depth = self.depth, "root split");
    }

    fn remove_from(&mut self, node_id: NodeId, key: &[u8]) -> Result<V, TreeError> {
        let child = match self.node(node_id)? {
            Node::Internal(internal) => {
                let index = internal.find_child_index(&self.comparator, key);
                Some((index, internal.child(index)?))
            }
            Node::Leaf(_) => None,
        };

        let Some((index, child_id)) = child else {
            let Ok(position) = self.leaf(node_id)?.find_index(&self.comparator, key) else {
                return Err(TreeError::NotFound);
            };
            return Ok(self.leaf_mut(node_id)?.entries.remove(position).value);
        };

        let value = self.remove_from(child_id, key)?;
        if self.node(child_id)?.key_count() < self.capacity / 2 {
            self.rebalance(node_id, index)?;
        }
        Ok(value)
    }

    /// Restore minimum occupancy of the child at `index` of `parent_id`.
    fn rebalance(&mut self, parent_id: NodeId, index: usize) -> Result<(), TreeError> {
        let min_keys = self.capacity / 2;
        let parent = self.internal(parent_id)?;
        let child_id = parent.child(index)?;
        let left_id = match index.checked_sub(1) {
            Some(i) => Some(parent.child(i)?),
            None => None,
        };
        let right_id = parent.children.get(index + 1).copied();

        let left_keys = match left_id {
            Some(id) => self.node(id)?.key_count(),
            None => 0,
        };
        let right_keys = match right_id {
            Some(id) => self.node(id)?.key_count(),
            None => 0,
        };

        // Prefer borrowing over merging
        match (left_id, right_id) {
            (Some(left_id), _) if left_keys > min_keys => {
                self.borrow_from_left(parent_id, index, left_id, child_id)
            }
            (_, Some(right_id)) if right_keys > min_keys => {
                self.borrow_from_right(parent_id, index, child_id, right_id)
            }
            (Some(left_id), _) => self.merge(parent_id, index - 1, left_id, child_id),
            (None, Some(right_id)) => self.merge(parent_id, index, child_id, right_id),
            (None, None) => Err(corrupt(format!("node {child_id} has no siblings"))),
        }
    }

    fn borrow_from_left(
        &mut self,
        parent_id: NodeId,
        index: usize,
        left_id: NodeId,
        child_id: NodeId,
    ) -> Result<(), TreeError> {
        match self.node_mut(left_id)? {
            Node::Leaf(left) => {
                let entry = left
                    .entries
                    .pop()
                    .ok_or_else(|| corrupt(format!("leaf {left_id} is empty")))?;
                let separator = entry.key.clone();
                self.leaf_mut(child_id)?.entries.insert(0, entry);
                *self.internal_mut(parent_id)?.key_mut(index - 1)? = separator;
            }
            Node::Internal(left) => {
                let (Some(moved_key), Some(moved_child)) = (left.keys.pop(), left.children.pop())
                else {
                    return Err(corrupt(format!("node {left_id} is empty")));
                };
                let separator = std::mem::replace(
                    self.internal_mut(parent_id)?.key_mut(index - 1)?,
                    moved_key,
                );
                let child = self.internal_mut(child_id)?;
                child.keys.insert(0, separator);
                child.children.insert(0, moved_child);
            }
        }
        self.trace_nodes("borrow left", &[left_id, child_id]);
        Ok(())
    }

    fn borrow_from_right(
        &mut self,
        parent_id: NodeId,
        index: usize,
        child_id: NodeId,
        right_id: NodeId,
    ) -> Result<(), TreeError> {
        match self.node_mut(right_id)? {
            Node::Leaf(right) => {
                if right.entries.len() < 2 {
                    return Err(corrupt(format!("leaf {right_id} cannot lend")));
                }
                let entry = right.entries.remove(0);
                let separator = right.entries[0].key.clone();
                self.leaf_mut(child_id)?.entries.push(entry);
                *self.internal_mut(parent_id)?.key_mut(index)? = separator;
            }
            Node::Internal(right) => {
                if right.keys.is_empty() {
                    return Err(corrupt(format!("node {right_id} is empty")));
                }
                let moved_key = right.keys.remove(0);
                let moved_child = right.children.remove(0);
                let separator =
                    std::mem::replace(self.internal_mut(parent_id)?.key_mut(index)?, moved_key);
                let child = self.internal_mut(child_id)?;
                child.keys.push(separator);
                child.children.push(moved_child);
            }
        }
        self.trace_nodes("borrow right", &[child_id, right_id]);
        Ok(())
    }

    /// Fold `right_id` into `left_id` and drop the separator between them.
    fn merge(
        &mut self,
        parent_id: NodeId,
        separator_index: usize,
        left_id: NodeId,
        right_id: NodeId,
    ) -> Result<(), TreeError> {
        let parent = self.internal_mut(parent_id)?;
        if separator_index >= parent.keys.len() {
            return Err(corrupt(format!("node {parent_id} has no separator {separator_index}")));
        }
        let separator = parent.keys.remove(separator_index);
        parent.children.remove(separator_index + 1);

        match self.release(right_id)? {
            Node::Leaf(right) => {
                let left = self.leaf_mut(left_id)?;
                left.entries.extend(right.entries);
                left.next = right.next;
                if let Some(next_id) = right.next {
                    self.leaf_mut(next_id)?.prev = Some(left_id);
                }
            }
            Node::Internal(right) => {
                let left = self.internal_mut(left_id)?;
                left.keys.push(separator);
                left.keys.extend(right.keys);
                left.children.extend(right.children);
            }
        }
        self.trace_nodes("merge", &[left_id]);
        Ok(())
    }

    /// Collapse internal roots that are left with a single child.
    fn shrink_root(&mut self) -> Result<(), TreeError> {
        loop {
            let old_root = self.root;
            let only_child = match self.node(old_root)? {
                Node::Internal(internal) if internal.keys.is_empty() => internal.child(0)?,
                _ => return Ok(()),
            };
            self.release(old_root)?;
            self.root = only_child;
            self.depth -= 1;
            tracing::debug!(depth = self.depth, "root collapsed");
        }
    }

    fn trace_split(&self, left_id: NodeId, right_id: NodeId) {
        self.trace_nodes("split", &[left_id, right_id]);
    }

    fn trace_nodes(&self, operation: &str, ids: &[NodeId]) {
        if !self.debug_mode {
            return;
        }
        for &id in ids {
            if let Ok(node) = self.node(id) {
                tracing::trace!(
                    operation,
                    node = id,
                    node_type = %node.node_type(),
                    keys = node.key_count(),
                    "node dump"
                );
            }
        }
    }
}

impl<V, C> Drop for BPlusTree<V, C> {
    fn drop(&mut self) {
        if self.free_function.is_some() {
            self.release_all();
        }
    }
}

impl<V, C> fmt::Debug for BPlusTree<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BPlusTree")
            .field("leaf_count", &self.leaf_count)
            .field("depth", &self.depth)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<'a, V, C> IntoIterator for &'a BPlusTree<V, C> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = Iter<'a, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ordered iterator over tree entries, following the leaf chain.
pub struct Iter<'a, V, C> {
    tree: &'a BPlusTree<V, C>,
    leaf: Option<NodeId>,
    index: usize,
}

impl<'a, V, C> Iterator for Iter<'a, V, C> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            let leaf = tree.leaf(self.leaf?).ok()?;
            if let Some(entry) = leaf.entries.get(self.index) {
                self.index += 1;
                return Some((&*entry.key, &entry.value));
            }
            self.leaf = leaf.next;
            self.index = 0;
        }
    }
}

/// Snapshot of a tree's contents in key order.
#[derive(Debug)]
pub struct TreeExport<'a, V> {
    /// Owned copies of every key.
    pub keys: Vec<Vec<u8>>,
    /// Borrowed values, parallel to `keys`.
    pub values: Vec<&'a V>,
}

impl<V> TreeExport<'_, V> {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Length of each key, parallel to `keys`.
    #[must_use]
    pub fn key_lengths(&self) -> Vec<usize> {
        self.keys.iter().map(Vec::len).collect()
    }
}

fn corrupt(message: String) -> TreeError {
    TreeError::Node(NodeError::Corrupt(message))
}

/// Errors that can occur during B+tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The key is already present.
    DuplicateKey,
    /// The key is not present.
    NotFound,
    /// Zero-length keys are not allowed.
    EmptyKey,
    /// Node capacity is below [`MIN_NODE_CAPACITY`].
    InvalidCapacity(usize),
    /// Node error.
    Node(NodeError),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey => write!(f, "key already exists"),
            Self::NotFound => write!(f, "key not found"),
            Self::EmptyKey => write!(f, "key must not be empty"),
            Self::InvalidCapacity(capacity) => write!(
                f,
                "node capacity {capacity} is below the minimum of {MIN_NODE_CAPACITY}"
            ),
            Self::Node(e) => write!(f, "node error: {e}"),
        }
    }
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Node(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NodeError> for TreeError {
    fn from(e: NodeError) -> Self {
        Self::Node(e)
    }
}
