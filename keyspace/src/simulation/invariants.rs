//! Invariant checking for deterministic simulation testing.
//!
//! Every operation is applied to both a [`BPlusTree`] and a
//! [`BTreeMap`] model. Any disagreement between the two, or any structural
//! problem reported by [`BPlusTree::validate`], is recorded as a violation.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::bptree::{BPlusTree, TreeError};
use crate::simulation::workload::Operation;

/// An invariant violation detected during simulation.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violation.
    pub description: String,
    /// Operation index where it was detected.
    pub operation_index: usize,
    /// Additional context.
    pub context: String,
}

/// Runs operations against a tree and a reference model side by side.
#[derive(Debug)]
pub struct ModelChecker {
    tree: BPlusTree<u32>,
    model: BTreeMap<Vec<u8>, u32>,
    violations: Vec<InvariantViolation>,
    operations_applied: usize,
}

impl ModelChecker {
    pub fn new(node_capacity: usize) -> Result<Self, TreeError> {
        Ok(Self {
            tree: BPlusTree::with_capacity(node_capacity)?,
            model: BTreeMap::new(),
            violations: Vec::new(),
            operations_applied: 0,
        })
    }

    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    #[must_use]
    pub const fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    #[must_use]
    pub const fn tree(&self) -> &BPlusTree<u32> {
        &self.tree
    }

    #[must_use]
    pub const fn operations_applied(&self) -> usize {
        self.operations_applied
    }

    /// Apply `operation` to both sides and compare the outcome.
    ///
    /// Returns whether the tree reported success.
    pub fn apply(&mut self, operation: &Operation) -> bool {
        let index = self.operations_applied;
        self.operations_applied += 1;

        let succeeded = match operation {
            Operation::Put { key, value } => {
                let result = self.tree.put(key, *value);
                let expected = if self.model.contains_key(key) {
                    Err(TreeError::DuplicateKey)
                } else {
                    self.model.insert(key.clone(), *value);
                    Ok(())
                };
                self.expect_equal(index, "put", &result, &expected);
                result.is_ok()
            }
            Operation::Remove { key } => {
                let result = self.tree.remove(key);
                let expected = self
                    .model
                    .remove(key)
                    .map(|_| ())
                    .ok_or(TreeError::NotFound);
                self.expect_equal(index, "remove", &result, &expected);
                result.is_ok()
            }
            Operation::Get { key } => {
                let result = self.tree.get(key).copied();
                let expected = self.model.get(key).copied();
                self.expect_equal(index, "get", &result, &expected);
                result.is_some()
            }
            Operation::Next { key } => {
                let result = self.tree.get_next(key).map(|(k, v)| (k.to_vec(), *v));
                let expected = self
                    .model
                    .range::<[u8], _>((Bound::Excluded(key.as_slice()), Bound::Unbounded))
                    .next()
                    .map(|(k, v)| (k.clone(), *v));
                self.expect_equal(index, "get_next", &result, &expected);
                result.is_some()
            }
            Operation::Previous { key } => {
                let result = self.tree.get_previous(key).map(|(k, v)| (k.to_vec(), *v));
                let expected = self
                    .model
                    .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(key.as_slice())))
                    .next_back()
                    .map(|(k, v)| (k.clone(), *v));
                self.expect_equal(index, "get_previous", &result, &expected);
                result.is_some()
            }
        };

        self.check_structure(index);
        succeeded
    }

    /// Check that the tree is well formed and the same size as the model.
    pub fn check_structure(&mut self, operation_index: usize) {
        if let Err(e) = self.tree.validate() {
            self.violations.push(InvariantViolation {
                description: "tree failed validation".to_string(),
                operation_index,
                context: e.to_string(),
            });
        }
        if self.tree.leaf_count() != self.model.len() {
            self.violations.push(InvariantViolation {
                description: "entry count mismatch".to_string(),
                operation_index,
                context: format!(
                    "tree has {}, model has {}",
                    self.tree.leaf_count(),
                    self.model.len()
                ),
            });
        }
    }

    /// Compare the full contents of tree and model in key order.
    pub fn check_contents(&mut self) {
        let export = self.tree.to_array();
        let matches = export.len() == self.model.len()
            && export
                .keys
                .iter()
                .zip(&export.values)
                .zip(&self.model)
                .all(|((key, value), (model_key, model_value))| {
                    key == model_key && *value == model_value
                });

        if !matches {
            self.violations.push(InvariantViolation {
                description: "contents differ from model".to_string(),
                operation_index: self.operations_applied,
                context: format!("tree exported {} entries", export.len()),
            });
        }
    }

    fn expect_equal<T: PartialEq + std::fmt::Debug>(
        &mut self,
        operation_index: usize,
        operation: &str,
        actual: &T,
        expected: &T,
    ) {
        if actual != expected {
            self.violations.push(InvariantViolation {
                description: format!("{operation} disagrees with model"),
                operation_index,
                context: format!("tree returned {actual:?}, model expected {expected:?}"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checker_accepts_correct_sequence() {
        let mut checker = ModelChecker::new(3).expect("create checker");
        let operations = [
            Operation::Put { key: b"b".to_vec(), value: 1 },
            Operation::Put { key: b"a".to_vec(), value: 2 },
            Operation::Put { key: b"b".to_vec(), value: 3 },
            Operation::Next { key: b"a".to_vec() },
            Operation::Previous { key: b"a".to_vec() },
            Operation::Remove { key: b"c".to_vec() },
            Operation::Remove { key: b"a".to_vec() },
            Operation::Get { key: b"b".to_vec() },
        ];
        let outcomes: Vec<bool> = operations.iter().map(|op| checker.apply(op)).collect();

        assert_eq!(outcomes, vec![true, true, false, true, false, false, true, true]);
        checker.check_contents();
        assert!(!checker.has_violations(), "{:?}", checker.violations());
        assert_eq!(checker.operations_applied(), 8);
        assert_eq!(checker.tree().get(b"b"), Some(&1));
    }
}
