use std::collections::{HashMap, HashSet};

use crate::schema::{SchemaForest, SchemaNode, SchemaNodeId};

/// Flat `(parent name, key name)` lookup table captured from the schema tree.
///
/// Data nodes are identified by name strings only, so "is this leaf a list
/// key of its parent" cannot be answered from the data tree alone. The pairs
/// are recorded once per schema load or schema projection with a full
/// pre-order walk, then read-only until the next rebuild.
#[derive(Debug, Clone, Default)]
pub struct ParentKeyIndex {
  pairs: HashMap<String, HashSet<String>>,
}

impl ParentKeyIndex {
  pub fn new() -> Self {
    Self::default()
  }

  /// Clear and re-record pairs from a pre-order walk of the given module
  /// subtrees. There is no incremental update; always a whole rebuild.
  pub fn rebuild<I>(&mut self, forest: &SchemaForest, modules: I)
  where
    I: IntoIterator<Item = SchemaNodeId>,
  {
    self.pairs.clear();
    for id in modules {
      if let Some(module) = forest.get(id) {
        self.walk(module);
      }
    }
  }

  fn walk(&mut self, node: SchemaNode<'_>) {
    if node.is_key() {
      if let Some(parent) = node.parent() {
        self
          .pairs
          .entry(parent.name().to_string())
          .or_default()
          .insert(node.name().to_string());
      }
    }
    for child in node.children() {
      self.walk(child);
    }
  }

  pub fn contains(&self, parent: &str, key: &str) -> bool {
    self.pairs.get(parent).is_some_and(|keys| keys.contains(key))
  }

  pub fn len(&self) -> usize {
    self.pairs.values().map(HashSet::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.pairs.is_empty()
  }
}
