use std::collections::HashSet;

use crate::schema::{SchemaForest, SchemaNodeId};

/// Reduce a selection to its minimal, ancestor-free subset: a selected node
/// whose ancestor is also selected is covered by the ancestor's fragment and
/// dropped. Survivor order follows the input selection order.
pub fn minimal_selection(forest: &SchemaForest, selected: &[SchemaNodeId]) -> Vec<SchemaNodeId> {
  let set: HashSet<SchemaNodeId> = selected.iter().copied().collect();
  selected
    .iter()
    .copied()
    .filter(|&id| {
      let Some(node) = forest.get(id) else { return false };
      let mut cur = node.parent();
      while let Some(p) = cur {
        if set.contains(&p.id()) {
          return false;
        }
        cur = p.parent();
      }
      true
    })
    .collect()
}

/// Render retrieval-filter fragments for a selection. Nodes without a direct
/// retrievable representation (modules) contribute each child's fragment
/// instead of one of their own.
pub fn build_fragments(forest: &SchemaForest, selected: &[SchemaNodeId]) -> Vec<String> {
  let mut fragments = Vec::new();
  for id in minimal_selection(forest, selected) {
    let Some(node) = forest.get(id) else { continue };
    match node.retrieval_fragment() {
      Some(f) => fragments.push(f),
      None => fragments.extend(node.children().filter_map(|c| c.retrieval_fragment())),
    }
  }
  fragments
}

/// The serialized key the engine compares to decide fetch-vs-reuse: plain
/// concatenation of the fragments in post-filter selection order.
pub fn cache_key(fragments: &[String]) -> String {
  fragments.concat()
}
