use crate::data::{DataNodeId, DataTree};
use crate::models::SchemaProjectionNode;

/// Budgeted expansion walks. One signed budget is threaded through every
/// entry point of a single projection pass; a unit is charged at the deepest
/// step that consumed nothing below it, so expanding a node whose children
/// already consumed budget costs nothing extra at that level. The budget may
/// go negative; `<= 0` at the end of the pass means truncation.

/// Apply `expand="1"` markers produced by the projector, depth first.
pub fn expand_marked(tree: &mut DataTree, node: DataNodeId, mut budget: i64) -> i64 {
  if tree.attr(node, "expand") == Some("1") && budget > 0 {
    let before = budget;
    tree.set_expanded(node, true);
    let children: Vec<DataNodeId> = tree.visible_children(node).collect();
    for child in children {
      budget = expand_marked(tree, child, budget);
    }
    if budget == before {
      budget -= 1;
    }
  }
  budget
}

/// Expand along an explicit schema-derived segment path: at each level, every
/// sibling whose name equals the next segment is expanded and recursed into
/// with the remainder. Every sibling iteration that leads to no further
/// consumption costs one unit.
pub fn expand_along_path(
  tree: &mut DataTree,
  nodes: &[DataNodeId],
  path: &[String],
  mut budget: i64,
) -> i64 {
  let Some((hop, rest)) = path.split_first() else {
    return budget;
  };
  if budget < 1 {
    return budget;
  }
  for &node in nodes {
    let before = budget;
    if tree.name(node) == hop {
      tree.set_expanded(node, true);
      let children: Vec<DataNodeId> = tree.visible_children(node).collect();
      budget = expand_along_path(tree, &children, rest, budget);
    }
    if budget == before {
      budget -= 1;
    }
  }
  budget
}

/// Schema-side variant of [`expand_marked`] over the owned projection tree.
pub fn expand_marked_schema(node: &mut SchemaProjectionNode, mut budget: i64) -> i64 {
  if node.expand && budget > 0 {
    let before = budget;
    node.expanded = true;
    for child in node.children.iter_mut() {
      budget = expand_marked_schema(child, budget);
    }
    if budget == before {
      budget -= 1;
    }
  }
  budget
}
