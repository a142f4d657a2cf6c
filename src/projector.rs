use crate::data::{DataNodeId, DataTree};
use crate::key_index::ParentKeyIndex;
use crate::models::SchemaProjectionNode;
use crate::schema::{SchemaForest, SchemaNode, SchemaNodeId};

/// Split a free-text query into lower-cased required substrings. All
/// whitespace behaves as empty.
pub(crate) fn tokens(query: &str) -> Vec<String> {
  query
    .to_lowercase()
    .split_whitespace()
    .map(str::to_string)
    .collect()
}

fn matches_all(hay: &str, tokens: &[String]) -> bool {
  tokens.iter().all(|t| hay.contains(t.as_str()))
}

/// Filter, prune and annotate a retrieved data tree in place.
///
/// Both queries are sticky: a name match clears the node query for the whole
/// subtree below it, and the first direct leaf child whose text matches the
/// value query marks the current node for expansion and clears the value
/// query for the rest of this subtree. Cleared state is threaded through the
/// recursion as arguments, never kept in shared mutable state.
pub fn project_data_tree(
  tree: &mut DataTree,
  key_index: &ParentKeyIndex,
  node_query: &str,
  value_query: &str,
) {
  let nq = tokens(node_query);
  let vq = tokens(value_query);
  let roots: Vec<DataNodeId> = tree.roots().to_vec();
  for root in roots {
    visit(tree, key_index, root, None, &nq, &vq);
  }
  tree.sort_roots_by_name();
}

/// Returns this subtree's keep vote toward the parent's decision; the node
/// hides itself when pruned or key-suppressed. Roots always vote true.
fn visit(
  tree: &mut DataTree,
  key_index: &ParentKeyIndex,
  node: DataNodeId,
  parent: Option<DataNodeId>,
  node_query: &[String],
  value_query: &[String],
) -> bool {
  let name = tree.name(node).to_lowercase();
  let node_ok = matches_all(&name, node_query);
  let value_vacuous = value_query.is_empty();

  match parent {
    None => tree.set_attr(node, "root", "1"),
    Some(p) if !node_query.is_empty() || !value_query.is_empty() => {
      tree.set_attr(p, "expand", "1")
    }
    Some(_) => {}
  }

  // A name match exempts the entire subtree from further name filtering.
  let child_node_query: &[String] = if node_ok && !node_query.is_empty() {
    &[]
  } else {
    node_query
  };

  // A matching direct leaf child marks this node for expansion and clears
  // the value query for everything below.
  let mut child_value_query = value_query;
  if !value_query.is_empty() {
    let children = tree.children(node).to_vec();
    for child in children {
      if tree.is_leaf(child) {
        let text = tree.text(child).to_lowercase();
        if matches_all(&text, value_query) {
          tree.set_attr(node, "expand", "1");
          child_value_query = &[];
          break;
        }
      }
    }
  }

  let children = tree.children(node).to_vec();
  let mut any_kept = false;
  for child in children {
    let keep = visit(tree, key_index, child, Some(node), child_node_query, child_value_query);
    any_kept = any_kept || keep;
  }
  tree.sort_children_by_name(node);

  let Some(p) = parent else {
    // Roots are tagged and never pruned.
    return true;
  };

  let kept = any_kept || (value_vacuous && node_ok);

  // Key-inlining suppression hides the row (the key's value is surfaced in
  // the parent's caption), but the vote still counts: a matching key leaf
  // keeps its list entry visible.
  let suppressed = key_index.contains(tree.name(p), tree.name(node));
  tree.set_hidden(node, suppressed || !kept);
  kept
}

/// True when every token matches the module name, or every token matches its
/// description.
pub(crate) fn module_matches(module: SchemaNode<'_>, module_query: &[String]) -> bool {
  matches_all(&module.name().to_lowercase(), module_query)
    || matches_all(&module.description().to_lowercase(), module_query)
}

/// Project the schema forest into an owned presentation tree: the given
/// modules, filtered by the node query with the same sticky semantics as the
/// data side, children re-sorted keys first then by name.
pub fn project_schema_tree(
  forest: &SchemaForest,
  modules: &[SchemaNodeId],
  node_query: &str,
) -> Vec<SchemaProjectionNode> {
  let nq = tokens(node_query);
  modules
    .iter()
    .filter_map(|&id| forest.get(id))
    .filter_map(|m| visit_schema(m, &nq))
    .collect()
}

fn visit_schema(node: SchemaNode<'_>, node_query: &[String]) -> Option<SchemaProjectionNode> {
  let name_ok = matches_all(&node.name().to_lowercase(), node_query);
  let child_query: &[String] = if name_ok && !node_query.is_empty() {
    &[]
  } else {
    node_query
  };

  let mut children: Vec<SchemaProjectionNode> = node
    .children()
    .filter_map(|c| visit_schema(c, child_query))
    .collect();
  children.sort_by(|a, b| (!a.is_key, a.caption.as_str()).cmp(&(!b.is_key, b.caption.as_str())));

  if children.is_empty() && !name_ok {
    return None;
  }

  Some(SchemaProjectionNode {
    node: node.id(),
    caption: node.name().to_string(),
    is_key: node.is_key(),
    // Mirror of the data side: ancestors of surviving matches open up.
    expand: !node_query.is_empty() && !children.is_empty(),
    expanded: false,
    children,
  })
}
