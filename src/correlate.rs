use crate::data::{DataNodeId, DataTree};
use crate::key_index::ParentKeyIndex;
use crate::schema::{NodeKind, SchemaForest, SchemaNodeId};

/// Sentinel schema data type for hex-encoded time intervals.
pub const TIME_INTERVAL_TYPE: &str = "time-interval";

const TIME_INTERVAL_MAX: u64 = 0x7FFF_FFFF_FFFF_FFFF;

/// Slash-joined ancestor path of a data node up to and including the nearest
/// `root="1"` element, plus the effective namespace (first non-empty
/// declaration walking leaf to root).
pub(crate) fn ancestor_path(tree: &DataTree, node: DataNodeId) -> (String, String) {
  let mut segments: Vec<&str> = Vec::new();
  let mut namespace = "";
  let mut cur = Some(node);
  while let Some(id) = cur {
    segments.push(tree.name(id));
    if namespace.is_empty() && !tree.namespace(id).is_empty() {
      namespace = tree.namespace(id);
    }
    if tree.attr(id, "root") == Some("1") {
      break;
    }
    cur = tree.parent(id);
  }
  segments.reverse();
  (segments.join("/"), namespace.to_string())
}

/// Resolve a data node to its schema node: find the module whose namespace
/// matches the data node's effective namespace and look the ancestor path up
/// against it. Absence is an expected outcome of correlating independently
/// sourced trees, never an error.
pub fn resolve(
  forest: &SchemaForest,
  tree: &DataTree,
  node: DataNodeId,
) -> Option<SchemaNodeId> {
  let (path, namespace) = ancestor_path(tree, node);
  let module = forest.module_by_namespace(&namespace)?;
  module.lookup_by_path(&path).map(|n| n.id())
}

/// Decode a hex-encoded time interval. Valid iff the parsed value is
/// strictly below `0x7FFF_FFFF_FFFF_FFFF`; the displayed value discards the
/// low 16 bits, which encode sub-units.
pub fn decode_time_interval(text: &str) -> Option<u64> {
  let value = u64::from_str_radix(text.trim(), 16).ok()?;
  if value >= TIME_INTERVAL_MAX {
    return None;
  }
  Some(value >> 16)
}

/// Display text for a leaf value under a resolved schema node. Malformed
/// time intervals render a literal "Invalid" marker instead of propagating.
pub fn decode_value(forest: &SchemaForest, node: SchemaNodeId, raw: &str) -> String {
  let is_interval = forest
    .get(node)
    .is_some_and(|n| n.data_type() == TIME_INTERVAL_TYPE);
  if !is_interval {
    return raw.to_string();
  }
  match decode_time_interval(raw) {
    Some(v) => v.to_string(),
    None => "Invalid".to_string(),
  }
}

/// Caption for a data row: list entries inline their first known key leaf
/// (`name (key = value)`), leaves show `name = value` with time intervals
/// decoded, everything else shows the bare name. Key detection uses the same
/// ParentKeyIndex rule as projection-time pruning.
pub fn caption_for(
  forest: &SchemaForest,
  key_index: &ParentKeyIndex,
  tree: &DataTree,
  node: DataNodeId,
) -> String {
  let name = tree.name(node);
  for &child in tree.children(node) {
    if key_index.contains(name, tree.name(child)) {
      return format!("{} ({} = {})", name, tree.name(child), tree.text(child));
    }
  }
  if !tree.is_leaf(node) {
    return name.to_string();
  }
  let value = match resolve(forest, tree, node) {
    Some(schema) => decode_value(forest, schema, tree.text(node)),
    None => tree.text(node).to_string(),
  };
  format!("{} = {}", name, value)
}

/// Sensor path with `[key=value]` predicates interpolated at list levels from
/// a correlated data node's ancestor chain. Without data (or when the chains
/// do not line up) this degrades to the plain sensor path.
pub fn filter_path(
  forest: &SchemaForest,
  node: SchemaNodeId,
  data: Option<(&DataTree, DataNodeId)>,
) -> String {
  let Some(schema) = forest.get(node) else {
    return String::new();
  };
  let module = schema.module();
  let path = schema.path_to(module.id());
  if path.is_empty() {
    return module.name().to_string();
  }

  // Schema chain from the module child down to the node.
  let mut chain = Vec::new();
  let mut cur = schema;
  while cur.id() != module.id() {
    chain.push(cur);
    match cur.parent() {
      Some(p) => cur = p,
      None => break,
    }
  }
  chain.reverse();

  // Matching data chain, leaf to nearest root, reversed. Predicates apply
  // only when both chains describe the same path.
  let data_chain: Vec<DataNodeId> = match data {
    Some((tree, id)) => {
      let mut ids = Vec::new();
      let mut cur = Some(id);
      while let Some(d) = cur {
        ids.push(d);
        if tree.attr(d, "root") == Some("1") {
          break;
        }
        cur = tree.parent(d);
      }
      ids.reverse();
      ids
    }
    None => Vec::new(),
  };
  let aligned = data.is_some() && data_chain.len() == chain.len();

  let mut out = format!("{}:", module.name());
  for (i, level) in chain.iter().enumerate() {
    if i > 0 {
      out.push('/');
    }
    out.push_str(level.name());
    if level.kind() == NodeKind::List && aligned {
      if let Some((tree, _)) = data {
        for key in level.keys() {
          if let Some(child) = tree.find_child(data_chain[i], key) {
            out.push_str(&format!("[{}={}]", key, tree.text(child)));
          }
        }
      }
    }
  }
  out
}
