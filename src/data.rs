use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Index of a node inside a [`DataTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataNodeId(pub(crate) u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DataNodeEntry {
  name: String,
  /// Own namespace declaration; empty means inherited from an ancestor.
  namespace: String,
  /// Leaf value; empty for non-leaf elements.
  text: String,
  parent: Option<DataNodeId>,
  children: Vec<DataNodeId>,
  /// Transient projection markers only (`root="1"`, `expand="1"`). Any other
  /// consumer must be able to ignore these.
  attrs: HashMap<String, String>,
  /// Presentation flag written by the expander; never affects pruning.
  expanded: bool,
  /// Set by the projector when this subtree is pruned from the view. The
  /// node and its children stay in the tree so captions can still inline
  /// suppressed key-leaf values.
  hidden: bool,
}

/// One retrieved data tree. Rebuilt from scratch on every retrieval; the
/// engine's cache keeps a pristine clone and projections work on copies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataTree {
  nodes: Vec<DataNodeEntry>,
  roots: Vec<DataNodeId>,
}

impl DataTree {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_root(&mut self, name: &str, namespace: &str) -> DataNodeId {
    let id = self.push(name, None);
    self.nodes[id.0 as usize].namespace = namespace.to_string();
    self.roots.push(id);
    id
  }

  pub fn add_child(&mut self, parent: DataNodeId, name: &str) -> DataNodeId {
    let id = self.push(name, Some(parent));
    self.nodes[parent.0 as usize].children.push(id);
    id
  }

  pub fn add_leaf(&mut self, parent: DataNodeId, name: &str, text: &str) -> DataNodeId {
    let id = self.add_child(parent, name);
    self.nodes[id.0 as usize].text = text.to_string();
    id
  }

  fn push(&mut self, name: &str, parent: Option<DataNodeId>) -> DataNodeId {
    let id = DataNodeId(self.nodes.len() as u32);
    self.nodes.push(DataNodeEntry {
      name: name.to_string(),
      namespace: String::new(),
      text: String::new(),
      parent,
      children: Vec::new(),
      attrs: HashMap::new(),
      expanded: false,
      hidden: false,
    });
    id
  }

  pub fn roots(&self) -> &[DataNodeId] {
    &self.roots
  }

  pub fn name(&self, id: DataNodeId) -> &str {
    &self.nodes[id.0 as usize].name
  }

  pub fn text(&self, id: DataNodeId) -> &str {
    &self.nodes[id.0 as usize].text
  }

  pub fn set_text(&mut self, id: DataNodeId, text: &str) {
    self.nodes[id.0 as usize].text = text.to_string();
  }

  /// Own namespace declaration of this node (empty if none).
  pub fn namespace(&self, id: DataNodeId) -> &str {
    &self.nodes[id.0 as usize].namespace
  }

  pub fn set_namespace(&mut self, id: DataNodeId, namespace: &str) {
    self.nodes[id.0 as usize].namespace = namespace.to_string();
  }

  /// First non-empty namespace declaration walking from this node to the
  /// root; empty if no ancestor declares one.
  pub fn effective_namespace(&self, id: DataNodeId) -> &str {
    let mut cur = Some(id);
    while let Some(n) = cur {
      let ns = &self.nodes[n.0 as usize].namespace;
      if !ns.is_empty() {
        return ns;
      }
      cur = self.nodes[n.0 as usize].parent;
    }
    ""
  }

  pub fn parent(&self, id: DataNodeId) -> Option<DataNodeId> {
    self.nodes[id.0 as usize].parent
  }

  /// All children, including ones pruned from the view.
  pub fn children(&self, id: DataNodeId) -> &[DataNodeId] {
    &self.nodes[id.0 as usize].children
  }

  /// Children that survived projection; what a tree widget should render.
  pub fn visible_children(&self, id: DataNodeId) -> impl Iterator<Item = DataNodeId> + '_ {
    self
      .nodes[id.0 as usize]
      .children
      .iter()
      .copied()
      .filter(|&c| !self.nodes[c.0 as usize].hidden)
  }

  pub fn is_hidden(&self, id: DataNodeId) -> bool {
    self.nodes[id.0 as usize].hidden
  }

  pub(crate) fn set_hidden(&mut self, id: DataNodeId, hidden: bool) {
    self.nodes[id.0 as usize].hidden = hidden;
  }

  pub fn is_leaf(&self, id: DataNodeId) -> bool {
    self.nodes[id.0 as usize].children.is_empty()
  }

  pub fn attr(&self, id: DataNodeId, key: &str) -> Option<&str> {
    self.nodes[id.0 as usize].attrs.get(key).map(String::as_str)
  }

  pub fn set_attr(&mut self, id: DataNodeId, key: &str, value: &str) {
    self
      .nodes[id.0 as usize]
      .attrs
      .insert(key.to_string(), value.to_string());
  }

  pub fn expanded(&self, id: DataNodeId) -> bool {
    self.nodes[id.0 as usize].expanded
  }

  pub fn set_expanded(&mut self, id: DataNodeId, expanded: bool) {
    self.nodes[id.0 as usize].expanded = expanded;
  }

  pub fn find_child(&self, id: DataNodeId, name: &str) -> Option<DataNodeId> {
    self
      .children(id)
      .iter()
      .copied()
      .find(|&c| self.name(c) == name)
  }

  /// Display order: name ascending, document order among equal names (list
  /// entries share a name).
  pub(crate) fn sort_children_by_name(&mut self, id: DataNodeId) {
    let mut kids = std::mem::take(&mut self.nodes[id.0 as usize].children);
    kids.sort_by(|a, b| self.nodes[a.0 as usize].name.cmp(&self.nodes[b.0 as usize].name));
    self.nodes[id.0 as usize].children = kids;
  }

  /// Same display order for the top-level elements.
  pub(crate) fn sort_roots_by_name(&mut self) {
    let mut roots = std::mem::take(&mut self.roots);
    roots.sort_by(|a, b| self.nodes[a.0 as usize].name.cmp(&self.nodes[b.0 as usize].name));
    self.roots = roots;
  }

  /// Count of visible nodes reachable from the roots after projection.
  pub fn visible_len(&self) -> usize {
    fn walk(tree: &DataTree, id: DataNodeId, acc: &mut usize) {
      *acc += 1;
      let kids: Vec<DataNodeId> = tree.visible_children(id).collect();
      for c in kids {
        walk(tree, c, acc);
      }
    }
    let mut acc = 0;
    for &r in &self.roots {
      if !self.is_hidden(r) {
        walk(self, r, &mut acc);
      }
    }
    acc
  }
}
