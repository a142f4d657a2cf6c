use serde::{Deserialize, Serialize};

/// Index of a node inside a [`SchemaForest`] arena. Ids are only meaningful
/// for the forest that produced them; a schema refresh replaces the whole
/// forest and invalidates all previously handed out ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaNodeId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
  Module,
  Container,
  List,
  Leaf,
  LeafList,
}

impl NodeKind {
  pub fn label(&self) -> &'static str {
    match self {
      NodeKind::Module => "module",
      NodeKind::Container => "container",
      NodeKind::List => "list",
      NodeKind::Leaf => "leaf",
      NodeKind::LeafList => "leaf-list",
    }
  }
}

/// Construction-time description of one schema node (everything except
/// identity and tree position, which the forest assigns).
#[derive(Debug, Clone)]
pub struct SchemaNodeSpec {
  pub name: String,
  pub kind: NodeKind,
  pub is_config: bool,
  pub data_type: String,
  pub description: String,
  pub keys: Vec<String>,
}

impl SchemaNodeSpec {
  pub fn new(name: &str, kind: NodeKind) -> Self {
    Self {
      name: name.to_string(),
      kind,
      is_config: true,
      data_type: String::new(),
      description: String::new(),
      keys: Vec::new(),
    }
  }

  pub fn operational(mut self) -> Self {
    self.is_config = false;
    self
  }

  pub fn data_type(mut self, data_type: &str) -> Self {
    self.data_type = data_type.to_string();
    self
  }

  pub fn description(mut self, description: &str) -> Self {
    self.description = description.to_string();
    self
  }

  pub fn keys(mut self, keys: &[&str]) -> Self {
    self.keys = keys.iter().map(|k| k.to_string()).collect();
    self
  }
}

#[derive(Debug, Clone)]
struct SchemaNodeEntry {
  name: String,
  namespace: String,
  kind: NodeKind,
  is_config: bool,
  data_type: String,
  description: String,
  keys: Vec<String>,
  parent: Option<SchemaNodeId>,
  children: Vec<SchemaNodeId>,
}

/// Arena holding every schema node of the currently loaded models.
///
/// Children are owned exclusively by their parent's child list; parent links
/// are plain ids used for lookup only. Built once per schema refresh and
/// immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct SchemaForest {
  nodes: Vec<SchemaNodeEntry>,
  modules: Vec<SchemaNodeId>,
}

impl SchemaForest {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_module(&mut self, name: &str, namespace: &str, description: &str) -> SchemaNodeId {
    let id = SchemaNodeId(self.nodes.len() as u32);
    self.nodes.push(SchemaNodeEntry {
      name: name.to_string(),
      namespace: namespace.to_string(),
      kind: NodeKind::Module,
      is_config: true,
      data_type: String::new(),
      description: description.to_string(),
      keys: Vec::new(),
      parent: None,
      children: Vec::new(),
    });
    self.modules.push(id);
    id
  }

  /// Add a child under `parent`, inheriting the parent's namespace.
  /// Child order is schema insertion order; display re-sorts separately.
  pub fn add_child(&mut self, parent: SchemaNodeId, spec: SchemaNodeSpec) -> SchemaNodeId {
    let id = SchemaNodeId(self.nodes.len() as u32);
    let namespace = self.nodes[parent.0 as usize].namespace.clone();
    self.nodes.push(SchemaNodeEntry {
      name: spec.name,
      namespace,
      kind: spec.kind,
      is_config: spec.is_config,
      data_type: spec.data_type,
      description: spec.description,
      keys: spec.keys,
      parent: Some(parent),
      children: Vec::new(),
    });
    self.nodes[parent.0 as usize].children.push(id);
    id
  }

  pub fn get(&self, id: SchemaNodeId) -> Option<SchemaNode<'_>> {
    if (id.0 as usize) < self.nodes.len() {
      Some(SchemaNode { forest: self, id })
    } else {
      None
    }
  }

  pub fn module_ids(&self) -> &[SchemaNodeId] {
    &self.modules
  }

  pub fn modules(&self) -> impl Iterator<Item = SchemaNode<'_>> {
    self.modules.iter().map(move |&id| SchemaNode { forest: self, id })
  }

  pub fn module_by_namespace(&self, namespace: &str) -> Option<SchemaNode<'_>> {
    self.modules().find(|m| m.namespace() == namespace)
  }
}

/// Borrow handle for one schema node; cheap to copy, valid as long as the
/// forest it came from.
#[derive(Clone, Copy)]
pub struct SchemaNode<'a> {
  forest: &'a SchemaForest,
  id: SchemaNodeId,
}

impl<'a> SchemaNode<'a> {
  fn entry(&self) -> &'a SchemaNodeEntry {
    &self.forest.nodes[self.id.0 as usize]
  }

  pub fn id(&self) -> SchemaNodeId {
    self.id
  }

  pub fn name(&self) -> &'a str {
    &self.entry().name
  }

  pub fn namespace(&self) -> &'a str {
    &self.entry().namespace
  }

  pub fn kind(&self) -> NodeKind {
    self.entry().kind
  }

  pub fn is_config(&self) -> bool {
    self.entry().is_config
  }

  pub fn data_type(&self) -> &'a str {
    &self.entry().data_type
  }

  pub fn description(&self) -> &'a str {
    &self.entry().description
  }

  pub fn keys(&self) -> &'a [String] {
    &self.entry().keys
  }

  pub fn parent(&self) -> Option<SchemaNode<'a>> {
    let forest = self.forest;
    self.entry().parent.map(|id| SchemaNode { forest, id })
  }

  pub fn children(&self) -> impl Iterator<Item = SchemaNode<'a>> + 'a {
    let forest = self.forest;
    self.entry().children.iter().map(move |&id| SchemaNode { forest, id })
  }

  /// True iff this node's name appears in its parent's declared key list.
  pub fn is_key(&self) -> bool {
    match self.parent() {
      Some(p) => p.keys().iter().any(|k| k == self.name()),
      None => false,
    }
  }

  /// The module root this node belongs to (self, for modules).
  pub fn module(&self) -> SchemaNode<'a> {
    let mut cur = *self;
    while let Some(p) = cur.parent() {
      cur = p;
    }
    cur
  }

  /// Slash-joined path from (exclusive) `root` down to this node. Empty when
  /// `self` is `root`. This is the join key against data-node ancestor chains.
  pub fn path_to(&self, root: SchemaNodeId) -> String {
    let mut segments: Vec<&str> = Vec::new();
    let mut cur = *self;
    while cur.id != root {
      segments.push(cur.name());
      match cur.parent() {
        Some(p) => cur = p,
        None => break,
      }
    }
    segments.reverse();
    segments.join("/")
  }

  /// Resolve a `/`-separated path against this subtree, matching each segment
  /// against children by name. Empty path resolves to the receiver; any
  /// unmatched segment is a miss, never an error.
  pub fn lookup_by_path(&self, path: &str) -> Option<SchemaNode<'a>> {
    let mut cur = *self;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
      cur = cur.children().find(|c| c.name() == segment)?;
    }
    Some(cur)
  }

  /// Display path like `/demo-system:interfaces/interface/name`.
  pub fn xpath(&self) -> String {
    let module = self.module();
    let path = self.path_to(module.id());
    if path.is_empty() {
      format!("/{}", module.name())
    } else {
      format!("/{}:{}", module.name(), path)
    }
  }

  /// Telemetry-style path like `demo-system:interfaces/interface/name`.
  pub fn sensor_path(&self) -> String {
    let module = self.module();
    let path = self.path_to(module.id());
    if path.is_empty() {
      module.name().to_string()
    } else {
      format!("{}:{}", module.name(), path)
    }
  }

  /// Generated-accessor path: dot-joined segments, dashes mapped to
  /// underscores. The qualified variant prefixes the first segment with the
  /// module name.
  pub fn maagic_path(&self, qualified: bool) -> String {
    let module = self.module();
    let module_name = module.name().replace('-', "_");
    let path = self.path_to(module.id());
    if path.is_empty() {
      return module_name;
    }
    let segments: Vec<String> = path.split('/').map(|s| s.replace('-', "_")).collect();
    if qualified {
      let mut out = format!("{}__{}", module_name, segments[0]);
      for s in &segments[1..] {
        out.push('.');
        out.push_str(s);
      }
      out
    } else {
      segments.join(".")
    }
  }

  /// Serialized retrieval-filter fragment requesting this node's subtree:
  /// nested elements from the module child down to this node, with the module
  /// namespace declared on the outermost element. Modules have no directly
  /// retrievable representation and return `None`; their selection is covered
  /// by each child's fragment instead.
  pub fn retrieval_fragment(&self) -> Option<String> {
    if self.kind() == NodeKind::Module {
      return None;
    }
    let module = self.module();
    let mut chain: Vec<&str> = Vec::new();
    let mut cur = *self;
    while cur.id != module.id() {
      chain.push(cur.name());
      match cur.parent() {
        Some(p) => cur = p,
        None => break,
      }
    }
    if chain.is_empty() {
      return None;
    }
    chain.reverse();
    let mut xml = String::new();
    for (i, name) in chain.iter().enumerate() {
      xml.push('<');
      xml.push_str(name);
      if i == 0 {
        xml.push_str(&format!(" xmlns=\"{}\"", escape_attr(self.namespace())));
      }
      if i == chain.len() - 1 {
        xml.push_str("/>");
      } else {
        xml.push('>');
      }
    }
    for name in chain.iter().rev().skip(1) {
      xml.push_str(&format!("</{}>", name));
    }
    Some(xml)
  }
}

fn escape_attr(s: &str) -> String {
  s.replace('&', "&amp;").replace('<', "&lt;").replace('"', "&quot;")
}
