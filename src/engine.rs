use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::correlate;
use crate::data::{DataNodeId, DataTree};
use crate::expander;
use crate::key_index::ParentKeyIndex;
use crate::models::{
  DataProjection, Datastore, DetailField, NodeDetails, RetrievalCommand, SchemaProjection,
};
use crate::projector;
use crate::schema::{SchemaForest, SchemaNodeId};
use crate::subtree_filter;

#[derive(Debug, Error)]
pub enum CoreError {
  #[error("retrieval failed: {0}")]
  Retrieval(String),
  #[error("unknown schema node")]
  UnknownNode,
}

/// Failure signal from the external retrieval transport. Refusal of
/// operational data is recoverable by falling back to a configuration-only
/// retrieval; anything else is surfaced verbatim.
#[derive(Debug, Error)]
pub enum RetrievalError {
  #[error("operational data refused: {0}")]
  Refused(String),
  #[error("{0}")]
  Failed(String),
}

/// The excluded transport collaborator: open a session, issue a get or
/// get-config style request for the given filter fragments, return a
/// complete data tree or a failure.
pub trait Retrieval {
  fn get(&mut self, filter: &[String]) -> Result<DataTree, RetrievalError>;

  fn get_config(
    &mut self,
    datastore: Datastore,
    filter: &[String],
    command: RetrievalCommand,
  ) -> Result<DataTree, RetrievalError>;
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
  /// Shared auto-expansion budget per projection pass.
  pub expand_budget: i64,
}

impl Default for EngineOptions {
  fn default() -> Self {
    Self { expand_budget: 100 }
  }
}

struct CacheEntry {
  key: String,
  datastore: Option<Datastore>,
  tree: DataTree,
}

/// Facade over the core: holds the loaded schema forest, the parent-key
/// index and the retrieval cache, and produces the filtered projections the
/// presentation layer renders.
pub struct ExplorerEngine {
  options: EngineOptions,
  forest: SchemaForest,
  key_index: Mutex<ParentKeyIndex>,
  cache: Mutex<Option<CacheEntry>>,
}

impl ExplorerEngine {
  pub fn new(options: EngineOptions) -> Self {
    Self {
      options,
      forest: SchemaForest::new(),
      key_index: Mutex::new(ParentKeyIndex::new()),
      cache: Mutex::new(None),
    }
  }

  /// Replace the schema forest wholesale (schema refresh). Rebuilds the
  /// parent-key index over every module and drops the retrieval cache; old
  /// schema node ids become invalid.
  pub fn load_schema(&mut self, forest: SchemaForest) {
    let mut index = ParentKeyIndex::new();
    index.rebuild(&forest, forest.module_ids().to_vec());
    debug!(modules = forest.module_ids().len(), key_pairs = index.len(), "schema loaded");
    self.forest = forest;
    *self.key_index.lock() = index;
    *self.cache.lock() = None;
  }

  pub fn schema(&self) -> &SchemaForest {
    &self.forest
  }

  /// Filter the schema forest by a module query (matched against module
  /// names or descriptions) and a node query, and pre-open up to the budget.
  /// The parent-key index is rebuilt over the matched modules before any
  /// projection reads it.
  pub fn project_schema(&self, module_query: &str, node_query: &str) -> SchemaProjection {
    let mq = projector::tokens(module_query);
    let matched: Vec<SchemaNodeId> = self
      .forest
      .modules()
      .filter(|m| projector::module_matches(*m, &mq))
      .map(|m| m.id())
      .collect();

    self.key_index.lock().rebuild(&self.forest, matched.clone());

    let mut roots = projector::project_schema_tree(&self.forest, &matched, node_query);
    let mut budget = self.options.expand_budget;
    for root in roots.iter_mut() {
      budget = expander::expand_marked_schema(root, budget);
    }
    let truncated = budget <= 0;
    if truncated {
      debug!(budget = self.options.expand_budget, "schema projection truncated");
    }
    SchemaProjection { roots, truncated }
  }

  /// Retrieve (or reuse) the data tree for the selected schema nodes and
  /// project it through the node/value filters and the bounded expander.
  ///
  /// The previous raw tree is reused iff the serialized filter key and the
  /// datastore are both unchanged. Operational retrieval that the device
  /// refuses falls back to a configuration-only retrieval of the running
  /// store; the fallback is reported, not raised.
  pub fn project_data(
    &self,
    retrieval: &mut dyn Retrieval,
    selected: &[SchemaNodeId],
    datastore: Option<Datastore>,
    command: RetrievalCommand,
    node_query: &str,
    value_query: &str,
  ) -> Result<DataProjection, CoreError> {
    let fragments = subtree_filter::build_fragments(&self.forest, selected);
    let key = subtree_filter::cache_key(&fragments);

    let (mut tree, reused_cache, used_config_fallback) = {
      let mut cache = self.cache.lock();
      match cache.as_ref() {
        Some(entry) if entry.key == key && entry.datastore == datastore => {
          debug!("reusing cached data tree");
          (entry.tree.clone(), true, false)
        }
        _ => {
          let (fetched, fallback) = self.fetch(retrieval, &fragments, datastore, command)?;
          *cache = Some(CacheEntry {
            key,
            datastore,
            tree: fetched.clone(),
          });
          (fetched, false, fallback)
        }
      }
    };

    {
      let index = self.key_index.lock();
      projector::project_data_tree(&mut tree, &index, node_query, value_query);
    }

    let mut budget = self.options.expand_budget;

    // Without filters, pre-open the retrieved subtrees along each selected
    // schema path so the interesting part of the tree is visible at once.
    let no_filters =
      projector::tokens(node_query).is_empty() && projector::tokens(value_query).is_empty();
    if no_filters {
      for &id in selected {
        if let Some(node) = self.forest.get(id) {
          let sensor = node.sensor_path();
          let tail = match sensor.find(':') {
            Some(i) => &sensor[i + 1..],
            None => sensor.as_str(),
          };
          let segments: Vec<String> = tail.split('/').map(str::to_string).collect();
          let roots = tree.roots().to_vec();
          budget = expander::expand_along_path(&mut tree, &roots, &segments, budget);
        }
      }
    }

    for root in tree.roots().to_vec() {
      budget = expander::expand_marked(&mut tree, root, budget);
    }

    let truncated = budget <= 0;
    if truncated {
      debug!(budget = self.options.expand_budget, "data projection truncated");
    }
    Ok(DataProjection {
      tree,
      truncated,
      reused_cache,
      used_config_fallback,
    })
  }

  fn fetch(
    &self,
    retrieval: &mut dyn Retrieval,
    fragments: &[String],
    datastore: Option<Datastore>,
    command: RetrievalCommand,
  ) -> Result<(DataTree, bool), CoreError> {
    match datastore {
      None => match retrieval.get(fragments) {
        Ok(tree) => Ok((tree, false)),
        Err(RetrievalError::Refused(msg)) => {
          warn!(%msg, "operational retrieval refused; falling back to configuration only");
          let tree = retrieval
            .get_config(Datastore::Running, fragments, command)
            .map_err(|e| CoreError::Retrieval(e.to_string()))?;
          Ok((tree, true))
        }
        Err(e) => Err(CoreError::Retrieval(e.to_string())),
      },
      Some(store) => retrieval
        .get_config(store, fragments, command)
        .map(|tree| (tree, false))
        .map_err(|e| CoreError::Retrieval(e.to_string())),
    }
  }

  /// Detail table for a selected schema node: identity, typing, keys, and
  /// the generated path variants. `data` supplies key predicates for the
  /// filter path when a correlated data node is selected.
  pub fn describe(
    &self,
    node: SchemaNodeId,
    data: Option<(&DataTree, DataNodeId)>,
  ) -> Result<NodeDetails, CoreError> {
    let n = self.forest.get(node).ok_or(CoreError::UnknownNode)?;
    let mut fields = vec![
      DetailField::new("Name", n.name()),
      DetailField::new("Namespace", n.namespace()),
      DetailField::new(
        "Type",
        format!(
          "{} ({})",
          n.kind().label(),
          if n.is_config() { "configuration" } else { "operational" }
        ),
      ),
    ];
    if !n.data_type().is_empty() {
      fields.push(DetailField::new("Data Type", n.data_type()));
    }
    let keys = n.keys().join(" ");
    if !keys.is_empty() {
      fields.push(DetailField::new("Keys", keys));
    }
    fields.push(DetailField::new("XPath", n.xpath()));
    fields.push(DetailField::new("Sensor Path", n.sensor_path()));
    fields.push(DetailField::new(
      "Filter Path",
      correlate::filter_path(&self.forest, node, data),
    ));
    fields.push(DetailField::new("Maagic Path", n.maagic_path(false)));
    fields.push(DetailField::new("Maagic QPath", n.maagic_path(true)));
    Ok(NodeDetails { fields })
  }

  /// Correlate a data node back to its schema node via namespace + path.
  pub fn resolve(&self, tree: &DataTree, node: DataNodeId) -> Option<SchemaNodeId> {
    correlate::resolve(&self.forest, tree, node)
  }

  /// Display text for a leaf value, decoding schema-declared time intervals.
  pub fn decode_value(&self, node: SchemaNodeId, raw: &str) -> String {
    correlate::decode_value(&self.forest, node, raw)
  }

  /// Caption for a data row, inlining known key-leaf values.
  pub fn caption_for(&self, tree: &DataTree, node: DataNodeId) -> String {
    let index = self.key_index.lock();
    correlate::caption_for(&self.forest, &index, tree, node)
  }

  /// Tooltip for a data row: the description of the correlated schema node,
  /// if it resolves and has one.
  pub fn tooltip_for(&self, tree: &DataTree, node: DataNodeId) -> Option<String> {
    let schema = self.resolve(tree, node)?;
    let description = self.forest.get(schema)?.description();
    if description.is_empty() {
      None
    } else {
      Some(description.to_string())
    }
  }
}
