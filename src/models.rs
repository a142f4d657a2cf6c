use serde::{Deserialize, Serialize};

use crate::data::DataTree;
use crate::schema::SchemaNodeId;

/// Named configuration datastore on the managed device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Datastore {
  Running,
  Candidate,
  Startup,
}

/// Retrieval variant: full operational+config data, or configuration only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalCommand {
  Get,
  GetConfig,
}

/// One row of the projected schema tree, ready for a tree widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaProjectionNode {
  pub node: SchemaNodeId,
  pub caption: String,
  pub is_key: bool,
  /// Expansion marker set by the projector; consumed by the expander.
  #[serde(skip)]
  pub(crate) expand: bool,
  /// Presentation flag: pre-open this row.
  pub expanded: bool,
  pub children: Vec<SchemaProjectionNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaProjection {
  pub roots: Vec<SchemaProjectionNode>,
  /// The shared auto-expansion budget ran out before all matches were
  /// pre-opened; the caller should surface a truncation notice.
  pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataProjection {
  pub tree: DataTree,
  pub truncated: bool,
  /// The previous raw tree was reused; no retrieval call was made.
  pub reused_cache: bool,
  /// The device refused operational data and a configuration-only retrieval
  /// of the running store was used instead.
  pub used_config_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailField {
  pub label: String,
  pub value: String,
}

impl DetailField {
  pub fn new(label: &str, value: impl Into<String>) -> Self {
    Self {
      label: label.to_string(),
      value: value.into(),
    }
  }
}

/// Structured field list shown for a selected schema node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDetails {
  pub fields: Vec<DetailField>,
}

impl NodeDetails {
  pub fn get(&self, label: &str) -> Option<&str> {
    self
      .fields
      .iter()
      .find(|f| f.label == label)
      .map(|f| f.value.as_str())
  }
}
