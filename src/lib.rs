mod correlate;
mod data;
mod engine;
mod expander;
mod key_index;
mod models;
mod projector;
mod schema;
mod subtree_filter;

pub use crate::correlate::{
  caption_for, decode_time_interval, decode_value, filter_path, resolve, TIME_INTERVAL_TYPE,
};
pub use crate::data::{DataNodeId, DataTree};
pub use crate::engine::{CoreError, EngineOptions, ExplorerEngine, Retrieval, RetrievalError};
pub use crate::expander::{expand_along_path, expand_marked, expand_marked_schema};
pub use crate::key_index::ParentKeyIndex;
pub use crate::models::{
  DataProjection, Datastore, DetailField, NodeDetails, RetrievalCommand, SchemaProjection,
  SchemaProjectionNode,
};
pub use crate::projector::{project_data_tree, project_schema_tree};
pub use crate::schema::{NodeKind, SchemaForest, SchemaNode, SchemaNodeId, SchemaNodeSpec};
pub use crate::subtree_filter::{build_fragments, cache_key, minimal_selection};
