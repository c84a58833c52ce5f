//! Error types for graph construction, filtering and tabular I/O.

use thiserror::Error;

/// Errors raised while building, querying or exporting a graph.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A required column is missing, or a cell cannot be read as the
    /// type the column demands.
    #[error("Schema error in {table} table: {message}")]
    Schema {
        /// Which input table the problem was found in
        table: &'static str,
        /// What was wrong
        message: String,
    },

    /// An edge names a node id that is absent from the node table.
    #[error("Edge {source_id} -> {target_id} references unknown node '{missing}'")]
    Reference {
        /// Source id as given in the edge record
        source_id: String,
        /// Target id as given in the edge record
        target_id: String,
        /// The id that could not be resolved
        missing: String,
    },

    /// A node id requested by a query does not exist in the graph.
    #[error("Node '{0}' not found")]
    NotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GraphError {
    pub(crate) fn schema(table: &'static str, message: impl Into<String>) -> Self {
        GraphError::Schema {
            table,
            message: message.into(),
        }
    }

    /// True for errors caused by the caller's input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            GraphError::Schema { .. } | GraphError::Reference { .. } | GraphError::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
