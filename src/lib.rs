//! Attributed interaction graphs for network dashboards.
//!
//! Node and edge tables go in, an annotated graph comes out: total
//! interaction weight, betweenness centrality and greedy-modularity
//! communities per node, plus pure filters that derive smaller graphs for
//! display.
//!
//! ```
//! use interaction_graph::generate::{sample_edges, sample_nodes};
//! use interaction_graph::GraphModelBuilder;
//!
//! let builder = GraphModelBuilder::new();
//! let graph = builder.build(&sample_nodes(), &sample_edges(), true)?;
//! let (graph, partition) = builder.annotate_all(graph);
//!
//! let strong = graph.filter_by_edge_weight(5.0);
//! assert!(strong.edges().all(|e| e.weight() >= 5.0));
//! assert!(partition.covers(&graph));
//! # Ok::<(), interaction_graph::GraphError>(())
//! ```

pub mod algorithms;
pub mod attr;
pub mod builder;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod generate;
pub mod graph;
pub mod partition;
pub mod table;

pub use algorithms::{GraphAlgorithms, StandardAlgorithms};
pub use attr::{AttrValue, Record};
pub use builder::GraphModelBuilder;
pub use config::ViewConfig;
pub use error::{GraphError, Result};
pub use filter::{FilterSettings, GraphView, NeighborhoodSummary};
pub use graph::{EdgeData, EdgeView, Graph, NodeData};
pub use partition::Partition;
