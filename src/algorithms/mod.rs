//! Graph metrics used to annotate nodes.
//!
//! - **Betweenness**: Brandes' algorithm over unweighted shortest paths
//! - **Communities**: Clauset–Newman–Moore greedy modularity maximisation
//!
//! Both sit behind [`GraphAlgorithms`] so the builder can be handed a
//! different implementation.

pub mod betweenness;
pub mod community;

pub use betweenness::betweenness_centrality;
pub use community::{greedy_modularity_communities, modularity, CommunityOptions};

use crate::graph::Graph;

/// Metric capability consumed by [`crate::GraphModelBuilder`].
///
/// Results are positional: entry `i` belongs to the `i`-th node of
/// `graph.nodes()`.
pub trait GraphAlgorithms: Send + Sync {
    /// One score per node. Must be 0 for isolates.
    fn betweenness(&self, graph: &Graph) -> Vec<f64>;

    /// Disjoint groups of node positions that together cover every node.
    /// The order of the groups is the community numbering.
    fn communities(&self, graph: &Graph) -> Vec<Vec<usize>>;

    /// Modularity of a partition given as node positions.
    fn modularity(&self, graph: &Graph, communities: &[Vec<usize>]) -> f64;
}

/// Brandes betweenness plus CNM communities.
#[derive(Clone, Debug, Default)]
pub struct StandardAlgorithms {
    pub community: CommunityOptions,
}

impl StandardAlgorithms {
    pub fn new(community: CommunityOptions) -> Self {
        StandardAlgorithms { community }
    }
}

impl GraphAlgorithms for StandardAlgorithms {
    fn betweenness(&self, graph: &Graph) -> Vec<f64> {
        betweenness_centrality(graph)
    }

    fn communities(&self, graph: &Graph) -> Vec<Vec<usize>> {
        greedy_modularity_communities(graph, &self.community)
    }

    fn modularity(&self, graph: &Graph, communities: &[Vec<usize>]) -> f64 {
        modularity(graph, communities, &self.community)
    }
}
