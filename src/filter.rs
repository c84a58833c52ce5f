//! Pure graph filters.
//!
//! Every filter runs in two steps: a predicate narrows a [`GraphView`] (a
//! pair of index sets borrowed against the source graph), then the view is
//! materialised into a new, independent [`Graph`], optionally dropping the
//! nodes left without edges. The source graph is never modified.
//!
//! Directed graphs are filtered per direction: with a threshold of 100,
//! `A -> B` at 99 is dropped while `B -> A` at 101 survives. Results of a
//! directed edge-weight filter can therefore look one-sided for what is
//! really a mutual interaction.

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::{EdgeData, Graph, NodeData};

/// Read-only selection of nodes and edges of a graph.
#[derive(Clone, Debug)]
pub struct GraphView<'g> {
    graph: &'g Graph,
    nodes: HashSet<NodeIndex>,
    edges: HashSet<EdgeIndex>,
}

impl<'g> GraphView<'g> {
    pub fn full(graph: &'g Graph) -> Self {
        GraphView {
            graph,
            nodes: graph.inner().node_indices().collect(),
            edges: graph.inner().edge_indices().collect(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn retain_edges(mut self, mut keep: impl FnMut(&EdgeData) -> bool) -> Self {
        let inner = self.graph.inner();
        self.edges.retain(|&e| keep(&inner[e]));
        self
    }

    /// Keeps the nodes matching `keep` and drops edges that lost an endpoint.
    pub fn retain_nodes(mut self, mut keep: impl FnMut(&NodeData) -> bool) -> Self {
        let inner = self.graph.inner();
        self.nodes.retain(|&n| keep(&inner[n]));
        let nodes = &self.nodes;
        self.edges.retain(|&e| match inner.edge_endpoints(e) {
            Some((s, t)) => nodes.contains(&s) && nodes.contains(&t),
            None => false,
        });
        self
    }

    /// Drops nodes with no selected incident edge.
    pub fn without_isolates(mut self) -> Self {
        let inner = self.graph.inner();
        let touched: HashSet<NodeIndex> = inner
            .edge_references()
            .filter(|e| self.edges.contains(&e.id()))
            .flat_map(|e| [e.source(), e.target()])
            .collect();
        self.nodes.retain(|n| touched.contains(n));
        self
    }

    /// Copies the selection into a new graph, preserving relative order.
    pub fn materialize(&self) -> Graph {
        let inner = self.graph.inner().filter_map(
            |idx, node| self.nodes.contains(&idx).then(|| node.clone()),
            |idx, edge| self.edges.contains(&idx).then(|| edge.clone()),
        );
        Graph::from_inner(inner, self.graph.is_directed())
    }
}

/// Dashboard filter chain: edge weight (with isolate pruning), then node total.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct FilterSettings {
    pub min_edge_weight: Option<f64>,
    pub min_total_interactions: Option<f64>,
}

/// What the neighbourhood of one node amounts to relative to the whole graph.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NeighborhoodSummary {
    pub focus: String,
    /// Nodes in the neighbourhood graph, focus included.
    pub node_count: usize,
    /// `node_count` as a percentage of the full graph, two decimals.
    pub share_percent: f64,
    pub total_interactions: Option<f64>,
}

impl Graph {
    pub fn view(&self) -> GraphView<'_> {
        GraphView::full(self)
    }

    /// Edges with `weight >= threshold`, then nodes that still have an edge.
    pub fn filter_by_edge_weight(&self, threshold: f64) -> Graph {
        let filtered = self
            .view()
            .retain_edges(|e| e.weight >= threshold)
            .without_isolates()
            .materialize();
        debug!(
            "Edge weight >= {}: {} -> {}",
            threshold,
            self.stats(),
            filtered.stats()
        );
        filtered
    }

    /// Nodes with `total_interactions >= threshold` and the edges between them.
    ///
    /// A node without the attribute is judged by its weighted degree in this graph.
    pub fn filter_by_node_total(&self, threshold: f64) -> Graph {
        let filtered = self
            .view()
            .retain_nodes(|n| {
                let total = n
                    .total_interactions()
                    .or_else(|| self.weighted_degree(&n.id))
                    .unwrap_or(0.0);
                total >= threshold
            })
            .materialize();
        debug!(
            "Node total >= {}: {} -> {}",
            threshold,
            self.stats(),
            filtered.stats()
        );
        filtered
    }

    /// The focus node, everything adjacent to it in either direction, and
    /// the edges among those nodes.
    pub fn filter_by_neighborhood(&self, focus: &str) -> Result<Graph> {
        let idx = self
            .index_of(focus)
            .ok_or_else(|| GraphError::NotFound(focus.to_string()))?;
        let mut keep: HashSet<&str> = self
            .neighbor_indices(idx)
            .into_iter()
            .map(|n| self.inner()[n].id.as_str())
            .collect();
        keep.insert(focus);

        let filtered = self.view().retain_nodes(|n| keep.contains(n.id.as_str())).materialize();
        debug!("Neighbourhood of '{}': {}", focus, filtered.stats());
        Ok(filtered)
    }

    /// Applies the configured thresholds in dashboard order.
    pub fn apply_filters(&self, settings: &FilterSettings) -> Graph {
        let graph = match settings.min_edge_weight {
            Some(t) => self.filter_by_edge_weight(t),
            None => self.clone(),
        };
        match settings.min_total_interactions {
            Some(t) => graph.filter_by_node_total(t),
            None => graph,
        }
    }

    pub fn neighborhood_summary(&self, focus: &str) -> Result<NeighborhoodSummary> {
        let neighborhood = self.filter_by_neighborhood(focus)?;
        let share = if self.node_count() == 0 {
            0.0
        } else {
            neighborhood.node_count() as f64 / self.node_count() as f64 * 100.0
        };
        Ok(NeighborhoodSummary {
            focus: focus.to_string(),
            node_count: neighborhood.node_count(),
            share_percent: (share * 100.0).round() / 100.0,
            total_interactions: self.node(focus).and_then(NodeData::total_interactions),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{edge_record, node_record};
    use crate::generate::{sample_edges, sample_nodes};
    use crate::GraphModelBuilder;

    fn sample(directed: bool) -> Graph {
        let builder = GraphModelBuilder::new();
        let g = builder.build(&sample_nodes(), &sample_edges(), directed).unwrap();
        builder.annotate_total_interactions(g)
    }

    #[test]
    fn edge_weight_filter_prunes_isolates() {
        let g = sample(true).filter_by_edge_weight(7.0);
        let mut ids: Vec<_> = g.node_ids().collect();
        ids.sort();
        assert_eq!(ids, vec!["2", "3", "4"]);
        assert_eq!(g.edge_count(), 2);
        assert!(g.edges().all(|e| e.weight() >= 7.0));
    }

    #[test]
    fn edge_weight_filter_keeps_attributes() {
        let g = sample(true);
        let filtered = g.filter_by_edge_weight(4.0);
        assert_eq!(filtered.node("3"), g.node("3"));
    }

    #[test]
    fn threshold_above_everything_empties_graph() {
        let g = sample(false).filter_by_edge_weight(100.0);
        assert_eq!((g.node_count(), g.edge_count()), (0, 0));
    }

    #[test]
    fn directed_filter_works_per_direction() {
        let nodes = vec![node_record("a", "a"), node_record("b", "b")];
        let edges = vec![edge_record("a", "b", 99), edge_record("b", "a", 101)];
        let g = GraphModelBuilder::new().build(&nodes, &edges, true).unwrap();
        let filtered = g.filter_by_edge_weight(100.0);
        assert_eq!(filtered.edge_count(), 1);
        assert!(filtered.edge("b", "a").is_some());
        assert!(filtered.edge("a", "b").is_none());
    }

    #[test]
    fn node_total_filter_keeps_internal_edges() {
        // totals: 1=14, 2=19, 3=20, 4=22, 5=13
        let g = sample(true).filter_by_node_total(19.0);
        assert_eq!(g.node_ids().collect::<Vec<_>>(), vec!["2", "3", "4"]);
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn node_total_filter_without_attribute_uses_weighted_degree() {
        let g = GraphModelBuilder::new()
            .build(&sample_nodes(), &sample_edges(), true)
            .unwrap();
        assert_eq!(g.filter_by_node_total(20.0).node_ids().collect::<Vec<_>>(), vec!["3", "4"]);
    }

    #[test]
    fn node_total_filter_keeps_nodes_that_lost_every_edge() {
        let nodes = vec![node_record("h", "hub"), node_record("x", "x"), node_record("y", "y")];
        let edges = vec![edge_record("h", "x", 5), edge_record("h", "y", 5)];
        let builder = GraphModelBuilder::new();
        let g = builder.annotate_total_interactions(builder.build(&nodes, &edges, false).unwrap());
        let filtered = g.filter_by_node_total(6.0);
        assert_eq!(filtered.node_ids().collect::<Vec<_>>(), vec!["h"]);
        assert_eq!(filtered.edge_count(), 0);
    }

    #[test]
    fn neighborhood_of_three() {
        let g = sample(true);
        let n = g.filter_by_neighborhood("3").unwrap();
        assert_eq!(n.node_ids().collect::<Vec<_>>(), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(n.edge_count(), 10);
        assert!(matches!(
            g.filter_by_neighborhood("99"),
            Err(GraphError::NotFound(id)) if id == "99"
        ));
    }

    #[test]
    fn neighborhood_excludes_non_adjacent_nodes() {
        let nodes: Vec<_> = ["a", "b", "c", "d"].iter().map(|id| node_record(id, id)).collect();
        let edges = vec![edge_record("a", "b", 1), edge_record("b", "c", 1), edge_record("c", "d", 1)];
        let g = GraphModelBuilder::new().build(&nodes, &edges, false).unwrap();
        let n = g.filter_by_neighborhood("b").unwrap();
        assert_eq!(n.node_ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(n.edge_count(), 2);

        let summary = g.neighborhood_summary("b").unwrap();
        assert_eq!(summary.node_count, 3);
        assert_eq!(summary.share_percent, 75.0);
        assert_eq!(summary.total_interactions, None);
    }

    #[test]
    fn filters_leave_source_untouched() {
        let g = sample(false);
        let before = g.clone();
        let _ = g.filter_by_edge_weight(5.0);
        let _ = g.filter_by_node_total(15.0);
        let _ = g.filter_by_neighborhood("1").unwrap();
        assert_eq!(g, before);
    }

    #[test]
    fn apply_filters_chains_in_order() {
        let g = sample(true);
        let settings = FilterSettings {
            min_edge_weight: Some(4.0),
            min_total_interactions: Some(20.0),
        };
        let chained = g.apply_filters(&settings);
        assert_eq!(chained, g.filter_by_edge_weight(4.0).filter_by_node_total(20.0));
        assert_eq!(g.apply_filters(&FilterSettings::default()), g);
    }
}
