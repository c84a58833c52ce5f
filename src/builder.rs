use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::algorithms::{GraphAlgorithms, StandardAlgorithms};
use crate::attr::{AttrValue, Attributes, Record};
use crate::error::{GraphError, Result};
use crate::graph::{
    BETWEENNESS, COMMUNITY_COLOR, COMMUNITY_ID, DEGREE, EdgeData, Graph, NodeData,
    TOTAL_INTERACTIONS,
};
use crate::partition::Partition;

pub const DEFAULT_PALETTE: [&str; 5] = ["#fbf59a", "#674ea7", "#72a45d", "#f2600b", "#2986cc"];

const NODE_ID: &str = "id";
const NODE_LABEL: &str = "label";
const EDGE_SOURCE: &str = "source";
const EDGE_TARGET: &str = "target";
const EDGE_WEIGHT: &str = "weight";

/// Turns node and edge tables into an attributed [`Graph`] and annotates
/// derived per-node metrics.
///
/// Annotators take the graph by value and hand it back: attributes are
/// attached in bulk while the builder owns the graph, never afterwards.
#[derive(Clone)]
pub struct GraphModelBuilder {
    algorithms: Arc<dyn GraphAlgorithms>,
    palette: Vec<String>,
}

impl Default for GraphModelBuilder {
    fn default() -> Self {
        GraphModelBuilder {
            algorithms: Arc::new(StandardAlgorithms::default()),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl GraphModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_algorithms(mut self, algorithms: impl GraphAlgorithms + 'static) -> Self {
        self.algorithms = Arc::new(algorithms);
        self
    }

    /// Replaces the community palette. An empty palette keeps the current one.
    pub fn with_palette(mut self, palette: Vec<String>) -> Self {
        if palette.is_empty() {
            warn!("Ignoring empty community palette");
        } else {
            self.palette = palette;
        }
        self
    }

    pub fn palette(&self) -> &[String] {
        &self.palette
    }

    /// Builds a graph from node and edge records.
    ///
    /// Node records need an `id`; `label` falls back to the id and every
    /// other column becomes a node attribute. Edge records need `source`,
    /// `target` and a non-negative numeric `weight`; other columns become
    /// edge attributes. Repeated node ids and repeated edges overwrite
    /// earlier ones.
    pub fn build(&self, nodes: &[Record], edges: &[Record], directed: bool) -> Result<Graph> {
        let mut graph = Graph::new(directed);

        for (row, record) in nodes.iter().enumerate() {
            graph.upsert_node(node_from_record(row, record)?);
        }

        for (row, record) in edges.iter().enumerate() {
            let source = required(record, EDGE_SOURCE, "edge", row)?.to_string();
            let target = required(record, EDGE_TARGET, "edge", row)?.to_string();
            let weight = edge_weight(record, row)?;

            let a = graph.index_of(&source);
            let b = graph.index_of(&target);
            let (a, b) = match (a, b) {
                (Some(a), Some(b)) => (a, b),
                (None, _) => return Err(reference_error(source.clone(), target, source)),
                (_, None) => return Err(reference_error(source, target.clone(), target)),
            };

            let mut data = EdgeData::new(weight);
            data.attributes = extra_columns(record, &[EDGE_SOURCE, EDGE_TARGET, EDGE_WEIGHT]);
            graph.upsert_edge(a, b, data);
        }

        info!("Built graph: {}", graph.stats());
        Ok(graph)
    }

    /// Attaches `total_interactions`: the summed weight of every edge
    /// touching the node, in either direction.
    pub fn annotate_total_interactions(&self, mut graph: Graph) -> Graph {
        let totals: Vec<_> = graph
            .inner()
            .node_indices()
            .map(|idx| (idx, graph.incident_weight(idx)))
            .collect();
        for (idx, total) in totals {
            graph.set_node_attr(idx, TOTAL_INTERACTIONS, AttrValue::Float(total));
        }
        debug!("Annotated total interactions on {} nodes", graph.node_count());
        graph
    }

    /// Attaches `degree`: the number of distinct neighbours.
    pub fn annotate_degree(&self, mut graph: Graph) -> Graph {
        let degrees: Vec<_> = graph
            .inner()
            .node_indices()
            .map(|idx| (idx, graph.neighbor_indices(idx).len()))
            .collect();
        for (idx, degree) in degrees {
            graph.set_node_attr(idx, DEGREE, AttrValue::from(degree));
        }
        graph
    }

    /// Attaches `betweenness` from the configured algorithms.
    pub fn annotate_betweenness(&self, mut graph: Graph) -> Graph {
        let scores = self.algorithms.betweenness(&graph);
        let indices: Vec<_> = graph.inner().node_indices().collect();
        for (idx, score) in indices.into_iter().zip(scores) {
            graph.set_node_attr(idx, BETWEENNESS, AttrValue::Float(score));
        }
        debug!("Annotated betweenness on {} nodes", graph.node_count());
        graph
    }

    /// Detects communities, attaches `community_id` and `community_color`,
    /// and returns the partition alongside the graph.
    pub fn annotate_communities(&self, mut graph: Graph) -> (Graph, Partition) {
        let groups = self.algorithms.communities(&graph);
        let modularity = self.algorithms.modularity(&graph, &groups);

        let indices: Vec<_> = graph.inner().node_indices().collect();
        let mut communities = Vec::with_capacity(groups.len());
        for (community, members) in groups.iter().enumerate() {
            let color = &self.palette[community % self.palette.len()];
            let mut ids = Vec::with_capacity(members.len());
            for &position in members {
                let Some(&idx) = indices.get(position) else {
                    warn!("Community member {} is not a node position", position);
                    continue;
                };
                graph.set_node_attr(idx, COMMUNITY_ID, AttrValue::from(community));
                graph.set_node_attr(idx, COMMUNITY_COLOR, AttrValue::from(color.as_str()));
                ids.push(graph.inner()[idx].id.clone());
            }
            communities.push(ids);
        }

        info!(
            "Detected {} communities (modularity {:.4})",
            communities.len(),
            modularity
        );
        (
            graph,
            Partition {
                communities,
                modularity,
            },
        )
    }

    /// Every annotation in dashboard order: totals, degree, betweenness,
    /// communities.
    pub fn annotate_all(&self, graph: Graph) -> (Graph, Partition) {
        let graph = self.annotate_total_interactions(graph);
        let graph = self.annotate_degree(graph);
        let graph = self.annotate_betweenness(graph);
        self.annotate_communities(graph)
    }
}

fn node_from_record(row: usize, record: &Record) -> Result<NodeData> {
    let id = required(record, NODE_ID, "node", row)?.to_string();
    let label = record
        .get(NODE_LABEL)
        .map(AttrValue::to_string)
        .unwrap_or_else(|| id.clone());
    let mut node = NodeData::new(&id, &label);
    node.attributes = extra_columns(record, &[NODE_ID, NODE_LABEL]);
    Ok(node)
}

fn required<'r>(
    record: &'r Record,
    column: &str,
    table: &'static str,
    row: usize,
) -> Result<&'r AttrValue> {
    record.get(column).ok_or_else(|| {
        GraphError::schema(table, format!("row {} is missing required column '{}'", row, column))
    })
}

fn edge_weight(record: &Record, row: usize) -> Result<f64> {
    let raw = required(record, EDGE_WEIGHT, "edge", row)?;
    match raw.as_f64() {
        Some(w) if w.is_finite() && w >= 0.0 => Ok(w),
        _ => Err(GraphError::schema(
            "edge",
            format!("row {} has invalid weight '{}': expected a non-negative number", row, raw),
        )),
    }
}

fn extra_columns(record: &Record, skip: &[&str]) -> Attributes {
    record
        .iter()
        .filter(|(column, _)| !skip.contains(column))
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect()
}

fn reference_error(source_id: String, target_id: String, missing: String) -> GraphError {
    GraphError::Reference {
        source_id,
        target_id,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{edge_record, node_record};
    use crate::generate::{sample_edges, sample_nodes};
    use crate::graph::COLOR;

    #[test]
    fn build_keeps_ids_and_edges() {
        let g = GraphModelBuilder::new()
            .build(&sample_nodes(), &sample_edges(), true)
            .unwrap();
        assert_eq!(g.node_ids().collect::<Vec<_>>(), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(g.edge_count(), 10);
        assert_eq!(g.node("2").unwrap().label, "Paracetamol");
        assert_eq!(
            g.node("1").unwrap().attr(COLOR),
            Some(&AttrValue::from("#2c96c7"))
        );
        assert_eq!(g.edge("1", "3").unwrap().weight(), 6.0);
    }

    #[test]
    fn dangling_edge_is_reference_error() {
        let err = GraphModelBuilder::new()
            .build(&[node_record("1", "1")], &[edge_record("1", "2", 5)], true)
            .unwrap_err();
        match err {
            GraphError::Reference { missing, .. } => assert_eq!(missing, "2"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn missing_columns_are_schema_errors() {
        let builder = GraphModelBuilder::new();
        let no_id = Record::new().with("label", "x");
        assert!(matches!(
            builder.build(&[no_id], &[], false),
            Err(GraphError::Schema { table: "node", .. })
        ));

        let no_weight = Record::new().with("source", "1").with("target", "1");
        assert!(matches!(
            builder.build(&[node_record("1", "1")], &[no_weight], false),
            Err(GraphError::Schema { table: "edge", .. })
        ));

        let no_source = Record::new().with("target", "1").with("weight", 2);
        let no_target = Record::new().with("source", "1").with("weight", 2);
        for edge in [no_source, no_target] {
            assert!(matches!(
                builder.build(&[node_record("1", "1")], &[edge], true),
                Err(GraphError::Schema { table: "edge", .. })
            ));
        }
    }

    #[test]
    fn negative_or_text_weight_is_rejected() {
        let builder = GraphModelBuilder::new();
        let nodes = [node_record("1", "1"), node_record("2", "2")];
        assert!(builder.build(&nodes, &[edge_record("1", "2", -1)], false).is_err());
        assert!(builder.build(&nodes, &[edge_record("1", "2", "many")], false).is_err());
        assert!(builder.build(&nodes, &[edge_record("1", "2", "3")], false).is_ok());
    }

    #[test]
    fn label_defaults_to_id_and_duplicates_overwrite() {
        let nodes = vec![
            Record::new().with("id", "a").with("size", 10),
            Record::new().with("id", "b"),
            Record::new().with("id", "a").with("label", "Alpha"),
        ];
        let g = GraphModelBuilder::new().build(&nodes, &[], false).unwrap();
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.node("b").unwrap().label, "b");
        let a = g.node("a").unwrap();
        assert_eq!(a.label, "Alpha");
        assert!(a.attr("size").is_none());
    }

    #[test]
    fn total_interactions_count_both_directions() {
        let builder = GraphModelBuilder::new();
        let g = builder.build(&sample_nodes(), &sample_edges(), true).unwrap();
        let g = builder.annotate_total_interactions(g);
        assert_eq!(g.node("1").unwrap().total_interactions(), Some(14.0));

        let u = builder.build(&sample_nodes(), &sample_edges(), false).unwrap();
        let u = builder.annotate_total_interactions(u);
        assert_eq!(u.node("1").unwrap().total_interactions(), Some(14.0));
    }

    #[test]
    fn self_loop_counts_twice() {
        let builder = GraphModelBuilder::new();
        let g = builder
            .build(&[node_record("a", "a")], &[edge_record("a", "a", 3)], false)
            .unwrap();
        let g = builder.annotate_total_interactions(g);
        assert_eq!(g.node("a").unwrap().total_interactions(), Some(6.0));
    }

    #[test]
    fn communities_get_id_and_palette_color() {
        let builder = GraphModelBuilder::new().with_palette(vec!["red".to_string()]);
        let g = builder.build(&sample_nodes(), &sample_edges(), false).unwrap();
        let (g, partition) = builder.annotate_communities(g);
        assert!(partition.covers(&g));
        for node in g.nodes() {
            let id = node.community_id().unwrap();
            assert_eq!(partition.community_of(&node.id), Some(id));
            assert_eq!(node.community_color(), Some("red"));
        }
    }

    #[test]
    fn palette_wraps_around() {
        let nodes: Vec<Record> = (0..7).map(|i| node_record(&i.to_string(), "n")).collect();
        let builder = GraphModelBuilder::new();
        let g = builder.build(&nodes, &[], false).unwrap();
        let (g, partition) = builder.annotate_communities(g);
        assert_eq!(partition.len(), 7);
        assert_eq!(g.node("5").unwrap().community_color(), Some(DEFAULT_PALETTE[0]));
        assert_eq!(g.node("6").unwrap().community_color(), Some(DEFAULT_PALETTE[1]));
    }

    #[test]
    fn degree_counts_distinct_neighbours() {
        let builder = GraphModelBuilder::new();
        let g = builder.build(&sample_nodes(), &sample_edges(), true).unwrap();
        let g = builder.annotate_degree(g);
        assert_eq!(g.node("3").unwrap().attr(DEGREE), Some(&AttrValue::Int(4)));
    }
}
