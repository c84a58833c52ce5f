//! Output shapes for external renderers: Cytoscape elements, layout
//! requests and Graphviz DOT.

use petgraph::dot::{Config, Dot};
use petgraph::visit::EdgeRef;
use petgraph::{EdgeType, Undirected};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::attr::Attributes;
use crate::error::Result;
use crate::graph::{EdgeData, Graph, NodeData, COLOR};
use crate::partition::Partition;

/// Layout names understood by the diagram widget.
pub const LAYOUT_OPTIONS: [&str; 14] = [
    "cise",
    "fcose",
    "circle",
    "random",
    "grid",
    "concentric",
    "breadthfirst",
    "cose",
    "klay",
    "avsdf",
    "elk",
    "dagre",
    "cola",
    "spread",
];

/// The one layout that accepts community clusters as a hint.
pub const CLUSTERED_LAYOUT: &str = "cise";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Element {
    pub data: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Elements {
    pub nodes: Vec<Element>,
    pub edges: Vec<Element>,
}

/// Graph in Cytoscape.js `elements` form.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CytoscapeGraph {
    pub directed: bool,
    pub multigraph: bool,
    pub elements: Elements,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LayoutRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub clusters: Option<Vec<Vec<String>>>,
}

impl LayoutRequest {
    /// Clusters are attached only for the clustered layout, restricted to
    /// the nodes present in `graph`.
    pub fn for_graph(name: &str, graph: &Graph, partition: &Partition) -> Self {
        let clusters = (name == CLUSTERED_LAYOUT).then(|| partition.clusters_within(graph));
        LayoutRequest {
            name: name.to_string(),
            clusters,
        }
    }
}

/// Everything a diagram page needs to draw one graph.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RenderDocument {
    pub graph: CytoscapeGraph,
    pub layout: LayoutRequest,
    /// Range for mapping node size, taken from the drawn graph.
    pub size_range: Option<(f64, f64)>,
    pub weight_range: Option<(f64, f64)>,
}

impl RenderDocument {
    pub fn new(graph: &Graph, partition: &Partition, layout: &str, size_attribute: &str) -> Self {
        RenderDocument {
            graph: to_cytoscape(graph),
            layout: LayoutRequest::for_graph(layout, graph, partition),
            size_range: graph.attribute_range(size_attribute),
            weight_range: graph.weight_range(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn data_map(fixed: Vec<(&str, Value)>, attributes: &Attributes) -> Map<String, Value> {
    let mut data: Map<String, Value> = attributes
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or(Value::Null)))
        .collect();
    for (k, v) in fixed {
        data.insert(k.to_string(), v);
    }
    data
}

pub fn to_cytoscape(graph: &Graph) -> CytoscapeGraph {
    let nodes = graph
        .nodes()
        .map(|n| Element {
            data: data_map(
                vec![
                    ("id", Value::from(n.id.as_str())),
                    ("label", Value::from(n.label.as_str())),
                ],
                &n.attributes,
            ),
        })
        .collect();

    let edges = graph
        .edges()
        .map(|e| Element {
            data: data_map(
                vec![
                    ("source", Value::from(e.source)),
                    ("target", Value::from(e.target)),
                    ("weight", Value::from(e.weight())),
                ],
                &e.data.attributes,
            ),
        })
        .collect();

    CytoscapeGraph {
        directed: graph.is_directed(),
        multigraph: false,
        elements: Elements { nodes, edges },
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn node_attributes(node: &NodeData) -> String {
    let fill = node
        .community_color()
        .or_else(|| node.attr(COLOR).and_then(|c| c.as_str()));
    match fill {
        Some(color) => format!(
            "label=\"{}\", style=filled, fillcolor=\"{}\"",
            escape(&node.label),
            escape(color)
        ),
        None => format!("label=\"{}\"", escape(&node.label)),
    }
}

fn render_dot<Ty: EdgeType>(graph: &petgraph::Graph<NodeData, EdgeData, Ty>) -> String {
    format!(
        "{:?}",
        Dot::with_attr_getters(
            graph,
            &[Config::NodeNoLabel, Config::EdgeNoLabel],
            &|_, edge| format!("label=\"{}\"", edge.weight().weight),
            &|_, (_, node)| node_attributes(node),
        )
    )
}

/// Graphviz source: `graph` for undirected graphs, `digraph` otherwise.
/// Nodes are filled with their community colour, or their own `color`.
pub fn to_dot(graph: &Graph) -> String {
    if graph.is_directed() {
        render_dot(graph.inner())
    } else {
        let undirected: petgraph::Graph<NodeData, EdgeData, Undirected> =
            graph.inner().clone().into_edge_type();
        render_dot(&undirected)
    }
}
