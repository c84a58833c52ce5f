use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::attr::{AttrValue, Attributes};
use crate::error::{GraphError, Result};

pub const SIZE: &str = "size";
pub const COLOR: &str = "color";
pub const TOTAL_INTERACTIONS: &str = "total_interactions";
pub const BETWEENNESS: &str = "betweenness";
pub const COMMUNITY_ID: &str = "community_id";
pub const COMMUNITY_COLOR: &str = "community_color";
pub const DEGREE: &str = "degree";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NodeData {
    pub id: String,
    pub label: String,
    pub attributes: Attributes,
}

impl NodeData {
    pub fn new(id: &str, label: &str) -> Self {
        NodeData {
            id: id.to_string(),
            label: label.to_string(),
            attributes: Attributes::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        self.attr(key).and_then(AttrValue::as_f64)
    }

    pub fn total_interactions(&self) -> Option<f64> {
        self.attr_f64(TOTAL_INTERACTIONS)
    }

    pub fn betweenness(&self) -> Option<f64> {
        self.attr_f64(BETWEENNESS)
    }

    pub fn community_id(&self) -> Option<usize> {
        match self.attr(COMMUNITY_ID) {
            Some(AttrValue::Int(i)) if *i >= 0 => Some(*i as usize),
            _ => None,
        }
    }

    pub fn community_color(&self) -> Option<&str> {
        self.attr(COMMUNITY_COLOR).and_then(AttrValue::as_str)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EdgeData {
    pub weight: f64,
    pub attributes: Attributes,
}

impl EdgeData {
    pub fn new(weight: f64) -> Self {
        EdgeData {
            weight,
            attributes: Attributes::new(),
        }
    }
}

/// Borrowed view of one edge with its endpoint ids resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeView<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub data: &'a EdgeData,
}

impl EdgeView<'_> {
    pub fn weight(&self) -> f64 {
        self.data.weight
    }
}

/// Attributed interaction graph.
///
/// Storage is always a petgraph `DiGraph`; `directed` decides whether the
/// stored orientation carries meaning. For undirected graphs `(a, b)` and
/// `(b, a)` address the same edge and adjacency ignores orientation.
#[derive(Clone, Debug)]
pub struct Graph {
    inner: DiGraph<NodeData, EdgeData>,
    index: HashMap<String, NodeIndex>,
    directed: bool,
}

impl Graph {
    pub fn new(directed: bool) -> Self {
        Graph {
            inner: DiGraph::new(),
            index: HashMap::new(),
            directed,
        }
    }

    pub(crate) fn from_inner(inner: DiGraph<NodeData, EdgeData>, directed: bool) -> Self {
        let index = inner
            .node_indices()
            .map(|idx| (inner[idx].id.clone(), idx))
            .collect();
        Graph {
            inner,
            index,
            directed,
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&NodeData> {
        self.index.get(id).map(|&idx| &self.inner[idx])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> {
        self.inner.node_weights()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes().map(|n| n.id.as_str())
    }

    /// Edges in insertion order, endpoints as stored.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
        self.inner.edge_references().map(|e| EdgeView {
            source: &self.inner[e.source()].id,
            target: &self.inner[e.target()].id,
            data: e.weight(),
        })
    }

    /// Looks up an edge. Undirected graphs match either orientation.
    pub fn edge(&self, source: &str, target: &str) -> Option<EdgeView<'_>> {
        let a = *self.index.get(source)?;
        let b = *self.index.get(target)?;
        let e = self.find_edge_index(a, b)?;
        let (s, t) = self.inner.edge_endpoints(e)?;
        Some(EdgeView {
            source: &self.inner[s].id,
            target: &self.inner[t].id,
            data: &self.inner[e],
        })
    }

    /// Ids adjacent to `id` in either direction, each listed once, in
    /// insertion order of the neighbours.
    pub fn neighbors(&self, id: &str) -> Result<Vec<&str>> {
        let idx = self
            .index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::NotFound(id.to_string()))?;
        Ok(self
            .neighbor_indices(idx)
            .into_iter()
            .map(|n| self.inner[n].id.as_str())
            .collect())
    }

    /// Sum of incident edge weights; a self-loop counts at both ends.
    pub fn weighted_degree(&self, id: &str) -> Option<f64> {
        self.index.get(id).map(|&idx| self.incident_weight(idx))
    }

    /// Min and max of a numeric node attribute over the nodes that carry it.
    pub fn attribute_range(&self, key: &str) -> Option<(f64, f64)> {
        self.nodes()
            .filter_map(|n| n.attr_f64(key))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Min and max edge weight, `None` for an edgeless graph.
    pub fn weight_range(&self) -> Option<(f64, f64)> {
        self.inner
            .edge_weights()
            .map(|e| e.weight)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Node ids ordered by `total_interactions`, highest first. Nodes
    /// without the attribute sort last; ties keep insertion order.
    pub fn nodes_by_total_interactions(&self) -> Vec<&str> {
        let mut nodes: Vec<&NodeData> = self.nodes().collect();
        nodes.sort_by(|a, b| {
            let a = a.total_interactions().unwrap_or(f64::NEG_INFINITY);
            let b = b.total_interactions().unwrap_or(f64::NEG_INFINITY);
            b.total_cmp(&a)
        });
        nodes.into_iter().map(|n| n.id.as_str()).collect()
    }

    pub fn stats(&self) -> String {
        format!(
            "Nodes: {}, Edges: {}, Directed: {}",
            self.node_count(),
            self.edge_count(),
            self.directed
        )
    }

    // Mutation is crate-private: only the builder and annotators touch a
    // graph before it is handed out.

    pub(crate) fn inner(&self) -> &DiGraph<NodeData, EdgeData> {
        &self.inner
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub(crate) fn upsert_node(&mut self, node: NodeData) -> NodeIndex {
        match self.index.get(&node.id) {
            Some(&idx) => {
                self.inner[idx] = node;
                idx
            }
            None => {
                let id = node.id.clone();
                let idx = self.inner.add_node(node);
                self.index.insert(id, idx);
                idx
            }
        }
    }

    pub(crate) fn upsert_edge(&mut self, a: NodeIndex, b: NodeIndex, data: EdgeData) -> EdgeIndex {
        match self.find_edge_index(a, b) {
            Some(e) => {
                let existing = &mut self.inner[e];
                existing.weight = data.weight;
                existing.attributes.extend(data.attributes);
                e
            }
            None => self.inner.add_edge(a, b, data),
        }
    }

    pub(crate) fn set_node_attr(&mut self, idx: NodeIndex, key: &str, value: AttrValue) {
        self.inner[idx].attributes.insert(key.to_string(), value);
    }

    pub(crate) fn find_edge_index(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        if self.directed {
            self.inner.find_edge(a, b)
        } else {
            self.inner.find_edge_undirected(a, b).map(|(e, _)| e)
        }
    }

    pub(crate) fn incident_weight(&self, idx: NodeIndex) -> f64 {
        let outgoing: f64 = self
            .inner
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.weight().weight)
            .sum();
        let incoming: f64 = self
            .inner
            .edges_directed(idx, Direction::Incoming)
            .map(|e| e.weight().weight)
            .sum();
        outgoing + incoming
    }

    /// Distinct neighbours of `idx` ignoring orientation, self excluded.
    pub(crate) fn neighbor_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut adjacent: Vec<NodeIndex> = self
            .inner
            .neighbors_undirected(idx)
            .filter(|&n| n != idx)
            .collect();
        adjacent.sort();
        adjacent.dedup();
        adjacent
    }

    /// Successors used for shortest paths: outgoing for directed graphs,
    /// all neighbours otherwise.
    pub(crate) fn successor_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        if self.directed {
            let mut out: Vec<NodeIndex> = self.inner.neighbors(idx).filter(|&n| n != idx).collect();
            out.sort();
            out.dedup();
            out
        } else {
            self.neighbor_indices(idx)
        }
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.directed == other.directed
            && self.nodes().eq(other.nodes())
            && self.edges().eq(other.edges())
    }
}
