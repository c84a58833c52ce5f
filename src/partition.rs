use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::graph::Graph;

/// Ordered community partition of a graph's node ids.
///
/// Position in `communities` is the community id written to the nodes.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Partition {
    pub communities: Vec<Vec<String>>,
    pub modularity: f64,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<String>> {
        self.communities.iter()
    }

    pub fn community_of(&self, id: &str) -> Option<usize> {
        self.communities
            .iter()
            .position(|members| members.iter().any(|m| m == id))
    }

    /// Community id per node id.
    pub fn labels(&self) -> HashMap<&str, usize> {
        self.communities
            .iter()
            .enumerate()
            .flat_map(|(c, members)| members.iter().map(move |m| (m.as_str(), c)))
            .collect()
    }

    /// The partition restricted to nodes present in `graph`, e.g. a filtered
    /// view. Every community keeps its slot, possibly empty, so cluster
    /// positions still line up with community ids.
    pub fn clusters_within(&self, graph: &Graph) -> Vec<Vec<String>> {
        self.communities
            .iter()
            .map(|members| {
                members
                    .iter()
                    .filter(|id| graph.contains_node(id))
                    .cloned()
                    .collect()
            })
            .collect()
    }

    /// True when every node of `graph` is in exactly one community and the
    /// partition names no other ids.
    pub fn covers(&self, graph: &Graph) -> bool {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for id in self.communities.iter().flatten() {
            *seen.entry(id.as_str()).or_default() += 1;
        }
        seen.len() == graph.node_count()
            && graph.node_ids().all(|id| seen.get(id) == Some(&1))
    }
}
