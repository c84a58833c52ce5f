use rayon::prelude::*;
use std::collections::VecDeque;
use tracing::debug;

use crate::graph::Graph;

/// Betweenness centrality via Brandes' algorithm on unweighted paths.
///
/// Every ordered (source, target) pair contributes, so an undirected path
/// through `v` counts from both ends. Scores are scaled by
/// `1 / ((n - 1)(n - 2))` when `n > 2` and left raw otherwise, where they
/// are all zero anyway.
pub fn betweenness_centrality(graph: &Graph) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return vec![];
    }

    let adjacency: Vec<Vec<usize>> = graph
        .inner()
        .node_indices()
        .map(|idx| {
            graph
                .successor_indices(idx)
                .into_iter()
                .map(|w| w.index())
                .collect()
        })
        .collect();

    // Ordered collect, then a sequential sum: float addition order stays
    // fixed no matter how rayon schedules the sources.
    let per_source: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|s| source_dependencies(&adjacency, s))
        .collect();

    let mut bc = vec![0.0_f64; n];
    for delta in per_source {
        for (score, d) in bc.iter_mut().zip(delta) {
            *score += d;
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for score in bc.iter_mut() {
            *score *= scale;
        }
    }

    debug!("Computed betweenness for {} nodes", n);
    bc
}

/// Dependency of `s` on every other node: one BFS plus back-propagation.
fn source_dependencies(adjacency: &[Vec<usize>], s: usize) -> Vec<f64> {
    let n = adjacency.len();
    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![vec![]; n];
    let mut sigma = vec![0.0_f64; n];
    let mut dist = vec![-1i64; n];
    let mut delta = vec![0.0_f64; n];

    sigma[s] = 1.0;
    dist[s] = 0;

    let mut queue = VecDeque::new();
    queue.push_back(s);

    while let Some(v) = queue.pop_front() {
        stack.push(v);
        for &w in &adjacency[v] {
            if dist[w] < 0 {
                queue.push_back(w);
                dist[w] = dist[v] + 1;
            }
            if dist[w] == dist[v] + 1 {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
        }
    }
    delta[s] = 0.0;
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{edge_record, node_record};
    use crate::GraphModelBuilder;

    fn path(directed: bool) -> Graph {
        let nodes = vec![node_record("a", "a"), node_record("b", "b"), node_record("c", "c")];
        let edges = vec![edge_record("a", "b", 1), edge_record("b", "c", 1)];
        GraphModelBuilder::new().build(&nodes, &edges, directed).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn undirected_path_midpoint_is_one() {
        let bc = betweenness_centrality(&path(false));
        assert!(close(bc[0], 0.0));
        assert!(close(bc[1], 1.0));
        assert!(close(bc[2], 0.0));
    }

    #[test]
    fn directed_path_midpoint_is_half() {
        let bc = betweenness_centrality(&path(true));
        assert!(close(bc[1], 0.5));
    }

    #[test]
    fn star_centre_carries_all_paths() {
        let nodes: Vec<_> = ["hub", "x", "y", "z"]
            .iter()
            .map(|id| node_record(id, id))
            .collect();
        let edges = vec![
            edge_record("hub", "x", 1),
            edge_record("hub", "y", 1),
            edge_record("hub", "z", 1),
        ];
        let g = GraphModelBuilder::new().build(&nodes, &edges, false).unwrap();
        let bc = betweenness_centrality(&g);
        assert!(close(bc[0], 1.0));
        assert!(bc[1..].iter().all(|&b| close(b, 0.0)));
    }

    #[test]
    fn disconnected_pairs_contribute_nothing() {
        let nodes: Vec<_> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| node_record(id, id))
            .collect();
        let edges = vec![edge_record("a", "b", 1), edge_record("c", "d", 1)];
        let g = GraphModelBuilder::new().build(&nodes, &edges, false).unwrap();
        assert!(betweenness_centrality(&g).iter().all(|&b| close(b, 0.0)));
    }

    #[test]
    fn empty_and_single() {
        assert!(betweenness_centrality(&Graph::new(false)).is_empty());
        let g = GraphModelBuilder::new()
            .build(&[node_record("solo", "solo")], &[], true)
            .unwrap();
        assert_eq!(betweenness_centrality(&g), vec![0.0]);
    }
}
