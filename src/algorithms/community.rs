use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use tracing::debug;

use crate::graph::{EdgeData, Graph};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CommunityOptions {
    /// Weight of the null-model term; 1.0 is classic modularity.
    pub resolution: f64,
    /// Use edge weights instead of counting every edge as 1.
    pub weighted: bool,
}

impl Default for CommunityOptions {
    fn default() -> Self {
        CommunityOptions {
            resolution: 1.0,
            weighted: false,
        }
    }
}

impl CommunityOptions {
    fn edge_weight(&self, edge: &EdgeData) -> f64 {
        if self.weighted { edge.weight } else { 1.0 }
    }
}

/// Candidate merge of communities `u < v` with modularity gain `gain`.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    gain: f64,
    u: usize,
    v: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Max-heap on gain; equal gains pop the lowest (u, v) pair first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain
            .total_cmp(&other.gain)
            .then_with(|| other.u.cmp(&self.u))
            .then_with(|| other.v.cmp(&self.v))
    }
}

impl Candidate {
    fn new(gain: f64, a: usize, b: usize) -> Self {
        Candidate {
            gain,
            u: a.min(b),
            v: a.max(b),
        }
    }
}

/// Per-node null-model terms: out/in strength over `m` (directed) or half
/// the degree over `m` on both sides (undirected). Also returns `m`.
fn degree_terms(graph: &Graph, options: &CommunityOptions) -> (Vec<f64>, Vec<f64>, f64) {
    let n = graph.node_count();
    let mut out_w = vec![0.0_f64; n];
    let mut in_w = vec![0.0_f64; n];
    let mut m = 0.0_f64;
    for e in graph.inner().edge_references() {
        let w = options.edge_weight(e.weight());
        out_w[e.source().index()] += w;
        in_w[e.target().index()] += w;
        m += w;
    }
    if m == 0.0 {
        return (vec![0.0; n], vec![0.0; n], 0.0);
    }
    if graph.is_directed() {
        let a = out_w.iter().map(|k| k / m).collect();
        let b = in_w.iter().map(|k| k / m).collect();
        (a, b, m)
    } else {
        let a: Vec<f64> = out_w
            .iter()
            .zip(&in_w)
            .map(|(o, i)| (o + i) / (2.0 * m))
            .collect();
        (a.clone(), a, m)
    }
}

/// Clauset–Newman–Moore greedy modularity communities.
///
/// Starts from singletons and keeps merging the connected pair with the
/// largest modularity gain while that gain is strictly positive. Candidate
/// merges live in a max-heap with lazy invalidation: stale entries are
/// recognised by comparing against the current gain table when popped.
///
/// Returned groups hold node positions in ascending order and are sorted by
/// size, largest first; equal sizes keep the group with the earliest member
/// first.
pub fn greedy_modularity_communities(graph: &Graph, options: &CommunityOptions) -> Vec<Vec<usize>> {
    let n = graph.node_count();
    if n == 0 {
        return vec![];
    }

    let (mut a, mut b, m) = degree_terms(graph, options);
    if m == 0.0 {
        return (0..n).map(|i| vec![i]).collect();
    }
    let q0 = 1.0 / m;
    let resolution = options.resolution;

    // dq[u][v]: gain from merging u and v, kept symmetric.
    let mut dq: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
    for e in graph.inner().edge_references() {
        let (u, v) = (e.source().index(), e.target().index());
        if u == v {
            continue;
        }
        let w = options.edge_weight(e.weight());
        *dq[u].entry(v).or_default() += w;
        *dq[v].entry(u).or_default() += w;
    }
    for u in 0..n {
        for (&v, gain) in dq[u].iter_mut() {
            *gain = q0 * *gain - resolution * (a[u] * b[v] + b[u] * a[v]);
        }
    }

    let mut heap = BinaryHeap::new();
    for u in 0..n {
        for (&v, &gain) in dq[u].range(u + 1..) {
            heap.push(Candidate::new(gain, u, v));
        }
    }

    let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    let mut alive = vec![true; n];
    let mut merges = 0usize;

    while let Some(Candidate { gain, u, v }) = heap.pop() {
        if !alive[u] || !alive[v] || dq[u].get(&v) != Some(&gain) {
            continue;
        }
        if gain <= 0.0 {
            break;
        }

        // Fold the higher-numbered community into the lower one.
        let (keep, drop) = (u, v);
        let neighbours: BTreeSet<usize> = dq[keep]
            .keys()
            .chain(dq[drop].keys())
            .copied()
            .filter(|&w| w != keep && w != drop)
            .collect();

        for w in neighbours {
            let updated = match (dq[keep].get(&w), dq[drop].get(&w)) {
                (Some(&kw), Some(&dw)) => kw + dw,
                (Some(&kw), None) => kw - resolution * (a[drop] * b[w] + a[w] * b[drop]),
                (None, Some(&dw)) => dw - resolution * (a[keep] * b[w] + a[w] * b[keep]),
                (None, None) => continue,
            };
            dq[keep].insert(w, updated);
            dq[w].insert(keep, updated);
            dq[w].remove(&drop);
            heap.push(Candidate::new(updated, keep, w));
        }

        dq[drop].clear();
        dq[keep].remove(&drop);
        alive[drop] = false;
        let absorbed = std::mem::take(&mut members[drop]);
        members[keep].extend(absorbed);
        a[keep] += a[drop];
        b[keep] += b[drop];
        merges += 1;
    }

    let mut communities: Vec<Vec<usize>> = members
        .into_iter()
        .zip(alive)
        .filter_map(|(mut group, live)| {
            live.then(|| {
                group.sort_unstable();
                group
            })
        })
        .collect();
    communities.sort_by(|x, y| y.len().cmp(&x.len()).then_with(|| x[0].cmp(&y[0])));

    debug!(
        "Greedy modularity: {} merges, {} communities",
        merges,
        communities.len()
    );
    communities
}

/// Modularity of a partition given as node positions.
///
/// Undirected: `sum_c L_c / m - r * (K_c / 2m)^2`.
/// Directed: `sum_c L_c / m - r * Kout_c * Kin_c / m^2`.
/// An edgeless graph scores 0.
pub fn modularity(graph: &Graph, communities: &[Vec<usize>], options: &CommunityOptions) -> f64 {
    let n = graph.node_count();
    let mut label = vec![usize::MAX; n];
    for (c, group) in communities.iter().enumerate() {
        for &i in group {
            if i < n {
                label[i] = c;
            }
        }
    }

    let k = communities.len();
    let mut internal = vec![0.0_f64; k];
    let mut out_strength = vec![0.0_f64; k];
    let mut in_strength = vec![0.0_f64; k];
    let mut m = 0.0_f64;

    for e in graph.inner().edge_references() {
        let w = options.edge_weight(e.weight());
        let (cu, cv) = (label[e.source().index()], label[e.target().index()]);
        m += w;
        if cu != usize::MAX {
            out_strength[cu] += w;
        }
        if cv != usize::MAX {
            in_strength[cv] += w;
        }
        if cu == cv && cu != usize::MAX {
            internal[cu] += w;
        }
    }
    if m == 0.0 {
        return 0.0;
    }

    (0..k)
        .map(|c| {
            let null_term = if graph.is_directed() {
                out_strength[c] * in_strength[c] / (m * m)
            } else {
                let degree = out_strength[c] + in_strength[c];
                (degree / (2.0 * m)).powi(2)
            };
            internal[c] / m - options.resolution * null_term
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{edge_record, node_record, Record};
    use crate::GraphModelBuilder;

    fn build(ids: &[&str], edges: &[(&str, &str)], directed: bool) -> Graph {
        let nodes: Vec<Record> = ids.iter().map(|id| node_record(id, id)).collect();
        let edges: Vec<Record> = edges.iter().map(|(s, t)| edge_record(s, t, 1)).collect();
        GraphModelBuilder::new().build(&nodes, &edges, directed).unwrap()
    }

    fn two_triangles(directed: bool) -> Graph {
        build(
            &["a", "b", "c", "d", "e", "f"],
            &[
                ("a", "b"),
                ("b", "c"),
                ("c", "a"),
                ("d", "e"),
                ("e", "f"),
                ("f", "d"),
                ("c", "d"),
            ],
            directed,
        )
    }

    fn assert_partition(communities: &[Vec<usize>], n: usize) {
        let mut seen = vec![false; n];
        for group in communities {
            for &i in group {
                assert!(!seen[i], "node {} appears twice", i);
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "some node left uncovered");
    }

    #[test]
    fn bridged_triangles_split_in_two() {
        let g = two_triangles(false);
        let communities = greedy_modularity_communities(&g, &CommunityOptions::default());
        assert_eq!(communities, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        let q = modularity(&g, &communities, &CommunityOptions::default());
        assert!((q - 5.0 / 14.0).abs() < 1e-9, "modularity was {}", q);
    }

    #[test]
    fn directed_triangles_also_split() {
        let g = two_triangles(true);
        let communities = greedy_modularity_communities(&g, &CommunityOptions::default());
        assert_partition(&communities, 6);
        assert_eq!(communities.len(), 2);
    }

    #[test]
    fn isolates_stay_singletons() {
        let g = build(&["a", "b", "c", "lonely"], &[("a", "b"), ("b", "c")], false);
        let communities = greedy_modularity_communities(&g, &CommunityOptions::default());
        assert_partition(&communities, 4);
        assert!(communities.contains(&vec![3]));
    }

    #[test]
    fn edgeless_and_empty_graphs() {
        let g = build(&["x", "y"], &[], false);
        assert_eq!(
            greedy_modularity_communities(&g, &CommunityOptions::default()),
            vec![vec![0], vec![1]]
        );
        assert!(greedy_modularity_communities(&Graph::new(true), &CommunityOptions::default()).is_empty());
        assert_eq!(modularity(&g, &[vec![0], vec![1]], &CommunityOptions::default()), 0.0);
    }

    #[test]
    fn merging_never_lowers_modularity() {
        let g = two_triangles(false);
        let options = CommunityOptions::default();
        let singletons: Vec<Vec<usize>> = (0..6).map(|i| vec![i]).collect();
        let found = greedy_modularity_communities(&g, &options);
        assert!(modularity(&g, &found, &options) > modularity(&g, &singletons, &options));
    }

    #[test]
    fn candidate_ties_prefer_lowest_pair() {
        let mut heap = BinaryHeap::new();
        heap.push(Candidate::new(0.5, 3, 4));
        heap.push(Candidate::new(0.5, 1, 2));
        heap.push(Candidate::new(0.1, 0, 1));
        let first = heap.pop().unwrap();
        assert_eq!((first.u, first.v), (1, 2));
    }
}
