//! Built-in datasets: the five-drug sample and seeded random graphs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashMap;

use crate::attr::{edge_record, node_record, Record};

const SAMPLE_LABELS: [&str; 5] = ["Aspirin", "Paracetamol", "Ibuprofen", "Codeine", "Naproxen"];
const SAMPLE_SIZES: [i64; 5] = [50, 60, 75, 40, 100];
const SAMPLE_COLORS: [&str; 5] = ["#2c96c7", "#32a852", "#bd132f", "#e6c315", "#e315e6"];
const SAMPLE_EDGES: [(&str, &str, i64); 10] = [
    ("1", "2", 3),
    ("1", "3", 6),
    ("2", "3", 4),
    ("2", "4", 7),
    ("3", "4", 8),
    ("3", "5", 2),
    ("4", "5", 4),
    ("4", "1", 3),
    ("5", "1", 2),
    ("5", "2", 5),
];

/// Five drugs with explicit size and colour columns.
pub fn sample_nodes() -> Vec<Record> {
    (0..5)
        .map(|i| {
            node_record(&(i + 1).to_string(), SAMPLE_LABELS[i])
                .with("size", SAMPLE_SIZES[i])
                .with("color", SAMPLE_COLORS[i])
        })
        .collect()
}

/// Ten weighted edges over the sample nodes; every node touches four others.
pub fn sample_edges() -> Vec<Record> {
    SAMPLE_EDGES
        .iter()
        .map(|&(s, t, w)| edge_record(s, t, w))
        .collect()
}

/// Random geometric graph: `n` points uniform in the unit square, an edge
/// of weight 1 between every pair at Euclidean distance `<= radius`.
/// Positions are kept as `pos_x` / `pos_y` node columns.
pub fn random_geometric_graph(n: usize, radius: f64, seed: u64) -> (Vec<Record>, Vec<Record>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let positions: Vec<(f64, f64)> = (0..n)
        .map(|_| (rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
        .collect();

    let nodes = positions
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| {
            let id = i.to_string();
            node_record(&id, &id).with("pos_x", x).with("pos_y", y)
        })
        .collect();

    let r2 = radius * radius;
    let edges = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            let positions = &positions;
            ((i + 1)..n).filter_map(move |j| {
                let (dx, dy) = (positions[i].0 - positions[j].0, positions[i].1 - positions[j].1);
                (dx * dx + dy * dy <= r2).then(|| edge_record(&i.to_string(), &j.to_string(), 1))
            })
        })
        .collect();

    (nodes, edges)
}

/// Random interaction log between `users` people: `interactions` draws of
/// an ordered pair with weight 1..=20. Repeated pairs are summed into one
/// edge. Self-interactions are skipped.
pub fn random_interactions(users: usize, interactions: usize, seed: u64) -> (Vec<Record>, Vec<Record>) {
    let nodes = (0..users)
        .map(|i| node_record(&format!("user{}", i), &format!("User {}", i)))
        .collect();
    if users < 2 {
        return (nodes, vec![]);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<(usize, usize)> = Vec::new();
    let mut totals: HashMap<(usize, usize), i64> = HashMap::new();
    for _ in 0..interactions {
        let a = rng.gen_range(0..users);
        let b = rng.gen_range(0..users);
        let weight = rng.gen_range(1..=20);
        if a == b {
            continue;
        }
        let total = totals.entry((a, b)).or_insert_with(|| {
            order.push((a, b));
            0
        });
        *total += weight;
    }

    let edges = order
        .into_iter()
        .map(|(a, b)| edge_record(&format!("user{}", a), &format!("user{}", b), totals[&(a, b)]))
        .collect();
    (nodes, edges)
}
