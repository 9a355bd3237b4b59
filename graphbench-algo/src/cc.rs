/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Connected components by Afforest subgraph sampling.
//!
//! A few rounds of lock-free union-find over one sampled neighbor per
//! vertex build an approximate forest whose dominant component is then
//! detected by sampling the label array; the final pass links the full
//! neighborhoods of the remaining vertices only, skipping the bulk of the
//! edges. Directed graphs yield weakly connected components by linking
//! incoming edges as well.

use graphbench::atomics::as_atomic_i32;
use graphbench::bitmap::Bitmap;
use graphbench::graph::Graph;
use graphbench::pvec::ParVec;
use graphbench::types::{NodeId, RAND_SEED};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

pub const DEFAULT_NEIGHBOR_ROUNDS: usize = 2;

const COMPRESS_CHUNK: usize = 2048;
const SAMPLES: usize = 1024;

/// Component labels, stable under repeated path compression:
/// `comp[u] == comp[v]` iff `u` and `v` are (weakly) connected.
pub fn afforest(g: &Graph, neighbor_rounds: usize) -> ParVec<NodeId> {
    let n = g.num_nodes();
    if n == 0 {
        return ParVec::new();
    }
    let mut comp = ParVec::<NodeId>::uninit(n as usize);
    comp.as_mut_slice()
        .par_iter_mut()
        .enumerate()
        .with_min_len(COMPRESS_CHUNK)
        .for_each(|(u, c)| *c = u as NodeId);
    let comp_atomic = as_atomic_i32(comp.as_mut_slice());

    // Approximate the components on a sampled subgraph: round r links the
    // r-th neighbor of every vertex.
    for r in 0..neighbor_rounds {
        (0..n).into_par_iter().with_min_len(COMPRESS_CHUNK).for_each(|u| {
            if let Some(&v) = g.out_neigh(u).get(r) {
                link(u, v, comp_atomic);
            }
        });
        compress(comp_atomic);
    }

    // The largest intermediate component can be skipped entirely in the
    // final pass.
    let c = sample_frequent_element(comp_atomic);
    if !g.is_directed() {
        (0..n).into_par_iter().with_min_len(COMPRESS_CHUNK).for_each(|u| {
            if comp_atomic[u as usize].load(Ordering::Relaxed) == c {
                return;
            }
            for &v in g.out_neigh_from(u, neighbor_rounds) {
                link(u, v, comp_atomic);
            }
        });
    } else {
        (0..n).into_par_iter().with_min_len(COMPRESS_CHUNK).for_each(|u| {
            if comp_atomic[u as usize].load(Ordering::Relaxed) == c {
                return;
            }
            for &v in g.out_neigh_from(u, neighbor_rounds) {
                link(u, v, comp_atomic);
            }
            // Weak connectivity requires the reverse edges of the skipped
            // component's vertices too.
            for &v in g.in_neigh(u) {
                link(u, v, comp_atomic);
            }
        });
    }
    compress(comp_atomic);
    comp
}

/// Lock-free union by id: the higher of the two roots is pointed at the
/// lower one with a compare-and-swap, retrying through freshly compressed
/// parents on contention.
fn link(u: NodeId, v: NodeId, comp: &[AtomicI32]) {
    let mut p1 = comp[u as usize].load(Ordering::Relaxed);
    let mut p2 = comp[v as usize].load(Ordering::Relaxed);
    while p1 != p2 {
        let high = p1.max(p2);
        let low = p1 + (p2 - high);
        let p_high = comp[high as usize].load(Ordering::Relaxed);
        if p_high == low {
            break;
        }
        if p_high == high
            && comp[high as usize]
                .compare_exchange(high, low, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
        {
            break;
        }
        p1 = comp[comp[high as usize].load(Ordering::Relaxed) as usize].load(Ordering::Relaxed);
        p2 = comp[low as usize].load(Ordering::Relaxed);
    }
}

/// Full path compression: every label chases its parent chain to a fixed
/// point.
fn compress(comp: &[AtomicI32]) {
    (0..comp.len())
        .into_par_iter()
        .with_min_len(COMPRESS_CHUNK)
        .for_each(|u| loop {
            let c = comp[u].load(Ordering::Relaxed);
            let cc = comp[c as usize].load(Ordering::Relaxed);
            if c == cc {
                break;
            }
            comp[u].store(cc, Ordering::Relaxed);
        });
}

/// Estimates the most frequent label from a fixed sample.
fn sample_frequent_element(comp: &[AtomicI32]) -> NodeId {
    let mut sample_counts: HashMap<NodeId, usize> = HashMap::with_capacity(32);
    let mut rng = SmallRng::seed_from_u64(RAND_SEED);
    for _ in 0..SAMPLES {
        let u = rng.random_range(0..comp.len());
        *sample_counts
            .entry(comp[u].load(Ordering::Relaxed))
            .or_insert(0) += 1;
    }
    let (&label, &count) = sample_counts
        .iter()
        .max_by_key(|entry| *entry.1)
        .expect("sampled an empty component array");
    log::info!(
        "Skipping the largest intermediate component (label {label}, approx. {:.2}% of the graph)",
        count as f64 / SAMPLES as f64 * 100.0
    );
    label
}

/// Logs the biggest components.
pub fn print_stats(_g: &Graph, comp: &[NodeId]) {
    let mut counts: HashMap<NodeId, i64> = HashMap::new();
    for &c in comp {
        *counts.entry(c).or_insert(0) += 1;
    }
    let mut sizes: Vec<(i64, NodeId)> = counts.iter().map(|(&c, &n)| (n, c)).collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    for &(size, label) in sizes.iter().take(5) {
        log::info!("{label}:{size}");
    }
    log::info!("There are {} components", counts.len());
}

/// Checks the labeling by a BFS from one representative per label: the
/// search must stay inside the label (treating directed graphs as
/// undirected) and must visit every vertex.
pub fn verify(g: &Graph, comp: &[NodeId]) -> bool {
    let mut label_to_source = HashMap::new();
    for u in g.vertices() {
        label_to_source.insert(comp[u as usize], u);
    }
    let mut visited = Bitmap::new(g.num_nodes() as usize);
    let mut frontier = Vec::with_capacity(g.num_nodes() as usize);
    for (&label, &source) in &label_to_source {
        frontier.clear();
        frontier.push(source);
        visited.set(source as usize);
        let mut head = 0;
        while head < frontier.len() {
            let u = frontier[head];
            head += 1;
            for &v in g.out_neigh(u) {
                if comp[v as usize] != label {
                    return false;
                }
                if !visited.get(v as usize) {
                    visited.set(v as usize);
                    frontier.push(v);
                }
            }
            if g.is_directed() {
                for &v in g.in_neigh(u) {
                    if comp[v as usize] != label {
                        return false;
                    }
                    if !visited.get(v as usize) {
                        visited.set(v as usize);
                        frontier.push(v);
                    }
                }
            }
        }
    }
    (0..g.num_nodes() as usize).all(|u| visited.get(u))
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphbench::builder::GraphBuilder;
    use graphbench::types::{Edge, EdgeList};
    use std::collections::HashSet;

    fn build(edges: &[(NodeId, NodeId)], symmetrize: bool, num_nodes: Option<NodeId>) -> Graph {
        let el: EdgeList<NodeId> = edges.iter().map(|&(u, v)| Edge::new(u, v)).collect();
        let mut b = GraphBuilder::new();
        b.symmetrize(symmetrize);
        if let Some(n) = num_nodes {
            b.num_nodes(n);
        }
        b.build(el)
    }

    fn labels(comp: &[NodeId]) -> HashSet<NodeId> {
        comp.iter().copied().collect()
    }

    #[test]
    fn clique_is_one_component() {
        let g = build(&[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)], true, None);
        let comp = afforest(&g, DEFAULT_NEIGHBOR_ROUNDS);
        assert_eq!(labels(&comp).len(), 1);
        assert!(verify(&g, &comp));
    }

    #[test]
    fn isolated_vertex_gets_its_own_label() {
        let g = build(
            &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)],
            true,
            Some(6),
        );
        let comp = afforest(&g, DEFAULT_NEIGHBOR_ROUNDS);
        assert_eq!(labels(&comp).len(), 3);
        assert_eq!(comp[4], 4);
        assert_eq!(comp[5], 5);
        assert!(verify(&g, &comp));
    }

    #[test]
    fn two_cliques_partition() {
        let g = build(
            &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)],
            true,
            None,
        );
        let comp = afforest(&g, DEFAULT_NEIGHBOR_ROUNDS);
        assert_eq!(labels(&comp).len(), 2);
        assert_eq!(comp[0], comp[1]);
        assert_eq!(comp[0], comp[2]);
        assert_eq!(comp[3], comp[4]);
        assert_ne!(comp[0], comp[3]);
        assert!(verify(&g, &comp));
    }

    #[test]
    fn directed_path_is_weakly_connected() {
        let g = build(&[(0, 1), (1, 2), (2, 3), (3, 4)], false, None);
        let comp = afforest(&g, DEFAULT_NEIGHBOR_ROUNDS);
        assert_eq!(labels(&comp).len(), 1);
        assert!(verify(&g, &comp));
    }

    #[test]
    fn empty_graph_is_all_singletons() {
        let g = build(&[], true, Some(4));
        let comp = afforest(&g, DEFAULT_NEIGHBOR_ROUNDS);
        assert_eq!(comp.as_slice(), &[0, 1, 2, 3]);
        assert!(verify(&g, &comp));
    }
}
