/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Δ-stepping single-source shortest paths.
//!
//! Tentative distances live in one shared array updated through
//! compare-and-swap lowering; vertices whose distance falls into the band
//! `[Δ·i, Δ·(i+1))` wait in bin `i`. Each outer step drains the lowest
//! non-empty bin in parallel, with every task spilling newly binned
//! vertices into thread-local bins that are merged afterwards. A vertex is
//! never removed from a bin it already sits in: stale entries are skipped
//! by re-checking `dist[u] >= Δ·i` when the bin drains, which costs less
//! than eager removal.

use graphbench::atomics::as_atomic_i32;
use graphbench::graph::WGraph;
use graphbench::pvec::ParVec;
use graphbench::types::{NodeId, Weight};
use rayon::prelude::*;
use std::collections::BinaryHeap;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicI32, Ordering};

/// Unreachable sentinel, kept at half range so a relaxation can never
/// overflow.
pub const DIST_INF: Weight = Weight::MAX / 2;

/// Frontier slice handed to one relaxation task.
const RELAX_CHUNK: usize = 64;

type LocalBins = Vec<Vec<NodeId>>;

/// Distances from `source`; unreachable vertices hold [`DIST_INF`].
pub fn delta_step(g: &WGraph, source: NodeId, delta: Weight) -> ParVec<Weight> {
    assert!(delta >= 1, "delta must be positive");
    let mut dist = ParVec::filled(g.num_nodes() as usize, DIST_INF);
    dist[source as usize] = 0;
    let dist_atomic = as_atomic_i32(dist.as_mut_slice());

    let mut bins: Vec<Vec<NodeId>> = vec![vec![source]];
    let mut curr_index = 0usize;
    let mut iter = 0usize;
    loop {
        // Reinsertions never go below the bin being drained, so the scan
        // can resume where it stopped.
        let Some(index) = (curr_index..bins.len()).find(|&i| !bins[i].is_empty()) else {
            break;
        };
        curr_index = index;
        let frontier = std::mem::take(&mut bins[index]);
        log::debug!("bin {index}: {} vertices", frontier.len());
        iter += 1;

        let spill = frontier
            .par_chunks(RELAX_CHUNK)
            .fold(LocalBins::new, |local, chunk| {
                relax_chunk(g, dist_atomic, delta, index, chunk, local)
            })
            .reduce(LocalBins::new, merge_bins);
        if spill.len() > bins.len() {
            bins.resize(spill.len(), Vec::new());
        }
        for (i, mut bin) in spill.into_iter().enumerate() {
            if !bin.is_empty() {
                bins[i].append(&mut bin);
            }
        }
    }
    log::debug!("took {iter} iterations");
    dist
}

fn relax_chunk(
    g: &WGraph,
    dist: &[AtomicI32],
    delta: Weight,
    curr_index: usize,
    chunk: &[NodeId],
    mut local: LocalBins,
) -> LocalBins {
    for &u in chunk {
        // Skip vertices that already moved to a lower bin.
        if (dist[u as usize].load(Ordering::Relaxed) as i64) < delta as i64 * curr_index as i64 {
            continue;
        }
        for wn in g.out_neigh(u) {
            let v = wn.v as usize;
            let new_dist = dist[u as usize].load(Ordering::Relaxed) + wn.w;
            let mut old_dist = dist[v].load(Ordering::Relaxed);
            let mut changed = false;
            while new_dist < old_dist {
                match dist[v].compare_exchange_weak(
                    old_dist,
                    new_dist,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        changed = true;
                        break;
                    }
                    Err(actual) => old_dist = actual,
                }
            }
            if changed {
                let dest_bin = (new_dist / delta) as usize;
                if dest_bin >= local.len() {
                    local.resize(dest_bin + 1, Vec::new());
                }
                local[dest_bin].push(wn.v);
            }
        }
    }
    local
}

fn merge_bins(mut a: LocalBins, b: LocalBins) -> LocalBins {
    if b.len() > a.len() {
        a.resize(b.len(), Vec::new());
    }
    for (i, mut bin) in b.into_iter().enumerate() {
        if !bin.is_empty() {
            a[i].append(&mut bin);
        }
    }
    a
}

/// Logs how many vertices the shortest-path tree reaches.
pub fn print_stats(_g: &WGraph, dist: &[Weight]) {
    let num_reached = dist.iter().filter(|&&d| d != DIST_INF).count();
    log::info!("SSSP tree reaches {num_reached} nodes");
}

/// Compares against a serial Dijkstra oracle; distances must match
/// exactly.
pub fn verify(g: &WGraph, source: NodeId, dist_to_test: &[Weight]) -> bool {
    let mut oracle_dist = vec![DIST_INF; g.num_nodes() as usize];
    oracle_dist[source as usize] = 0;
    let mut heap = BinaryHeap::new();
    heap.push(Reverse((0 as Weight, source)));
    while let Some(Reverse((td, u))) = heap.pop() {
        if td != oracle_dist[u as usize] {
            continue;
        }
        for wn in g.out_neigh(u) {
            let relaxed = td + wn.w;
            if relaxed < oracle_dist[wn.v as usize] {
                oracle_dist[wn.v as usize] = relaxed;
                heap.push(Reverse((relaxed, wn.v)));
            }
        }
    }
    let mut all_ok = true;
    for u in g.vertices() {
        if dist_to_test[u as usize] != oracle_dist[u as usize] {
            log::error!(
                "{u}: {} != {}",
                dist_to_test[u as usize],
                oracle_dist[u as usize]
            );
            all_ok = false;
        }
    }
    all_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphbench::builder::GraphBuilder;
    use graphbench::generator::{insert_weights, Generator};
    use graphbench::types::{Edge, EdgeList, WNode};

    fn build(edges: &[(NodeId, NodeId, Weight)], symmetrize: bool) -> WGraph {
        let el: EdgeList<WNode> = edges
            .iter()
            .map(|&(u, v, w)| Edge::new(u, WNode::new(v, w)))
            .collect();
        let mut b = GraphBuilder::<WNode>::new();
        b.symmetrize(symmetrize).needs_weights(false);
        b.build(el)
    }

    #[test]
    fn unit_weight_k4() {
        let g = build(
            &[(0, 1, 1), (0, 2, 1), (0, 3, 1), (1, 2, 1), (1, 3, 1), (2, 3, 1)],
            true,
        );
        let dist = delta_step(&g, 0, 1);
        assert_eq!(dist.as_slice(), &[0, 1, 1, 1]);
        assert!(verify(&g, 0, &dist));
    }

    #[test]
    fn shortcut_beats_direct_edge() {
        // 0 -> 2 direct costs 10, via 1 costs 3
        let g = build(&[(0, 1, 1), (1, 2, 2), (0, 2, 10)], false);
        let dist = delta_step(&g, 0, 1);
        assert_eq!(dist.as_slice(), &[0, 1, 3]);
        assert!(verify(&g, 0, &dist));
    }

    #[test]
    fn unreachable_vertices_stay_at_infinity() {
        let g = build(&[(0, 1, 5)], false);
        let dist = delta_step(&g, 1, 2);
        assert_eq!(dist.as_slice(), &[DIST_INF, 0]);
        assert!(verify(&g, 1, &dist));
    }

    #[test]
    fn delta_choice_does_not_change_distances() {
        let gen = Generator::<WNode>::new(7, 6);
        let mut el = gen.generate(true);
        insert_weights(&mut el);
        let mut b = GraphBuilder::<WNode>::new();
        b.symmetrize(true).needs_weights(false);
        let g = b.build(el);
        let d1 = delta_step(&g, 3, 1);
        let d64 = delta_step(&g, 3, 64);
        assert_eq!(d1, d64);
        assert!(verify(&g, 3, &d1));
    }
}
