/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Iterative PageRank in the pull direction.
//!
//! Every iteration first publishes each vertex's outgoing contribution
//! (`score / out_degree`, zero for dangling vertices — their rank is not
//! redistributed), then each vertex pulls the contributions of its
//! in-neighbors. Since a vertex only writes its own slots, the kernel
//! needs no atomics; the L1 error is accumulated with compensated
//! summation.

use graphbench::graph::Graph;
use graphbench::pvec::ParVec;
use kahan::KahanSum;
use rayon::prelude::*;

/// Score type, deliberately narrow: the benchmark measures bandwidth.
pub type Score = f32;

pub const DAMPING: Score = 0.85;
pub const DEFAULT_EPSILON: f64 = 1e-4;

const MIN_LEN: usize = 1 << 10;

/// PageRank scores after at most `max_iters` iterations, stopping early
/// once the total score change of an iteration falls below `epsilon`.
pub fn page_rank_pull(g: &Graph, max_iters: i32, epsilon: f64) -> ParVec<Score> {
    let n = g.num_nodes();
    if n == 0 {
        return ParVec::new();
    }
    let init_score = 1.0 / n as Score;
    let base_score = (1.0 - DAMPING) / n as Score;
    let mut scores = ParVec::filled(n as usize, init_score);
    let mut outgoing_contrib = ParVec::<Score>::uninit(n as usize);

    for iter in 0..max_iters {
        outgoing_contrib
            .as_mut_slice()
            .par_iter_mut()
            .enumerate()
            .with_min_len(MIN_LEN)
            .for_each(|(u, contrib)| {
                let degree = g.out_degree(u as i32);
                *contrib = if degree == 0 {
                    0.0
                } else {
                    scores[u] / degree as Score
                };
            });
        let error: f64 = scores
            .as_mut_slice()
            .par_iter_mut()
            .enumerate()
            .with_min_len(MIN_LEN)
            .fold(KahanSum::<f64>::new, |mut error, (u, score)| {
                let incoming_total: Score = g
                    .in_neigh(u as i32)
                    .iter()
                    .map(|&v| outgoing_contrib[v as usize])
                    .sum();
                let new_score = base_score + DAMPING * incoming_total;
                error += (new_score - *score).abs() as f64;
                *score = new_score;
                error
            })
            .map(|k| k.sum())
            .sum();
        log::debug!("iteration {iter}: error {error:e}");
        if error < epsilon {
            break;
        }
    }
    scores
}

/// Logs the five highest-ranked vertices.
pub fn print_stats(g: &Graph, scores: &[Score]) {
    let mut pairs: Vec<(Score, i32)> = g.vertices().map(|u| (scores[u as usize], u)).collect();
    pairs.sort_unstable_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    for &(score, u) in pairs.iter().take(5) {
        log::info!("{u}:{score}");
    }
}

/// Checks that the scores are a fixed point of the update rule: one more
/// pull iteration must change the total score by less than
/// `target_error`.
pub fn verify(g: &Graph, scores: &[Score], target_error: f64) -> bool {
    let n = g.num_nodes();
    if n == 0 {
        return scores.is_empty();
    }
    let base_score = (1.0 - DAMPING) / n as Score;
    let mut incoming_sums = vec![0.0 as Score; n as usize];
    for u in g.vertices() {
        let degree = g.out_degree(u);
        if degree == 0 {
            continue;
        }
        let contrib = scores[u as usize] / degree as Score;
        for &v in g.out_neigh(u) {
            incoming_sums[v as usize] += contrib;
        }
    }
    let mut error = 0.0f64;
    for u in g.vertices() {
        let expected = base_score + DAMPING * incoming_sums[u as usize];
        error += (expected - scores[u as usize]).abs() as f64;
    }
    log::info!("total error: {error:e}");
    error < target_error
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphbench::builder::GraphBuilder;
    use graphbench::types::{Edge, EdgeList, NodeId};

    fn build(edges: &[(NodeId, NodeId)], symmetrize: bool) -> Graph {
        let el: EdgeList<NodeId> = edges.iter().map(|&(u, v)| Edge::new(u, v)).collect();
        GraphBuilder::new().symmetrize(symmetrize).build(el)
    }

    #[test]
    fn scores_sum_to_one_on_a_clique() {
        let g = build(&[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)], true);
        let scores = page_rank_pull(&g, 50, 1e-7);
        let total: f64 = scores.iter().map(|&s| s as f64).sum();
        assert!((total - 1.0).abs() < 1e-4, "total {total}");
        // symmetric graph: all scores equal
        for &s in scores.iter() {
            assert!((s - scores[0]).abs() < 1e-6);
        }
        assert!(verify(&g, &scores, 1e-4));
    }

    #[test]
    fn directed_path_scores_ascend() {
        let g = build(&[(0, 1), (1, 2), (2, 3), (3, 4)], false);
        let scores = page_rank_pull(&g, 20, 0.0);
        for w in scores.windows(2) {
            assert!(w[0] < w[1], "scores not ascending: {scores:?}");
        }
    }

    #[test]
    fn dangling_vertices_contribute_nothing() {
        // 1 is dangling; its rank must not flow anywhere
        let g = build(&[(0, 1)], false);
        let scores = page_rank_pull(&g, 30, 1e-9);
        let base = (1.0 - DAMPING) / 2.0;
        assert!((scores[0] - base).abs() < 1e-6);
        assert!((scores[1] - (base + DAMPING * scores[0])).abs() < 1e-6);
    }

    #[test]
    fn converges_before_iteration_cap() {
        let g = build(&[(0, 1), (1, 2), (2, 0)], false);
        let a = page_rank_pull(&g, 1000, 1e-10);
        let b = page_rank_pull(&g, 2000, 1e-10);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
        assert!(verify(&g, &a, 1e-6));
    }
}
