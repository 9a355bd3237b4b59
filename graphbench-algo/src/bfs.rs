/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Direction-optimizing breadth-first search.
//!
//! The parent array doubles as the visited set: `parent[u] >= 0` is the
//! tree parent, `parent[source] == source`, and unvisited vertices hold
//! `-max(out_degree(u), 1)` so that claiming a vertex also yields its
//! degree for the scouting heuristic without another memory access.
//!
//! Top-down steps push from the frontier queue with compare-and-swap
//! claims; once the frontier scouts more edges than `1/alpha` of the
//! unexplored ones, the queue converts to a bitmap and bottom-up steps
//! scan unvisited vertices for any parent in the frontier, converting back
//! when fewer than `1/beta` of the vertices awaken.

use graphbench::atomics::as_atomic_i32;
use graphbench::bitmap::Bitmap;
use graphbench::graph::Graph;
use graphbench::pvec::ParVec;
use graphbench::queue::SlidingQueue;
use graphbench::types::NodeId;
use rayon::prelude::*;
use std::sync::atomic::{AtomicI32, Ordering};

pub const DEFAULT_ALPHA: i64 = 15;
pub const DEFAULT_BETA: i64 = 18;

/// Frontier slice handed to one top-down task.
const TD_CHUNK: usize = 64;
/// Vertex range handed to one bottom-up task.
const BU_CHUNK: usize = 1024;

/// BFS tree from `source` with the default direction-switch parameters.
pub fn bfs_tree(g: &Graph, source: NodeId) -> ParVec<NodeId> {
    bfs_tree_with(g, source, DEFAULT_ALPHA, DEFAULT_BETA)
}

/// BFS tree from `source`; `alpha` and `beta` tune the top-down to
/// bottom-up switch.
pub fn bfs_tree_with(g: &Graph, source: NodeId, alpha: i64, beta: i64) -> ParVec<NodeId> {
    let n = g.num_nodes();
    let mut parent = init_parent(g);
    parent[source as usize] = source;
    let mut queue = SlidingQueue::new(n as usize);
    queue.push(source);
    queue.slide_window();
    let mut front = Bitmap::new(n as usize);
    let mut next = Bitmap::new(n as usize);

    let mut edges_to_check = g.num_edges_directed();
    let mut scout_count = g.out_degree(source) as i64;
    while !queue.is_empty() {
        if scout_count > edges_to_check / alpha {
            front.reset();
            queue_to_bitmap(&queue, &front);
            queue.slide_window();
            loop {
                let awake_count = bu_step(g, &mut parent, &front, &mut next);
                front.swap(&mut next);
                log::debug!("bu step: {awake_count} awakened");
                if awake_count <= n as i64 / beta {
                    break;
                }
            }
            bitmap_to_queue(g, &front, &mut queue);
            log::debug!("converted back to queue: {} in frontier", queue.len());
            scout_count = 1;
        } else {
            edges_to_check -= scout_count;
            scout_count = {
                let parent_atomic = as_atomic_i32(parent.as_mut_slice());
                td_step(g, parent_atomic, &queue)
            };
            queue.slide_window();
            log::debug!("td step: {} in frontier", queue.len());
        }
    }
    parent
}

/// Seeds every vertex with the negated degree so a top-down claim learns
/// the degree of the vertex it just discovered.
fn init_parent(g: &Graph) -> ParVec<NodeId> {
    let mut parent = ParVec::uninit(g.num_nodes() as usize);
    parent
        .as_mut_slice()
        .par_iter_mut()
        .enumerate()
        .with_min_len(BU_CHUNK)
        .for_each(|(u, p)| {
            let degree = g.out_degree(u as NodeId);
            *p = if degree != 0 { -degree } else { -1 };
        });
    parent
}

fn td_step(g: &Graph, parent: &[AtomicI32], queue: &SlidingQueue<NodeId>) -> i64 {
    queue
        .window()
        .par_chunks(TD_CHUNK)
        .map(|chunk| {
            let mut lqueue = queue.buffer();
            let mut scout_count = 0i64;
            for &u in chunk {
                for &v in g.out_neigh(u) {
                    let curr_val = parent[v as usize].load(Ordering::Relaxed);
                    if curr_val < 0
                        && parent[v as usize]
                            .compare_exchange(curr_val, u, Ordering::Relaxed, Ordering::Relaxed)
                            .is_ok()
                    {
                        lqueue.push(v);
                        scout_count += (-curr_val) as i64;
                    }
                }
            }
            scout_count
        })
        .sum()
}

fn bu_step(g: &Graph, parent: &mut ParVec<NodeId>, front: &Bitmap, next: &mut Bitmap) -> i64 {
    next.reset();
    let next = &*next;
    parent
        .as_mut_slice()
        .par_iter_mut()
        .enumerate()
        .with_min_len(BU_CHUNK)
        .map(|(u, p)| {
            if *p < 0 {
                for &v in g.in_neigh(u as NodeId) {
                    if front.get(v as usize) {
                        *p = v;
                        next.set_atomic(u);
                        return 1i64;
                    }
                }
            }
            0
        })
        .sum()
}

fn queue_to_bitmap(queue: &SlidingQueue<NodeId>, bm: &Bitmap) {
    queue
        .window()
        .par_iter()
        .for_each(|&u| bm.set_atomic(u as usize));
}

fn bitmap_to_queue(g: &Graph, bm: &Bitmap, queue: &mut SlidingQueue<NodeId>) {
    {
        let queue = &*queue;
        (0..g.num_nodes())
            .into_par_iter()
            .with_min_len(BU_CHUNK)
            .for_each_init(
                || queue.buffer(),
                |lqueue, u| {
                    if bm.get(u as usize) {
                        lqueue.push(u);
                    }
                },
            );
    }
    queue.slide_window();
}

/// Logs the size of the discovered tree.
pub fn print_stats(g: &Graph, parent: &[NodeId]) {
    let mut tree_size = 0i64;
    let mut n_edges = 0i64;
    for u in g.vertices() {
        if parent[u as usize] >= 0 {
            n_edges += g.out_degree(u) as i64;
            tree_size += 1;
        }
    }
    log::info!("BFS tree has {tree_size} nodes and {n_edges} edges");
}

/// Checks the parent array against a serial BFS depth oracle.
pub fn verify(g: &Graph, source: NodeId, parent: &[NodeId]) -> bool {
    let n = g.num_nodes() as usize;
    let mut depth = vec![-1 as NodeId; n];
    depth[source as usize] = 0;
    let mut frontier = Vec::with_capacity(n);
    frontier.push(source);
    let mut head = 0;
    while head < frontier.len() {
        let u = frontier[head];
        head += 1;
        for &v in g.out_neigh(u) {
            if depth[v as usize] == -1 {
                depth[v as usize] = depth[u as usize] + 1;
                frontier.push(v);
            }
        }
    }
    for u in g.vertices() {
        let (u_idx, p) = (u as usize, parent[u as usize]);
        if depth[u_idx] >= 0 {
            if p < 0 {
                log::error!("{u} reachable but unvisited");
                return false;
            }
            if u == source {
                if p != source {
                    log::error!("source parent is {p}");
                    return false;
                }
                continue;
            }
            if depth[p as usize] + 1 != depth[u_idx] {
                log::error!("parent of {u} not one level up");
                return false;
            }
            if !g.out_neigh(p).contains(&u) {
                log::error!("no edge from {p} to {u}");
                return false;
            }
        } else if p >= 0 {
            log::error!("{u} unreachable but visited");
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphbench::builder::GraphBuilder;
    use graphbench::types::{Edge, EdgeList};

    fn build(edges: &[(NodeId, NodeId)], symmetrize: bool) -> Graph {
        let el: EdgeList<NodeId> = edges.iter().map(|&(u, v)| Edge::new(u, v)).collect();
        GraphBuilder::new().symmetrize(symmetrize).build(el)
    }

    #[test]
    fn k4_parents_point_at_source() {
        let g = build(&[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)], true);
        let parent = bfs_tree(&g, 0);
        assert_eq!(parent.as_slice(), &[0, 0, 0, 0]);
        assert!(verify(&g, 0, &parent));
    }

    #[test]
    fn directed_path_chains_parents() {
        let g = build(&[(0, 1), (1, 2), (2, 3), (3, 4)], false);
        let parent = bfs_tree(&g, 0);
        assert_eq!(parent.as_slice(), &[0, 0, 1, 2, 3]);
        assert!(verify(&g, 0, &parent));
    }

    #[test]
    fn isolated_vertex_stays_unvisited() {
        let mut el: EdgeList<NodeId> = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]
            .iter()
            .map(|&(u, v)| Edge::new(u, v))
            .collect();
        el.push(Edge::new(0, 0)); // keeps vertex range, squished away
        let g = GraphBuilder::new()
            .symmetrize(true)
            .num_nodes(6)
            .build(el);
        let parent = bfs_tree(&g, 0);
        assert_eq!(parent[5], -1);
        assert!(verify(&g, 0, &parent));
    }

    #[test]
    fn empty_graph_leaves_only_the_source() {
        let g = GraphBuilder::new()
            .symmetrize(true)
            .num_nodes(4)
            .build(EdgeList::new());
        let parent = bfs_tree(&g, 2);
        assert_eq!(parent.as_slice(), &[-1, -1, 2, -1]);
        assert!(verify(&g, 2, &parent));
    }

    #[test]
    fn forced_bottom_up_agrees_with_top_down() {
        // star plus a tail; alpha = 0 forces an immediate bottom-up phase
        let edges: Vec<(NodeId, NodeId)> =
            (1..32).map(|v| (0, v)).chain([(31, 32), (32, 33)]).collect();
        let g = build(&edges, true);
        // alpha = 1 never crosses the scout threshold (pure top-down);
        // alpha = i64::MAX converts to bottom-up on the first step
        let td = bfs_tree_with(&g, 0, 1, DEFAULT_BETA);
        let hybrid = bfs_tree_with(&g, 0, i64::MAX, DEFAULT_BETA);
        assert!(verify(&g, 0, &td));
        assert!(verify(&g, 0, &hybrid));
        // depths agree even where the chosen parents differ
        for u in g.vertices() {
            assert_eq!(td[u as usize] >= 0, hybrid[u as usize] >= 0);
        }
    }
}
