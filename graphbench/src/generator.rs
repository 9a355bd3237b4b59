/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Deterministic synthetic edge-list generators.
//!
//! Both the uniform-random and the R-MAT (Kronecker) generator partition
//! the edge index range into fixed-size blocks and seed a fresh
//! thread-local generator with `RAND_SEED + block` for each, so the output
//! is identical regardless of how blocks are scheduled over threads.

use crate::types::{Destination, Edge, EdgeList, NodeId, Weight, RAND_SEED};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::marker::PhantomData;
use std::time::Instant;

/// Edges generated per seeding block.
const BLOCK_SIZE: usize = 1 << 18;

/// R-MAT quadrant probabilities (A, B, C; D is the remainder).
const RMAT_A: f64 = 0.57;
const RMAT_B: f64 = 0.19;
const RMAT_C: f64 = 0.19;

/// Generates synthetic edge lists with `2^scale` vertices and
/// `2^scale · degree` edges.
///
/// ```
/// use graphbench::generator::Generator;
/// use graphbench::types::NodeId;
///
/// let gen = Generator::<NodeId>::new(8, 4);
/// let el = gen.generate(true);
/// assert_eq!(el.len(), 256 * 4);
/// assert!(el.iter().all(|e| e.u < 256 && e.v < 256));
/// ```
pub struct Generator<D: Destination = NodeId> {
    scale: u32,
    num_nodes: NodeId,
    num_edges: usize,
    _marker: PhantomData<D>,
}

impl<D: Destination> Generator<D> {
    pub fn new(scale: u32, degree: u32) -> Self {
        assert!(scale < 31, "scale must leave node ids representable");
        let num_nodes: NodeId = 1 << scale;
        Self {
            scale,
            num_nodes,
            num_edges: (num_nodes as usize) * degree as usize,
            _marker: PhantomData,
        }
    }

    /// Generates an edge list, uniform-random or R-MAT.
    pub fn generate(&self, uniform: bool) -> EdgeList<D> {
        let start = Instant::now();
        let el = if uniform {
            self.make_uniform_el()
        } else {
            self.make_kron_el()
        };
        log::info!(
            "Generate time: {:.5}s ({} edges)",
            start.elapsed().as_secs_f64(),
            el.len()
        );
        el
    }

    fn make_uniform_el(&self) -> EdgeList<D> {
        let n = self.num_nodes;
        let mut el = EdgeList::uninit(self.num_edges);
        el.par_chunks_mut(BLOCK_SIZE)
            .enumerate()
            .for_each(|(block, chunk)| {
                let mut rng = SmallRng::seed_from_u64(RAND_SEED + block as u64);
                for e in chunk {
                    let u = rng.random_range(0..n);
                    let v = rng.random_range(0..n);
                    *e = Edge::new(u, D::from_node(v));
                }
            });
        el
    }

    fn make_kron_el(&self) -> EdgeList<D> {
        let scale = self.scale;
        let mut el = EdgeList::uninit(self.num_edges);
        el.par_chunks_mut(BLOCK_SIZE)
            .enumerate()
            .for_each(|(block, chunk)| {
                let mut rng = SmallRng::seed_from_u64(RAND_SEED + block as u64);
                for e in chunk {
                    let mut src: NodeId = 0;
                    let mut dst: NodeId = 0;
                    for _ in 0..scale {
                        let point: f64 = rng.random();
                        src <<= 1;
                        dst <<= 1;
                        if point < RMAT_A + RMAT_B {
                            if point > RMAT_A {
                                dst += 1;
                            }
                        } else {
                            src += 1;
                            if point > RMAT_A + RMAT_B + RMAT_C {
                                dst += 1;
                            }
                        }
                    }
                    *e = Edge::new(src, D::from_node(dst));
                }
            });
        self.permute_ids(&mut el);
        el
    }

    /// Replaces every node id through a seeded random permutation.
    ///
    /// Without this, vertex locality mirrors the R-MAT recursion and makes
    /// the generated graphs unrealistically cache-friendly.
    fn permute_ids(&self, el: &mut EdgeList<D>) {
        let mut permutation: Vec<NodeId> = (0..self.num_nodes).collect();
        permutation.shuffle(&mut SmallRng::seed_from_u64(RAND_SEED));
        el.par_iter_mut().with_min_len(1 << 13).for_each(|e| {
            *e = Edge::new(
                permutation[e.u as usize],
                e.v.with_node(permutation[e.v.node() as usize]),
            );
        });
    }
}

/// Overwrites the weights of an edge list with uniform integers in
/// [1, 255], block-seeded like edge generation.
///
/// A no-op for unweighted destinations.
pub fn insert_weights<D: Destination>(el: &mut EdgeList<D>) {
    el.par_chunks_mut(BLOCK_SIZE)
        .enumerate()
        .for_each(|(block, chunk)| {
            let mut rng = SmallRng::seed_from_u64(RAND_SEED + block as u64);
            for e in chunk {
                e.v = e.v.with_weight(rng.random_range(1..=255 as Weight));
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WNode;

    #[test]
    fn uniform_is_deterministic() {
        let gen = Generator::<NodeId>::new(10, 16);
        assert_eq!(gen.generate(true), gen.generate(true));
    }

    #[test]
    fn kron_is_deterministic() {
        let gen = Generator::<NodeId>::new(10, 16);
        let a = gen.generate(false);
        let b = gen.generate(false);
        assert_eq!(a, b);
    }

    #[test]
    fn endpoints_are_in_range() {
        let gen = Generator::<NodeId>::new(9, 8);
        for uniform in [true, false] {
            let el = gen.generate(uniform);
            assert_eq!(el.len(), 512 * 8);
            assert!(el.iter().all(|e| (0..512).contains(&e.u) && (0..512).contains(&e.v)));
        }
    }

    #[test]
    fn permutation_preserves_degree_multiset() {
        let gen = Generator::<NodeId>::new(8, 8);
        let el = gen.generate(false);
        // The permutation is a bijection, so the number of distinct
        // endpoints cannot change across runs of the same generator.
        let distinct: std::collections::HashSet<NodeId> =
            el.iter().flat_map(|e| [e.u, e.v]).collect();
        assert!(!distinct.is_empty());
        assert!(distinct.len() <= 256);
    }

    #[test]
    fn inserted_weights_are_in_range_and_deterministic() {
        let gen = Generator::<WNode>::new(8, 8);
        let mut a = gen.generate(true);
        let mut b = gen.generate(true);
        insert_weights(&mut a);
        insert_weights(&mut b);
        assert_eq!(a, b);
        assert!(a.iter().all(|e| (1..=255).contains(&e.v.w)));
    }
}
