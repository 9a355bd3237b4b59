/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The compressed sparse-row graph handed to the kernels.

use crate::pvec::ParVec;
use crate::types::{Destination, NodeId, Offset, WNode};
use std::ops::Range;

/// An in-memory CSR graph over destinations of type `D`.
///
/// Neighborhoods are stored as one flat array indexed by an `N + 1`-entry
/// offsets array, so a neighborhood access costs two loads. Directed graphs
/// built with inverse adjacency carry a mirrored pair of arrays for
/// incoming edges; undirected graphs store each edge in both directions and
/// answer `in_*` queries from the out arrays.
///
/// A graph owns its arrays exclusively (possibly adopted from an edge
/// list's allocation by the in-place builder); kernels borrow it
/// read-only.
pub struct CsrGraph<D: Destination = NodeId> {
    directed: bool,
    num_nodes: NodeId,
    out_offsets: ParVec<Offset>,
    out_neigh: ParVec<D>,
    in_offsets: Option<ParVec<Offset>>,
    in_neigh: Option<ParVec<D>>,
}

/// An unweighted graph.
pub type Graph = CsrGraph<NodeId>;

/// A weighted graph.
pub type WGraph = CsrGraph<WNode>;

impl<D: Destination> CsrGraph<D> {
    /// Creates an undirected graph; every edge must appear in both
    /// directions in the arrays.
    pub fn undirected(num_nodes: NodeId, out_offsets: ParVec<Offset>, out_neigh: ParVec<D>) -> Self {
        debug_assert_eq!(out_offsets.len(), num_nodes as usize + 1);
        Self {
            directed: false,
            num_nodes,
            out_offsets,
            out_neigh,
            in_offsets: None,
            in_neigh: None,
        }
    }

    /// Creates a directed graph, optionally with inverse adjacency.
    pub fn directed(
        num_nodes: NodeId,
        out_offsets: ParVec<Offset>,
        out_neigh: ParVec<D>,
        inverse: Option<(ParVec<Offset>, ParVec<D>)>,
    ) -> Self {
        debug_assert_eq!(out_offsets.len(), num_nodes as usize + 1);
        let (in_offsets, in_neigh) = match inverse {
            Some((o, n)) => (Some(o), Some(n)),
            None => (None, None),
        };
        Self {
            directed: true,
            num_nodes,
            out_offsets,
            out_neigh,
            in_offsets,
            in_neigh,
        }
    }

    #[inline]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    #[inline]
    pub fn num_nodes(&self) -> NodeId {
        self.num_nodes
    }

    /// The number of logical edges: directed edges for directed graphs,
    /// unordered pairs for undirected ones.
    #[inline]
    pub fn num_edges(&self) -> i64 {
        if self.directed {
            self.num_edges_directed()
        } else {
            self.num_edges_directed() / 2
        }
    }

    /// The number of stored directed edges.
    #[inline]
    pub fn num_edges_directed(&self) -> i64 {
        self.out_neigh.len() as i64
    }

    /// The vertex range `[0, N)`.
    #[inline]
    pub fn vertices(&self) -> Range<NodeId> {
        0..self.num_nodes
    }

    #[inline]
    pub fn out_degree(&self, u: NodeId) -> NodeId {
        let u = u as usize;
        (self.out_offsets[u + 1] - self.out_offsets[u]) as NodeId
    }

    #[inline]
    pub fn in_degree(&self, u: NodeId) -> NodeId {
        match &self.in_offsets {
            Some(in_offsets) => {
                let u = u as usize;
                (in_offsets[u + 1] - in_offsets[u]) as NodeId
            }
            None => self.out_degree(u),
        }
    }

    /// The outgoing neighborhood of `u`.
    #[inline]
    pub fn out_neigh(&self, u: NodeId) -> &[D] {
        let u = u as usize;
        &self.out_neigh[self.out_offsets[u] as usize..self.out_offsets[u + 1] as usize]
    }

    /// The outgoing neighborhood of `u`, skipping the first `skip`
    /// neighbors.
    #[inline]
    pub fn out_neigh_from(&self, u: NodeId, skip: usize) -> &[D] {
        let all = self.out_neigh(u);
        &all[skip.min(all.len())..]
    }

    /// The incoming neighborhood of `u`.
    ///
    /// For undirected graphs this is the outgoing neighborhood.
    ///
    /// # Panics
    ///
    /// Panics if the graph is directed but was built without inverse
    /// adjacency.
    #[inline]
    pub fn in_neigh(&self, u: NodeId) -> &[D] {
        match (&self.in_offsets, &self.in_neigh) {
            (Some(in_offsets), Some(in_neigh)) => {
                let u = u as usize;
                &in_neigh[in_offsets[u] as usize..in_offsets[u + 1] as usize]
            }
            _ if !self.directed => self.out_neigh(u),
            _ => panic!("directed graph built without inverse adjacency"),
        }
    }

    /// The position of `u`'s outgoing neighborhood in the flat neighbor
    /// array.
    ///
    /// Together with a neighbor's rank this addresses a single edge slot,
    /// which is how the betweenness-centrality kernel indexes its successor
    /// bitmap.
    #[inline]
    pub fn out_offset(&self, u: NodeId) -> Offset {
        self.out_offsets[u as usize]
    }

    /// The position of `u`'s incoming neighborhood in the flat inverse
    /// neighbor array; for undirected graphs, same as
    /// [`out_offset`](Self::out_offset).
    #[inline]
    pub fn in_offset(&self, u: NodeId) -> Offset {
        match &self.in_offsets {
            Some(in_offsets) => in_offsets[u as usize],
            None => self.out_offset(u),
        }
    }

    /// Logs a short summary of the graph shape.
    pub fn print_stats(&self) {
        let n = self.num_nodes.max(1) as i64;
        log::info!(
            "Graph has {} nodes and {} {} edges for an average degree of {}",
            self.num_nodes,
            self.num_edges(),
            if self.directed { "directed" } else { "undirected" },
            self.num_edges() / n,
        );
    }

    pub(crate) fn out_offsets_raw(&self) -> &[Offset] {
        &self.out_offsets
    }

    pub(crate) fn out_neigh_raw(&self) -> &[D] {
        &self.out_neigh
    }

    pub(crate) fn in_arrays_raw(&self) -> Option<(&[Offset], &[D])> {
        match (&self.in_offsets, &self.in_neigh) {
            (Some(o), Some(n)) => Some((o, n)),
            _ => None,
        }
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        bool,
        NodeId,
        ParVec<Offset>,
        ParVec<D>,
        Option<(ParVec<Offset>, ParVec<D>)>,
    ) {
        let inverse = match (self.in_offsets, self.in_neigh) {
            (Some(o), Some(n)) => Some((o, n)),
            _ => None,
        };
        (
            self.directed,
            self.num_nodes,
            self.out_offsets,
            self.out_neigh,
            inverse,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Graph {
        // 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3
        let out_offsets: ParVec<Offset> = vec![0, 2, 3, 4, 4].into();
        let out_neigh: ParVec<NodeId> = vec![1, 2, 3, 3].into();
        let in_offsets: ParVec<Offset> = vec![0, 0, 1, 2, 4].into();
        let in_neigh: ParVec<NodeId> = vec![0, 0, 1, 2].into();
        CsrGraph::directed(4, out_offsets, out_neigh, Some((in_offsets, in_neigh)))
    }

    #[test]
    fn accessors() {
        let g = diamond();
        assert!(g.is_directed());
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.num_edges(), 4);
        assert_eq!(g.num_edges_directed(), 4);
        assert_eq!(g.out_neigh(0), &[1, 2]);
        assert_eq!(g.out_degree(0), 2);
        assert_eq!(g.out_degree(3), 0);
        assert_eq!(g.in_neigh(3), &[1, 2]);
        assert_eq!(g.in_degree(3), 2);
        assert_eq!(g.out_neigh_from(0, 1), &[2]);
        let empty: &[NodeId] = &[];
        assert_eq!(g.out_neigh_from(0, 5), empty);
        assert_eq!(g.out_offset(1), 2);
        assert_eq!(g.in_offset(3), 2);
        assert_eq!(g.vertices(), 0..4);
    }

    #[test]
    fn undirected_aliases_in_to_out() {
        let out_offsets: ParVec<Offset> = vec![0, 1, 2].into();
        let out_neigh: ParVec<NodeId> = vec![1, 0].into();
        let g = CsrGraph::undirected(2, out_offsets, out_neigh);
        assert_eq!(g.num_edges(), 1);
        assert_eq!(g.in_neigh(0), g.out_neigh(0));
        assert_eq!(g.in_degree(0), 1);
    }
}
