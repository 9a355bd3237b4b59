/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Graph construction: edge lists to CSR.
//!
//! The copying pipeline counts degrees with atomic increments, derives
//! offsets with a block-parallel exclusive prefix sum, scatters edges with
//! fetch-and-add slot reservation, and finally
//! [squishes](crate::builder::squish) the result (per-vertex sort,
//! duplicate and self-loop removal) to restore the adjacency invariants.
//!
//! The in-place pipeline instead sorts and compacts the edge list itself,
//! then rewrites its allocation into the neighbor array: an `(u, v)` pair
//! occupies two [`NodeId`] slots, so the neighbor written for the i-th edge
//! strictly trails the edge being read and the buffer can be reused without
//! a copy. Symmetrization then grows the same buffer in place by opening a
//! gap at the head of each adjacency for the missing inverse edges.

use crate::atomics::{as_atomic_i32, as_atomic_i64};
use crate::generator;
use crate::graph::{CsrGraph, Graph};
use crate::pvec::{ParVec, RawParts};
use crate::types::{Destination, Edge, EdgeList, NodeId, Offset};
use rayon::prelude::*;
use std::alloc::{self, Layout};
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};
use std::sync::atomic::Ordering;
use std::time::Instant;
use sync_cell_slice::SyncSlice;

/// Block length of the parallel prefix sum; sized so a block of degrees
/// stays L2-resident.
const PREFIX_BLOCK: usize = 1 << 20;

/// Minimum per-task length for uniform parallel edge passes.
const MIN_LEN: usize = 1 << 13;

/// Configures and runs CSR construction for destinations of type `D`.
///
/// ```
/// use graphbench::builder::GraphBuilder;
/// use graphbench::types::{Edge, EdgeList};
///
/// let mut el: EdgeList<i32> = EdgeList::new();
/// for (u, v) in [(0, 1), (0, 2), (1, 2)] {
///     el.push(Edge::new(u, v));
/// }
/// let g = GraphBuilder::new().symmetrize(true).build(el);
/// assert_eq!(g.num_nodes(), 3);
/// assert_eq!(g.num_edges(), 3);
/// assert_eq!(g.out_neigh(0), &[1, 2]);
/// ```
pub struct GraphBuilder<D: Destination = NodeId> {
    symmetrize: bool,
    num_nodes: Option<NodeId>,
    needs_weights: bool,
    _marker: PhantomData<D>,
}

impl<D: Destination> Default for GraphBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Destination> GraphBuilder<D> {
    pub fn new() -> Self {
        Self {
            symmetrize: false,
            num_nodes: None,
            needs_weights: D::WEIGHTED,
            _marker: PhantomData,
        }
    }

    /// Whether to treat the input as undirected, inserting every inverse
    /// edge.
    pub fn symmetrize(&mut self, symmetrize: bool) -> &mut Self {
        self.symmetrize = symmetrize;
        self
    }

    /// Fixes the vertex count instead of deriving it from the maximum node
    /// id in the edge list.
    pub fn num_nodes(&mut self, num_nodes: NodeId) -> &mut Self {
        self.num_nodes = Some(num_nodes);
        self
    }

    /// Whether weights still have to be generated for a weighted graph.
    ///
    /// Defaults to true for weighted destinations; readers of formats that
    /// carry weights turn it off.
    pub fn needs_weights(&mut self, needs_weights: bool) -> &mut Self {
        self.needs_weights = needs_weights;
        self
    }

    fn resolve_num_nodes(&self, el: &[Edge<D>]) -> NodeId {
        self.num_nodes.unwrap_or_else(|| find_max_node(el) + 1)
    }

    /// Builds a CSR graph by the copying pipeline.
    pub fn build(&self, mut el: EdgeList<D>) -> CsrGraph<D> {
        let num_nodes = self.resolve_num_nodes(&el);
        if D::WEIGHTED && self.needs_weights {
            generator::insert_weights(&mut el);
        }
        let start = Instant::now();
        let (offsets, neighs) = make_csr(&el, num_nodes, self.symmetrize, false);
        let g = if self.symmetrize {
            CsrGraph::undirected(num_nodes, offsets, neighs)
        } else {
            let inverse = make_csr(&el, num_nodes, false, true);
            CsrGraph::directed(num_nodes, offsets, neighs, Some(inverse))
        };
        drop(el);
        log::info!("Build time: {:.5}s", start.elapsed().as_secs_f64());
        squish(g)
    }
}

impl GraphBuilder<NodeId> {
    /// Builds an unweighted CSR graph in place, consuming the edge list's
    /// allocation as neighbor storage.
    ///
    /// Weighted graphs have no in-place path: the edge-pair layout is only
    /// [`NodeId`]-compatible when destinations carry no weight, which this
    /// method encodes by existing for unweighted builders alone.
    pub fn build_in_place(&self, mut el: EdgeList<NodeId>) -> Graph {
        let num_nodes = self.resolve_num_nodes(&el);
        let n = num_nodes as usize;
        let start = Instant::now();

        el.par_sort_unstable();
        compact_edges(&mut el);

        let m = el.len();
        let degrees = count_degrees(&el, num_nodes, self.symmetrize, false, true);
        let indegrees = (!self.symmetrize).then(|| count_degrees(&el, num_nodes, false, true, true));
        let mut offsets = parallel_prefix_sum(&degrees);

        let raw = el.leak();
        let edges_ptr = raw.ptr.as_ptr();
        let node_ptr = raw.ptr.as_ptr() as *mut NodeId;

        // Forward scatter into the same allocation. Edges are sorted, so
        // the i-th edge writes neighbor slot i: the NodeId write at byte 4i
        // strictly trails the Edge read at byte 8⌊i/2⌋.
        for i in 0..m {
            // SAFETY: reads happen before any write that could reach them.
            let e = unsafe { *edges_ptr.add(i) };
            let slot = offsets[e.u as usize];
            offsets[e.u as usize] = slot + 1;
            unsafe { *node_ptr.add(slot as usize) = e.v };
        }
        // The scatter advanced each offset by the vertex degree; shift the
        // array down one slot to revert.
        for i in (1..offsets.len()).rev() {
            offsets[i] = offsets[i - 1];
        }
        offsets[0] = 0;

        let g = if !self.symmetrize {
            // SAFETY: raw is the edge list's allocation, m neighbor slots
            // initialized by the scatter above.
            let neighs = unsafe { shrink_edges_to_nodes(raw, m) };
            let inverse = indegrees.map(|indegrees| {
                let in_offsets = parallel_prefix_sum(&indegrees);
                let mut inv_neigh = ParVec::<NodeId>::uninit(m);
                let mut cursor = in_offsets.clone();
                for u in 0..n {
                    for k in offsets[u]..offsets[u + 1] {
                        let v = neighs[k as usize] as usize;
                        inv_neigh[cursor[v] as usize] = u as NodeId;
                        cursor[v] += 1;
                    }
                }
                (in_offsets, inv_neigh)
            });
            CsrGraph::directed(num_nodes, offsets, neighs, inverse)
        } else {
            let (offsets, neighs) = symmetrize_in_place(raw, &offsets, degrees, num_nodes);
            CsrGraph::undirected(num_nodes, offsets, neighs)
        };
        log::info!("Build time: {:.5}s", start.elapsed().as_secs_f64());
        g
    }
}

/// Parallel maximum node id over an edge list; -1 when empty.
pub fn find_max_node<D: Destination>(el: &[Edge<D>]) -> NodeId {
    el.par_iter()
        .with_min_len(MIN_LEN)
        .map(|e| e.u.max(e.v.node()))
        .max()
        .unwrap_or(-1)
}

/// Counts the degree contribution of every edge under the
/// symmetrize/transpose flag matrix.
///
/// The in-place symmetrizing build counts only source endpoints: the
/// inverse edges are created later by the in-place expansion.
fn count_degrees<D: Destination>(
    el: &[Edge<D>],
    num_nodes: NodeId,
    symmetrize: bool,
    transpose: bool,
    in_place: bool,
) -> ParVec<NodeId> {
    let mut degrees = ParVec::filled(num_nodes as usize, 0 as NodeId);
    let counts = as_atomic_i32(&mut degrees);
    el.par_iter().with_min_len(MIN_LEN).for_each(|e| {
        if symmetrize || !transpose {
            counts[e.u as usize].fetch_add(1, Ordering::Relaxed);
        }
        if !(in_place && symmetrize) && (symmetrize || transpose) {
            counts[e.v.node() as usize].fetch_add(1, Ordering::Relaxed);
        }
    });
    degrees
}

/// Exclusive prefix sum of `values` into an `N + 1`-entry offsets array.
///
/// Two phases around a serial spine: per-block sums in parallel, a serial
/// scan over the block totals, then a parallel within-block rewrite.
pub fn parallel_prefix_sum(values: &[NodeId]) -> ParVec<Offset> {
    let n = values.len();
    let num_blocks = n.div_ceil(PREFIX_BLOCK);
    let block_sums: Vec<Offset> = (0..num_blocks)
        .into_par_iter()
        .map(|b| {
            values[b * PREFIX_BLOCK..((b + 1) * PREFIX_BLOCK).min(n)]
                .iter()
                .map(|&d| d as Offset)
                .sum()
        })
        .collect();
    let mut bulk_prefix = Vec::with_capacity(num_blocks + 1);
    let mut total: Offset = 0;
    for &sum in &block_sums {
        bulk_prefix.push(total);
        total += sum;
    }
    bulk_prefix.push(total);

    let mut prefix = ParVec::<Offset>::uninit(n + 1);
    let (body, last) = prefix.as_mut_slice().split_at_mut(n);
    body.par_chunks_mut(PREFIX_BLOCK)
        .enumerate()
        .for_each(|(b, chunk)| {
            let mut running = bulk_prefix[b];
            for (slot, &d) in chunk.iter_mut().zip(&values[b * PREFIX_BLOCK..]) {
                *slot = running;
                running += d as Offset;
            }
        });
    last[0] = bulk_prefix[num_blocks];
    prefix
}

/// Builds one direction of a CSR by counting, prefix-summing and
/// scattering.
///
/// With `symmetrize` both directions of every edge are written; with
/// `transpose` the inverse direction only. The resulting adjacencies are
/// unsorted and may contain duplicates and self-loops until
/// [`squish`] runs.
fn make_csr<D: Destination>(
    el: &[Edge<D>],
    num_nodes: NodeId,
    symmetrize: bool,
    transpose: bool,
) -> (ParVec<Offset>, ParVec<D>) {
    let degrees = count_degrees(el, num_nodes, symmetrize, transpose, false);
    let offsets = parallel_prefix_sum(&degrees);
    let mut scatter = offsets.clone();
    let mut neighs = ParVec::<D>::uninit(offsets[num_nodes as usize] as usize);
    {
        let cursor = as_atomic_i64(&mut scatter);
        let slots = neighs.as_mut_slice().as_sync_slice();
        el.par_iter().with_min_len(MIN_LEN).for_each(|e| {
            if symmetrize || !transpose {
                let idx = cursor[e.u as usize].fetch_add(1, Ordering::Relaxed) as usize;
                // SAFETY: the fetch-and-add reserves each slot for exactly
                // one write.
                unsafe { slots[idx].set(e.v) };
            }
            if symmetrize || transpose {
                let idx = cursor[e.v.node() as usize].fetch_add(1, Ordering::Relaxed) as usize;
                // SAFETY: as above; the mirrored destination keeps the
                // weight of the original edge.
                unsafe { slots[idx].set(e.v.with_node(e.u)) };
            }
        });
    }
    (offsets, neighs)
}

/// Splits `buf` into the per-vertex sub-slices delimited by `offsets`.
///
/// `offsets` must start at 0 and be non-decreasing with final value
/// `buf.len()`.
fn split_by_offsets<'a, T>(mut buf: &'a mut [T], offsets: &[Offset]) -> Vec<&'a mut [T]> {
    let n = offsets.len() - 1;
    let mut slices = Vec::with_capacity(n);
    let mut prev = 0usize;
    for u in 0..n {
        let end = offsets[u + 1] as usize;
        let (head, tail) = buf.split_at_mut(end - prev);
        slices.push(head);
        buf = tail;
        prev = end;
    }
    slices
}

fn squish_csr<D: Destination>(
    offsets: &[Offset],
    neigh: &mut ParVec<D>,
) -> (ParVec<Offset>, ParVec<D>) {
    let n = offsets.len() - 1;
    let mut diffs = ParVec::<NodeId>::uninit(n);
    split_by_offsets(neigh.as_mut_slice(), offsets)
        .into_par_iter()
        .zip(diffs.as_mut_slice().par_iter_mut())
        .enumerate()
        .for_each(|(u, (adj, diff))| {
            adj.sort_unstable();
            let u = u as NodeId;
            let mut kept = 0;
            for i in 0..adj.len() {
                let d = adj[i];
                if d.node() == u {
                    continue;
                }
                if kept > 0 && adj[kept - 1].node() == d.node() {
                    continue;
                }
                adj[kept] = d;
                kept += 1;
            }
            *diff = kept as NodeId;
        });

    let sq_offsets = parallel_prefix_sum(&diffs);
    let mut sq_neigh = ParVec::<D>::uninit(sq_offsets[n] as usize);
    split_by_offsets(sq_neigh.as_mut_slice(), &sq_offsets)
        .into_par_iter()
        .enumerate()
        .for_each(|(u, dst)| {
            let start = offsets[u] as usize;
            dst.copy_from_slice(&neigh[start..start + dst.len()]);
        });
    (sq_offsets, sq_neigh)
}

/// Sorts every adjacency, removes duplicate targets and self-loops, and
/// compacts the result into fresh arrays.
pub fn squish<D: Destination>(g: CsrGraph<D>) -> CsrGraph<D> {
    let (directed, num_nodes, out_offsets, mut out_neigh, inverse) = g.into_parts();
    let (sq_out_offsets, sq_out_neigh) = squish_csr(&out_offsets, &mut out_neigh);
    if directed {
        let inverse =
            inverse.map(|(in_offsets, mut in_neigh)| squish_csr(&in_offsets, &mut in_neigh));
        CsrGraph::directed(num_nodes, sq_out_offsets, sq_out_neigh, inverse)
    } else {
        CsrGraph::undirected(num_nodes, sq_out_offsets, sq_out_neigh)
    }
}

/// In-place removal of duplicate edges and self-loops from a sorted edge
/// list.
fn compact_edges(el: &mut EdgeList<NodeId>) {
    let mut kept = 0usize;
    for i in 0..el.len() {
        let e = el[i];
        if e.u == e.v {
            continue;
        }
        if kept > 0 && el[kept - 1] == e {
            continue;
        }
        el[kept] = e;
        kept += 1;
    }
    el.resize(kept);
}

/// Shrinks a leaked edge-pair allocation down to its first `m` neighbor
/// slots.
///
/// # Safety
///
/// `raw` must come from an `EdgeList<NodeId>` whose buffer had its first
/// `m` [`NodeId`] slots initialized.
unsafe fn shrink_edges_to_nodes(raw: RawParts<Edge<NodeId>>, m: usize) -> ParVec<NodeId> {
    if raw.cap == 0 {
        return ParVec::new();
    }
    let old_layout = Layout::array::<Edge<NodeId>>(raw.cap).unwrap();
    if m == 0 {
        alloc::dealloc(raw.ptr.as_ptr() as *mut u8, old_layout);
        return ParVec::new();
    }
    let new_size = m * mem::size_of::<NodeId>();
    let p = alloc::realloc(raw.ptr.as_ptr() as *mut u8, old_layout, new_size);
    let p = NonNull::new(p as *mut NodeId).unwrap_or_else(|| {
        alloc::handle_alloc_error(Layout::array::<NodeId>(m).unwrap())
    });
    ParVec::from_raw_parts(p, m, m)
}

/// Expands a forward CSR (living in a leaked edge-pair allocation) into a
/// symmetric one by inserting the missing inverse edges in place.
///
/// Three passes: count the missing inverses of every vertex by binary
/// search over the original adjacency; relocate adjacencies from high to
/// low vertex ids to their shifted positions, leaving a gap of
/// `invs[v]` slots at the head of each; fill the gaps. Whether an edge is
/// already mirrored is always decided against the original adjacency (the
/// relocated tail), so the counts of pass one and the fills of pass three
/// agree by construction. A final per-vertex sort restores the adjacency
/// invariants.
fn symmetrize_in_place(
    raw: RawParts<Edge<NodeId>>,
    old_offsets: &[Offset],
    mut degrees: ParVec<NodeId>,
    num_nodes: NodeId,
) -> (ParVec<Offset>, ParVec<NodeId>) {
    let n = num_nodes as usize;
    let m = old_offsets[n] as usize;
    let node_ptr = raw.ptr.as_ptr() as *mut NodeId;

    // Pass one: count missing inverses.
    let mut invs = vec![0 as NodeId; n];
    {
        // SAFETY: the forward scatter initialized the first m slots.
        let view = unsafe { std::slice::from_raw_parts(node_ptr, m) };
        for v in 0..n {
            for &d in &view[old_offsets[v] as usize..old_offsets[v + 1] as usize] {
                let d = d as usize;
                let adj = &view[old_offsets[d] as usize..old_offsets[d + 1] as usize];
                if adj.binary_search(&(v as NodeId)).is_err() {
                    invs[d] += 1;
                }
            }
        }
    }
    for (degree, &inv) in degrees.iter_mut().zip(invs.iter()) {
        *degree += inv;
    }
    let new_offsets = parallel_prefix_sum(&degrees);
    let new_m = new_offsets[n] as usize;

    if raw.cap == 0 || new_m == 0 {
        if raw.cap != 0 {
            // SAFETY: raw owns this allocation.
            unsafe {
                alloc::dealloc(
                    raw.ptr.as_ptr() as *mut u8,
                    Layout::array::<Edge<NodeId>>(raw.cap).unwrap(),
                );
            }
        }
        return (new_offsets, ParVec::new());
    }
    // The expanded array still fits the edge-pair allocation:
    // new_m <= 2 m <= 2 cap.
    debug_assert!(new_m * mem::size_of::<NodeId>() <= raw.cap * mem::size_of::<Edge<NodeId>>());
    let old_layout = Layout::array::<Edge<NodeId>>(raw.cap).unwrap();
    // SAFETY: raw owns this allocation with old_layout.
    let realloced = unsafe {
        alloc::realloc(
            raw.ptr.as_ptr() as *mut u8,
            old_layout,
            new_m * mem::size_of::<NodeId>(),
        )
    } as *mut NodeId;
    let Some(buf) = NonNull::new(realloced) else {
        alloc::handle_alloc_error(Layout::array::<NodeId>(new_m).unwrap())
    };
    let p = buf.as_ptr();

    // Pass two: relocate adjacencies to their shifted tails, high to low,
    // so every destination range sits at or after its source range.
    for v in (0..n).rev() {
        let deg = (old_offsets[v + 1] - old_offsets[v]) as usize;
        let src = old_offsets[v] as usize;
        let dst = new_offsets[v] as usize + invs[v] as usize;
        if deg > 0 && src != dst {
            // SAFETY: both ranges lie inside the reallocated buffer;
            // ptr::copy tolerates their overlap.
            unsafe { ptr::copy(p.add(src), p.add(dst), deg) };
        }
    }

    // Pass three: fill the head gap of every vertex with its missing
    // inverses.
    let mut pending = invs.clone();
    for v in 0..n {
        let tail_start = new_offsets[v] as usize + invs[v] as usize;
        let tail_end = new_offsets[v + 1] as usize;
        for k in tail_start..tail_end {
            // SAFETY: tails are never written during this pass; fills only
            // land in head gaps.
            let d = unsafe { *p.add(k) } as usize;
            let d_tail = unsafe {
                std::slice::from_raw_parts(
                    p.add(new_offsets[d] as usize + invs[d] as usize),
                    (new_offsets[d + 1] as usize) - (new_offsets[d] as usize + invs[d] as usize),
                )
            };
            if d_tail.binary_search(&(v as NodeId)).is_err() {
                let slot = new_offsets[d] as usize + pending[d] as usize - 1;
                // SAFETY: slot lies in d's head gap, disjoint from every
                // tail and from previously filled slots of d.
                unsafe { *p.add(slot) = v as NodeId };
                pending[d] -= 1;
            }
        }
    }
    debug_assert!(pending.iter().all(|&p| p == 0));

    // SAFETY: the buffer now holds new_m initialized NodeIds and its
    // allocation size is exactly Layout::array::<NodeId>(new_m).
    let mut neighs = unsafe { ParVec::from_raw_parts(buf, new_m, new_m) };
    split_by_offsets(neighs.as_mut_slice(), &new_offsets)
        .into_par_iter()
        .for_each(|adj| adj.sort_unstable());
    (new_offsets, neighs)
}

/// Relabels an undirected graph by decreasing degree and rebuilds its CSR.
///
/// The triangle-counting kernel uses this to make the ordered count walk
/// short adjacencies first.
pub fn relabel_by_degree<D: Destination>(g: &CsrGraph<D>) -> CsrGraph<D> {
    assert!(!g.is_directed(), "cannot relabel a directed graph");
    let n = g.num_nodes() as usize;
    let start = Instant::now();

    let mut pairs: Vec<(NodeId, NodeId)> = (0..n as NodeId)
        .into_par_iter()
        .map(|u| (g.out_degree(u), u))
        .collect();
    pairs.par_sort_unstable_by(|a, b| b.cmp(a));

    let mut degrees = ParVec::<NodeId>::uninit(n);
    let mut new_ids = ParVec::<NodeId>::uninit(n);
    {
        let new_id_slots = new_ids.as_mut_slice().as_sync_slice();
        degrees
            .as_mut_slice()
            .par_iter_mut()
            .enumerate()
            .for_each(|(k, degree)| {
                *degree = pairs[k].0;
                // SAFETY: pairs is a permutation, each slot written once.
                unsafe { new_id_slots[pairs[k].1 as usize].set(k as NodeId) };
            });
    }

    let offsets = parallel_prefix_sum(&degrees);
    let mut neighs = ParVec::<D>::uninit(offsets[n] as usize);
    {
        let slots = neighs.as_mut_slice().as_sync_slice();
        (0..n as NodeId).into_par_iter().for_each(|u| {
            let base = offsets[new_ids[u as usize] as usize] as usize;
            for (k, d) in g.out_neigh(u).iter().enumerate() {
                // SAFETY: target ranges are disjoint across source
                // vertices.
                unsafe { slots[base + k].set(d.with_node(new_ids[d.node() as usize])) };
            }
        });
    }
    split_by_offsets(neighs.as_mut_slice(), &offsets)
        .into_par_iter()
        .for_each(|adj| adj.sort_unstable());

    log::info!("Relabel time: {:.5}s", start.elapsed().as_secs_f64());
    CsrGraph::undirected(g.num_nodes(), offsets, neighs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WNode;

    fn edge_list(edges: &[(NodeId, NodeId)]) -> EdgeList<NodeId> {
        edges.iter().map(|&(u, v)| Edge::new(u, v)).collect()
    }

    fn weighted_edge_list(edges: &[(NodeId, NodeId, i32)]) -> EdgeList<WNode> {
        edges
            .iter()
            .map(|&(u, v, w)| Edge::new(u, WNode::new(v, w)))
            .collect()
    }

    const K4: [(NodeId, NodeId); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

    fn check_invariants<D: Destination>(g: &CsrGraph<D>) {
        let n = g.num_nodes();
        let mut total = 0;
        for u in g.vertices() {
            let adj = g.out_neigh(u);
            total += adj.len() as i64;
            for w in adj.windows(2) {
                assert!(w[0].node() < w[1].node(), "adjacency not strictly ascending");
            }
            for d in adj {
                assert_ne!(d.node(), u, "self loop survived");
                assert!(d.node() >= 0 && d.node() < n);
            }
        }
        assert_eq!(total, g.num_edges_directed());
    }

    fn check_symmetric<D: Destination>(g: &CsrGraph<D>) {
        for u in g.vertices() {
            for d in g.out_neigh(u) {
                assert!(
                    g.out_neigh(d.node()).iter().any(|e| e.node() == u),
                    "missing inverse of ({u}, {})",
                    d.node()
                );
            }
        }
    }

    #[test]
    fn k4_symmetrized() {
        let g = GraphBuilder::new().symmetrize(true).build(edge_list(&K4));
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.num_edges(), 6);
        assert!(!g.is_directed());
        check_invariants(&g);
        check_symmetric(&g);
        for u in g.vertices() {
            assert_eq!(g.out_degree(u), 3);
        }
    }

    #[test]
    fn duplicates_and_self_loops_are_squished() {
        let g = GraphBuilder::new()
            .symmetrize(true)
            .build(edge_list(&[(0, 1), (1, 0), (0, 1), (1, 1), (2, 2), (1, 2)]));
        check_invariants(&g);
        check_symmetric(&g);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.out_neigh(1), &[0, 2]);
    }

    #[test]
    fn directed_path_with_inverse() {
        let g = GraphBuilder::new().build(edge_list(&[(0, 1), (1, 2), (2, 3), (3, 4)]));
        assert!(g.is_directed());
        check_invariants(&g);
        assert_eq!(g.num_edges_directed(), 4);
        assert_eq!(g.out_neigh(0), &[1]);
        let empty: &[NodeId] = &[];
        assert_eq!(g.in_neigh(0), empty);
        assert_eq!(g.in_neigh(4), &[3]);
        // inverse consistency
        for u in g.vertices() {
            for &v in g.out_neigh(u) {
                assert!(g.in_neigh(v).contains(&u));
            }
        }
    }

    #[test]
    fn explicit_num_nodes_adds_isolated_vertices() {
        let g = GraphBuilder::new()
            .symmetrize(true)
            .num_nodes(6)
            .build(edge_list(&K4));
        assert_eq!(g.num_nodes(), 6);
        assert_eq!(g.out_degree(5), 0);
    }

    #[test]
    fn in_place_matches_copying_without_symmetrization() {
        let edges = [(0, 1), (1, 2), (2, 0), (3, 1), (1, 3), (0, 1), (2, 2)];
        let copying = GraphBuilder::new().build(edge_list(&edges));
        let in_place = GraphBuilder::new().build_in_place(edge_list(&edges));
        assert_eq!(copying.num_nodes(), in_place.num_nodes());
        assert_eq!(copying.num_edges_directed(), in_place.num_edges_directed());
        check_invariants(&in_place);
        for u in copying.vertices() {
            assert_eq!(copying.out_neigh(u), in_place.out_neigh(u));
            assert_eq!(copying.in_neigh(u), in_place.in_neigh(u));
        }
    }

    #[test]
    fn in_place_matches_copying_with_symmetrization() {
        let edges = [(0, 1), (1, 2), (2, 0), (3, 1), (4, 0), (0, 4), (2, 4)];
        let copying = GraphBuilder::new().symmetrize(true).build(edge_list(&edges));
        let in_place = GraphBuilder::new()
            .symmetrize(true)
            .build_in_place(edge_list(&edges));
        assert!(!in_place.is_directed());
        check_invariants(&in_place);
        check_symmetric(&in_place);
        assert_eq!(copying.num_edges(), in_place.num_edges());
        for u in copying.vertices() {
            assert_eq!(copying.out_neigh(u), in_place.out_neigh(u));
        }
    }

    #[test]
    fn in_place_symmetrization_when_all_inverses_exist() {
        // Already symmetric input: no gaps to open.
        let edges = [(0, 1), (1, 0), (1, 2), (2, 1)];
        let g = GraphBuilder::new()
            .symmetrize(true)
            .build_in_place(edge_list(&edges));
        check_invariants(&g);
        check_symmetric(&g);
        assert_eq!(g.num_edges(), 2);
    }

    #[test]
    fn weighted_symmetrization_mirrors_weights() {
        let mut b = GraphBuilder::<WNode>::new();
        b.symmetrize(true).needs_weights(false);
        let g = b.build(weighted_edge_list(&[(0, 1, 7), (1, 2, 9)]));
        check_invariants(&g);
        assert_eq!(g.out_neigh(1), &[WNode::new(0, 7), WNode::new(2, 9)]);
        assert_eq!(g.out_neigh(2), &[WNode::new(1, 9)]);
    }

    #[test]
    fn prefix_sum_is_exact_across_blocks() {
        let len = PREFIX_BLOCK + 123;
        let values: Vec<NodeId> = (0..len).map(|i| (i % 7) as NodeId).collect();
        let prefix = parallel_prefix_sum(&values);
        assert_eq!(prefix.len(), len + 1);
        let mut running: Offset = 0;
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(prefix[i], running);
            running += v as Offset;
        }
        assert_eq!(prefix[len], running);
    }

    #[test]
    fn relabel_by_degree_sorts_vertices_by_degree() {
        // star around 3 plus one extra edge
        let g = GraphBuilder::new()
            .symmetrize(true)
            .build(edge_list(&[(3, 0), (3, 1), (3, 2), (3, 4), (0, 1)]));
        let r = relabel_by_degree(&g);
        check_invariants(&r);
        check_symmetric(&r);
        assert_eq!(r.num_edges(), g.num_edges());
        // new id 0 is the old hub
        assert_eq!(r.out_degree(0), 4);
        let mut degrees: Vec<NodeId> = r.vertices().map(|u| r.out_degree(u)).collect();
        let mut sorted = degrees.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(degrees, sorted);
        degrees.sort_unstable();
        let mut orig: Vec<NodeId> = g.vertices().map(|u| g.out_degree(u)).collect();
        orig.sort_unstable();
        assert_eq!(degrees, orig);
    }

    #[test]
    fn empty_edge_list_builds_empty_graph() {
        let g = GraphBuilder::new()
            .symmetrize(true)
            .num_nodes(4)
            .build(EdgeList::<NodeId>::new());
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.num_edges(), 0);
        let g = GraphBuilder::new().num_nodes(4).build_in_place(EdgeList::new());
        assert_eq!(g.num_edges_directed(), 0);
    }
}
