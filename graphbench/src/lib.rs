/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Core of the graphbench suite: a compressed sparse-row graph, the
//! builders that produce it from files or synthetic generators, and the
//! shared-memory primitives the parallel kernels are written against.
//!
//! The representation is deliberately plain — an offsets array and a flat
//! neighbor array per direction — so that kernels can reason about edge
//! slots by index (the betweenness-centrality successor bitmap depends on
//! this). All construction paths end with the same adjacency invariants:
//! neighborhoods sorted, duplicate-free, and without self-loops.

#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(unreachable_code)]
#![deny(unreachable_patterns)]
#![deny(unused_doc_comments)]

pub mod atomics;
pub mod bitmap;
pub mod builder;
pub mod generator;
pub mod graph;
pub mod pvec;
pub mod queue;
pub mod reader;
pub mod types;
pub mod writer;

pub mod prelude {
    pub use crate::bitmap::Bitmap;
    pub use crate::builder::GraphBuilder;
    pub use crate::generator::Generator;
    pub use crate::graph::{CsrGraph, Graph, WGraph};
    pub use crate::pvec::ParVec;
    pub use crate::queue::{QueueBuffer, SlidingQueue};
    pub use crate::reader::Reader;
    pub use crate::types::{Destination, Edge, EdgeList, NodeId, Offset, WNode, Weight};
    pub use crate::writer::Writer;
}
