/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The six parallel graph kernels of the graphbench suite.
//!
//! Each kernel is a pure function of `(graph, parameters)` returning a
//! per-vertex result (or a scalar for triangle counting), built on a
//! distinct concurrency pattern:
//!
//! - [`bfs`] — direction-optimizing frontier search with queue/bitmap
//!   conversion;
//! - [`sssp`] — Δ-stepping with bucketed compare-and-swap relaxation;
//! - [`pr`] — atomics-free pull-direction iteration;
//! - [`cc`] — Afforest sampled union-find;
//! - [`bc`] — Brandes with a successor bitmap over edge slots;
//! - [`tc`] — ordered triangle enumeration with a relabeling heuristic.
//!
//! Every module also carries its stats printer and a verifier checking
//! the kernel against an independent serial implementation.

#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(unreachable_code)]
#![deny(unreachable_patterns)]
#![deny(unused_doc_comments)]

pub mod bc;
pub mod bfs;
pub mod cc;
pub mod pr;
pub mod sssp;
pub mod tc;
