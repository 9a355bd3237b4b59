/*
 * SPDX-FileCopyrightText: 2025 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Graph output: edge-list text and serialized CSR binaries.

use crate::graph::CsrGraph;
use crate::types::{Destination, NodeId, Offset};
use anyhow::{ensure, Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Persists a built graph.
pub struct Writer<'a, D: Destination> {
    g: &'a CsrGraph<D>,
}

impl<'a, D: Destination> Writer<'a, D> {
    pub fn new(g: &'a CsrGraph<D>) -> Self {
        Self { g }
    }

    /// Writes one `u v` (or `u v w`) line per stored directed edge.
    pub fn write_edge_list(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut out = BufWriter::new(
            File::create(path).with_context(|| format!("could not create {}", path.display()))?,
        );
        for u in self.g.vertices() {
            for d in self.g.out_neigh(u) {
                self.write_edge(&mut out, u, *d)
                    .with_context(|| format!("could not write to {}", path.display()))?;
            }
        }
        Ok(())
    }

    fn write_edge(&self, out: &mut impl Write, u: NodeId, d: D) -> std::io::Result<()> {
        if D::WEIGHTED {
            writeln!(out, "{u} {} {}", d.node(), d.weight())
        } else {
            writeln!(out, "{u} {}", d.node())
        }
    }

    /// Serializes the graph in the packed little-endian CSR layout read by
    /// [`Reader::read_serialized`](crate::reader::Reader::read_serialized).
    ///
    /// The suffix must match the destination type: `.sg` for unweighted
    /// graphs, `.wsg` for weighted ones.
    pub fn write_serialized(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let suffix = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        if D::WEIGHTED {
            ensure!(suffix == "wsg", "weighted graphs serialize to .wsg");
        } else {
            ensure!(suffix == "sg", "unweighted graphs serialize to .sg");
        }
        let mut out = BufWriter::new(
            File::create(path).with_context(|| format!("could not create {}", path.display()))?,
        );
        (|| -> std::io::Result<()> {
            out.write_all(&[self.g.is_directed() as u8])?;
            out.write_all(&self.g.num_edges_directed().to_le_bytes())?;
            out.write_all(&(self.g.num_nodes() as i64).to_le_bytes())?;
            out.write_all(bytes_of(self.g.out_offsets_raw()))?;
            out.write_all(bytes_of(self.g.out_neigh_raw()))?;
            if self.g.is_directed() {
                let (in_offsets, in_neigh) = self
                    .g
                    .in_arrays_raw()
                    .expect("serializing a directed graph requires inverse adjacency");
                out.write_all(bytes_of(in_offsets))?;
                out.write_all(bytes_of(in_neigh))?;
            }
            out.flush()
        })()
        .with_context(|| format!("could not write to {}", path.display()))
    }
}

/// The raw bytes of a plain-data slice (little-endian packed on the
/// supported targets).
fn bytes_of<T: Copy>(slice: &[T]) -> &[u8] {
    // SAFETY: T is plain data; the view covers exactly the slice.
    unsafe { std::slice::from_raw_parts(slice.as_ptr() as *const u8, std::mem::size_of_val(slice)) }
}

const _: () = {
    // Offsets must serialize as 8 bytes and node ids as 4.
    assert!(std::mem::size_of::<Offset>() == 8);
    assert!(std::mem::size_of::<NodeId>() == 4);
};
