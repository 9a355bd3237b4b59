/*
 * SPDX-FileCopyrightText: 2025 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Suffix-dispatched graph input.
//!
//! Text formats produce an edge list for the builder; the serialized
//! binary formats (`.sg`/`.wsg`) load a finished CSR directly.

use crate::graph::CsrGraph;
use crate::pvec::ParVec;
use crate::types::{Destination, Edge, EdgeList, NodeId, Offset, Weight};
use anyhow::{bail, ensure, Context, Result};
use dsi_progress_logger::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::marker::PhantomData;
use std::path::PathBuf;

/// Reads a graph input file, dispatching on its suffix.
pub struct Reader<D: Destination = NodeId> {
    path: PathBuf,
    _marker: PhantomData<D>,
}

impl<D: Destination> Reader<D> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    fn suffix(&self) -> Result<&str> {
        self.path
            .extension()
            .and_then(|s| s.to_str())
            .with_context(|| format!("could not find the suffix of {}", self.path.display()))
    }

    /// Whether the file holds a serialized CSR rather than an edge list.
    pub fn is_serialized(&self) -> bool {
        matches!(self.suffix(), Ok("sg") | Ok("wsg"))
    }

    /// Parses a textual edge-list format.
    ///
    /// The second component reports whether weights still need to be
    /// generated: true only for weighted builds fed from a weightless
    /// format.
    pub fn read_file(&self) -> Result<(EdgeList<D>, bool)> {
        let suffix = self.suffix()?;
        let file = File::open(&self.path)
            .with_context(|| format!("could not open {}", self.path.display()))?;
        let reader = BufReader::new(file);

        let mut pl = ProgressLogger::default();
        pl.item_name("edge");
        pl.start(format!("Reading {}...", self.path.display()));

        let el = match suffix {
            "el" => self.read_el(reader, &mut pl)?,
            "wel" => self.read_wel(reader, &mut pl)?,
            "gr" => self.read_gr(reader, &mut pl)?,
            "graph" => self.read_metis(reader, &mut pl)?,
            _ => bail!("unrecognized suffix: .{suffix}"),
        };
        pl.done();
        Ok((el, D::WEIGHTED && suffix == "el"))
    }

    fn read_el(&self, reader: impl BufRead, pl: &mut impl ProgressLog) -> Result<EdgeList<D>> {
        let mut el = EdgeList::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = self.line(line, lineno)?;
            let mut tokens = line.split_whitespace();
            let Some(first) = tokens.next() else { continue };
            let u = self.parse(first, lineno)?;
            let v = self.parse(self.token(tokens.next(), lineno)?, lineno)?;
            el.push(Edge::new(u, D::from_node(v)));
            pl.light_update();
        }
        Ok(el)
    }

    fn read_wel(&self, reader: impl BufRead, pl: &mut impl ProgressLog) -> Result<EdgeList<D>> {
        let mut el = EdgeList::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = self.line(line, lineno)?;
            let mut tokens = line.split_whitespace();
            let Some(first) = tokens.next() else { continue };
            let u = self.parse(first, lineno)?;
            let v = self.parse(self.token(tokens.next(), lineno)?, lineno)?;
            let w: Weight = self.parse(self.token(tokens.next(), lineno)?, lineno)?;
            el.push(Edge::new(u, D::from_node(v).with_weight(w)));
            pl.light_update();
        }
        Ok(el)
    }

    /// DIMACS: only lines of the form `a u v w` carry edges.
    fn read_gr(&self, reader: impl BufRead, pl: &mut impl ProgressLog) -> Result<EdgeList<D>> {
        let mut el = EdgeList::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = self.line(line, lineno)?;
            let mut tokens = line.split_whitespace();
            if tokens.next() != Some("a") {
                continue;
            }
            let u = self.parse(self.token(tokens.next(), lineno)?, lineno)?;
            let v = self.parse(self.token(tokens.next(), lineno)?, lineno)?;
            let w: Weight = self.parse(self.token(tokens.next(), lineno)?, lineno)?;
            el.push(Edge::new(u, D::from_node(v).with_weight(w)));
            pl.light_update();
        }
        Ok(el)
    }

    /// Metis: header `N M`, then line `i + 1` lists the 1-based neighbors
    /// of vertex `i`.
    fn read_metis(&self, reader: impl BufRead, pl: &mut impl ProgressLog) -> Result<EdgeList<D>> {
        let mut el = EdgeList::new();
        let mut lines = reader.lines().enumerate();
        let (lineno, header) = lines
            .next()
            .with_context(|| format!("{} is empty", self.path.display()))?;
        let header = self.line(header, lineno)?;
        let mut tokens = header.split_whitespace();
        let num_nodes: NodeId = self.parse(self.token(tokens.next(), lineno)?, lineno)?;
        let _num_edges: i64 = self
            .token(tokens.next(), lineno)?
            .parse()
            .with_context(|| format!("bad header in {}", self.path.display()))?;
        for u in 0..num_nodes {
            let (lineno, line) = lines.next().with_context(|| {
                format!("{}: missing adjacency line for vertex {u}", self.path.display())
            })?;
            let line = self.line(line, lineno)?;
            for token in line.split_whitespace() {
                let v: NodeId = self.parse(token, lineno)?;
                el.push(Edge::new(u, D::from_node(v - 1)));
                pl.light_update();
            }
        }
        Ok(el)
    }

    /// Loads a serialized CSR graph (`.sg`/`.wsg`).
    ///
    /// The layout is little-endian and tightly packed: a directedness
    /// byte, the directed edge count and the vertex count as `i64`, the
    /// offsets array, the neighbor array, and, for directed graphs, the
    /// same two arrays for the inverse adjacency.
    pub fn read_serialized(&self) -> Result<CsrGraph<D>> {
        let suffix = self.suffix()?;
        let weighted = suffix == "wsg";
        ensure!(
            !weighted || D::WEIGHTED,
            ".wsg is only allowed for weighted graphs"
        );
        ensure!(
            weighted || !D::WEIGHTED,
            ".sg is not allowed for weighted graphs"
        );
        let file = File::open(&self.path)
            .with_context(|| format!("could not open {}", self.path.display()))?;
        let mut reader = BufReader::new(file);

        let directed = read_u8(&mut reader)? != 0;
        let num_edges = read_i64(&mut reader)?;
        let num_nodes = read_i64(&mut reader)?;
        ensure!(
            num_nodes >= 0 && num_nodes <= NodeId::MAX as i64 && num_edges >= 0,
            "{}: malformed header",
            self.path.display()
        );

        let offsets = read_vec::<Offset>(&mut reader, num_nodes as usize + 1)?;
        let neighs = read_vec::<D>(&mut reader, num_edges as usize)?;
        let g = if directed {
            let in_offsets = read_vec::<Offset>(&mut reader, num_nodes as usize + 1)?;
            let in_neighs = read_vec::<D>(&mut reader, num_edges as usize)?;
            CsrGraph::directed(
                num_nodes as NodeId,
                offsets,
                neighs,
                Some((in_offsets, in_neighs)),
            )
        } else {
            CsrGraph::undirected(num_nodes as NodeId, offsets, neighs)
        };
        Ok(g)
    }

    fn line(&self, line: std::io::Result<String>, lineno: usize) -> Result<String> {
        line.with_context(|| format!("error reading line {} of {}", lineno + 1, self.path.display()))
    }

    fn token<'a>(&self, token: Option<&'a str>, lineno: usize) -> Result<&'a str> {
        token.with_context(|| {
            format!("truncated line {} in {}", lineno + 1, self.path.display())
        })
    }

    fn parse<T: std::str::FromStr>(&self, token: &str, lineno: usize) -> Result<T>
    where
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        token.parse().with_context(|| {
            format!(
                "could not parse {token:?} on line {} of {}",
                lineno + 1,
                self.path.display()
            )
        })
    }
}

fn read_u8(reader: &mut impl Read) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_i64(reader: &mut impl Read) -> Result<i64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

/// Bulk-reads `len` plain-data elements.
///
/// Elements are read as raw bytes; all supported element types are
/// little-endian-packed 32/64-bit integers, matching the on-disk layout on
/// the little-endian targets this suite runs on.
fn read_vec<T: Copy>(reader: &mut impl Read, len: usize) -> Result<ParVec<T>> {
    let mut v = ParVec::<T>::uninit(len);
    // SAFETY: the byte view covers exactly the freshly allocated buffer,
    // and every byte is overwritten by read_exact before use.
    let bytes = unsafe {
        std::slice::from_raw_parts_mut(
            v.as_mut_slice().as_mut_ptr() as *mut u8,
            len * std::mem::size_of::<T>(),
        )
    };
    reader
        .read_exact(bytes)
        .context("truncated serialized graph")?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WNode;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_el() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "g.el", "0 1\n1 2\n\n2 0\n");
        let (el, needs_weights) = Reader::<NodeId>::new(&path).read_file().unwrap();
        assert!(!needs_weights);
        let edges: Vec<(NodeId, NodeId)> = el.iter().map(|e| (e.u, e.v)).collect();
        assert_eq!(edges, vec![(0, 1), (1, 2), (2, 0)]);
    }

    #[test]
    fn parses_wel_and_suppresses_weight_insertion() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "g.wel", "0 1 5\n1 2 9\n");
        let (el, needs_weights) = Reader::<WNode>::new(&path).read_file().unwrap();
        assert!(!needs_weights);
        assert_eq!(el[1].v, WNode::new(2, 9));
    }

    #[test]
    fn weighted_el_requests_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "g.el", "0 1\n");
        let (_, needs_weights) = Reader::<WNode>::new(&path).read_file().unwrap();
        assert!(needs_weights);
    }

    #[test]
    fn parses_dimacs_gr() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "g.gr",
            "c a comment\np sp 3 2\na 1 2 4\na 2 3 1\n",
        );
        let (el, _) = Reader::<WNode>::new(&path).read_file().unwrap();
        assert_eq!(el.len(), 2);
        assert_eq!(el[0].u, 1);
        assert_eq!(el[0].v, WNode::new(2, 4));
    }

    #[test]
    fn parses_metis_graph() {
        let dir = tempfile::tempdir().unwrap();
        // triangle, 1-indexed
        let path = write_file(&dir, "g.graph", "3 3\n2 3\n1 3\n1 2\n");
        let (el, _) = Reader::<NodeId>::new(&path).read_file().unwrap();
        let edges: Vec<(NodeId, NodeId)> = el.iter().map(|e| (e.u, e.v)).collect();
        assert_eq!(edges, vec![(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)]);
    }

    #[test]
    fn rejects_unknown_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "g.xyz", "0 1\n");
        assert!(Reader::<NodeId>::new(&path).read_file().is_err());
    }

    #[test]
    fn rejects_weight_mismatch_on_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "g.wsg", "");
        assert!(Reader::<NodeId>::new(&path).read_serialized().is_err());
        let path = write_file(&dir, "g.sg", "");
        assert!(Reader::<WNode>::new(&path).read_serialized().is_err());
    }
}
