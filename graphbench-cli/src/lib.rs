/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Shared command-line surface and benchmark driver for the kernel
//! binaries.

use anyhow::{bail, ensure, Result};
use clap::Args;
use graphbench::builder::GraphBuilder;
use graphbench::generator::Generator;
use graphbench::graph::{CsrGraph, Graph, WGraph};
use graphbench::reader::Reader;
use graphbench::types::{Destination, EdgeList, NodeId, WNode, RAND_SEED};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments shared by every kernel binary.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Load the graph from a file; the suffix selects the parser.
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Generate an R-MAT graph with 2^scale vertices.
    #[arg(short = 'g', long, conflicts_with = "file")]
    pub scale: Option<u32>,

    /// Generate a uniform-random graph with 2^scale vertices.
    #[arg(short = 'u', long = "uniform", conflicts_with_all = ["file", "scale"])]
    pub uniform_scale: Option<u32>,

    /// Average degree of generated graphs.
    #[arg(long, default_value_t = 16)]
    pub degree: u32,

    /// Symmetrize the input edge list.
    #[arg(short = 's', long)]
    pub symmetrize: bool,

    /// Build the graph in place, reusing the edge-list buffer
    /// (unweighted graphs only).
    #[arg(short = 'm', long)]
    pub in_place: bool,

    /// Number of benchmark trials.
    #[arg(short = 'n', long, default_value_t = 16)]
    pub trials: usize,

    /// Fixed start vertex; random (seeded) when absent.
    #[arg(short = 'r', long)]
    pub start_vertex: Option<NodeId>,

    /// Print an analysis of the last trial.
    #[arg(short = 'a', long)]
    pub analysis: bool,

    /// Check every trial against the serial verifier.
    #[arg(short = 'v', long)]
    pub verify: bool,

    /// Number of worker threads; defaults to all cores.
    #[arg(short = 'j', long)]
    pub num_threads: Option<usize>,
}

impl CommonArgs {
    /// Sizes the global rayon pool when `-j` is given.
    pub fn configure_thread_pool(&self) -> Result<()> {
        if let Some(num_threads) = self.num_threads {
            ensure!(num_threads > 0, "number of threads must be positive");
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()?;
        }
        log::info!("Using {} threads", rayon::current_num_threads());
        Ok(())
    }

    /// Generated graphs are always symmetrized; files are symmetrized on
    /// request.
    fn symmetrize_effective(&self) -> bool {
        self.symmetrize || self.scale.is_some() || self.uniform_scale.is_some()
    }

    fn generate<D: Destination>(&self) -> Result<EdgeList<D>> {
        match (self.scale, self.uniform_scale) {
            (Some(scale), None) => Ok(Generator::<D>::new(scale, self.degree).generate(false)),
            (None, Some(scale)) => Ok(Generator::<D>::new(scale, self.degree).generate(true)),
            (None, None) => bail!("no graph input specified (use --help)"),
            (Some(_), Some(_)) => unreachable!("rejected by clap"),
        }
    }

    /// Builds the unweighted graph described by the flags.
    pub fn make_graph(&self) -> Result<Graph> {
        let el = if let Some(path) = &self.file {
            let reader = Reader::<NodeId>::new(path);
            if reader.is_serialized() {
                return reader.read_serialized();
            }
            reader.read_file()?.0
        } else {
            self.generate()?
        };
        let mut builder = GraphBuilder::new();
        builder.symmetrize(self.symmetrize_effective());
        Ok(if self.in_place {
            builder.build_in_place(el)
        } else {
            builder.build(el)
        })
    }

    /// Builds the weighted graph described by the flags; weights are
    /// generated unless the input format carries them.
    pub fn make_weighted_graph(&self) -> Result<WGraph> {
        ensure!(
            !self.in_place,
            "in-place building does not support weighted graphs"
        );
        let (el, needs_weights) = if let Some(path) = &self.file {
            let reader = Reader::<WNode>::new(path);
            if reader.is_serialized() {
                return reader.read_serialized();
            }
            reader.read_file()?
        } else {
            (self.generate()?, true)
        };
        let mut builder = GraphBuilder::<WNode>::new();
        builder
            .symmetrize(self.symmetrize_effective())
            .needs_weights(needs_weights);
        Ok(builder.build(el))
    }
}

/// Picks benchmark sources: the fixed `-r` vertex when given, otherwise
/// seeded uniform draws skipping isolated vertices.
pub struct SourcePicker<'a, D: Destination> {
    g: &'a CsrGraph<D>,
    given_source: Option<NodeId>,
    rng: SmallRng,
}

impl<'a, D: Destination> SourcePicker<'a, D> {
    pub fn new(g: &'a CsrGraph<D>, given_source: Option<NodeId>) -> Self {
        Self {
            g,
            given_source,
            rng: SmallRng::seed_from_u64(RAND_SEED),
        }
    }

    pub fn pick_next(&mut self) -> NodeId {
        if let Some(source) = self.given_source {
            return source;
        }
        loop {
            let source = self.rng.random_range(0..self.g.num_nodes());
            if self.g.out_degree(source) != 0 {
                return source;
            }
        }
    }
}

/// Times `trials` runs of a kernel, printing per-trial and average times,
/// the analysis after the last trial under `-a`, and checking each result
/// under `-v`.
pub fn benchmark_kernel<D: Destination, R>(
    args: &CommonArgs,
    g: &CsrGraph<D>,
    mut kernel: impl FnMut(&CsrGraph<D>) -> R,
    stats: impl Fn(&CsrGraph<D>, &R),
    mut verify: impl FnMut(&CsrGraph<D>, &R) -> bool,
) -> Result<()> {
    g.print_stats();
    let mut total = 0.0f64;
    for trial in 0..args.trials {
        let start = Instant::now();
        let result = kernel(g);
        let elapsed = start.elapsed().as_secs_f64();
        log::info!("Trial time: {elapsed:.5}s");
        total += elapsed;
        if args.analysis && trial == args.trials - 1 {
            stats(g, &result);
        }
        if args.verify {
            ensure!(verify(g, &result), "verification failed on trial {trial}");
            log::info!("Verification: PASS");
        }
    }
    if args.trials > 0 {
        log::info!("Average time: {:.5}s", total / args.trials as f64);
    }
    Ok(())
}

/// Initializes `env_logger` with an `info` default so the benchmark
/// output is visible without configuration.
pub fn init_env_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
