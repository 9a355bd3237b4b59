/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::Parser;
use graphbench_algo::bc;
use graphbench_cli::{benchmark_kernel, init_env_logger, CommonArgs, SourcePicker};

#[derive(Parser, Debug)]
#[command(name = "bc", about = "Approximate betweenness centrality (Brandes)")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Number of sampled sources per trial.
    #[arg(short = 'k', long, default_value_t = 1)]
    iterations: usize,
}

fn main() -> Result<()> {
    init_env_logger();
    let cli = Cli::parse();
    cli.common.configure_thread_pool()?;
    if cli.iterations > 1 && cli.common.start_vertex.is_some() {
        log::warn!("iterating from the same source (-r with -k)");
    }
    let g = cli.common.make_graph()?;
    let mut sp = SourcePicker::new(&g, cli.common.start_vertex);
    let mut vsp = SourcePicker::new(&g, cli.common.start_vertex);
    benchmark_kernel(
        &cli.common,
        &g,
        |g| {
            let sources: Vec<_> = (0..cli.iterations).map(|_| sp.pick_next()).collect();
            bc::brandes(g, sources)
        },
        |g, scores| bc::print_stats(g, scores),
        |g, scores| {
            let sources: Vec<_> = (0..cli.iterations).map(|_| vsp.pick_next()).collect();
            bc::verify(g, sources, scores, 1e-3)
        },
    )
}
