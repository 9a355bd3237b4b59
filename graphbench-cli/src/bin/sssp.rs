/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::Parser;
use graphbench::types::Weight;
use graphbench_algo::sssp;
use graphbench_cli::{benchmark_kernel, init_env_logger, CommonArgs, SourcePicker};

#[derive(Parser, Debug)]
#[command(name = "sssp", about = "Single-source shortest paths (delta-stepping)")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Bucket width of the delta-stepping bins.
    #[arg(short = 'd', long, default_value_t = 1)]
    delta: Weight,
}

fn main() -> Result<()> {
    init_env_logger();
    let cli = Cli::parse();
    cli.common.configure_thread_pool()?;
    let g = cli.common.make_weighted_graph()?;
    let mut sp = SourcePicker::new(&g, cli.common.start_vertex);
    let mut vsp = SourcePicker::new(&g, cli.common.start_vertex);
    benchmark_kernel(
        &cli.common,
        &g,
        |g| {
            let source = sp.pick_next();
            log::info!("source: {source}");
            sssp::delta_step(g, source, cli.delta)
        },
        |g, dist| sssp::print_stats(g, dist),
        |g, dist| sssp::verify(g, vsp.pick_next(), dist),
    )
}
