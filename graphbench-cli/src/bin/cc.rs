/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::Parser;
use graphbench_algo::cc;
use graphbench_cli::{benchmark_kernel, init_env_logger, CommonArgs};

#[derive(Parser, Debug)]
#[command(name = "cc", about = "Connected components (Afforest sampling)")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Number of neighbor-sampling rounds before the final link phase.
    #[arg(long, default_value_t = cc::DEFAULT_NEIGHBOR_ROUNDS)]
    neighbor_rounds: usize,
}

fn main() -> Result<()> {
    init_env_logger();
    let cli = Cli::parse();
    cli.common.configure_thread_pool()?;
    let g = cli.common.make_graph()?;
    benchmark_kernel(
        &cli.common,
        &g,
        |g| cc::afforest(g, cli.neighbor_rounds),
        |g, comp| cc::print_stats(g, comp),
        |g, comp| cc::verify(g, comp),
    )
}
