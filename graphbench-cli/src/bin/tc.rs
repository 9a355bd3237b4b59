/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::Parser;
use graphbench_algo::tc;
use graphbench_cli::{benchmark_kernel, init_env_logger, CommonArgs};

#[derive(Parser, Debug)]
#[command(name = "tc", about = "Triangle counting (ordered, relabeling heuristic)")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    init_env_logger();
    let cli = Cli::parse();
    cli.common.configure_thread_pool()?;
    let g = cli.common.make_graph()?;
    benchmark_kernel(
        &cli.common,
        &g,
        tc::hybrid,
        |g, total| tc::print_stats(g, total),
        |g, total| tc::verify(g, *total),
    )
}
