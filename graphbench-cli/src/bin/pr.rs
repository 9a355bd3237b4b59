/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::Parser;
use graphbench_algo::pr;
use graphbench_cli::{benchmark_kernel, init_env_logger, CommonArgs};

#[derive(Parser, Debug)]
#[command(name = "pr", about = "PageRank (pull direction)")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Maximum number of iterations.
    #[arg(short = 'k', long, default_value_t = 20)]
    iterations: i32,

    /// Convergence threshold on the total score change per iteration.
    #[arg(short = 'e', long, default_value_t = pr::DEFAULT_EPSILON)]
    epsilon: f64,
}

fn main() -> Result<()> {
    init_env_logger();
    let cli = Cli::parse();
    cli.common.configure_thread_pool()?;
    let g = cli.common.make_graph()?;
    benchmark_kernel(
        &cli.common,
        &g,
        |g| pr::page_rank_pull(g, cli.iterations, cli.epsilon),
        |g, scores| pr::print_stats(g, scores),
        |g, scores| pr::verify(g, scores, cli.epsilon.max(1e-12) * 4.0),
    )
}
