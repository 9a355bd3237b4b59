/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::Parser;
use graphbench_algo::bfs;
use graphbench_cli::{benchmark_kernel, init_env_logger, CommonArgs, SourcePicker};

#[derive(Parser, Debug)]
#[command(name = "bfs", about = "Direction-optimizing breadth-first search")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    init_env_logger();
    let cli = Cli::parse();
    cli.common.configure_thread_pool()?;
    let g = cli.common.make_graph()?;
    let mut sp = SourcePicker::new(&g, cli.common.start_vertex);
    let mut vsp = SourcePicker::new(&g, cli.common.start_vertex);
    benchmark_kernel(
        &cli.common,
        &g,
        |g| {
            let source = sp.pick_next();
            log::info!("source: {source}");
            bfs::bfs_tree(g, source)
        },
        |g, parent| bfs::print_stats(g, parent),
        |g, parent| bfs::verify(g, vsp.pick_next(), parent),
    )
}
