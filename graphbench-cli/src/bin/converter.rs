/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::{ensure, Result};
use clap::Parser;
use graphbench::writer::Writer;
use graphbench_cli::{init_env_logger, CommonArgs};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "converter",
    about = "Builds a graph and writes it back out as an edge list or a serialized CSR"
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Write the built graph as a textual edge list.
    #[arg(short = 'e', long)]
    edge_list_out: Option<PathBuf>,

    /// Write the built graph in the serialized CSR layout (.sg / .wsg).
    #[arg(short = 'b', long)]
    serialized_out: Option<PathBuf>,

    /// Build (and write) a weighted graph.
    #[arg(short = 'w', long)]
    weighted: bool,
}

fn main() -> Result<()> {
    init_env_logger();
    let cli = Cli::parse();
    cli.common.configure_thread_pool()?;
    ensure!(
        cli.edge_list_out.is_some() || cli.serialized_out.is_some(),
        "no output requested (use -e or -b)"
    );
    if cli.weighted {
        let g = cli.common.make_weighted_graph()?;
        let writer = Writer::new(&g);
        if let Some(path) = &cli.edge_list_out {
            writer.write_edge_list(path)?;
        }
        if let Some(path) = &cli.serialized_out {
            writer.write_serialized(path)?;
        }
    } else {
        let g = cli.common.make_graph()?;
        let writer = Writer::new(&g);
        if let Some(path) = &cli.edge_list_out {
            writer.write_edge_list(path)?;
        }
        if let Some(path) = &cli.serialized_out {
            writer.write_serialized(path)?;
        }
    }
    Ok(())
}
