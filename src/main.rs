mod api;
mod cli;
mod correlator;
mod extensions;
mod logging;
mod orchestrator;
mod session;
mod tree_builder;
mod tree_view;
mod tui;
mod utils;
mod workflow;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli_args = cli::Cli::parse();

    // Delegate the main application logic to the workflow module
    workflow::run_reshelf(cli_args)
}
