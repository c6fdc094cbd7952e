//! Live plots of data sent by Pinguino demo sketches.
#![warn(missing_docs)]

use clap::Parser;
use pinguino_plot::cli::Cli;

/// The main plot application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    Cli::parse().run().await
}
