//! apidoc CLI: browsable documentation for a C++ API.
//!
//! Builds a static Markdown site from the documentation document, and
//! inspects routes, name resolution, and markup from the command line.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
