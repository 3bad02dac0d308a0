//! leadscrub CLI — lead-list enrichment tool.
//!
//! Runs a sales-lead CSV through LLM classification, company bundling, and
//! email-provider lookup, then uploads the augmented list and notifies
//! operators.

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
