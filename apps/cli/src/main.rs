//! botskills CLI: refresh an assistant's dispatcher model and bindings.
//!
//! Regenerates the dispatcher routing model and the strongly-typed
//! recognizer classes after connected skills change.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::try_parse().unwrap_or_else(|e| commands::exit_on_parse_error(e));
    commands::init_tracing(&cli);
    commands::run(cli).await
}
