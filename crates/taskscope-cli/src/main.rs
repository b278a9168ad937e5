//! taskscope - inspect the live tasks of an instrumented process

use std::io::stderr;

use anyhow::Result;
use clap::Parser as _;
use console::Term;
use taskscope_cli::Cli;
use taskscope_cli::commands::run;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so views stay pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskscope=warn,taskscope_cli=warn".into()),
        )
        .with_writer(stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    run(cli.command, &Term::stdout()).await?;
    Ok(())
}
