#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;
mod commands;
mod logging;

use crate::commands::Command;
use crate::logging::{TracingConfig, TracingFormat};
use tracing::instrument;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    if let Err(error) = run_main().await {
        eprintln!("{error:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> miette::Result<()> {
    let cli = cli::parse();

    let tracing_config = TracingConfig {
        format: if cli.json {
            TracingFormat::Json
        } else {
            TracingFormat::Compact
        },
        level: cli.level.into(),
    };
    logging::init_tracing(tracing_config)?;

    let command: Command = cli.command.into();
    run_command(command).await
}

#[instrument(name = "fncache_command", skip_all)]
async fn run_command(command: Command) -> miette::Result<()> {
    let message = commands::execute(command).await?;
    println!("{message}");
    Ok(())
}
