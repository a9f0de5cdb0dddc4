mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        // A failed probe already rendered its outcome line.
        if !matches!(err, CliError::ProbeFailed { .. }) {
            eprintln!("{:?}", miette::Report::new(err));
        }
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

// Command args can carry a token, so log only the command name.
fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Presence => "presence",
        Command::Test(_) => "test",
        Command::Config(_) => "config",
        Command::Completions(_) => "completions",
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    tracing::debug!(command = command_name(&cli.command), "dispatching command");

    match cli.command {
        Command::Presence => commands::presence::handle(&cli.global).await,

        Command::Test(args) => commands::probe::handle(args, &cli.global).await,

        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "hapresence", &mut std::io::stdout());
            Ok(())
        }
    }
}
