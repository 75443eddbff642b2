use std::process::ExitCode;

use args::{Cli, Commands};
use clap::Parser;
use common::status;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "error" };
    let filter = EnvFilter::try_from_env("LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Generate(args) => commands::generate::generate(args, &cli),
        Commands::Show(opts) => commands::show::show(opts, &cli),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            status::failed(&err.to_string());
            ExitCode::FAILURE
        }
    }
}
