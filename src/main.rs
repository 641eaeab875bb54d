//! handwrite entrypoint.

mod cli;
mod core;

use clap::Parser;
use std::process::ExitCode;

use crate::core::error::eprint_error_json;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    if let Err(err) = cli::init_logging(cli.verbose, cli.log_level.as_deref()) {
        return exit_with_error(&err, cli.json);
    }

    match cli::commands::handle(cli.command, cli.json, cli.config.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => exit_with_error(&err, cli.json),
    }
}

fn exit_with_error(error: &core::error::HandwriteError, json: bool) -> ExitCode {
    if json {
        eprint_error_json(error);
    } else {
        eprintln!("{error}");
    }
    ExitCode::from(1)
}
