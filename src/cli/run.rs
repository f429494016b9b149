//! CLI entry point and dispatch
//!
//! `run()` parses arguments, discovers configuration, installs logging,
//! dispatches the command, and prints every error itself.

use clap::Parser;

use ctxbuf_config::Config;
use ctxbuf_utils::exit_codes::ExitCode;
use ctxbuf_utils::logging::init_tracing;
use ctxbuf_utils::redaction::redact_error_message;

use super::args::{Cli, Commands};
use super::commands;

/// Main CLI execution function.
///
/// Returns the exit code on failure after printing the error; `main` only
/// maps it to the process exit status.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let config = match Config::discover(&cli.config_args()) {
        Ok(config) => config,
        Err(err) => return Err(report(err)),
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let result = rt.block_on(async {
        match &cli.command {
            Commands::Filter { dir } => commands::execute_filter_command(dir, &config),
            Commands::Classify { dir } => commands::execute_classify_command(dir, &config),
            Commands::ParseResponse { input } => commands::execute_parse_response_command(input),
            Commands::Select {
                dir,
                history,
                summary,
            } => {
                commands::execute_select_command(dir, history, summary.as_deref(), &config).await
            }
            Commands::Import { dir } => commands::execute_import_command(dir, &config),
        }
    });

    result.map_err(report)
}

/// Print `error` for the user and return its exit code.
fn report(error: anyhow::Error) -> ExitCode {
    match commands::typed_error(error) {
        Ok(typed) => {
            eprint!("{}", typed.display_for_user());
            typed.to_exit_code()
        }
        Err(other) => {
            eprintln!("✗ Unexpected error: {}", redact_error_message(&format!("{other:#}")));
            eprintln!("\n  Run with --verbose for more detailed output");
            ExitCode::INTERNAL
        }
    }
}
