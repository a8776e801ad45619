// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, read the key, hand off to
//   `publish::run`.
// - Every fatal error ends up here and becomes exit code 1.

use buildrone_upload::config::{ApiKey, Cli};
use buildrone_upload::publish;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "buildrone_upload=debug"
    } else {
        "buildrone_upload=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // The key is checked before anything touches the network.
    let key = match ApiKey::from_env() {
        Ok(key) => key,
        Err(e) => {
            println!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let workdir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("couldn't determine working directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    match publish::run(&cli, &key, &workdir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
