//! JINST CLI - static invocation counter

mod cli;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::{Cli, EXIT_FAILURE, EXIT_SUCCESS};

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match jinst::run(&cli.to_options()) {
        Ok(_) => EXIT_SUCCESS,
        Err(e) => {
            error!("{e}");
            EXIT_FAILURE
        }
    };

    std::process::exit(exit_code);
}
