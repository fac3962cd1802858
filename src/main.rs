mod api;
mod app;
mod application;
mod domain;
mod helper;
mod utils;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = app::Cli::parse();
    init_tracing(cli.verbose);

    app::run(cli).await
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "wallpaper_fetcher=debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}
