// Entry point for the filter-demo command-line application.
// The lib crate holds the pipeline; this binary only wires up logging and the runtime.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use image_filter_lib::commands::{self, Cli, ExitCode};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)       // Remove module path
        .with_thread_ids(false)   // Remove thread IDs
        .with_writer(std::io::stderr)
        .compact()
        .init();

    info!("=== filter-demo starting ===");

    let exit_code = match commands::run::run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    };

    exit_code.into()
}
