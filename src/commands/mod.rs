//! Command-line front end: argument parsing, configuration layering and the run loop.

pub mod presenter;
pub mod run;

use std::path::PathBuf;

use clap::Parser;
use tracing::debug;

use crate::core::{AppConfig, Strategy};
use crate::utils::{AppResult, validate_config};

/// Filter the bundled images in parallel or one by one, with progress and Ctrl-C cancellation.
#[derive(Parser, Debug, Default)]
#[command(name = "filter-demo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding Image1 .. ImageN
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Execution strategy: parallel or sequential
    #[arg(long, value_parser = parse_strategy)]
    pub strategy: Option<Strategy>,

    /// Filter name (invert, grayscale, sepia, blur[:sigma], brighten[:n], huerotate[:deg],
    /// contrast[:c]), a comma separated list to pick from, or "random"
    #[arg(long)]
    pub filter: Option<String>,

    /// Limit how many images the parallel strategy filters at once
    #[arg(long, value_name = "N")]
    pub max_parallel: Option<usize>,

    /// Write processed images to this directory
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Number of simulated calculation steps
    #[arg(long)]
    pub steps: Option<usize>,

    /// Delay between simulated steps, in milliseconds
    #[arg(long, value_name = "MS")]
    pub step_interval_ms: Option<u64>,

    /// Do not run the progress simulation alongside the filters
    #[arg(long)]
    pub no_simulate: bool,

    /// Print events as JSON lines on stdout instead of progress bars
    #[arg(long)]
    pub json: bool,

    /// TOML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// The batch ran to completion (individual images may have failed)
    Success = 0,
    /// Setup failed before processing started
    Error = 1,
    /// The batch was cancelled
    Cancelled = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    s.parse().map_err(|e: crate::utils::AppError| e.to_string())
}

impl Cli {
    /// Load the config file (if any), then apply flags on top.
    pub fn resolve_config(&self) -> AppResult<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        self.apply_overrides(&mut config);
        validate_config(&config)?;
        debug!("Resolved config: {:?}", config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.assets {
            config.assets.dir = dir.clone();
        }
        if let Some(dir) = &self.output {
            config.assets.output_dir = Some(dir.clone());
        }
        if let Some(strategy) = self.strategy {
            config.pipeline.strategy = strategy;
        }
        if let Some(filter) = &self.filter {
            config.pipeline.filter = filter.clone();
        }
        if self.max_parallel.is_some() {
            config.pipeline.max_parallel = self.max_parallel;
        }
        if let Some(steps) = self.steps {
            config.simulator.steps = steps;
        }
        if let Some(ms) = self.step_interval_ms {
            config.simulator.step_interval_ms = ms;
        }
        if self.no_simulate {
            config.simulator.enabled = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.toml");
        std::fs::write(
            &path,
            "[pipeline]\nstrategy = \"sequential\"\nfilter = \"sepia\"\n\n[simulator]\nsteps = 5\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "filter-demo",
            "--config",
            path.to_str().unwrap(),
            "--filter",
            "grayscale",
            "--no-simulate",
        ]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.pipeline.strategy, Strategy::Sequential);
        assert_eq!(config.pipeline.filter, "grayscale");
        assert_eq!(config.simulator.steps, 5);
        assert!(!config.simulator.enabled);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let cli = Cli::parse_from(["filter-demo", "--steps", "0"]);
        assert!(cli.resolve_config().is_err());
    }

    #[test]
    fn strategy_flag_is_validated_by_clap() {
        assert!(Cli::try_parse_from(["filter-demo", "--strategy", "serial"]).is_err());
        let cli = Cli::parse_from(["filter-demo", "--strategy", "Sequential"]);
        assert_eq!(cli.strategy, Some(Strategy::Sequential));
    }
}
