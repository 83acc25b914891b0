//! hrrr-sampler CLI
//!
//! Random HRRR GRIB2 sampling and validation.

use anyhow::Context;
use clap::Parser;
use hrrr_sampler::{
    AnsiPalette, Config, Console, EXIT_INTERRUPTED, Error, Harness, NoColor, Palette, Tone,
    run_until_interrupted,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod args;

use args::{Cli, LogLevel};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout carries the operator report
    init_logging(cli.log_level)?;

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    let palette: Arc<dyn Palette> = if cli.no_color || no_color_requested() {
        Arc::new(NoColor)
    } else {
        Arc::new(AnsiPalette)
    };
    let mut rng = match config.run.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let harness = Harness::new(config, Console::stdout(palette));
    let console = harness.console();

    let code = match run_until_interrupted(&harness, &mut rng).await {
        Ok(summary) => {
            if let Some(path) = &cli.json_report {
                summary
                    .write_json(path)
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
            }
            summary.exit_code
        }
        Err(Error::Interrupted) => {
            console.blank();
            console.line(Tone::Warning, "Interrupted by user");
            EXIT_INTERRUPTED
        }
        Err(
            e @ (Error::MissingDependencies(_) | Error::NoCandidates { .. } | Error::NoDownloads { .. }),
        ) => {
            // Already explained on the console
            tracing::error!(error = %e, "run aborted");
            e.exit_code()
        }
        Err(e) => {
            console.blank();
            console.line(Tone::Error, &format!("Unexpected error: {}", e));
            tracing::error!(error = ?e, "run failed");
            e.exit_code()
        }
    };

    std::process::exit(code);
}

/// Initialize logging from RUST_LOG, falling back to `level`.
fn init_logging(level: LogLevel) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

fn no_color_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty())
}
