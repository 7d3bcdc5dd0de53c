use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use findoutlie::integrity::{validate_data, DEFAULT_MANIFEST};

/// Check data files against the hashes recorded in a manifest.
#[derive(Parser)]
#[command(name = "validate-data")]
#[command(version)]
struct Cli {
    /// Directory containing data
    data_directory: PathBuf,

    /// Manifest of `<hash> <path>` lines, relative to the data directory
    #[arg(short, long, default_value = DEFAULT_MANIFEST)]
    manifest: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let verified = validate_data(&cli.data_directory, &cli.manifest)
        .with_context(|| format!("validating {}", cli.data_directory.display()))?;

    log::info!("{verified} files match their recorded hashes");
    Ok(())
}
