use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use vkbind_core::logging::{init_logging, LoggingConfig};
use vkbind_gen::{generate_dir, is_up_to_date, write_bindings, GenConfig, WriteOutcome};

/// Generate typed bindings from extension descriptors
#[derive(Parser, Debug)]
#[command(name = "vkbind-gen", version)]
struct Cli {
    /// Generator configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fail if the output file is missing or out of date instead of writing it
    #[arg(long)]
    check: bool,

    /// Log filter, overrides RUST_LOG
    #[arg(long)]
    log: Option<String>,

    /// Directory of `*.toml` extension descriptors
    descriptor_dir: PathBuf,

    /// Generated Rust file
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(LoggingConfig { env_filter: cli.log.clone(), ..LoggingConfig::default() });

    let config = match &cli.config {
        Some(path) => GenConfig::from_path(path)?,
        None => GenConfig::default(),
    };
    let source = generate_dir(&cli.descriptor_dir, &config)?;

    if cli.check {
        let fresh = is_up_to_date(&source, &cli.output)?;
        anyhow::ensure!(fresh, "{} is out of date; rerun without --check", cli.output.display());
        log::info!("{} is up to date", cli.output.display());
        return Ok(());
    }

    let outcome = write_bindings(&source, &cli.output)
        .with_context(|| format!("could not update {}", cli.output.display()))?;
    match outcome {
        WriteOutcome::Written => log::info!("wrote {}", cli.output.display()),
        WriteOutcome::Unchanged => log::info!("{} unchanged", cli.output.display()),
    }
    Ok(())
}
