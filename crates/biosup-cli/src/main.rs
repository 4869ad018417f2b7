//! biosup - Main entry point
//!
//! Checks the vendor catalog for a newer BIOS for this machine and optionally
//! downloads and launches the update package.

mod archive;
mod config;
mod fetch;
mod hardware;
mod installer;
mod pipeline;

use anyhow::Result;
use biosup_core::{RunContext, UpdateError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::pipeline::{CheckReport, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "biosup")]
#[command(about = "BIOS update checker driven by the vendor catalog")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "biosup.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Read the hardware identity from this TOML file instead of the OS
    #[arg(long)]
    identity: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether a BIOS update is available
    Check {
        /// Print a JSON report instead of a status line
        #[arg(long)]
        json: bool,
    },
    /// Download the available update and launch its installer
    Update {
        /// Launch the installer after downloading
        #[arg(short, long)]
        yes: bool,
        /// Never pass the restart flag to the installer
        #[arg(long)]
        no_restart: bool,
    },
    /// Show the resolved hardware identity
    Identity,
    /// Write the default configuration file
    InitConfig {
        /// Destination (defaults to --config)
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("biosup v{}", env!("CARGO_PKG_VERSION"));

    let open_pipeline = || -> Result<Pipeline> {
        let mut config = config::load_config(&args.config)?;
        if let Some(identity) = &args.identity {
            config.identity.file = Some(identity.clone());
        }
        Pipeline::new(config)
    };

    match &args.command {
        Command::InitConfig { path } => {
            let path = path.as_ref().unwrap_or(&args.config);
            config::save_default_config(path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        Command::Identity => {
            let pipeline = open_pipeline()?;
            let identity = pipeline.read_identity()?;
            println!("Model:             {}", identity.model);
            println!(
                "SKU number:        {}",
                identity.sku_number.as_deref().unwrap_or("(none)")
            );
            for (i, s) in identity.oem_strings.iter().enumerate() {
                println!("OEM string [{}]:    {}", i, s);
            }
            println!("Installed version: {}", identity.installed_version);

            let ctx = RunContext::resolve(identity).map_err(UpdateError::from)?;
            println!("System ID:         {}", ctx.system_id);
            println!("Model token:       {}", ctx.model_token);
            println!("Parsed version:    {}", ctx.installed_version);
        }
        Command::Check { json } => {
            let pipeline = open_pipeline()?;
            let ctx = pipeline.context()?;
            let decision = pipeline.check(&ctx).await?;
            if *json {
                let report = CheckReport::new(pipeline.run_id(), &ctx, decision);
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", decision);
            }
        }
        Command::Update { yes, no_restart } => {
            let pipeline = open_pipeline()?;
            let ctx = pipeline.context()?;
            let decision = pipeline.check(&ctx).await?;
            println!("{}", decision);

            if let Some(package) = decision.package().filter(|_| decision.is_update_available()) {
                let file = pipeline.download(package).await?;
                println!("Downloaded {}", file.display());

                let installer = pipeline.installer_for(&file, *no_restart);
                if *yes {
                    installer.launch()?;
                    println!("Installer started: {}", installer);
                } else {
                    println!("Run the installer with: {}", installer);
                }
            }
        }
    }

    Ok(())
}
