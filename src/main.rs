// SPDX-License-Identifier: GPL-3.0-only

use campdf::terminal::{self, ViewOptions};
use campdf::{Config, EncodingQuality, FacingPreference, PhotoEncoder};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

mod cli;

#[derive(Parser)]
#[command(name = "campdf")]
#[command(about = "Photograph document pages and save them as a single PDF")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory the PDF is written to (default: ~/Documents/Scans)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Document name without extension (default: Report-YYYY-MM-DD)
    #[arg(short, long, global = true)]
    name: Option<String>,

    /// Which camera to prefer
    #[arg(long, value_enum, global = true)]
    facing: Option<FacingPreference>,

    /// JPEG quality of captured pages
    #[arg(short, long, value_enum, global = true)]
    quality: Option<EncodingQuality>,

    /// Open the PDF with the system viewer after export
    #[arg(long, global = true)]
    open: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive capture session in the terminal (default)
    Terminal,

    /// List available cameras
    List,

    /// Capture pages without the interactive view
    Scan {
        /// Number of pages to capture
        #[arg(short, long, default_value = "1")]
        count: usize,

        /// Delay between pages in milliseconds
        #[arg(short, long, default_value = "2000")]
        interval_ms: u64,
    },

    /// Build a PDF from existing image files, one page per image
    Assemble {
        /// Images in page order
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=campdf=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    // Command line flags override the config file
    let mut config = Config::load()?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(facing) = cli.facing {
        config.facing = facing;
    }
    if let Some(quality) = cli.quality {
        config.quality = quality;
    }
    if cli.open {
        config.open_after_export = true;
    }

    match cli.command.unwrap_or(Commands::Terminal) {
        Commands::Terminal => terminal::run(ViewOptions {
            facing: config.facing,
            encoder: PhotoEncoder::new(config.quality),
            pipeline: cli::document_pipeline(&config),
            session: cli::new_session(&config, cli.name),
            open_after_export: config.open_after_export,
        }),
        Commands::List => cli::list_cameras(),
        Commands::Scan { count, interval_ms } => cli::scan(
            &config,
            cli.name,
            count,
            Duration::from_millis(interval_ms),
        ),
        Commands::Assemble { images } => cli::assemble(&config, cli.name, &images),
    }
}
