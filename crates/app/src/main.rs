use std::path::PathBuf;

use bpwatch_core::DEFAULT_CONFIG_FILE;
use bpwatch_desktop::X11Desktop;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod workflow;

#[derive(Parser)]
#[command(name = "bpwatch", version)]
#[command(about = "Reads patient records off a desktop application's screen and delivers them", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Increase logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch, log in, capture the patient list and deliver it (default)
    Run,

    /// Extract records from OCR text and print them as JSON
    Parse {
        /// Text file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
    },

    /// OCR an image and print the extracted records as JSON
    Ocr {
        /// Screenshot (PNG, JPEG, ...)
        image: PathBuf,
    },

    /// Extract records from OCR text and deliver them
    Deliver {
        /// Text file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Overrides delivery.endpoint
        #[arg(short, long)]
        endpoint: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = commands::load_config(&cli.config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            tracing::info!("Starting BP Watcher");
            let summary = workflow::Workflow::from_config(&config, X11Desktop)?.run().await?;
            let all_delivered = summary.report.as_ref().map_or(true, |r| r.all_delivered());
            tracing::info!(records = summary.records.len(), all_delivered, "BP Watcher finished");
        }
        Commands::Parse { input } => commands::parse(&config, input).await?,
        Commands::Ocr { image } => commands::ocr(&config, image).await?,
        Commands::Deliver { input, endpoint } => commands::deliver(config, input, endpoint).await?,
    }
    Ok(())
}
