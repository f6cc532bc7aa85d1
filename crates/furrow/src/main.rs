//! Furrow - ground-vehicle positioning simulator and log replay

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "furrow")]
#[command(about = "GNSS/IMU positioning pipeline for ground vehicles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CLI batch/single simulation mode
    Cli {
        /// Pass remaining arguments to furrow-cli
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Replay a recorded sensor log through the positioning engine
    Replay {
        /// Sensor log (CSV) written by `furrow cli --single --record`
        log: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Scenario configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also write PGN 100 frames
        #[arg(long)]
        frames: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Cli { args }) => {
            let cli_args: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
            run_cli(&cli_args)
        }
        Some(Commands::Replay {
            log,
            output_dir,
            config,
            frames,
        }) => {
            let log = log.to_string_lossy().into_owned();
            let output_dir = output_dir.to_string_lossy().into_owned();
            let config = config.map(|p| p.to_string_lossy().into_owned());

            let mut cli_args = vec!["--replay", log.as_str(), "--output-dir", output_dir.as_str()];
            if let Some(config) = &config {
                cli_args.extend(["--config", config.as_str()]);
            }
            if frames {
                cli_args.push("--frames");
            }
            run_cli(&cli_args)
        }
        None => {
            // Default to a single simulated run
            run_cli(&["--single"])
        }
    }
}

fn run_cli(args: &[&str]) -> anyhow::Result<()> {
    let mut full_args = vec!["furrow-cli"];
    full_args.extend(args);

    match furrow_cli::run_cli_main(&full_args) {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("CLI error: {:#}", e);
            std::process::exit(1);
        }
    }
}
