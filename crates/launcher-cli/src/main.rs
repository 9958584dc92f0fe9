//! `launcher` -- runs one task of a Grid Engine array job.
//!
//! The scheduler starts `launcher run` once per array index. Everything
//! else (`render`, `submit`, `plan`) is for the person submitting the job.
//!
//! # Environment variables
//!
//! | Variable          | Default         | Description                          |
//! |-------------------|-----------------|--------------------------------------|
//! | `LAUNCHER_CONFIG` | `launcher.toml` | Job configuration file               |
//! | `RUST_LOG`        | `launcher=warn` | tracing filter (stderr)              |
//! | `SGE_TASK_ID`     | --              | Task index, set by the scheduler     |

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "launcher")]
#[command(about = "Array-job launcher for cluster schedulers", long_about = None)]
#[command(version)]
struct Cli {
    /// Job configuration file
    #[arg(short, long, env = "LAUNCHER_CONFIG", default_value = "launcher.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one array task (called by the scheduler)
    Run {
        /// Task index; overrides the scheduler's task variable
        #[arg(long, value_name = "INT")]
        index: Option<u32>,
    },

    /// Print the job submission script
    Render {
        /// Launcher binary the script should exec (default: this binary)
        #[arg(long, value_name = "PATH")]
        launcher: Option<PathBuf>,
    },

    /// Submit the array job to the scheduler
    Submit {
        /// Print the script instead of submitting it
        #[arg(long)]
        dry_run: bool,

        /// Launcher binary the script should exec (default: this binary)
        #[arg(long, value_name = "PATH")]
        launcher: Option<PathBuf>,
    },

    /// Show the resolved job: array size, command, modules, log paths
    Plan {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "launcher=warn,launcher_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { index } => commands::run(&cli.config, index).await,
        Commands::Render { launcher } => commands::render(&cli.config, launcher),
        Commands::Submit { dry_run, launcher } => {
            commands::submit(&cli.config, launcher, dry_run).await
        }
        Commands::Plan { json } => commands::plan(&cli.config, json),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "launcher failed");
            eprintln!("launcher: {err:#}");
            ExitCode::FAILURE
        }
    }
}
