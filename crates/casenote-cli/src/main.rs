//! casenote CLI
//!
//! Command-line interface for casenote - annotating and exporting case
//! reports.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod session;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "casenote")]
#[command(about = "casenote - annotate and export genomics case reports")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a report with annotations applied
    Show {
        /// Path to the report file
        report: PathBuf,
    },
    /// Read one annotation value
    Get {
        /// Path to the report file
        report: PathBuf,
        /// Annotation key (e.g. note.summary, tier.BRAF_V600E)
        key: String,
        /// Value returned when the key has no annotation and no field
        #[arg(long, default_value = "")]
        fallback: String,
    },
    /// Write one annotation value
    Set {
        /// Path to the report file
        report: PathBuf,
        /// Annotation key
        key: String,
        /// Annotation value
        value: String,
    },
    /// Remove an annotation, reverting the field to its baseline
    #[command(alias = "rm")]
    Remove {
        /// Path to the report file
        report: PathBuf,
        /// Annotation key
        key: String,
    },
    /// Export the report as a self-contained artifact
    Export {
        /// Path to the report file
        report: PathBuf,
        /// Path the artifact is written to
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Clear every annotation for a report
    Reset {
        /// Path to the report file
        report: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show report and storage status
    Status {
        /// Path to the report file
        report: PathBuf,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, resource_dir)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match cli.command {
        Commands::Show { report } => commands::show::show(&report, &output).await,
        Commands::Get {
            report,
            key,
            fallback,
        } => commands::annotate::get(&report, key, fallback, &output).await,
        Commands::Set { report, key, value } => {
            commands::annotate::set(&report, key, value, &output).await
        }
        Commands::Remove { report, key } => {
            commands::annotate::remove(&report, key, &output).await
        }
        Commands::Export { report, out } => commands::export::export(&report, &out, &output).await,
        Commands::Reset { report, yes } => commands::reset::reset(&report, yes, &output).await,
        Commands::Status { report } => commands::status::show(&report, &output).await,
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config::show(&output),
            Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, &output),
        },
    }
}
