//! Command-line argument parsing for spandex_usage
//!
//! This module defines the CLI structure using clap derive macros: a
//! reconciliation command, a per-request log extraction command, and
//! configuration management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// spandex_usage - Reconcile suggest request logs with the Spandex index
#[derive(Parser, Debug)]
#[command(
    name = "spandex_usage",
    version,
    about = "Find unused and missing datasets in the Spandex autocomplete index",
    long_about = "Compares suggest-endpoint request logs with the datasets present in the Spandex search index.
Reports indexed datasets nobody queries and heavily requested datasets missing from the index."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile request counts with the index and write the reports
    Reconcile(ReconcileArgs),

    /// Enrich every logged request and summarize index usage
    Extract(ExtractArgs),

    /// Show or create the configuration file
    Config(ConfigArgs),
}

/// Reference table locations
#[derive(Args, Debug, Clone)]
pub struct ReferenceArgs {
    /// Tab-delimited dataset_id, fxf, version, created_at table
    #[arg(long, value_name = "FILE")]
    pub dataset_id_fxf_map: PathBuf,

    /// Tab-delimited fxf, cname, salesforce_id, deleted_at table
    #[arg(long, value_name = "FILE")]
    pub fxf_domain_map: PathBuf,

    /// Tab-delimited fxf, domain, app_type, app_urls table of app-backing datasets
    #[arg(long, value_name = "FILE")]
    pub app_backing_map: Option<PathBuf>,
}

/// Where the indexed dataset IDs come from
#[derive(Args, Debug, Clone, Default)]
pub struct IndexArgs {
    /// Flat file of dataset IDs currently in the index
    #[arg(long, value_name = "FILE", conflicts_with = "es_host")]
    pub indexed_datasets: Option<PathBuf>,

    /// Search index host to scroll instead of reading a snapshot
    #[arg(long, value_name = "HOST")]
    pub es_host: Option<String>,

    /// Search index port
    #[arg(long, value_name = "PORT")]
    pub es_port: Option<u16>,

    /// Index name to scroll (empty for every index)
    #[arg(long, value_name = "NAME")]
    pub es_index: Option<String>,
}

/// Arguments for the reconcile command
#[derive(Args, Debug, Clone)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub reference: ReferenceArgs,

    #[command(flatten)]
    pub index: IndexArgs,

    /// Pre-aggregated `count dataset_id` pairs
    #[arg(long, value_name = "FILE")]
    pub counted_logs: Option<PathBuf>,

    /// JSON-lines request log export (repeatable)
    #[arg(long, value_name = "FILE", num_args = 1..)]
    pub logfile: Vec<PathBuf>,

    /// Enriched dataset stored by an earlier run
    #[arg(long, value_name = "FILE")]
    pub log_dataset: Option<PathBuf>,

    /// Where to write the unexplained zero-request dataset IDs
    #[arg(long, value_name = "FILE")]
    pub zero_request_datasets: Option<PathBuf>,

    /// Where to write the HTML re-index report
    #[arg(long, value_name = "FILE")]
    pub non_indexed: Option<PathBuf>,

    /// Requests a missing dataset must exceed to be reported
    #[arg(long)]
    pub threshold: Option<u64>,

    /// Rows shown in the summary tables
    #[arg(long)]
    pub top: Option<usize>,

    /// Store the enriched dataset for later runs
    #[arg(long)]
    pub store_dataset: bool,

    /// Where to store the enriched dataset
    #[arg(long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,
}

/// Arguments for the extract command
#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub reference: ReferenceArgs,

    #[command(flatten)]
    pub index: IndexArgs,

    /// JSON-lines request log export (repeatable)
    #[arg(long, value_name = "FILE", num_args = 1.., required = true)]
    pub logfile: Vec<PathBuf>,

    /// Where to store the per-request enriched dataset
    #[arg(long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Rows shown in the summary tables
    #[arg(long)]
    pub top: Option<usize>,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Where to write it (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },
}

/// The log input a reconcile run reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogInput {
    /// Pre-aggregated counts
    Counted(PathBuf),
    /// Raw JSON-lines exports
    Raw(Vec<PathBuf>),
    /// Stored enriched dataset
    Dataset(PathBuf),
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments, falling back to the
    /// configured level
    pub fn log_level(&self, configured: &str) -> String {
        if self.global.quiet {
            "error".to_string()
        } else if self.global.very_verbose {
            "debug".to_string()
        } else if self.global.verbose {
            "info".to_string()
        } else {
            configured.to_lowercase()
        }
    }
}

impl ReconcileArgs {
    /// Check flag combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.reference.app_backing_map.is_none() {
            return Err("--app-backing-map is required for reconcile".to_string());
        }

        let inputs = [
            self.counted_logs.is_some(),
            !self.logfile.is_empty(),
            self.log_dataset.is_some(),
        ];
        match inputs.iter().filter(|given| **given).count() {
            0 => Err("Provide one of --counted-logs, --logfile or --log-dataset".to_string()),
            1 => Ok(()),
            _ => Err("Only one of --counted-logs, --logfile or --log-dataset may be given".to_string()),
        }?;

        if self.top == Some(0) {
            return Err("--top must be greater than 0".to_string());
        }

        Ok(())
    }

    /// The selected log input; call after [`validate`](Self::validate)
    pub fn log_input(&self) -> Option<LogInput> {
        if let Some(path) = &self.counted_logs {
            Some(LogInput::Counted(path.clone()))
        } else if let Some(path) = &self.log_dataset {
            Some(LogInput::Dataset(path.clone()))
        } else if !self.logfile.is_empty() {
            Some(LogInput::Raw(self.logfile.clone()))
        } else {
            None
        }
    }
}
