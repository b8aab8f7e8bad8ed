//! Command-line interface components
//!
//! This module contains CLI-specific code for the spandex_usage application,
//! including argument parsing, command handlers, and spinner feedback.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, ExtractArgs, GlobalArgs, IndexArgs, LogInput,
    ReconcileArgs, ReferenceArgs,
};
pub use commands::{handle_config, handle_extract, handle_reconcile};
pub use progress::spinner;
