//! spandex_usage CLI application
//!
//! Command-line interface for reconciling suggest request logs with the
//! Spandex search index.

use std::process;

use tracing::info;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

// Import CLI modules through the library
use spandex_usage::cli::{
    handle_config, handle_extract, handle_reconcile, Cli, Commands, ConfigAction, ConfigArgs,
};
use spandex_usage::config::AppConfig;
use spandex_usage::errors::{ConfigError, Result};

#[tokio::main]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse_args();

    // Configuration decides the default log level. `config init` may target
    // a file that does not exist yet.
    let config = match AppConfig::load(cli.global.config.clone()).await {
        Err(ConfigError::NotFound { .. }) if is_config_init(&cli) => AppConfig::default(),
        loaded => loaded?,
    };

    init_logging(&cli, &config);

    info!("spandex_usage v{} starting", env!("CARGO_PKG_VERSION"));

    let quiet = cli.global.quiet;
    match cli.command {
        Commands::Reconcile(args) => {
            info!("Executing reconcile command");
            handle_reconcile(args, &config, quiet).await
        }
        Commands::Extract(args) => {
            info!("Executing extract command");
            handle_extract(args, &config, quiet).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(args, &config, cli.global.config.clone()).await
        }
    }
}

fn is_config_init(cli: &Cli) -> bool {
    matches!(
        cli.command,
        Commands::Config(ConfigArgs {
            action: ConfigAction::Init { .. }
        })
    )
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli, config: &AppConfig) {
    let log_level = cli.log_level(&config.logging.level);

    // Create environment filter
    let directive = format!("spandex_usage={}", log_level).parse::<Directive>();
    let filter = match directive {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };

    // Initialize subscriber
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
