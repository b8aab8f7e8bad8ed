//! Command handlers for the spandex_usage CLI
//!
//! This module implements the command handlers that coordinate between CLI
//! arguments, configuration, and the core application functionality.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use crate::app::{
    count_requests, extract_enriched_records, load_enriched_dataset, read_counted_logs, reconcile,
    render_extract_summary, render_reconcile_summary, save_enriched_dataset, write_reindex_report,
    write_zero_request_list, IndexSource, ReconcileOptions, ReferencePaths, ReferenceTables,
    RequestCounts,
};
use crate::cli::args::{
    ConfigAction, ConfigArgs, ExtractArgs, IndexArgs, LogInput, ReconcileArgs, ReferenceArgs,
};
use crate::cli::progress::spinner;
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the reconcile command
///
/// Loads the reference tables, the index contents, and the request counts,
/// then writes the zero-request list and the re-index report.
pub async fn handle_reconcile(args: ReconcileArgs, config: &AppConfig, quiet: bool) -> Result<()> {
    let start_time = Instant::now();
    args.validate().map_err(AppError::generic)?;

    let log_input = args
        .log_input()
        .ok_or_else(|| AppError::generic("No log input given"))?;
    let options = reconcile_options(config, args.threshold, args.top);
    let index_source = resolve_index_source(&args.index, config)?;

    let tables = load_reference_tables(&args.reference, quiet).await?;
    let indexed = load_indexed_datasets(&index_source, quiet).await?;

    let progress = spinner("Reading request logs...", quiet);
    let (counts, skipped) = match &log_input {
        LogInput::Counted(path) => (read_counted_logs(path).await?, 0),
        LogInput::Raw(paths) => {
            let (counts, stats) = count_requests(paths).await?;
            (counts, stats.skipped())
        }
        LogInput::Dataset(path) => {
            let records = load_enriched_dataset(path).await?;
            (RequestCounts::from_enriched_records(&records), 0)
        }
    };
    progress.finish_and_clear();
    if skipped > 0 {
        warn!("Skipped {} unparseable log lines", skipped);
    }

    let report = reconcile(&counts, &indexed, &tables, &options).with_skipped_log_lines(skipped);

    let zero_request_path = args
        .zero_request_datasets
        .clone()
        .unwrap_or_else(|| config.output.zero_request_datasets.clone());
    let non_indexed_path = args
        .non_indexed
        .clone()
        .unwrap_or_else(|| config.output.non_indexed.clone());
    write_zero_request_list(&zero_request_path, &report)?;
    write_reindex_report(&non_indexed_path, &report)?;

    if args.store_dataset {
        if matches!(log_input, LogInput::Dataset(_)) {
            info!("Enriched dataset was loaded from disk; not storing it again");
        } else {
            let output_path = output_file(args.output_file.as_ref(), config);
            save_enriched_dataset(&output_path, &counts.enrich(&tables))?;
        }
    }

    if !quiet {
        print!("{}", render_reconcile_summary(&report));
        println!();
        println!("Zero-request list: {}", zero_request_path.display());
        println!("Re-index report:   {}", non_indexed_path.display());
    }

    info!("Reconcile completed in {:?}", start_time.elapsed());
    Ok(())
}

/// Handle the extract command
///
/// Enriches every parsed request, stores the per-request dataset, and prints
/// the usage summary.
pub async fn handle_extract(args: ExtractArgs, config: &AppConfig, quiet: bool) -> Result<()> {
    let start_time = Instant::now();
    if args.top == Some(0) {
        return Err(AppError::generic("--top must be greater than 0"));
    }

    let options = reconcile_options(config, None, args.top);
    let index_source = resolve_index_source(&args.index, config)?;

    let tables = load_reference_tables(&args.reference, quiet).await?;
    let indexed = load_indexed_datasets(&index_source, quiet).await?;

    info!("Reading logfiles: {:?}", args.logfile);
    let progress = spinner(format!("Reading {} log files...", args.logfile.len()), quiet);
    let (records, stats) = extract_enriched_records(&args.logfile, &tables).await?;
    progress.finish_and_clear();
    if stats.skipped() > 0 {
        warn!(
            "Skipped {} of {} log lines ({:.1}% parsed)",
            stats.skipped(),
            stats.lines_processed,
            stats.success_rate()
        );
    }

    let counts = RequestCounts::from_enriched_records(&records);
    let report =
        reconcile(&counts, &indexed, &tables, &options).with_skipped_log_lines(stats.skipped());

    let output_path = output_file(args.output_file.as_ref(), config);
    save_enriched_dataset(&output_path, &records)?;

    if !quiet {
        print!("{}", render_extract_summary(&report));
        println!();
        println!("Enriched requests: {}", output_path.display());
    }

    info!("Extract completed in {:?}", start_time.elapsed());
    Ok(())
}

/// Handle configuration management
pub async fn handle_config(
    args: ConfigArgs,
    config: &AppConfig,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Init { path } => {
            let (path, created) = AppConfig::init(path.or(config_override)).await?;
            if created {
                println!("📁 Created default configuration file:");
                println!("   {}", path.display());
                println!("   You can customize settings by editing this file.");
            } else {
                println!("Configuration file already exists: {}", path.display());
            }
        }
    }
    Ok(())
}

/// Merge CLI overrides into the configured reconciliation options
fn reconcile_options(
    config: &AppConfig,
    threshold: Option<u64>,
    top: Option<usize>,
) -> ReconcileOptions {
    let mut options = config.reconcile.to_runtime_config();
    if let Some(threshold) = threshold {
        options.threshold = threshold;
    }
    if let Some(top) = top {
        options.top_n = top;
    }
    options
}

/// Pick the index source: snapshot flag, then host flag, then configured host
fn resolve_index_source(args: &IndexArgs, config: &AppConfig) -> Result<IndexSource> {
    if let Some(path) = &args.indexed_datasets {
        return Ok(IndexSource::Snapshot(path.clone()));
    }

    let host = args
        .es_host
        .clone()
        .or_else(|| config.index.host.clone())
        .ok_or_else(|| {
            AppError::generic(
                "No index contents: pass --indexed-datasets or --es-host, or set [index] host",
            )
        })?;

    let mut client_config = config.index.to_runtime_config(&host);
    if let Some(port) = args.es_port {
        client_config.port = port;
    }
    if let Some(index) = &args.es_index {
        client_config.index = index.clone();
    }
    Ok(IndexSource::Remote(client_config))
}

async fn load_reference_tables(args: &ReferenceArgs, quiet: bool) -> Result<ReferenceTables> {
    let paths = ReferencePaths {
        dataset_id_fxf_map: args.dataset_id_fxf_map.clone(),
        fxf_domain_map: args.fxf_domain_map.clone(),
        app_backing_map: args.app_backing_map.clone(),
    };

    let progress = spinner("Loading reference tables...", quiet);
    let tables = ReferenceTables::load(&paths).await;
    progress.finish_and_clear();
    Ok(tables?)
}

async fn load_indexed_datasets(source: &IndexSource, quiet: bool) -> Result<BTreeSet<String>> {
    let progress = spinner(
        format!("Reading indexed datasets from {}...", source.describe()),
        quiet,
    );
    let indexed = source.dataset_ids().await;
    progress.finish_and_clear();
    Ok(indexed?)
}

fn output_file(requested: Option<&PathBuf>, config: &AppConfig) -> PathBuf {
    requested
        .cloned()
        .unwrap_or_else(|| config.output.enriched_dataset.clone())
}
