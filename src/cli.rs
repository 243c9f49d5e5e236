//! CLI definition and dispatch.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_adapter::{
    JsonNewsAdapter, JsonPositionAdapter, JsonSignalReportAdapter,
};
use crate::domain::breakout::SignalOutcome;
use crate::domain::config_validation::{
    load_filter_config, load_portfolio_value, load_regime_config, load_signal_config,
    validate_config,
};
use crate::domain::error::NewsdeskError;
use crate::domain::ingest::{self, IngestStats};
use crate::domain::news::parse_timestamp;
use crate::domain::pipeline::{self, PipelineStats};
use crate::domain::position::{Position, index_positions};
use crate::domain::regime;
use crate::domain::risk;
use crate::domain::universe::{TrendReport, build_universe, generate_trend_report};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::news_port::NewsPort;
use crate::ports::position_port::PositionPort;
use crate::ports::signal_port::SignalReportPort;
use std::collections::BTreeMap;

const RULE: &str = "============================================================";

#[derive(Parser, Debug)]
#[command(name = "newsdesk", about = "News filtering and breakout signals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge raw feed dumps into one deduplicated news file
    Ingest {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Run the hygiene and trade pipelines over a news file
    Clean {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Reference time, defaults to the current clock
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,
    },
    /// Compute breakout signals for the watchlist and held positions
    Signals {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        prices_dir: Option<PathBuf>,
        #[arg(long)]
        positions: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,
    },
    /// Classify the broad-market regime
    Regime {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        prices_dir: Option<PathBuf>,
    },
    /// Exit levels, triggered exits and portfolio heat for held positions
    Risk {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        prices_dir: Option<PathBuf>,
        #[arg(long)]
        positions: Option<PathBuf>,
        #[arg(long)]
        portfolio_value: Option<f64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Ingest { output, inputs } => run_ingest(&output, &inputs),
        Command::Clean {
            input,
            config,
            output_dir,
            now,
        } => run_clean(&input, config.as_deref(), output_dir.as_deref(), now),
        Command::Signals {
            config,
            prices_dir,
            positions,
            output,
            now,
        } => run_signals(
            config.as_deref(),
            prices_dir.as_deref(),
            positions.as_deref(),
            output.as_deref(),
            now,
        ),
        Command::Regime { config, prices_dir } => {
            run_regime(config.as_deref(), prices_dir.as_deref())
        }
        Command::Risk {
            config,
            prices_dir,
            positions,
            portfolio_value,
        } => run_risk(
            config.as_deref(),
            prices_dir.as_deref(),
            positions.as_deref(),
            portfolio_value,
        ),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn parse_now(value: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(value).ok_or_else(|| format!("unrecognized timestamp: {value}"))
}

/// Without a path every setting takes its built-in default.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, NewsdeskError> {
    match path {
        Some(path) => {
            tracing::info!(file = %path.display(), "loading config");
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// CLI override, then `[data] key`, then the default.
pub fn resolve_data_path(
    cli_value: Option<&Path>,
    config: &dyn ConfigPort,
    key: &str,
    default: &str,
) -> PathBuf {
    cli_value
        .map(Path::to_path_buf)
        .or_else(|| {
            config
                .get_string("data", key)
                .filter(|s| !s.trim().is_empty())
                .map(|s| PathBuf::from(s.trim()))
        })
        .unwrap_or_else(|| PathBuf::from(default))
}

fn load_positions(
    cli_value: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<BTreeMap<String, Position>, NewsdeskError> {
    let path = resolve_data_path(cli_value, config, "positions_file", "data/open_positions.json");
    let positions = JsonPositionAdapter::new(path).load_positions()?;
    Ok(index_positions(positions))
}

fn run_ingest(output: &Path, inputs: &[PathBuf]) -> Result<(), NewsdeskError> {
    let adapter = JsonNewsAdapter;
    let batches = inputs
        .iter()
        .map(|path| adapter.load(path))
        .collect::<Result<Vec<_>, _>>()?;
    let rejected: usize = batches.iter().map(|b| b.rejected).sum();

    let (items, mut stats) = ingest::ingest(batches.into_iter().map(|b| b.items));
    stats.input_count += rejected;
    stats.dropped_malformed += rejected;
    adapter.save(&items, output)?;

    print_ingest_stats(&stats);
    println!("  Wrote {}", output.display());
    Ok(())
}

fn run_clean(
    input: &Path,
    config_path: Option<&Path>,
    output_dir: Option<&Path>,
    now: Option<DateTime<Utc>>,
) -> Result<(), NewsdeskError> {
    let config = load_config(config_path)?;
    let filters = load_filter_config(&config)?;
    let now = now.unwrap_or_else(Utc::now);

    let adapter = JsonNewsAdapter;
    let batch = adapter.load(input)?;
    let (hygiene, trade) = pipeline::run_all(&batch.items, &filters, now)?;

    let output_dir = resolve_data_path(output_dir, &config, "output_dir", "data");
    let date = now.format("%Y-%m-%d");
    let hygiene_path = output_dir.join(format!("clean_news_{date}.json"));
    let trade_path = output_dir.join(format!("clean_trade_news_{date}.json"));
    adapter.save(&hygiene.items, &hygiene_path)?;
    adapter.save(&trade.items, &trade_path)?;

    if batch.rejected > 0 {
        println!("  {:<28}{}", "Rejected at load:", batch.rejected);
    }
    print_pipeline_stats(&hygiene.stats, "Hygiene Filtering Results");
    print_pipeline_stats(&trade.stats, "Trade Filtering Results");
    println!("{RULE}");
    println!("  Hygiene-filtered news: {}", hygiene_path.display());
    println!("  Trade-filtered news:   {}", trade_path.display());
    println!("{RULE}");
    Ok(())
}

fn run_signals(
    config_path: Option<&Path>,
    prices_dir: Option<&Path>,
    positions_path: Option<&Path>,
    output: Option<&Path>,
    now: Option<DateTime<Utc>>,
) -> Result<(), NewsdeskError> {
    let config = load_config(config_path)?;
    let filters = load_filter_config(&config)?;
    let signals = load_signal_config(&config)?;
    let now = now.unwrap_or_else(Utc::now);

    let positions = load_positions(positions_path, &config)?;
    let universe = build_universe(&filters.watchlist, &positions);
    let data = CsvPriceAdapter::new(resolve_data_path(prices_dir, &config, "prices_dir", "data/prices"));

    let report = generate_trend_report(&data, &universe, &positions, &signals, now);

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => resolve_data_path(None, &config, "output_dir", "data")
            .join(format!("trend_signals_{}.json", now.format("%Y-%m-%d"))),
    };
    JsonSignalReportAdapter.write(&report, &output)?;

    print_trend_report(&report);
    println!("  Wrote {}", output.display());
    Ok(())
}

fn run_regime(config_path: Option<&Path>, prices_dir: Option<&Path>) -> Result<(), NewsdeskError> {
    let config = load_config(config_path)?;
    let settings = load_regime_config(&config)?;
    let data = CsvPriceAdapter::new(resolve_data_path(prices_dir, &config, "prices_dir", "data/prices"));

    let indices = settings
        .tickers
        .iter()
        .map(|ticker| {
            let bars = data.fetch_bars(ticker).unwrap_or_else(|e| {
                tracing::warn!(ticker = %ticker, error = %e, "failed to load index history");
                Vec::new()
            });
            (ticker.clone(), bars)
        })
        .collect::<Vec<_>>();

    let report = regime::classify(&indices, settings.ma_period);
    print_json(&report)
}

fn run_risk(
    config_path: Option<&Path>,
    prices_dir: Option<&Path>,
    positions_path: Option<&Path>,
    portfolio_value: Option<f64>,
) -> Result<(), NewsdeskError> {
    let config = load_config(config_path)?;
    let portfolio_value = match portfolio_value {
        Some(value) => value,
        None => load_portfolio_value(&config)?.ok_or_else(|| NewsdeskError::ConfigMissing {
            section: "risk".to_string(),
            key: "portfolio_value".to_string(),
        })?,
    };

    let positions = load_positions(positions_path, &config)?;
    let data = CsvPriceAdapter::new(resolve_data_path(prices_dir, &config, "prices_dir", "data/prices"));

    let report = risk::build_risk_report(&data, &positions, portfolio_value);
    print_json(&report)
}

fn run_validate(config_path: &Path) -> Result<(), NewsdeskError> {
    let config = FileConfigAdapter::from_file(config_path)?;
    validate_config(&config)?;

    let filters = load_filter_config(&config)?;
    let signals = load_signal_config(&config)?;
    let regime_cfg = load_regime_config(&config)?;

    println!("Configuration OK: {}", config_path.display());
    println!("  Watchlist:        {} tickers", filters.watchlist.len());
    println!("  Event keywords:   {}", filters.event_keywords.len());
    println!("  Market keywords:  {}", filters.market_summary_keywords.len());
    println!("  Max age:          {}h", filters.max_age_hours);
    println!("  Breakout window:  {} bars", signals.window);
    println!("  Hard stop:        {:.1}%", signals.hard_stop_pct * 100.0);
    println!(
        "  Regime indices:   {} (MA {})",
        regime_cfg.tickers.join(","),
        regime_cfg.ma_period
    );

    let prices_dir = resolve_data_path(None, &config, "prices_dir", "data/prices");
    match CsvPriceAdapter::new(prices_dir.clone()).list_tickers() {
        Ok(available) => {
            let missing: Vec<_> = filters
                .watchlist
                .iter()
                .chain(regime_cfg.tickers.iter())
                .filter(|t| !available.contains(*t))
                .cloned()
                .collect();
            if !missing.is_empty() {
                println!("  Missing price files: {}", missing.join(","));
            }
        }
        Err(e) => tracing::warn!(dir = %prices_dir.display(), error = %e, "cannot list price files"),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), NewsdeskError> {
    let body = serde_json::to_string_pretty(value).map_err(|source| NewsdeskError::Json {
        file: "<stdout>".to_string(),
        source,
    })?;
    println!("{body}");
    Ok(())
}

pub fn print_pipeline_stats(stats: &PipelineStats, title: &str) {
    println!();
    println!("{RULE}");
    println!("  {title}");
    println!("{RULE}");
    println!("  {:<28}{}", "Input items:", stats.input_count);
    for drop in &stats.stages {
        let label = format!("Dropped ({}):", drop.stage.label());
        println!("  {label:<28}{}", drop.dropped);
    }
    println!("  {:<28}{}", "Output items:", stats.output_count);
    println!("{RULE}");
    println!();
}

fn print_ingest_stats(stats: &IngestStats) {
    println!();
    println!("{RULE}");
    println!("  Ingest Results");
    println!("{RULE}");
    println!("  {:<28}{}", "Input items:", stats.input_count);
    println!("  {:<28}{}", "Dropped (malformed):", stats.dropped_malformed);
    println!("  {:<28}{}", "Dropped (duplicates):", stats.dropped_duplicates);
    println!("  {:<28}{}", "Output items:", stats.output_count);
    println!("{RULE}");
}

fn print_trend_report(report: &TrendReport) {
    println!();
    println!("{RULE}");
    println!(
        "  Trend Signals {} (window {})",
        report.asof_date, report.window
    );
    println!("{RULE}");
    println!(
        "  {:<8}{:>10}{:>10}{:>10}  {}",
        "TICKER", "CLOSE", "HIGH", "LOW", "SIGNAL"
    );
    for (ticker, outcome) in &report.signals {
        match outcome {
            SignalOutcome::Signal(s) => {
                let label = if s.breakout {
                    "BREAKOUT"
                } else if s.breakdown {
                    "BREAKDOWN"
                } else {
                    "-"
                };
                println!(
                    "  {:<8}{:>10.2}{:>10.2}{:>10.2}  {}",
                    ticker, s.close, s.window_high, s.window_low, label
                );
            }
            SignalOutcome::Skipped(reason) => {
                println!("  {:<8}{:>32}  skipped: {}", ticker, "", reason);
            }
        }
    }
    println!("{RULE}");
    println!(
        "  {} signals, {} skipped",
        report.signal_count(),
        report.skipped().len()
    );
}
