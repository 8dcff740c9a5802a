//! Turtle CLI: signal, indicator and config commands.
//!
//! Commands:
//! - `signals`: run the turtle system over one or more CSV bar files
//! - `indicators`: write the ATR/channel table for one CSV file
//! - `config`: print the effective configuration and its fingerprint

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use turtle_core::data::PriceSeries;
use turtle_core::{Direction, Mode, PositionState, SystemRun, TurtleConfig, TurtleSystem};

#[derive(Parser)]
#[command(
    name = "turtle",
    about = "Turtle CLI: channel-breakout signal engine"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// Path to a TOML config file. Missing keys take the classic defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the mode: system-1 or system-2.
    #[arg(long, value_parser = parse_mode)]
    mode: Option<Mode>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate signals for each CSV file (date,open,high,low,close[,volume]).
    Signals {
        /// Bar files; the symbol is taken from the file stem.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        config: ConfigArgs,

        /// Account equity used for the informational unit size.
        #[arg(long, default_value_t = 10_000.0)]
        equity: f64,

        /// Only report the signal on the most recent bar.
        #[arg(long, default_value_t = false)]
        latest: bool,

        /// Start as if the previous closed trade was a win (unlocks system-1 entries).
        #[arg(long, default_value_t = false)]
        after_win: bool,

        /// Emit JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the indicator table for one CSV file as CSV.
    Indicators {
        file: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML plus its fingerprint.
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Signals {
            files,
            config,
            equity,
            latest,
            after_win,
            json,
        } => run_signals(&files, &config, equity, latest, after_win, json),
        Commands::Indicators { file, config, out } => {
            run_indicators(&file, &config, out.as_deref())
        }
        Commands::Config { config } => run_config(&config),
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        "turtle_core=debug,turtle=debug"
    } else {
        "turtle_core=info,turtle=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse::<Mode>().map_err(|e| e.to_string())
}

fn load_config(args: &ConfigArgs) -> Result<TurtleConfig> {
    let mut config = match &args.config {
        Some(path) => TurtleConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TurtleConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    config.validate()?;
    Ok(config)
}

fn run_signals(
    files: &[PathBuf],
    config_args: &ConfigArgs,
    equity: f64,
    latest: bool,
    after_win: bool,
    as_json: bool,
) -> Result<()> {
    if !equity.is_finite() || equity <= 0.0 {
        bail!("--equity must be a positive number, got {equity}");
    }
    let system = TurtleSystem::new(load_config(config_args)?)?;
    let initial = PositionState::flat(after_win);

    // One independent run (and position state) per instrument.
    let results: Vec<(PathBuf, Result<(String, SystemRun)>)> = files
        .par_iter()
        .map(|path| {
            let outcome = PriceSeries::load(path)
                .map_err(anyhow::Error::from)
                .and_then(|series| {
                    let run = system
                        .run_from(&series.bars, equity, initial)
                        .with_context(|| format!("running {}", series.symbol))?;
                    Ok((series.symbol, run))
                });
            (path.clone(), outcome)
        })
        .collect();

    let mut failures = 0;
    let mut reports = Vec::new();
    for (path, outcome) in results {
        match outcome {
            Ok((symbol, run)) => {
                if as_json {
                    reports.push(json_report(&symbol, &run, system.config(), latest));
                } else if latest {
                    print_latest(&symbol, &run);
                } else {
                    print_run(&symbol, &run, system.config());
                }
            }
            Err(e) => {
                failures += 1;
                tracing::error!(file = %path.display(), "{e:#}");
                eprintln!("Error for {}: {e:#}", path.display());
            }
        }
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    if failures > 0 {
        bail!("{failures} of {} file(s) failed", files.len());
    }
    Ok(())
}

fn json_report(
    symbol: &str,
    run: &SystemRun,
    config: &TurtleConfig,
    latest: bool,
) -> serde_json::Value {
    let signals: Vec<_> = if latest {
        run.latest_signal().into_iter().collect()
    } else {
        run.signals().iter().collect()
    };
    json!({
        "symbol": symbol,
        "mode": config.mode,
        "config_fingerprint": run.config_fingerprint,
        "bars": run.rows.len(),
        "last_date": run.rows.last().map(|r| r.date),
        "signals": signals,
        "final_state": run.final_state(),
    })
}

fn describe_state(state: &PositionState) -> String {
    match state.direction {
        Direction::Flat => format!(
            "flat (last trade {})",
            if state.last_trade_won { "won" } else { "lost or none" }
        ),
        Direction::Long | Direction::Short => format!(
            "{:?} x{} @ {:.4} (stop {:.4})",
            state.direction,
            state.units,
            state.avg_price.unwrap_or(f64::NAN),
            state.trailing_stop.unwrap_or(f64::NAN),
        )
        .to_lowercase(),
    }
}

fn print_run(symbol: &str, run: &SystemRun, config: &TurtleConfig) {
    println!();
    println!(
        "=== {symbol} ({}, config {}) ===",
        config.mode,
        &run.config_fingerprint[..12.min(run.config_fingerprint.len())]
    );
    if let (Some(first), Some(last)) = (run.rows.first(), run.rows.last()) {
        println!("Period:    {} to {}", first.date, last.date);
    }
    println!("Bars:      {}", run.rows.len());
    println!("Signals:   {}", run.signals().len());
    println!("Position:  {}", describe_state(&run.final_state()));
    if run.signals().is_empty() {
        return;
    }
    println!();
    println!(
        "  {:<10}  {:<10}  {:>12}  {:>12}  {:>5}",
        "date", "signal", "price", "unit size", "units"
    );
    for s in run.signals() {
        println!(
            "  {:<10}  {:<10}  {:>12.4}  {:>12.2}  {:>5}",
            s.date.to_string(),
            s.kind.as_str(),
            s.price,
            s.unit_size,
            s.units
        );
    }
}

fn print_latest(symbol: &str, run: &SystemRun) {
    let date = run
        .rows
        .last()
        .map(|r| r.date.to_string())
        .unwrap_or_default();
    match run.latest_signal() {
        Some(s) => println!(
            "{symbol} {date}: {} @ {:.4} (unit size {:.2})",
            s.kind, s.price, s.unit_size
        ),
        None => println!("{symbol} {date}: no signal"),
    }
}

fn run_indicators(file: &Path, config_args: &ConfigArgs, out: Option<&Path>) -> Result<()> {
    let system = TurtleSystem::new(load_config(config_args)?)?;
    let series = PriceSeries::load(file)?;
    turtle_core::data::validate_bars(&series.bars, system.config())
        .with_context(|| format!("validating {}", file.display()))?;
    let rows = system.indicators(&series.bars);

    let sink: Box<dyn std::io::Write> = match out {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = csv::Writer::from_writer(sink);
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::info!(symbol = %series.symbol, rows = rows.len(), "wrote indicator table");
    Ok(())
}

fn run_config(config_args: &ConfigArgs) -> Result<()> {
    let config = load_config(config_args)?;
    print!("{}", config.to_toml_string()?);
    println!("# fingerprint = \"{}\"", config.fingerprint());
    Ok(())
}
