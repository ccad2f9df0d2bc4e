//! CycleLab CLI: signal columns and per-trade decisions from candle files.
//!
//! Commands:
//! - `signals`: run the indicator pipeline over a candle CSV and print every row with its entry/exit flags
//! - `decide`: evaluate stop-loss, custom exit, stake size and entry confirmation for one trade
//! - `check-config`: validate a TOML configuration and print its hash

mod candles;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cyclelab_core::domain::{ExitDecision, Timeframe, Trade, TradeSide};
use cyclelab_core::pipeline::IndicatorRow;
use cyclelab_core::{EngineConfig, SignalEngine, StakeRequest};

use crate::candles::{load_history, parse_timestamp, CsvInformative};

#[derive(Parser)]
#[command(
    name = "cyclelab",
    about = "CycleLab CLI: adaptive cycle signals and risk decisions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Side {
    Long,
    Short,
}

impl From<Side> for TradeSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Long => TradeSide::Long,
            Side::Short => TradeSide::Short,
        }
    }
}

/// Inputs shared by every command that runs the pipeline.
#[derive(clap::Args, Debug, Clone)]
struct DataArgs {
    /// Base-timeframe candle CSV (timestamp,open,high,low,close,volume).
    #[arg(long)]
    candles: PathBuf,

    /// Pair name, e.g. SOL/USDT.
    #[arg(long, default_value = "PAIR")]
    pair: String,

    /// Higher-timeframe candle CSV used for confirmation.
    #[arg(long)]
    informative: Option<PathBuf>,

    /// TOML configuration. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base timeframe; overrides the configuration.
    #[arg(long)]
    timeframe: Option<Timeframe>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute indicator rows with entry/exit columns.
    Signals {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Print only candles where an entry or exit fired.
        #[arg(long, default_value_t = false)]
        only_signals: bool,
    },
    /// Evaluate the per-tick decisions for one open or proposed trade.
    Decide {
        #[command(flatten)]
        data: DataArgs,

        /// Trade entry price.
        #[arg(long)]
        entry_price: f64,

        /// Trade open time (RFC 3339 or Unix ms).
        #[arg(long)]
        opened: String,

        /// Evaluation time. Defaults to the close of the last candle.
        #[arg(long)]
        now: Option<String>,

        /// Current rate. Defaults to the last close.
        #[arg(long)]
        rate: Option<f64>,

        /// Stake currently committed to the trade.
        #[arg(long, default_value_t = 100.0)]
        stake: f64,

        #[arg(long, default_value_t = 5.0)]
        min_stake: f64,

        #[arg(long, default_value_t = 1_000.0)]
        max_stake: f64,

        #[arg(long, default_value_t = 1.0)]
        leverage: f64,

        #[arg(long, value_enum, default_value_t = Side::Long)]
        side: Side,
    },
    /// Validate a configuration and print its hash.
    CheckConfig {
        /// TOML configuration. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the effective configuration as TOML.
        #[arg(long, default_value_t = false)]
        print: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Signals {
            data,
            format,
            only_signals,
        } => run_signals(&data, format, only_signals, &mut out),
        Commands::Decide {
            data,
            entry_price,
            opened,
            now,
            rate,
            stake,
            min_stake,
            max_stake,
            leverage,
            side,
        } => {
            let trade = TradeArgs {
                entry_price,
                opened: parse_timestamp(&opened)?,
                now: now.as_deref().map(parse_timestamp).transpose()?,
                rate,
                stake,
                min_stake,
                max_stake,
                leverage,
                side: side.into(),
            };
            run_decide(&data, &trade, &mut out)
        }
        Commands::CheckConfig { config, print } => {
            run_check_config(config.as_deref(), print, &mut out)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn build_engine(data: &DataArgs) -> Result<(SignalEngine, Timeframe)> {
    let mut config = load_config(data.config.as_deref())?;
    if let Some(tf) = data.timeframe {
        config.timeframe = tf;
    }
    let timeframe = config.timeframe;
    tracing::info!(hash = %config.config_hash(), %timeframe, "configuration loaded");

    let mut engine = SignalEngine::new(config);
    if let Some(path) = &data.informative {
        engine = engine.with_informative(Arc::new(CsvInformative::new(path.clone())));
    }
    Ok((engine, timeframe))
}

/// One printed line of `signals`.
#[derive(Serialize)]
struct SignalLine<'a> {
    #[serde(flatten)]
    row: &'a IndicatorRow,
    entry: bool,
    exit: bool,
}

fn run_signals(
    data: &DataArgs,
    format: OutputFormat,
    only_signals: bool,
    out: &mut impl Write,
) -> Result<()> {
    let (engine, timeframe) = build_engine(data)?;
    let history = load_history(&data.candles, &data.pair, timeframe)?;
    let snapshot = engine.refresh(&history);
    let frame = &snapshot.frame;

    let lines: Vec<SignalLine> = frame
        .rows()
        .iter()
        .zip(frame.entry().iter().zip(frame.exit()))
        .filter(|(_, (entry, exit))| !only_signals || **entry || **exit)
        .map(|(row, (&entry, &exit))| SignalLine { row, entry, exit })
        .collect();

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &lines)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut *out);
            for line in &lines {
                writer.serialize(CsvLine::from(line))?;
            }
            writer.flush()?;
        }
    }

    tracing::info!(
        pair = %data.pair,
        rows = frame.len(),
        entries = frame.entry_indices().len(),
        exits = frame.exit_indices().len(),
        "signals computed"
    );
    Ok(())
}

/// CSV cannot serialize flattened structs; spell the columns out.
#[derive(Serialize)]
struct CsvLine {
    timestamp: String,
    close: f64,
    dc_period: f64,
    phase: f64,
    lead_phase: f64,
    cycle_strength: f64,
    atr: f64,
    atr_pct: f64,
    atr_ratio: f64,
    volatility_rank: f64,
    adx: f64,
    di_spread: f64,
    regime: String,
    rsi: f64,
    momentum_rank: f64,
    ema_fast: f64,
    ema_long: f64,
    rvol: f64,
    close_change: f64,
    htf_trend_up: bool,
    hurst: f64,
    entropy: f64,
    efficiency: f64,
    warm: bool,
    entry: bool,
    exit: bool,
}

impl From<&SignalLine<'_>> for CsvLine {
    fn from(line: &SignalLine<'_>) -> Self {
        let r = line.row;
        Self {
            timestamp: r.timestamp.to_rfc3339(),
            close: r.close,
            dc_period: r.dc_period,
            phase: r.phase,
            lead_phase: r.lead_phase,
            cycle_strength: r.cycle_strength,
            atr: r.atr,
            atr_pct: r.atr_pct,
            atr_ratio: r.atr_ratio,
            volatility_rank: r.volatility_rank,
            adx: r.adx,
            di_spread: r.di_spread,
            regime: r.regime.to_string(),
            rsi: r.rsi,
            momentum_rank: r.momentum_rank,
            ema_fast: r.ema_fast,
            ema_long: r.ema_long,
            rvol: r.rvol,
            close_change: r.close_change,
            htf_trend_up: r.htf_trend_up,
            hurst: r.hurst,
            entropy: r.entropy,
            efficiency: r.efficiency,
            warm: r.warm,
            entry: line.entry,
            exit: line.exit,
        }
    }
}

struct TradeArgs {
    entry_price: f64,
    opened: DateTime<Utc>,
    now: Option<DateTime<Utc>>,
    rate: Option<f64>,
    stake: f64,
    min_stake: f64,
    max_stake: f64,
    leverage: f64,
    side: TradeSide,
}

#[derive(Debug, Serialize)]
struct Decision {
    pair: String,
    now: DateTime<Utc>,
    rate: f64,
    profit: f64,
    entry_signal: bool,
    exit_signal: bool,
    stop_loss: f64,
    custom_exit: Option<ExitDecision>,
    roi_reached: bool,
    stake: f64,
    confirm_entry: bool,
}

fn run_decide(data: &DataArgs, args: &TradeArgs, out: &mut impl Write) -> Result<()> {
    let (engine, timeframe) = build_engine(data)?;
    let history = load_history(&data.candles, &data.pair, timeframe)?;
    let last = history
        .last()
        .with_context(|| format!("{} has no candles", data.candles.display()))?;

    let now = args.now.unwrap_or(last.timestamp + timeframe.duration());
    let rate = args.rate.unwrap_or(last.close);
    let profit = match args.side {
        TradeSide::Long => rate / args.entry_price - 1.0,
        TradeSide::Short => 1.0 - rate / args.entry_price,
    };

    let snapshot = engine.refresh(&history);
    let pair = data.pair.as_str();
    let trade = Trade {
        pair: pair.to_string(),
        entry_price: args.entry_price,
        open_timestamp: args.opened,
        current_stake: args.stake,
    };
    let request = StakeRequest {
        proposed: args.stake,
        min_stake: args.min_stake,
        max_stake: args.max_stake,
        leverage: args.leverage,
        entry_tag: None,
        side: args.side,
    };

    let decision = Decision {
        pair: pair.to_string(),
        now,
        rate,
        profit,
        entry_signal: snapshot.entry_signal(),
        exit_signal: snapshot.exit_signal(),
        stop_loss: engine.stop_loss(pair, &trade, now, rate, profit),
        custom_exit: engine.custom_exit(pair, &trade, now, rate, profit),
        roi_reached: engine.roi_reached(&trade, now, profit),
        stake: engine.stake_size(pair, now, rate, &request),
        confirm_entry: engine.confirm_entry(pair, now, rate, args.stake),
    };

    serde_json::to_writer_pretty(&mut *out, &decision)?;
    writeln!(out)?;
    Ok(())
}

fn run_check_config(path: Option<&Path>, print: bool, out: &mut impl Write) -> Result<()> {
    let config = load_config(path)?;
    writeln!(out, "config OK")?;
    writeln!(out, "hash: {}", config.config_hash())?;
    if print {
        writeln!(out)?;
        write!(out, "{}", config.to_toml()?)?;
    }
    Ok(())
}
