//! Serializable engine configuration.
//!
//! Every window size, threshold and feature toggle the engine reads lives here.
//! Sections default individually, so a TOML file only needs the keys it
//! overrides:
//!
//! ```toml
//! timeframe = "5m"
//!
//! [features]
//! higher_timeframe = true
//!
//! [stop_loss]
//! hard_floor = -0.08
//! pair_ceilings = { "SOL/USDT" = -0.06 }
//! ```

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::Timeframe;
use crate::error::EngineError;

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Base candle granularity of every pair's history.
    pub timeframe: Timeframe,
    pub features: FeatureFlags,
    pub cycle: CycleConfig,
    pub volatility: VolatilityConfig,
    pub regime: RegimeConfig,
    pub momentum: MomentumConfig,
    pub trend: TrendConfig,
    pub fractal: FractalConfig,
    pub entry: EntryConfig,
    pub exit: ExitConfig,
    pub custom_exit: CustomExitConfig,
    pub stop_loss: StopLossConfig,
    pub sizing: SizingConfig,
    pub roi: RoiLadder,
    pub trailing: TrailingConfig,
    pub liquidity: LiquidityWindow,
    pub informative: InformativeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::M5,
            features: FeatureFlags::default(),
            cycle: CycleConfig::default(),
            volatility: VolatilityConfig::default(),
            regime: RegimeConfig::default(),
            momentum: MomentumConfig::default(),
            trend: TrendConfig::default(),
            fractal: FractalConfig::default(),
            entry: EntryConfig::default(),
            exit: ExitConfig::default(),
            custom_exit: CustomExitConfig::default(),
            stop_loss: StopLossConfig::default(),
            sizing: SizingConfig::default(),
            roi: RoiLadder::default(),
            trailing: TrailingConfig::default(),
            liquidity: LiquidityWindow::default(),
            informative: InformativeConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self).map_err(|e| EngineError::InvalidConfig(e.to_string()))
    }

    /// Deterministic identity of this configuration (BLAKE3 over canonical JSON).
    pub fn config_hash(&self) -> String {
        // Struct fields serialize in declaration order and maps are BTreeMaps,
        // so the JSON is canonical.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    /// Reject configurations that would break the engine's output guarantees.
    pub fn validate(&self) -> Result<(), EngineError> {
        fn check(ok: bool, msg: &str) -> Result<(), EngineError> {
            if ok {
                Ok(())
            } else {
                Err(EngineError::InvalidConfig(msg.to_string()))
            }
        }

        let sl = &self.stop_loss;
        check(
            sl.hard_floor > -1.0 && sl.hard_floor < 0.0,
            "stop_loss.hard_floor must be in (-1, 0)",
        )?;
        for (pair, ceiling) in &sl.pair_ceilings {
            if !(*ceiling > -1.0 && *ceiling < 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "stop_loss.pair_ceilings[{pair}] must be in (-1, 0)"
                )));
            }
        }
        check(
            sl.loss_multiplier >= sl.base_multiplier && sl.base_multiplier >= sl.profit_multiplier,
            "stop_loss multipliers must be non-increasing in profit",
        )?;
        check(sl.profit_multiplier > 0.0, "stop_loss.profit_multiplier must be > 0")?;

        check(self.cycle.warmup >= 7, "cycle.warmup must be >= 7")?;
        check(
            self.cycle.min_period < self.cycle.max_period,
            "cycle.min_period must be below cycle.max_period",
        )?;
        check(
            self.cycle.strength_min_window >= 3
                && self.cycle.strength_min_window <= self.cycle.strength_max_window,
            "cycle strength window bounds are inverted or too small",
        )?;

        check(self.volatility.atr_period >= 1, "volatility.atr_period must be >= 1")?;
        check(self.volatility.rank_window >= 2, "volatility.rank_window must be >= 2")?;
        check(
            self.volatility.min_observations >= 1
                && self.volatility.min_observations <= self.volatility.rank_window,
            "volatility.min_observations must be in [1, rank_window]",
        )?;
        check(self.regime.adx_period >= 1, "regime.adx_period must be >= 1")?;
        check(
            self.regime.ranging_below <= self.regime.trending_above,
            "regime.ranging_below must not exceed regime.trending_above",
        )?;
        check(self.momentum.rsi_period >= 1, "momentum.rsi_period must be >= 1")?;
        check(
            self.trend.ema_fast >= 1 && self.trend.ema_long >= 1 && self.trend.volume_window >= 1,
            "trend windows must be >= 1",
        )?;
        check(self.fractal.window >= 3, "fractal.window must be >= 3")?;
        check(self.fractal.bins >= 2, "fractal.bins must be >= 2")?;

        check(
            self.custom_exit.early_max_minutes < self.custom_exit.mature_max_minutes,
            "custom_exit tier boundaries must increase",
        )?;
        check(
            self.custom_exit.maturity_min_candles <= self.custom_exit.maturity_max_candles,
            "custom_exit maturity bounds are inverted",
        )?;

        check(
            self.sizing.non_trending_factor > 0.0 && self.sizing.non_trending_factor <= 1.0,
            "sizing.non_trending_factor must be in (0, 1]",
        )?;

        self.roi.validate()?;
        check(
            self.trailing.positive >= 0.0 && self.trailing.positive_offset >= self.trailing.positive,
            "trailing.positive_offset must be >= trailing.positive >= 0",
        )?;
        check(
            self.liquidity.start_hour < 24 && self.liquidity.end_hour < 24,
            "liquidity hours must be < 24",
        )?;

        Ok(())
    }
}

/// Independent toggles for each refinement of the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeatureFlags {
    /// Use percentile ranks instead of raw RSI / ATR% for entry bounds.
    pub percentile_thresholds: bool,
    /// Require the detected cycle to explain recent price motion.
    pub cycle_strength_filter: bool,
    /// Require the informative timeframe to agree with the entry.
    pub higher_timeframe: bool,
    /// Gate entries on Hurst / entropy / efficiency.
    pub fractal_gate: bool,
    /// Evaluate the tiered custom exit.
    pub tiered_exits: bool,
    /// Reject entries inside the low-liquidity weekly window.
    pub liquidity_gate: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            percentile_thresholds: true,
            cycle_strength_filter: true,
            higher_timeframe: false,
            fractal_gate: false,
            tiered_exits: true,
            liquidity_gate: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CycleConfig {
    /// Candles before the Hilbert cycle measurement is trusted.
    pub warmup: usize,
    /// Dominant cycle lengths below this are noise.
    pub min_period: f64,
    /// Dominant cycle lengths above this are trend, not cycle.
    pub max_period: f64,
    pub min_strength: f64,
    pub strength_min_window: usize,
    pub strength_max_window: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            warmup: 63,
            min_period: 10.0,
            max_period: 40.0,
            min_strength: 0.3,
            strength_min_window: 8,
            strength_max_window: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VolatilityConfig {
    pub atr_period: usize,
    /// Trailing window for the ATR% percentile rank.
    pub rank_window: usize,
    /// Below this many observations the rank is the neutral 0.5.
    pub min_observations: usize,
    /// Window of the ATR mean that `atr_ratio` is measured against.
    pub atr_mean_period: usize,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            atr_period: 14,
            rank_window: 200,
            min_observations: 20,
            atr_mean_period: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegimeConfig {
    pub adx_period: usize,
    pub trending_above: f64,
    pub ranging_below: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            adx_period: 14,
            trending_above: 25.0,
            ranging_below: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MomentumConfig {
    pub rsi_period: usize,
    /// Trailing window for the RSI percentile rank.
    pub rank_window: usize,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rank_window: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrendConfig {
    pub ema_fast: usize,
    pub ema_long: usize,
    /// Window of the volume mean behind relative volume.
    pub volume_window: usize,
    /// Close is compared with the close this many candles earlier.
    pub structure_lookback: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            ema_fast: 12,
            ema_long: 50,
            volume_window: 24,
            structure_lookback: 12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FractalConfig {
    pub window: usize,
    pub bins: usize,
    pub hurst_min: f64,
    /// Entropy ceiling in bits.
    pub entropy_max: f64,
    pub efficiency_min: f64,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            window: 20,
            bins: 10,
            hurst_min: 0.5,
            entropy_max: 3.0,
            efficiency_min: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EntryConfig {
    /// `phase - lead_phase` must exceed this on the crossing candle.
    pub min_cross_magnitude: f64,
    pub trending_rvol_min: f64,
    pub ranging_rvol_min: f64,
    /// Ranging entries need a trough at least this deep.
    pub ranging_max_lead: f64,
    pub transitional_rvol_min: f64,
    pub rsi_floor: f64,
    pub rsi_ceiling: f64,
    pub rank_floor: f64,
    pub rank_ceiling: f64,
    pub max_volatility_rank: f64,
    pub max_atr_pct: f64,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            min_cross_magnitude: 0.05,
            trending_rvol_min: 1.0,
            ranging_rvol_min: 1.2,
            ranging_max_lead: -0.5,
            transitional_rvol_min: 1.2,
            rsi_floor: 30.0,
            rsi_ceiling: 70.0,
            rank_floor: 0.1,
            rank_ceiling: 0.9,
            max_volatility_rank: 0.9,
            max_atr_pct: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExitConfig {
    /// `lead_phase - phase` must exceed this on the crossing candle.
    pub min_cross_magnitude: f64,
    /// A lead phase at or above this exits without further confirmation.
    pub strong_lead: f64,
    /// RSI below this counts as weak momentum.
    pub weak_momentum: f64,
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            min_cross_magnitude: 0.05,
            strong_lead: 0.7,
            weak_momentum: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CustomExitConfig {
    pub early_max_minutes: f64,
    pub mature_max_minutes: f64,
    pub early_profit: f64,
    pub early_pullback: f64,
    pub mature_profit: f64,
    pub mature_pullback: f64,
    pub long_profit: f64,
    pub long_pullback: f64,
    /// Share of the dominant cycle after which a trade is mature.
    pub maturity_fraction: f64,
    pub maturity_min_candles: f64,
    pub maturity_max_candles: f64,
    pub maturity_min_profit: f64,
    /// Share of ATR% that also sets the maturity profit floor.
    pub maturity_atr_share: f64,
    pub overheat_rank: f64,
    pub overheat_profit: f64,
    pub trend_break_spread: f64,
}

impl Default for CustomExitConfig {
    fn default() -> Self {
        Self {
            early_max_minutes: 30.0,
            mature_max_minutes: 120.0,
            early_profit: 0.005,
            early_pullback: 0.15,
            mature_profit: 0.02,
            mature_pullback: 0.25,
            long_profit: 0.05,
            long_pullback: 0.35,
            maturity_fraction: 0.4,
            maturity_min_candles: 10.0,
            maturity_max_candles: 30.0,
            maturity_min_profit: 0.008,
            maturity_atr_share: 0.5,
            overheat_rank: 0.95,
            overheat_profit: 0.015,
            trend_break_spread: -0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StopLossConfig {
    /// Base hard stop; the returned stop is never looser than this.
    pub hard_floor: f64,
    pub loss_multiplier: f64,
    pub base_multiplier: f64,
    pub profit_multiplier: f64,
    /// Profit at which the tight multiplier applies.
    pub profit_breakpoint: f64,
    pub volatility_cap_min: f64,
    pub volatility_cap_atr_mult: f64,
    /// Per-pair stop ceilings (negative fractions).
    pub pair_ceilings: BTreeMap<String, f64>,
}

impl Default for StopLossConfig {
    fn default() -> Self {
        Self {
            hard_floor: -0.10,
            loss_multiplier: 2.5,
            base_multiplier: 2.0,
            profit_multiplier: 1.2,
            profit_breakpoint: 0.02,
            volatility_cap_min: 0.08,
            volatility_cap_atr_mult: 2.0,
            pair_ceilings: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SizingConfig {
    pub non_trending_factor: f64,
    pub cycle_weight: f64,
    pub cycle_offset: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            non_trending_factor: 0.7,
            cycle_weight: 2.0,
            cycle_offset: 0.5,
        }
    }
}

/// One rung of the ROI ladder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoiStep {
    /// Holding time (minutes) from which this rung applies.
    pub minutes: u32,
    /// Minimum return that closes the position.
    pub min_return: f64,
}

/// Elapsed-minutes → minimum acceptable return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoiLadder {
    pub steps: Vec<RoiStep>,
}

impl Default for RoiLadder {
    fn default() -> Self {
        Self {
            steps: vec![
                RoiStep { minutes: 0, min_return: 0.04 },
                RoiStep { minutes: 30, min_return: 0.02 },
                RoiStep { minutes: 60, min_return: 0.01 },
            ],
        }
    }
}

impl RoiLadder {
    fn validate(&self) -> Result<(), EngineError> {
        let ordered = self.steps.windows(2).all(|w| w[0].minutes < w[1].minutes);
        if !ordered {
            return Err(EngineError::InvalidConfig(
                "roi.steps must be sorted by strictly increasing minutes".into(),
            ));
        }
        Ok(())
    }

    /// Minimum return required after `elapsed_minutes`, if any rung applies yet.
    pub fn minimum_return(&self, elapsed_minutes: f64) -> Option<f64> {
        self.steps
            .iter()
            .take_while(|s| f64::from(s.minutes) <= elapsed_minutes)
            .last()
            .map(|s| s.min_return)
    }

    /// True if `profit` meets the rung active after `elapsed_minutes`.
    pub fn roi_reached(&self, elapsed_minutes: f64, profit: f64) -> bool {
        self.minimum_return(elapsed_minutes)
            .is_some_and(|min| profit >= min)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrailingConfig {
    pub enabled: bool,
    /// Stop distance once trailing is active.
    pub positive: f64,
    /// Profit that activates trailing.
    pub positive_offset: f64,
}

impl Default for TrailingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            positive: 0.005,
            positive_offset: 0.015,
        }
    }
}

/// Weekly UTC window in which new entries are refused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LiquidityWindow {
    pub start_weekday: Weekday,
    pub start_hour: u32,
    pub end_weekday: Weekday,
    pub end_hour: u32,
}

impl Default for LiquidityWindow {
    fn default() -> Self {
        Self {
            start_weekday: Weekday::Sat,
            start_hour: 0,
            end_weekday: Weekday::Sun,
            end_hour: 20,
        }
    }
}

/// Higher-timeframe confirmation parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InformativeConfig {
    pub timeframe: Timeframe,
    pub ema_period: usize,
    pub rsi_period: usize,
    /// Informative RSI must exceed this for the trend to count as up.
    pub rsi_min: f64,
}

impl Default for InformativeConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::H1,
            ema_period: 50,
            rsi_period: 14,
            rsi_min: 50.0,
        }
    }
}
