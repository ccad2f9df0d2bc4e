//! Property tests for decision bounds.
//!
//! Uses proptest to verify:
//! 1. Stop distance is in (−1, 0] and never looser than the hard floor
//! 2. Stop distance never loosens as profit rises
//! 3. Stake is always within [min_stake, max_stake]
//! 4. Every pipeline row is finite for any sane candle series

mod common;

use proptest::prelude::*;

use cyclelab_core::config::EngineConfig;
use cyclelab_core::domain::{Regime, TradeSide};
use cyclelab_core::pipeline::IndicatorPipeline;
use cyclelab_core::position_management::StopLossController;
use cyclelab_core::sizers::{RegimeVolatilitySizer, Sizer, StakeRequest};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_any_f64() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1e12..1e12_f64,
        Just(0.0),
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
        Just(1e300),
    ]
}

fn arb_regime() -> impl Strategy<Value = Regime> {
    prop_oneof![
        Just(Regime::Trending),
        Just(Regime::Ranging),
        Just(Regime::Transitional),
    ]
}

// ── 1-2. Stop-loss bounds ────────────────────────────────────────────

proptest! {
    #[test]
    fn stop_is_bounded_for_any_input(
        atr in arb_any_f64(),
        atr_pct in arb_any_f64(),
        rate in arb_any_f64(),
        profit in arb_any_f64(),
        warm in any::<bool>(),
    ) {
        let config = EngineConfig::default();
        let controller = StopLossController::from_config(&config);
        let mut row = common::warm_row(100.0);
        row.atr = atr;
        row.atr_pct = atr_pct;
        row.warm = warm;

        let stop = controller.stop_loss("SOL/USDT", &row, rate, profit);
        prop_assert!(stop > -1.0 && stop <= 0.0, "stop {} out of range", stop);
        prop_assert!(stop >= config.stop_loss.hard_floor);
    }

    #[test]
    fn stop_never_loosens_with_profit(
        atr in 0.0..20.0_f64,
        rate in 1.0..1000.0_f64,
        p1 in -0.5..0.5_f64,
        p2 in -0.5..0.5_f64,
    ) {
        let controller = StopLossController::from_config(&EngineConfig::default());
        let mut row = common::warm_row(rate);
        row.atr = atr;
        row.atr_pct = atr / rate;

        let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
        let stop_lo = controller.stop_loss("SOL/USDT", &row, rate, lo);
        let stop_hi = controller.stop_loss("SOL/USDT", &row, rate, hi);
        prop_assert!(stop_hi >= stop_lo);
    }
}

// ── 3. Stake bounds ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn stake_is_within_bounds(
        proposed in arb_any_f64(),
        min_stake in 0.0..1e6_f64,
        span in 0.0..1e6_f64,
        atr_ratio in arb_any_f64(),
        strength in arb_any_f64(),
        regime in arb_regime(),
        warm in any::<bool>(),
    ) {
        let sizer = RegimeVolatilitySizer::new(EngineConfig::default().sizing);
        let max_stake = min_stake + span;
        let request = StakeRequest {
            proposed,
            min_stake,
            max_stake,
            leverage: 3.0,
            entry_tag: Some("cycle_trough".into()),
            side: TradeSide::Long,
        };
        let mut row = common::warm_row(100.0);
        row.atr_ratio = atr_ratio;
        row.cycle_strength = strength;
        row.regime = regime;
        row.warm = warm;

        let stake = sizer.size(&request, &row);
        prop_assert!(stake >= min_stake && stake <= max_stake, "stake {} outside [{}, {}]", stake, min_stake, max_stake);
    }

    #[test]
    fn inverted_bounds_resolve_to_max(
        proposed in 0.0..1e6_f64,
        max_stake in 0.0..1e3_f64,
        gap in 1.0..1e3_f64,
    ) {
        let sizer = RegimeVolatilitySizer::new(EngineConfig::default().sizing);
        let request = StakeRequest {
            proposed,
            min_stake: max_stake + gap,
            max_stake,
            leverage: 1.0,
            entry_tag: None,
            side: TradeSide::Short,
        };
        let stake = sizer.size(&request, &common::warm_row(100.0));
        prop_assert_eq!(stake, max_stake);
    }
}

// ── 4. Pipeline finiteness ───────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn pipeline_rows_are_finite(len in 1usize..200, slope in -0.04..0.2_f64) {
        let mut config = EngineConfig::default();
        config.features.fractal_gate = true;
        let pipeline = IndicatorPipeline::new(&config);
        let mut candles = common::random_walk(len);
        for (i, c) in candles.iter_mut().enumerate() {
            let drift = slope * i as f64;
            c.open += drift;
            c.high += drift;
            c.low += drift;
            c.close += drift;
        }
        let frame = pipeline.run(&common::history("SOL/USDT", candles), None);
        prop_assert_eq!(frame.len(), len);
        for row in frame.rows() {
            for v in [
                row.dc_period, row.phase, row.lead_phase, row.cycle_strength,
                row.atr, row.atr_pct, row.atr_ratio, row.volatility_rank,
                row.adx, row.di_spread, row.rsi, row.momentum_rank,
                row.ema_fast, row.ema_long, row.rvol, row.close_change,
                row.hurst, row.entropy, row.efficiency,
            ] {
                prop_assert!(v.is_finite());
            }
        }
    }
}
