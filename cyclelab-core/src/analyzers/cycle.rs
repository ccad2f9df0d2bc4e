//! Dominant-cycle measurement (Hilbert transform, homodyne discriminator).
//!
//! Per candle, causally:
//! 1. 4-bar weighted smoothing of close
//! 2. Detrender and quadrature via a 7-tap Hilbert FIR, scaled by the
//!    previous period
//! 3. Homodyne discriminator → raw period, clamped to [0.67×prev, 1.5×prev]
//!    and [6, 50], then smoothed twice
//! 4. Dominant-cycle phase = DFT phase of the smoothed price over one
//!    dominant cycle
//!
//! `phase = sin(dc_phase)`, `lead_phase = sin(dc_phase + 45°)`.
//!
//! Cycle strength is |Pearson(close, phase)| over `round(dc_period)` candles
//! clamped to the configured window bounds. That pass is O(n·window) with the
//! window capped at 50.

use crate::config::CycleConfig;
use crate::domain::Candle;
use crate::indicators::rolling::pearson;
use crate::indicators::Indicator;

const HILBERT_A: f64 = 0.0962;
const HILBERT_B: f64 = 0.5769;
const MIN_RAW_PERIOD: f64 = 6.0;
const MAX_RAW_PERIOD: f64 = 50.0;
const LEAD_DEGREES: f64 = 45.0;

/// Raw Hilbert outputs, one value per candle. NaN before the warm-up.
#[derive(Debug, Clone)]
pub struct CycleSeries {
    /// Smoothed dominant cycle length in candles.
    pub dc_period: Vec<f64>,
    pub phase: Vec<f64>,
    pub lead_phase: Vec<f64>,
    /// |correlation(close, phase)| in [0, 1].
    pub strength: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct CycleAnalyzer {
    warmup: usize,
    strength_min_window: usize,
    strength_max_window: usize,
}

impl CycleAnalyzer {
    pub fn new(warmup: usize, strength_min_window: usize, strength_max_window: usize) -> Self {
        Self {
            warmup,
            strength_min_window: strength_min_window.max(2),
            strength_max_window: strength_max_window.max(strength_min_window.max(2)),
        }
    }

    pub fn from_config(config: &CycleConfig) -> Self {
        Self::new(
            config.warmup,
            config.strength_min_window,
            config.strength_max_window,
        )
    }

    pub fn warmup(&self) -> usize {
        self.warmup
    }

    pub fn analyze(&self, candles: &[Candle]) -> CycleSeries {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let raw = hilbert_cycle(&closes);
        // Correlate against the unmasked phase so strength is defined as soon
        // as the warm-up ends.
        let strength = self.strength(&closes, &raw.phase, &raw.dc_period);

        let mask = |mut v: Vec<f64>| {
            for x in v.iter_mut().take(self.warmup) {
                *x = f64::NAN;
            }
            v
        };

        CycleSeries {
            dc_period: mask(raw.dc_period),
            phase: mask(raw.phase),
            lead_phase: mask(raw.lead_phase),
            strength: mask(strength),
        }
    }

    fn strength(&self, closes: &[f64], phase: &[f64], dc_period: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut out = vec![f64::NAN; n];
        for i in 0..n {
            if !dc_period[i].is_finite() {
                continue;
            }
            let window = (dc_period[i].round() as usize)
                .clamp(self.strength_min_window, self.strength_max_window);
            if i + 1 < window {
                continue;
            }
            let start = i + 1 - window;
            out[i] = match pearson(&closes[start..=i], &phase[start..=i]) {
                Some(r) => r.abs(),
                None if phase[start..=i].iter().all(|p| p.is_finite()) => 0.0,
                None => f64::NAN,
            };
        }
        out
    }
}

/// Unmasked Hilbert cycle outputs for a close series.
#[derive(Debug, Clone)]
pub struct HilbertOutput {
    pub dc_period: Vec<f64>,
    pub phase: Vec<f64>,
    pub lead_phase: Vec<f64>,
}

/// Run the homodyne discriminator over `closes`.
///
/// State starts at zero, so early values are meaningless until the filters
/// settle; callers mask the first `warmup` outputs. A NaN close leaves every
/// later output NaN.
pub fn hilbert_cycle(closes: &[f64]) -> HilbertOutput {
    let n = closes.len();
    let mut out = HilbertOutput {
        dc_period: vec![f64::NAN; n],
        phase: vec![f64::NAN; n],
        lead_phase: vec![f64::NAN; n],
    };

    let mut smooth = vec![0.0; n];
    let mut detrender = vec![0.0; n];
    let mut q1 = vec![0.0; n];
    let mut i1 = vec![0.0; n];

    let mut prev_i2 = 0.0;
    let mut prev_q2 = 0.0;
    let mut re = 0.0;
    let mut im = 0.0;
    let mut period = 0.0;
    let mut smooth_period = 0.0;
    let mut dc_phase = 0.0;

    let lag = |v: &[f64], i: usize, k: usize| if i >= k { v[i - k] } else { 0.0 };
    let fir = |v: &[f64], i: usize| {
        HILBERT_A * v[i] + HILBERT_B * lag(v, i, 2) - HILBERT_B * lag(v, i, 4) - HILBERT_A * lag(v, i, 6)
    };

    for i in 0..n {
        if closes[i].is_nan() {
            return out;
        }

        smooth[i] = if i >= 3 {
            (4.0 * closes[i] + 3.0 * closes[i - 1] + 2.0 * closes[i - 2] + closes[i - 3]) / 10.0
        } else {
            closes[i]
        };

        let adjust = 0.075 * period + 0.54;
        detrender[i] = fir(&smooth, i) * adjust;
        q1[i] = fir(&detrender, i) * adjust;
        i1[i] = lag(&detrender, i, 3);

        // Advance I1 and Q1 by 90 degrees.
        let j_i = fir(&i1, i) * adjust;
        let j_q = fir(&q1, i) * adjust;

        let i2 = 0.2 * (i1[i] - j_q) + 0.8 * prev_i2;
        let q2 = 0.2 * (q1[i] + j_i) + 0.8 * prev_q2;

        re = 0.2 * (i2 * prev_i2 + q2 * prev_q2) + 0.8 * re;
        im = 0.2 * (i2 * prev_q2 - q2 * prev_i2) + 0.8 * im;
        prev_i2 = i2;
        prev_q2 = q2;

        let prev_period = period;
        if im != 0.0 && re != 0.0 {
            period = 360.0 / (im / re).atan().to_degrees();
        }
        period = period.min(1.5 * prev_period).max(0.67 * prev_period);
        period = period.clamp(MIN_RAW_PERIOD, MAX_RAW_PERIOD);
        period = 0.2 * period + 0.8 * prev_period;

        smooth_period = 0.33 * period + 0.67 * smooth_period;

        dc_phase = dominant_phase(&smooth, i, smooth_period, dc_phase);

        out.dc_period[i] = smooth_period;
        out.phase[i] = dc_phase.to_radians().sin();
        out.lead_phase[i] = (dc_phase + LEAD_DEGREES).to_radians().sin();
    }

    out
}

/// DFT phase (degrees) of the smoothed price over one dominant cycle.
fn dominant_phase(smooth: &[f64], i: usize, smooth_period: f64, prev_phase: f64) -> f64 {
    let cycle = (smooth_period + 0.5) as usize;
    if cycle == 0 {
        return prev_phase;
    }

    let mut real = 0.0;
    let mut imag = 0.0;
    for k in 0..cycle.min(i + 1) {
        let angle = (k as f64 * 360.0 / cycle as f64).to_radians();
        real += angle.sin() * smooth[i - k];
        imag += angle.cos() * smooth[i - k];
    }

    let mut phase = prev_phase;
    if imag.abs() > 0.0 {
        phase = (real / imag).atan().to_degrees();
    } else if real < 0.0 {
        phase -= 90.0;
    } else if real > 0.0 {
        phase += 90.0;
    }

    phase += 90.0;
    // Lag compensation of the weighted smoother.
    phase += 360.0 / smooth_period.max(1.0);
    if imag < 0.0 {
        phase += 180.0;
    }
    if phase > 315.0 {
        phase -= 360.0;
    }
    phase
}

/// Smoothed dominant cycle length as a standalone indicator.
#[derive(Debug, Clone)]
pub struct DominantCycle {
    warmup: usize,
}

impl DominantCycle {
    pub fn new(warmup: usize) -> Self {
        Self { warmup }
    }
}

impl Indicator for DominantCycle {
    fn name(&self) -> &str {
        "dc_period"
    }

    fn lookback(&self) -> usize {
        self.warmup
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let mut period = hilbert_cycle(&closes).dc_period;
        for v in period.iter_mut().take(self.warmup) {
            *v = f64::NAN;
        }
        period
    }
}

/// Sine of the dominant-cycle phase as a standalone indicator.
#[derive(Debug, Clone)]
pub struct CyclePhase {
    warmup: usize,
    lead: bool,
}

impl CyclePhase {
    pub fn sine(warmup: usize) -> Self {
        Self { warmup, lead: false }
    }

    pub fn lead(warmup: usize) -> Self {
        Self { warmup, lead: true }
    }
}

impl Indicator for CyclePhase {
    fn name(&self) -> &str {
        if self.lead {
            "lead_phase"
        } else {
            "phase"
        }
    }

    fn lookback(&self) -> usize {
        self.warmup
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let raw = hilbert_cycle(&closes);
        let mut series = if self.lead { raw.lead_phase } else { raw.phase };
        for v in series.iter_mut().take(self.warmup) {
            *v = f64::NAN;
        }
        series
    }
}
