//! Composite analyzers built on the primitive indicators.
//!
//! Each analyzer turns a candle slice into one or more aligned series. Like the
//! indicators, they emit NaN inside their warm-up window; the pipeline owns the
//! conversion to neutral placeholders.

pub mod cycle;
pub mod fractal;
pub mod informative;
pub mod regime;
pub mod volatility;

pub use cycle::{hilbert_cycle, CycleAnalyzer, CyclePhase, CycleSeries, DominantCycle};
pub use fractal::{shannon_entropy, FractalOrderAnalyzer, FractalSeries};
pub use informative::{align_closed, InformativeAligner, InformativeSource};
pub use regime::{RegimeSeries, TrendRegimeClassifier};
pub use volatility::{VolatilityAnalyzer, VolatilitySeries};
