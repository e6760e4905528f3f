pub mod generators;
pub mod indicators;
pub mod params;
pub mod registry;

use std::collections::BTreeMap;

pub use generators::{BollingerBand, RsiThreshold, SmaCrossover, StochasticThreshold};
pub use params::{ParamSpec, MAX_PERIOD, StrategyDescriptor, StrategyParams};
pub use registry::{catalog, StrategyFactory, StrategyRegistry};

use common::Signal;

/// Indicator name to value, as reported to the display sink.
pub type IndicatorSnapshot = BTreeMap<String, f64>;

/// Indicator values carried from one tick to the next so generators can
/// detect threshold crossings instead of threshold levels.
///
/// Owned by the engine's bot state and handed to the active generator on
/// every tick. All fields start at 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorMemory {
    pub last_short_sma: f64,
    pub last_long_sma: f64,
    pub last_rsi: f64,
}

/// All strategy implementations must satisfy this trait.
pub trait SignalGenerator: Send + Sync {
    /// Configuration key of this strategy.
    fn name(&self) -> &str;

    /// History length required before anything but HOLD can be produced.
    fn min_history(&self) -> usize;

    /// Evaluate the current price history (oldest first) and update the
    /// carried-over indicator memory.
    ///
    /// Must be called on every tick, including ticks below `min_history`,
    /// where it returns HOLD without touching `memory`.
    fn evaluate(&self, prices: &[f64], memory: &mut IndicatorMemory) -> Signal;

    /// Indicator values for charting. Independent of `evaluate`.
    fn display_indicators(&self, _prices: &[f64]) -> IndicatorSnapshot {
        IndicatorSnapshot::new()
    }
}
