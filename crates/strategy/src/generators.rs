//! Built-in signal generators.
//!
//! The crossover strategies (`sma_crossover`, `rsi_basic`) are edge-triggered:
//! they fire once on the tick a threshold relationship flips. The oscillator
//! strategies (`stochastic`, `bollinger`) are level-triggered and fire on
//! every tick their condition holds.

use std::collections::HashMap;

use common::{Result, Signal};

use crate::indicators::{bollinger_bands, rsi, sma, stochastic};
use crate::params::{ParamSpec, StrategyDescriptor, StrategyParams};
use crate::{IndicatorMemory, IndicatorSnapshot, SignalGenerator};

// ─── SMA crossover ────────────────────────────────────────────────────────────

pub struct SmaCrossover {
    short_period: usize,
    long_period: usize,
}

impl SmaCrossover {
    pub const DESCRIPTOR: StrategyDescriptor = StrategyDescriptor {
        key: "sma_crossover",
        name: "SMA Crossover",
        description: "Generates buy signals when the short SMA crosses above the long SMA, and sell signals when it crosses below. Best for trending markets.",
        params: &[
            ParamSpec { key: "sma_short_period", label: "Short Period", default: 10.0, min: 2.0, max: 50.0 },
            ParamSpec { key: "sma_long_period", label: "Long Period", default: 25.0, min: 5.0, max: 100.0 },
        ],
    };

    pub fn new(short_period: usize, long_period: usize) -> Self {
        Self { short_period, long_period }
    }

    pub fn from_params(values: &HashMap<String, f64>) -> Result<Self> {
        let p = StrategyParams::new(&Self::DESCRIPTOR, values);
        Ok(Self::new(p.period("sma_short_period")?, p.period("sma_long_period")?))
    }
}

impl SignalGenerator for SmaCrossover {
    fn name(&self) -> &str {
        Self::DESCRIPTOR.key
    }

    fn min_history(&self) -> usize {
        self.long_period
    }

    fn evaluate(&self, prices: &[f64], memory: &mut IndicatorMemory) -> Signal {
        if prices.len() < self.long_period {
            return Signal::Hold;
        }
        let short = sma(prices, self.short_period);
        let long = sma(prices, self.long_period);

        let signal = if short > long && memory.last_short_sma <= memory.last_long_sma {
            Signal::Buy
        } else if short < long && memory.last_short_sma >= memory.last_long_sma {
            Signal::Sell
        } else {
            Signal::Hold
        };

        memory.last_short_sma = short;
        memory.last_long_sma = long;
        signal
    }

    fn display_indicators(&self, prices: &[f64]) -> IndicatorSnapshot {
        let mut out = IndicatorSnapshot::new();
        if prices.len() >= self.short_period {
            out.insert("sma_short".into(), sma(prices, self.short_period));
        }
        if prices.len() >= self.long_period {
            out.insert("sma_long".into(), sma(prices, self.long_period));
        }
        out
    }
}

// ─── RSI threshold ────────────────────────────────────────────────────────────

pub struct RsiThreshold {
    period: usize,
    overbought: f64,
    oversold: f64,
}

impl RsiThreshold {
    pub const DESCRIPTOR: StrategyDescriptor = StrategyDescriptor {
        key: "rsi_basic",
        name: "RSI Basic",
        description: "Uses the Relative Strength Index to identify overbought and oversold conditions. Good for range-bound markets.",
        params: &[
            ParamSpec { key: "rsi_period", label: "RSI Period", default: 14.0, min: 5.0, max: 30.0 },
            ParamSpec { key: "rsi_overbought", label: "Overbought Level", default: 70.0, min: 60.0, max: 90.0 },
            ParamSpec { key: "rsi_oversold", label: "Oversold Level", default: 30.0, min: 10.0, max: 40.0 },
        ],
    };

    pub fn new(period: usize, overbought: f64, oversold: f64) -> Self {
        Self { period, overbought, oversold }
    }

    pub fn from_params(values: &HashMap<String, f64>) -> Result<Self> {
        let p = StrategyParams::new(&Self::DESCRIPTOR, values);
        Ok(Self::new(
            p.period("rsi_period")?,
            p.f64("rsi_overbought"),
            p.f64("rsi_oversold"),
        ))
    }
}

impl SignalGenerator for RsiThreshold {
    fn name(&self) -> &str {
        Self::DESCRIPTOR.key
    }

    fn min_history(&self) -> usize {
        self.period + 1
    }

    fn evaluate(&self, prices: &[f64], memory: &mut IndicatorMemory) -> Signal {
        if prices.len() < self.period + 1 {
            return Signal::Hold;
        }
        let current = rsi(prices, self.period);

        let signal = if current > self.overbought && memory.last_rsi <= self.overbought {
            Signal::Sell
        } else if current < self.oversold && memory.last_rsi >= self.oversold {
            Signal::Buy
        } else {
            Signal::Hold
        };

        memory.last_rsi = current;
        signal
    }
}

// ─── Stochastic threshold ─────────────────────────────────────────────────────

pub struct StochasticThreshold {
    period: usize,
    overbought: f64,
    oversold: f64,
}

impl StochasticThreshold {
    pub const DESCRIPTOR: StrategyDescriptor = StrategyDescriptor {
        key: "stochastic",
        name: "Stochastic Oscillator",
        description: "Measures the position of current price relative to its range over a specified period. Sensitive to market momentum.",
        params: &[
            ParamSpec { key: "period", label: "Period", default: 14.0, min: 5.0, max: 50.0 },
            ParamSpec { key: "overbought", label: "Overbought", default: 80.0, min: 70.0, max: 95.0 },
            ParamSpec { key: "oversold", label: "Oversold", default: 20.0, min: 5.0, max: 30.0 },
        ],
    };

    pub fn new(period: usize, overbought: f64, oversold: f64) -> Self {
        Self { period, overbought, oversold }
    }

    pub fn from_params(values: &HashMap<String, f64>) -> Result<Self> {
        let p = StrategyParams::new(&Self::DESCRIPTOR, values);
        Ok(Self::new(p.period("period")?, p.f64("overbought"), p.f64("oversold")))
    }
}

impl SignalGenerator for StochasticThreshold {
    fn name(&self) -> &str {
        Self::DESCRIPTOR.key
    }

    fn min_history(&self) -> usize {
        self.period
    }

    fn evaluate(&self, prices: &[f64], _memory: &mut IndicatorMemory) -> Signal {
        if prices.len() < self.period {
            return Signal::Hold;
        }
        let k = stochastic(prices, self.period);
        if k > self.overbought {
            Signal::Sell
        } else if k < self.oversold {
            Signal::Buy
        } else {
            Signal::Hold
        }
    }
}

// ─── Bollinger band ───────────────────────────────────────────────────────────

pub struct BollingerBand {
    period: usize,
    std_dev: f64,
}

impl BollingerBand {
    pub const DESCRIPTOR: StrategyDescriptor = StrategyDescriptor {
        key: "bollinger",
        name: "Bollinger Bands",
        description: "Triggers trades when the price touches the upper or lower bands. Effective in volatile markets with mean reversion.",
        params: &[
            ParamSpec { key: "period", label: "Period", default: 20.0, min: 10.0, max: 50.0 },
            ParamSpec { key: "std_dev", label: "Std. Deviations", default: 2.0, min: 1.0, max: 3.0 },
        ],
    };

    pub fn new(period: usize, std_dev: f64) -> Self {
        Self { period, std_dev }
    }

    pub fn from_params(values: &HashMap<String, f64>) -> Result<Self> {
        let p = StrategyParams::new(&Self::DESCRIPTOR, values);
        Ok(Self::new(p.period("period")?, p.f64("std_dev")))
    }
}

impl SignalGenerator for BollingerBand {
    fn name(&self) -> &str {
        Self::DESCRIPTOR.key
    }

    fn min_history(&self) -> usize {
        self.period
    }

    fn evaluate(&self, prices: &[f64], _memory: &mut IndicatorMemory) -> Signal {
        if prices.len() < self.period {
            return Signal::Hold;
        }
        let bands = bollinger_bands(prices, self.period, self.std_dev);
        let price = prices[prices.len() - 1];

        // A collapsed band touches both sides at once; the upper band wins.
        if price >= bands.upper {
            Signal::Sell
        } else if price <= bands.lower {
            Signal::Buy
        } else {
            Signal::Hold
        }
    }

    fn display_indicators(&self, prices: &[f64]) -> IndicatorSnapshot {
        let mut out = IndicatorSnapshot::new();
        if prices.len() >= self.period {
            let bands = bollinger_bands(prices, self.period, self.std_dev);
            out.insert("bollinger_upper".into(), bands.upper);
            out.insert("bollinger_lower".into(), bands.lower);
        }
        out
    }
}
