use serde::{Deserialize, Serialize};

/// Trade signal produced by a strategy on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    #[default]
    Hold,
    Buy,
    Sell,
}

impl Signal {
    pub fn is_hold(self) -> bool {
        self == Signal::Hold
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Hold => "HOLD",
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk tier selecting the fixed quote-currency notional of each live order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskLevel {
    /// Quote-currency amount risked per order.
    pub fn quote_notional(self) -> f64 {
        match self {
            RiskLevel::Conservative => 10.0,
            RiskLevel::Moderate => 20.0,
            RiskLevel::Aggressive => 50.0,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Conservative => write!(f, "conservative"),
            RiskLevel::Moderate => write!(f, "moderate"),
            RiskLevel::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// Severity attached to a log notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    Signal,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Success => write!(f, "success"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Signal => write!(f, "signal"),
        }
    }
}

/// Direction of a price-alert move relative to the alert baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertDirection {
    Up,
    Down,
}

impl std::fmt::Display for AlertDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertDirection::Up => write!(f, "UP"),
            AlertDirection::Down => write!(f, "DOWN"),
        }
    }
}

/// A price move of at least the alert threshold since the last baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub direction: AlertDirection,
    /// Absolute move in percent.
    pub change_pct: f64,
    pub from: f64,
    pub to: f64,
}

/// Running performance counters reported after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub trade_count: u64,
    pub win_rate_pct: f64,
    pub current_price: f64,
    pub profit_and_loss: f64,
}
