use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, RiskLevel};

pub const MIN_TICK_INTERVAL_SECS: u64 = 1;
pub const MAX_TICK_INTERVAL_SECS: u64 = 60;

/// Run configuration consumed by `Bot::start`.
///
/// Example `config/bot.toml`:
/// ```toml
/// symbol = "BTCUSDT"
/// tick_interval_secs = 2
/// paper_trading = true
/// connector = "binance"
/// strategy = "rsi_basic"
/// risk_level = "conservative"
///
/// [strategy_params]
/// rsi_period = 14
/// rsi_overbought = 70.0
/// rsi_oversold = 30.0
/// ```
///
/// The camelCase aliases accept the JSON shape produced by the web UI.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    /// Trading pair, e.g. "BTCUSDT".
    pub symbol: String,
    #[serde(alias = "tickIntervalSeconds")]
    pub tick_interval_secs: u64,
    #[serde(default = "default_paper_trading", alias = "paperTrading")]
    pub paper_trading: bool,
    /// Connector key: "simulation", "coinbase" or "binance".
    pub connector: String,
    /// Credentials: `apiKey`, `apiSecret`, `secretPhrase`.
    #[serde(default, alias = "connectorParams")]
    pub connector_params: HashMap<String, String>,
    /// Strategy key, e.g. "sma_crossover".
    pub strategy: String,
    /// Periods, thresholds and multipliers for the selected strategy.
    #[serde(default, alias = "strategyParams")]
    pub strategy_params: HashMap<String, f64>,
    #[serde(default, alias = "riskLevel")]
    pub risk_level: RiskLevel,
}

fn default_paper_trading() -> bool {
    true
}

impl BotConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Parse the JSON config shape submitted by the web UI.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(Error::Config("a trading symbol is required".into()));
        }
        if self.tick_interval_secs < MIN_TICK_INTERVAL_SECS {
            return Err(Error::Config(format!(
                "Tick interval must be at least {MIN_TICK_INTERVAL_SECS} second."
            )));
        }
        if self.tick_interval_secs > MAX_TICK_INTERVAL_SECS {
            return Err(Error::Config(format!(
                "Tick interval must be at most {MAX_TICK_INTERVAL_SECS} seconds."
            )));
        }
        Ok(())
    }

    /// Fill credentials absent from `connector_params` from the environment.
    pub fn with_env_credentials(mut self) -> Self {
        let env_keys: &[(&str, &str)] = match self.connector.as_str() {
            "binance" => &[("apiKey", "BINANCE_API_KEY"), ("apiSecret", "BINANCE_SECRET")],
            "coinbase" => &[
                ("apiKey", "COINBASE_API_KEY"),
                ("apiSecret", "COINBASE_API_SECRET"),
                ("secretPhrase", "COINBASE_PASSPHRASE"),
            ],
            _ => &[],
        };
        for (param, var) in env_keys {
            let present = self
                .connector_params
                .get(*param)
                .is_some_and(|v| !v.is_empty());
            if !present {
                if let Some(value) = optional_env(var) {
                    self.connector_params.insert(param.to_string(), value);
                }
            }
        }
        self
    }
}

/// Process-level settings loaded from environment variables at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_path: String,
}

impl AppConfig {
    /// Loads `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        AppConfig {
            config_path: optional_env("GANYMEDE_CONFIG")
                .unwrap_or_else(|| "config/bot.toml".to_string()),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UI_JSON: &str = r#"{
        "symbol": "BTCUSDT",
        "tickIntervalSeconds": 5,
        "paperTrading": false,
        "connector": "coinbase",
        "connectorParams": { "apiKey": "k", "apiSecret": "s", "secretPhrase": "p" },
        "strategy": "stochastic",
        "strategyParams": { "period": 14, "overbought": 80, "oversold": 20 },
        "riskLevel": "aggressive"
    }"#;

    #[test]
    fn parses_ui_json_shape() {
        let cfg = BotConfig::from_json(UI_JSON).unwrap();
        assert_eq!(cfg.symbol, "BTCUSDT");
        assert_eq!(cfg.tick_interval(), Duration::from_secs(5));
        assert!(!cfg.paper_trading);
        assert_eq!(cfg.connector_params["secretPhrase"], "p");
        assert_eq!(cfg.strategy_params["overbought"], 80.0);
        assert_eq!(cfg.risk_level, RiskLevel::Aggressive);
    }

    #[test]
    fn parses_toml_with_defaults() {
        let cfg: BotConfig = toml::from_str(
            r#"
            symbol = "ETHUSDT"
            tick_interval_secs = 1
            connector = "simulation"
            strategy = "bollinger"
            "#,
        )
        .unwrap();
        assert!(cfg.paper_trading);
        assert_eq!(cfg.risk_level, RiskLevel::Moderate);
        assert!(cfg.strategy_params.is_empty());
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_sub_minimum_tick_interval() {
        let mut cfg = BotConfig::from_json(UI_JSON).unwrap();
        cfg.tick_interval_secs = 0;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_tick_interval_above_ui_bound() {
        let mut cfg = BotConfig::from_json(UI_JSON).unwrap();
        cfg.tick_interval_secs = 61;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_empty_symbol() {
        let mut cfg = BotConfig::from_json(UI_JSON).unwrap();
        cfg.symbol = "  ".into();
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn explicit_credentials_are_not_overridden_by_env() {
        let cfg = BotConfig::from_json(UI_JSON).unwrap().with_env_credentials();
        assert_eq!(cfg.connector_params["apiKey"], "k");
        assert_eq!(cfg.connector_params["apiSecret"], "s");
    }

    #[test]
    fn risk_tiers_size_notional() {
        assert_eq!(RiskLevel::Conservative.quote_notional(), 10.0);
        assert_eq!(RiskLevel::Moderate.quote_notional(), 20.0);
        assert_eq!(RiskLevel::Aggressive.quote_notional(), 50.0);
    }
}
