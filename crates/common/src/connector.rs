use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;

use crate::{Error, Result, Signal};

/// Abstraction over a price source plus an order sink.
///
/// The engine owns exactly one `Connector` per run. `SimulatedConnector`
/// (crate `simulation`) holds no external resources; the live connectors in
/// `crates/engine` own a stream subscription and a credential set.
#[async_trait]
pub trait Connector: Send {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Open the price source. Live variants block here until the stream is
    /// confirmed or the connect timeout elapses.
    async fn connect(&mut self, paper_trading: bool, symbol: &str) -> Result<()>;

    /// Latest price. Never blocks: fails with `Error::PriceUnavailable` until
    /// the first price has been observed.
    fn price(&mut self) -> Result<f64>;

    /// Forward a non-HOLD signal. Live submissions are dispatched onto a
    /// background task; only credential or backlog problems surface here.
    fn place_order(&mut self, signal: Signal, price: f64, symbol: &str) -> Result<()>;

    async fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Connector variants selectable by configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    Simulation,
    Coinbase,
    Binance,
}

impl ConnectorKind {
    pub const ALL: [ConnectorKind; 3] = [
        ConnectorKind::Simulation,
        ConnectorKind::Coinbase,
        ConnectorKind::Binance,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ConnectorKind::Simulation => "simulation",
            ConnectorKind::Coinbase => "coinbase",
            ConnectorKind::Binance => "binance",
        }
    }

    /// Connector parameter keys that must be set for live trading.
    pub fn required_credentials(self) -> &'static [&'static str] {
        match self {
            ConnectorKind::Simulation => &[],
            ConnectorKind::Coinbase => &["apiKey", "apiSecret", "secretPhrase"],
            ConnectorKind::Binance => &["apiKey", "apiSecret"],
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ConnectorKind::Simulation => {
                "Generates realistic price movements with trends and volatility for testing strategies without real money."
            }
            ConnectorKind::Coinbase => {
                "Connect to Coinbase Pro exchange. Requires API credentials with trading permissions."
            }
            ConnectorKind::Binance => {
                "Connect to Binance exchange. Requires API credentials with trading permissions."
            }
        }
    }
}

impl FromStr for ConnectorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ConnectorKind::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| Error::UnknownConnector(s.to_string()))
    }
}

impl std::fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Exchange API credentials taken from the connector parameter map.
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl Credentials {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let get = |key: &str| params.get(key).cloned().unwrap_or_default();
        Self {
            api_key: get("apiKey"),
            api_secret: get("apiSecret"),
            passphrase: get("secretPhrase"),
        }
    }

    /// Names of the credentials `kind` needs that are empty here.
    pub fn missing(&self, kind: ConnectorKind) -> Vec<&'static str> {
        kind.required_credentials()
            .iter()
            .copied()
            .filter(|key| match *key {
                "apiKey" => self.api_key.is_empty(),
                "apiSecret" => self.api_secret.is_empty(),
                "secretPhrase" => self.passphrase.is_empty(),
                _ => false,
            })
            .collect()
    }
}

// Never print secrets.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key_set", &!self.api_key.is_empty())
            .field("api_secret_set", &!self.api_secret.is_empty())
            .field("passphrase_set", &!self.passphrase.is_empty())
            .finish()
    }
}
