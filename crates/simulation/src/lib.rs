use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use common::{Connector, Error, LogLevel, NotificationSink, Result, Signal};

pub const MIN_PRICE: f64 = 10.0;
pub const MAX_PRICE: f64 = 1000.0;

/// Self-contained random-walk price source for paper trading.
///
/// Each tick applies a slow sine trend plus uniform noise scaled by a
/// volatility drawn at connect time. No I/O; orders are only logged.
pub struct SimulatedConnector {
    rng: StdRng,
    last_price: Option<f64>,
    volatility: f64,
    clock: fn() -> u64,
    sink: Arc<dyn NotificationSink>,
}

impl SimulatedConnector {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self::from_rng(StdRng::from_entropy(), sink)
    }

    /// Reproducible walk for tests and replays.
    pub fn with_seed(seed: u64, sink: Arc<dyn NotificationSink>) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), sink)
    }

    fn from_rng(rng: StdRng, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            rng,
            last_price: None,
            volatility: 0.0,
            clock: unix_secs,
            sink,
        }
    }

    /// Replace the wall clock driving the trend component.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[async_trait]
impl Connector for SimulatedConnector {
    fn name(&self) -> &str {
        "simulation"
    }

    async fn connect(&mut self, _paper_trading: bool, _symbol: &str) -> Result<()> {
        self.last_price = Some(100.0 + self.rng.gen::<f64>() * 50.0);
        self.volatility = 0.02 + self.rng.gen::<f64>() * 0.03;
        self.sink
            .log(LogLevel::Info, "Simulation Connector Initialized.");
        Ok(())
    }

    fn price(&mut self) -> Result<f64> {
        let last = self
            .last_price
            .ok_or_else(|| Error::PriceUnavailable("simulation (not connected)".into()))?;

        let trend = ((self.clock)() as f64 / 100.0).sin() * 0.001;
        let noise = (self.rng.gen::<f64>() - 0.5) * self.volatility;
        let next = (last * (1.0 + trend + noise)).clamp(MIN_PRICE, MAX_PRICE);

        debug!(price = next, trend, noise, "Simulated price");
        self.last_price = Some(next);
        Ok(next)
    }

    fn place_order(&mut self, signal: Signal, price: f64, symbol: &str) -> Result<()> {
        self.sink.log(
            LogLevel::Success,
            &format!("[PAPER TRADE] Placed {signal} order for {symbol} at ${price:.2}"),
        );
        Ok(())
    }
}
