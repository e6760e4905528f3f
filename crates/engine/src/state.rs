use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, warn};

use common::{BotConfig, Connector, LogLevel, Notification, NotificationSink, Signal};
use strategy::{IndicatorMemory, SignalGenerator};

use crate::alert::PriceAlertTracker;
use crate::history::PriceHistory;
use crate::stats::TradeStats;

/// Everything the tick loop mutates.
///
/// Owned by exactly one task at a time: the `Bot` while idle, the loop task
/// while running. History, indicator memory and counters carry over from one
/// run to the next; the connector and generator are replaced on every start.
pub struct BotState {
    config: Option<BotConfig>,
    history: PriceHistory,
    memory: IndicatorMemory,
    last_position: Signal,
    stats: TradeStats,
    alert: PriceAlertTracker,
    started_at: Option<Instant>,
    started_wall: Option<DateTime<Utc>>,
    connector: Option<Box<dyn Connector>>,
    generator: Option<Box<dyn SignalGenerator>>,
}

/// Read-only view of the bot published after every tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BotSnapshot {
    pub running: bool,
    pub symbol: Option<String>,
    pub strategy: Option<String>,
    pub connector: Option<String>,
    pub history_len: usize,
    pub last_price: Option<f64>,
    pub trade_count: u64,
    pub win_count: u64,
    pub win_rate_pct: f64,
    pub last_position: Signal,
    pub memory: IndicatorMemory,
    pub started_at: Option<DateTime<Utc>>,
}

impl BotState {
    pub fn new(stats: TradeStats) -> Self {
        Self {
            config: None,
            history: PriceHistory::default(),
            memory: IndicatorMemory::default(),
            last_position: Signal::Hold,
            stats,
            alert: PriceAlertTracker::default(),
            started_at: None,
            started_wall: None,
            connector: None,
            generator: None,
        }
    }

    /// Install a connected connector and generator for a new run.
    pub fn begin_run(
        &mut self,
        config: BotConfig,
        connector: Box<dyn Connector>,
        generator: Box<dyn SignalGenerator>,
    ) {
        self.config = Some(config);
        self.connector = Some(connector);
        self.generator = Some(generator);
        self.started_at = Some(Instant::now());
        self.started_wall = Some(Utc::now());
    }

    /// Hand back the connector so the caller can disconnect it.
    pub fn end_run(&mut self) -> Option<Box<dyn Connector>> {
        self.generator = None;
        self.connector.take()
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    pub fn stats(&self) -> &TradeStats {
        &self.stats
    }

    pub fn last_position(&self) -> Signal {
        self.last_position
    }

    pub fn performance(&self) -> common::PerformanceSnapshot {
        self.stats
            .snapshot(self.history.last().unwrap_or_default())
    }

    pub fn snapshot(&self, running: bool) -> BotSnapshot {
        BotSnapshot {
            running,
            symbol: self.config.as_ref().map(|c| c.symbol.clone()),
            strategy: self.generator.as_ref().map(|g| g.name().to_string()),
            connector: self.connector.as_ref().map(|c| c.name().to_string()),
            history_len: self.history.len(),
            last_price: self.history.last(),
            trade_count: self.stats.trade_count(),
            win_count: self.stats.win_count(),
            win_rate_pct: self.stats.win_rate(),
            last_position: self.last_position,
            memory: self.memory,
            started_at: self.started_wall,
        }
    }

    /// Run one tick. Returns the generated signal, or `None` when no price
    /// could be fetched and the tick was skipped.
    pub fn tick(&mut self, sink: &dyn NotificationSink) -> Option<Signal> {
        let (Some(config), Some(connector), Some(generator)) = (
            self.config.as_ref(),
            self.connector.as_mut(),
            self.generator.as_ref(),
        ) else {
            warn!("Tick without an active run");
            return None;
        };
        let symbol = config.symbol.as_str();

        let price = match connector.price() {
            Ok(price) => price,
            Err(e) => {
                sink.log(LogLevel::Error, &format!("Failed to get price: {e}"));
                return None;
            }
        };

        self.history.push(price);

        sink.notify(Notification::PriceTick(price));
        if let Some(started) = self.started_at {
            sink.notify(Notification::Uptime(started.elapsed()));
        }
        sink.notify(Notification::Performance(self.stats.snapshot(price)));
        sink.log(
            LogLevel::Info,
            &format!("New price for {symbol}: ${price:.2}"),
        );

        let prices = self.history.as_slice();
        let indicators = generator.display_indicators(prices);
        if !indicators.is_empty() {
            sink.notify(Notification::Indicators(indicators));
        }

        let signal = generator.evaluate(prices, &mut self.memory);
        debug!(%signal, price, history = prices.len(), "Strategy evaluated");

        if !signal.is_hold() {
            if let Err(e) = connector.place_order(signal, price, symbol) {
                warn!(%signal, error = %e, "Order placement rejected");
            }
            if signal != self.last_position {
                self.stats.record_position_change();
            }
            self.last_position = signal;
            sink.log(LogLevel::Signal, &format!("{signal} signal triggered"));
            sink.notify(Notification::Signal { signal, price });
        }

        if let Some(alert) = self.alert.observe(price) {
            sink.notify(Notification::PriceAlert {
                symbol: symbol.to_string(),
                alert,
            });
        }

        Some(signal)
    }
}

impl Default for BotState {
    fn default() -> Self {
        Self::new(TradeStats::default())
    }
}
