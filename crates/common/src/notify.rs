use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{LogLevel, PerformanceSnapshot, PriceAlert, Signal};

/// One-way event emitted by the engine for display and logging consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Log { level: LogLevel, message: String },
    Status(String),
    PriceTick(f64),
    Signal { signal: Signal, price: f64 },
    Performance(PerformanceSnapshot),
    Uptime(Duration),
    /// Indicator name to value. Never emitted empty.
    Indicators(BTreeMap<String, f64>),
    PriceAlert { symbol: String, alert: PriceAlert },
}

/// Fire-and-forget consumer of engine notifications.
///
/// Implementations must not block: the tick loop calls `notify` inline.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);

    fn log(&self, level: LogLevel, message: &str) {
        self.notify(Notification::Log {
            level,
            message: message.to_string(),
        });
    }
}

/// Maps every notification onto a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Log { level, message } => match level {
                LogLevel::Info | LogLevel::Success | LogLevel::Signal => {
                    info!(%level, "{message}")
                }
                LogLevel::Warning => warn!("{message}"),
                LogLevel::Error => error!("{message}"),
            },
            Notification::Status(status) => info!(%status, "Status changed"),
            Notification::PriceTick(price) => debug!(price, "Price tick"),
            Notification::Signal { signal, price } => info!(%signal, price, "Signal"),
            Notification::Performance(p) => debug!(
                trades = p.trade_count,
                win_rate = p.win_rate_pct,
                price = p.current_price,
                pnl = p.profit_and_loss,
                "Performance"
            ),
            Notification::Uptime(uptime) => debug!(?uptime, "Uptime"),
            Notification::Indicators(indicators) => debug!(?indicators, "Indicators"),
            Notification::PriceAlert { symbol, alert } => warn!(
                "PRICE ALERT: {symbol} moved {} by {:.2}% (from ${:.2} to ${:.2})",
                alert.direction, alert.change_pct, alert.from, alert.to
            ),
        }
    }
}

/// Publishes notifications on a broadcast channel (dashboard streams, tests).
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl NotificationSink for BroadcastSink {
    fn notify(&self, notification: Notification) {
        // Ignore send errors (no active receivers)
        let _ = self.tx.send(notification);
    }
}

/// Forwards each notification to every inner sink.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl NotificationSink for FanoutSink {
    fn notify(&self, notification: Notification) {
        for sink in &self.sinks {
            sink.notify(notification.clone());
        }
    }
}
