pub mod alert;
pub mod binance;
pub mod coinbase;
pub mod feed;
pub mod history;
pub mod lifecycle;
pub mod orders;
pub mod state;
pub mod stats;

use std::sync::Arc;
use std::time::Duration;

use common::{BotConfig, Connector, ConnectorKind, Credentials, NotificationSink, Result};
use simulation::SimulatedConnector;

pub use alert::PriceAlertTracker;
pub use binance::BinanceConnector;
pub use coinbase::CoinbaseConnector;
pub use feed::{FeedSpec, FeedState, LatestPrice, LiveFeed};
pub use history::PriceHistory;
pub use lifecycle::Bot;
pub use orders::OrderTasks;
pub use state::{BotSnapshot, BotState};
pub use stats::TradeStats;

/// Build the connector selected by `config.connector`.
///
/// Unknown keys fail with `Error::UnknownConnector`. The connector is not
/// connected yet.
pub fn connector_from_config(
    config: &BotConfig,
    sink: Arc<dyn NotificationSink>,
    connect_timeout: Duration,
) -> Result<Box<dyn Connector>> {
    let kind: ConnectorKind = config.connector.parse()?;
    let credentials = Credentials::from_params(&config.connector_params);

    Ok(match kind {
        ConnectorKind::Simulation => Box::new(SimulatedConnector::new(sink)),
        ConnectorKind::Binance => Box::new(
            BinanceConnector::new(credentials, config.risk_level, sink)
                .with_connect_timeout(connect_timeout),
        ),
        ConnectorKind::Coinbase => Box::new(
            CoinbaseConnector::new(credentials, config.risk_level, sink)
                .with_connect_timeout(connect_timeout),
        ),
    })
}
