pub mod rest;
pub mod stream;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use common::{
    Connector, ConnectorKind, Credentials, Error, LogLevel, NotificationSink, Result, RiskLevel,
    Signal,
};

use crate::feed::{FeedSpec, LiveFeed, DEFAULT_CONNECT_TIMEOUT};
use crate::orders::{pretty_body, OrderTasks};

pub use rest::BinanceClient;

/// Live connector backed by the Binance trade stream and signed REST orders.
pub struct BinanceConnector {
    credentials: Credentials,
    risk_level: RiskLevel,
    paper_trading: bool,
    stream_base: String,
    rest_base: String,
    connect_timeout: Duration,
    feed: Option<LiveFeed>,
    client: Option<Arc<BinanceClient>>,
    orders: OrderTasks,
    sink: Arc<dyn NotificationSink>,
}

impl BinanceConnector {
    pub fn new(
        credentials: Credentials,
        risk_level: RiskLevel,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            credentials,
            risk_level,
            paper_trading: true,
            stream_base: stream::STREAM_BASE.to_string(),
            rest_base: rest::REST_BASE.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            feed: None,
            client: None,
            orders: OrderTasks::default(),
            sink,
        }
    }

    /// Point the connector at other stream and REST hosts.
    pub fn with_endpoints(mut self, stream_base: impl Into<String>, rest_base: impl Into<String>) -> Self {
        self.stream_base = stream_base.into();
        self.rest_base = rest_base.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn feed(&self) -> Option<&LiveFeed> {
        self.feed.as_ref()
    }

    fn has_credentials(&self) -> bool {
        self.credentials.missing(ConnectorKind::Binance).is_empty()
    }
}

#[async_trait]
impl Connector for BinanceConnector {
    fn name(&self) -> &str {
        "binance"
    }

    async fn connect(&mut self, paper_trading: bool, symbol: &str) -> Result<()> {
        self.sink.log(LogLevel::Info, "Binance Connector Initializing...");
        self.paper_trading = paper_trading;

        if !paper_trading {
            if !self.has_credentials() {
                return Err(Error::Credentials(
                    "API Key or Secret is missing for Binance".into(),
                ));
            }
            self.client = Some(Arc::new(BinanceClient::new(
                &self.rest_base,
                &self.credentials.api_key,
                &self.credentials.api_secret,
            )?));
        }

        let spec = FeedSpec {
            exchange: "Binance",
            url: stream::stream_url(&self.stream_base, symbol),
            subscribe: None,
            parse: stream::parse_trade_price,
        };
        self.feed = Some(LiveFeed::connect(spec, self.connect_timeout, self.sink.clone()).await?);
        info!(symbol, paper_trading, "Binance connector ready");
        Ok(())
    }

    fn price(&mut self) -> Result<f64> {
        match &self.feed {
            Some(feed) => feed.price(),
            None => Err(Error::PriceUnavailable("Binance WebSocket".into())),
        }
    }

    fn place_order(&mut self, signal: Signal, price: f64, symbol: &str) -> Result<()> {
        if self.paper_trading {
            self.sink.log(
                LogLevel::Success,
                &format!("[PAPER TRADE] Placed {signal} order for {symbol} at ${price:.2}"),
            );
            return Ok(());
        }

        let client = match (&self.client, self.has_credentials()) {
            (Some(client), true) => client.clone(),
            _ => {
                let err = Error::Credentials(
                    "cannot place real order: Binance API Key or Secret is missing".into(),
                );
                self.sink.log(LogLevel::Error, &err.to_string());
                return Err(err);
            }
        };

        let side = rest::side(signal);
        let quote_qty = format!("{:.1}", self.risk_level.quote_notional());
        let symbol = symbol.to_string();
        let sink = self.sink.clone();

        let submission = async move {
            sink.log(
                LogLevel::Info,
                &format!("[REAL TRADE] Submitting {side} market order for {symbol} of ${quote_qty}..."),
            );
            match client.submit_market_order(&symbol, signal, &quote_qty).await {
                Ok(body) => sink.log(
                    LogLevel::Success,
                    &format!("Binance order successful:\n{}", pretty_body(&body)),
                ),
                Err(Error::Exchange(body)) => {
                    sink.log(LogLevel::Error, &format!("Binance API Error:\n{body}"))
                }
                Err(e) => sink.log(
                    LogLevel::Error,
                    &format!("Network error during trade execution: {e}"),
                ),
            }
        };

        if let Err(e) = self.orders.spawn(submission) {
            self.sink.log(LogLevel::Error, &e.to_string());
            return Err(e);
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.orders.abort_all();
        if let Some(mut feed) = self.feed.take() {
            feed.close().await;
        }
        Ok(())
    }
}
