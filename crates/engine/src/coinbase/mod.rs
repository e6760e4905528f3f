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

pub use rest::{CoinbaseClient, MarketOrder};

/// Live connector backed by the Coinbase ticker channel and signed REST orders.
pub struct CoinbaseConnector {
    credentials: Credentials,
    risk_level: RiskLevel,
    paper_trading: bool,
    stream_url: String,
    rest_base: String,
    connect_timeout: Duration,
    feed: Option<LiveFeed>,
    client: Option<Arc<CoinbaseClient>>,
    orders: OrderTasks,
    sink: Arc<dyn NotificationSink>,
}

impl CoinbaseConnector {
    pub fn new(
        credentials: Credentials,
        risk_level: RiskLevel,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            credentials,
            risk_level,
            paper_trading: true,
            stream_url: stream::STREAM_URL.to_string(),
            rest_base: rest::REST_BASE.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            feed: None,
            client: None,
            orders: OrderTasks::default(),
            sink,
        }
    }

    pub fn with_endpoints(mut self, stream_url: impl Into<String>, rest_base: impl Into<String>) -> Self {
        self.stream_url = stream_url.into();
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
        self.credentials.missing(ConnectorKind::Coinbase).is_empty()
    }
}

#[async_trait]
impl Connector for CoinbaseConnector {
    fn name(&self) -> &str {
        "coinbase"
    }

    async fn connect(&mut self, paper_trading: bool, symbol: &str) -> Result<()> {
        self.sink.log(LogLevel::Info, "Coinbase Connector Initializing...");
        self.paper_trading = paper_trading;

        if !paper_trading {
            if !self.has_credentials() {
                return Err(Error::Credentials(
                    "API Key, Secret, or Passphrase is missing for Coinbase".into(),
                ));
            }
            self.client = Some(Arc::new(CoinbaseClient::new(
                &self.rest_base,
                &self.credentials.api_key,
                &self.credentials.api_secret,
                &self.credentials.passphrase,
            )?));
        }

        let product = stream::product_id(symbol);
        let spec = FeedSpec {
            exchange: "Coinbase",
            url: self.stream_url.clone(),
            subscribe: Some(stream::subscribe_message(&product)),
            parse: stream::parse_ticker_price,
        };
        self.feed = Some(LiveFeed::connect(spec, self.connect_timeout, self.sink.clone()).await?);
        self.sink.log(
            LogLevel::Info,
            &format!("Subscribed to Coinbase ticker for {product}"),
        );
        info!(%product, paper_trading, "Coinbase connector ready");
        Ok(())
    }

    fn price(&mut self) -> Result<f64> {
        match &self.feed {
            Some(feed) => feed.price(),
            None => Err(Error::PriceUnavailable("Coinbase WebSocket".into())),
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
                    "cannot place real order: Coinbase API Key, Secret, or Passphrase is missing"
                        .into(),
                );
                self.sink.log(LogLevel::Error, &err.to_string());
                return Err(err);
            }
        };

        let product = stream::product_id(symbol);
        let funds = format!("{:.2}", self.risk_level.quote_notional());
        let order = MarketOrder::new(&product, signal, &funds);
        let sink = self.sink.clone();

        let submission = async move {
            if order.size.is_some() {
                sink.log(
                    LogLevel::Warning,
                    "Coinbase market SELL orders require 'size' (amount of crypto). This is not implemented. Order will likely fail.",
                );
            }
            sink.log(
                LogLevel::Info,
                &format!(
                    "[REAL TRADE] Submitting Coinbase {} market order for {}...",
                    order.side, order.product_id
                ),
            );
            match client.submit(&order).await {
                Ok(body) => sink.log(
                    LogLevel::Success,
                    &format!("Coinbase order successful:\n{}", pretty_body(&body)),
                ),
                Err(Error::Exchange(body)) => {
                    sink.log(LogLevel::Error, &format!("Coinbase API Error:\n{body}"))
                }
                Err(Error::Credentials(reason)) => sink.log(LogLevel::Error, &reason),
                Err(e) => sink.log(
                    LogLevel::Error,
                    &format!("Network error during Coinbase trade execution: {e}"),
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
