use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use tracing::debug;

use common::{Error, Result, Signal};

pub const REST_BASE: &str = "https://api.binance.com";

const ORDER_PATH: &str = "/api/v3/order";

/// Signed REST client for Binance spot market orders.
pub struct BinanceClient {
    api_key: String,
    secret: String,
    base_url: String,
    http: Client,
}

impl BinanceClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            api_key: api_key.into(),
            secret: secret.into(),
            base_url: base_url.into(),
            http,
        })
    }

    fn timestamp_ms() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
    }

    /// Submit a MARKET order spending `quote_qty` of the quote asset.
    /// Returns the response body on success.
    pub async fn submit_market_order(
        &self,
        symbol: &str,
        side: Signal,
        quote_qty: &str,
    ) -> Result<String> {
        let query = order_query(symbol, side, quote_qty, Self::timestamp_ms());
        let signature = sign(&self.secret, &query);
        let url = format!(
            "{}{ORDER_PATH}?{query}&signature={signature}",
            self.base_url.trim_end_matches('/')
        );

        debug!(symbol, side = %side, quote_qty, "Submitting order to Binance");
        let resp = self
            .http
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

/// Binance side for a non-HOLD signal.
pub fn side(signal: Signal) -> &'static str {
    match signal {
        Signal::Sell => "SELL",
        _ => "BUY",
    }
}

pub fn order_query(symbol: &str, signal: Signal, quote_qty: &str, timestamp_ms: u128) -> String {
    format!(
        "symbol={symbol}&side={}&type=MARKET&quoteOrderQty={quote_qty}&timestamp={timestamp_ms}",
        side(signal)
    )
}

/// Hex HMAC-SHA256 of `payload` keyed with the API secret.
pub fn sign(secret: &str, payload: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_layout() {
        assert_eq!(
            order_query("BTCUSDT", Signal::Sell, "20.0", 1_700_000_000_123),
            "symbol=BTCUSDT&side=SELL&type=MARKET&quoteOrderQty=20.0&timestamp=1700000000123"
        );
        assert!(order_query("ETHUSDT", Signal::Buy, "10.0", 1).contains("side=BUY"));
    }

    #[test]
    fn signature_matches_binance_reference() {
        // Example request from the Binance API documentation.
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            sign(secret, query),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }
}
