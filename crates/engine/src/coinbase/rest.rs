use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;
use tracing::debug;

use common::{Error, Result, Signal};

pub const REST_BASE: &str = "https://api.pro.coinbase.com";

const ORDER_PATH: &str = "/orders";

/// Placeholder base-asset size sent with market sells, which Coinbase sizes
/// in the base currency rather than in funds.
pub const SELL_SIZE: &str = "0.001";

/// Market order body. Fields are kept in lexical order so the serialized
/// body is stable for signing.
#[derive(Debug, Serialize, PartialEq)]
pub struct MarketOrder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funds: Option<String>,
    pub product_id: String,
    pub side: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl MarketOrder {
    pub fn new(product_id: &str, signal: Signal, funds: &str) -> Self {
        let sell = signal == Signal::Sell;
        Self {
            funds: (!sell).then(|| funds.to_string()),
            product_id: product_id.to_string(),
            side: if sell { "sell" } else { "buy" },
            size: sell.then(|| SELL_SIZE.to_string()),
            kind: "market",
        }
    }
}

/// Signed REST client for Coinbase market orders.
pub struct CoinbaseClient {
    api_key: String,
    secret: String,
    passphrase: String,
    base_url: String,
    http: Client,
}

impl CoinbaseClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        secret: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            api_key: api_key.into(),
            secret: secret.into(),
            passphrase: passphrase.into(),
            base_url: base_url.into(),
            http,
        })
    }

    fn timestamp_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }

    /// Submit `order`. Returns the response body on success.
    pub async fn submit(&self, order: &MarketOrder) -> Result<String> {
        let body = serde_json::to_string(order)?;
        let timestamp = Self::timestamp_secs().to_string();
        let signature = sign(&self.secret, &prehash(&timestamp, "POST", ORDER_PATH, &body))?;
        let url = format!("{}{ORDER_PATH}", self.base_url.trim_end_matches('/'));

        debug!(product = %order.product_id, side = order.side, "Submitting order to Coinbase");
        let resp = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .header("CB-ACCESS-KEY", &self.api_key)
            .header("CB-ACCESS-SIGN", signature)
            .header("CB-ACCESS-TIMESTAMP", &timestamp)
            .header("CB-ACCESS-PASSPHRASE", &self.passphrase)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {text}")));
        }
        Ok(text)
    }
}

pub fn prehash(timestamp: &str, method: &str, path: &str, body: &str) -> String {
    format!("{timestamp}{method}{path}{body}")
}

/// Base64 HMAC-SHA256 of `payload` keyed with the base64-decoded secret.
pub fn sign(secret_b64: &str, payload: &str) -> Result<String> {
    let key = STANDARD
        .decode(secret_b64)
        .map_err(|_| Error::Credentials("Failed to decode Coinbase API secret.".into()))?;
    let mut mac = Hmac::<Sha256>::new_from_slice(&key).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
