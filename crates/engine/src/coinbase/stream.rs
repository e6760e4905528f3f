use serde::{Deserialize, Serialize};

pub const STREAM_URL: &str = "wss://ws-feed.pro.coinbase.com";

/// Coinbase product id for an exchange-style symbol: `btcusdt` → `BTC-USD`.
pub fn product_id(symbol: &str) -> String {
    symbol.to_uppercase().replacen("USDT", "-USD", 1)
}

#[derive(Serialize)]
struct Subscribe<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    product_ids: [&'a str; 1],
    channels: [&'a str; 1],
}

/// Ticker channel subscription for one product.
pub fn subscribe_message(product_id: &str) -> String {
    let message = Subscribe {
        kind: "subscribe",
        product_ids: [product_id],
        channels: ["ticker"],
    };
    serde_json::to_string(&message).unwrap_or_default()
}

#[derive(Deserialize)]
struct Ticker {
    #[serde(rename = "type")]
    kind: String,
    price: String,
}

/// Price of a `ticker` message. Heartbeats, subscription acks, anything
/// unparsable and prices that are not positive and finite yield `None`.
pub fn parse_ticker_price(text: &str) -> Option<f64> {
    let ticker: Ticker = serde_json::from_str(text).ok()?;
    if ticker.kind != "ticker" {
        return None;
    }
    ticker
        .price
        .parse()
        .ok()
        .filter(|p: &f64| p.is_finite() && *p > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_usdt_symbols_to_usd_products() {
        assert_eq!(product_id("BTCUSDT"), "BTC-USD");
        assert_eq!(product_id("ethusdt"), "ETH-USD");
        assert_eq!(product_id("BTC-EUR"), "BTC-EUR");
    }

    #[test]
    fn subscription_payload() {
        assert_eq!(
            subscribe_message("BTC-USD"),
            r#"{"type":"subscribe","product_ids":["BTC-USD"],"channels":["ticker"]}"#
        );
    }

    #[test]
    fn parses_ticker_only() {
        let ticker = r#"{"type":"ticker","sequence":1,"product_id":"BTC-USD","price":"43001.17","side":"buy"}"#;
        assert_eq!(parse_ticker_price(ticker), Some(43001.17));

        assert_eq!(parse_ticker_price(r#"{"type":"heartbeat","sequence":1}"#), None);
        assert_eq!(parse_ticker_price(r#"{"type":"subscriptions","channels":[]}"#), None);
        assert_eq!(parse_ticker_price(r#"{"type":"ticker","price":1.5}"#), None);
        assert_eq!(parse_ticker_price("garbage"), None);

        for raw in ["NaN", "inf", "0", "-5"] {
            let text = format!(r#"{{"type":"ticker","price":"{raw}"}}"#);
            assert_eq!(parse_ticker_price(&text), None, "{raw} should be ignored");
        }
    }
}
