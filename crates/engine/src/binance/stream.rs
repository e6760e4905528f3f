use serde::Deserialize;

pub const STREAM_BASE: &str = "wss://stream.binance.com:9443/ws";

/// Raw trade stream URL for `symbol` under `base`.
pub fn stream_url(base: &str, symbol: &str) -> String {
    format!("{}/{}@trade", base.trim_end_matches('/'), symbol.to_lowercase())
}

// ─── Binance trade JSON parsing ──────────────────────────────────────────────

#[derive(Deserialize)]
struct TradeEvent {
    #[serde(rename = "p")]
    price: String,
}

/// Price of a trade event. Anything that is not a trade with a positive,
/// finite numeric string `p` yields `None`.
pub fn parse_trade_price(text: &str) -> Option<f64> {
    let event: TradeEvent = serde_json::from_str(text).ok()?;
    event
        .price
        .parse()
        .ok()
        .filter(|p: &f64| p.is_finite() && *p > 0.0)
}
