use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use common::{
    BroadcastSink, Connector, Credentials, Error, LogLevel, Notification, RiskLevel, Signal,
};
use engine::{BinanceConnector, CoinbaseConnector, FeedState};

// ─── Local stream server ─────────────────────────────────────────────────────

/// Accept one WebSocket client, forward its first frame (if any) on
/// `first_frame`, send `frames`, then either close or idle until the client
/// goes away.
async fn serve(
    frames: Vec<&'static str>,
    close_after: bool,
) -> (String, JoinHandle<()>, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (first_tx, first_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        let mut first_tx = Some(first_tx);

        for frame in frames {
            ws.send(Message::Text(frame.to_string())).await.unwrap();
        }
        if close_after {
            let _ = ws.close(None).await;
            return;
        }
        while let Some(Ok(msg)) = ws.next().await {
            match msg {
                Message::Text(text) => {
                    if let Some(tx) = first_tx.take() {
                        let _ = tx.send(text);
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    (format!("ws://{addr}"), server, first_rx)
}

fn sink() -> (Arc<BroadcastSink>, broadcast::Receiver<Notification>) {
    let sink = Arc::new(BroadcastSink::new(256));
    let rx = sink.subscribe();
    (sink, rx)
}

fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

fn logged(notifications: &[Notification], level: LogLevel, text: &str) -> bool {
    notifications.iter().any(|n| {
        matches!(n, Notification::Log { level: l, message } if *l == level && message.contains(text))
    })
}

async fn wait_for_price(connector: &mut dyn Connector, expected: f64) {
    for _ in 0..200 {
        if connector.price().ok() == Some(expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("price {expected} never arrived, last read {:?}", connector.price().ok());
}

fn binance_creds() -> Credentials {
    Credentials {
        api_key: "test-key".into(),
        api_secret: "test-secret".into(),
        passphrase: String::new(),
    }
}

// ─── Binance ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn binance_feed_tracks_latest_trade_price() {
    let (url, server, _) = serve(
        vec![
            "not json at all",
            r#"{"result":null,"id":1}"#,
            r#"{"e":"trade","s":"BTCUSDT","p":"43000.50","q":"0.1"}"#,
            r#"{"e":"trade","s":"BTCUSDT","p":"43001.25","q":"0.2"}"#,
        ],
        false,
    )
    .await;
    let (sink, mut rx) = sink();
    let mut connector = BinanceConnector::new(Credentials::default(), RiskLevel::Moderate, sink)
        .with_endpoints(url, "http://127.0.0.1:9");

    connector.connect(true, "BTCUSDT").await.unwrap();
    wait_for_price(&mut connector, 43001.25).await;
    assert_eq!(connector.feed().map(|f| f.state()), Some(FeedState::Subscribed));

    let notifications = drain(&mut rx);
    assert!(logged(&notifications, LogLevel::Success, "Binance WebSocket connection established."));
    // Malformed frames are dropped without a log line.
    assert!(!notifications
        .iter()
        .any(|n| matches!(n, Notification::Log { level: LogLevel::Error, .. })));

    connector.disconnect().await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), server)
        .await
        .expect("server should see the close")
        .unwrap();
}

#[tokio::test]
async fn price_is_unavailable_until_first_trade() {
    let (url, _server, _) = serve(vec![], false).await;
    let (sink, _rx) = sink();
    let mut connector = BinanceConnector::new(Credentials::default(), RiskLevel::Moderate, sink)
        .with_endpoints(url, "http://127.0.0.1:9");

    assert!(matches!(connector.price(), Err(Error::PriceUnavailable(_))));
    connector.connect(true, "ETHUSDT").await.unwrap();
    assert!(matches!(connector.price(), Err(Error::PriceUnavailable(_))));
    connector.disconnect().await.unwrap();
}

#[tokio::test]
async fn closed_feed_keeps_last_price_and_does_not_reconnect() {
    let (url, server, _) = serve(vec![r#"{"p":"250.5"}"#], true).await;
    let (sink, mut rx) = sink();
    let mut connector = BinanceConnector::new(Credentials::default(), RiskLevel::Moderate, sink)
        .with_endpoints(url, "http://127.0.0.1:9");

    connector.connect(true, "BTCUSDT").await.unwrap();
    server.await.unwrap();

    for _ in 0..200 {
        if connector.feed().map(|f| f.state()) == Some(FeedState::Closed) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(connector.feed().map(|f| f.state()), Some(FeedState::Closed));
    assert_eq!(connector.price().unwrap(), 250.5);
    assert!(logged(&drain(&mut rx), LogLevel::Warning, "Binance WebSocket connection closed."));
}

#[tokio::test]
async fn handshake_timeout_fails_connect() {
    // Accepts TCP but never answers the WebSocket upgrade.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _silent = tokio::spawn(async move {
        let (_tcp, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let (sink, _rx) = sink();
    let mut connector = BinanceConnector::new(Credentials::default(), RiskLevel::Moderate, sink)
        .with_endpoints(format!("ws://{addr}"), "http://127.0.0.1:9")
        .with_connect_timeout(Duration::from_millis(200));

    let err = connector.connect(true, "BTCUSDT").await.unwrap_err();
    assert!(matches!(err, Error::ConnectionTimeout { ref feed, .. } if feed == "Binance"));
    assert!(matches!(connector.price(), Err(Error::PriceUnavailable(_))));
}

#[tokio::test]
async fn live_connect_requires_credentials() {
    let (sink, _rx) = sink();
    let mut connector = BinanceConnector::new(Credentials::default(), RiskLevel::Moderate, sink)
        .with_endpoints("ws://127.0.0.1:9", "http://127.0.0.1:9");
    let err = connector.connect(false, "BTCUSDT").await.unwrap_err();
    assert!(matches!(err, Error::Credentials(_)));

    let (sink, _rx) = self::sink();
    let mut coinbase = CoinbaseConnector::new(binance_creds(), RiskLevel::Moderate, sink)
        .with_endpoints("ws://127.0.0.1:9", "http://127.0.0.1:9");
    let err = coinbase.connect(false, "BTCUSDT").await.unwrap_err();
    assert!(matches!(err, Error::Credentials(_)));
}

#[tokio::test]
async fn paper_order_is_only_logged() {
    let (url, _server, _) = serve(vec![], false).await;
    let (sink, mut rx) = sink();
    let mut connector = BinanceConnector::new(Credentials::default(), RiskLevel::Moderate, sink)
        .with_endpoints(url, "http://127.0.0.1:9");
    connector.connect(true, "BTCUSDT").await.unwrap();

    connector.place_order(Signal::Sell, 43000.0, "BTCUSDT").unwrap();
    assert!(logged(
        &drain(&mut rx),
        LogLevel::Success,
        "[PAPER TRADE] Placed SELL order for BTCUSDT at $43000.00"
    ));
    connector.disconnect().await.unwrap();
}

/// Read one HTTP request head, answer with `body`, return the head.
async fn serve_one_http(listener: TcpListener, body: &'static str) -> String {
    let (mut tcp, _) = listener.accept().await.unwrap();
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = tcp.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    tcp.write_all(response.as_bytes()).await.unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}

#[tokio::test]
async fn live_order_is_signed_and_reported_asynchronously() {
    let (ws_url, _server, _) = serve(vec![], false).await;
    let rest = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let rest_url = format!("http://{}", rest.local_addr().unwrap());
    let http = tokio::spawn(serve_one_http(rest, r#"{"orderId":42,"status":"FILLED"}"#));

    let (sink, mut rx) = sink();
    let mut connector = BinanceConnector::new(binance_creds(), RiskLevel::Aggressive, sink)
        .with_endpoints(ws_url, rest_url);
    connector.connect(false, "BTCUSDT").await.unwrap();

    connector.place_order(Signal::Buy, 43000.0, "BTCUSDT").unwrap();

    let head = tokio::time::timeout(Duration::from_secs(5), http)
        .await
        .unwrap()
        .unwrap();
    assert!(head.starts_with(
        "POST /api/v3/order?symbol=BTCUSDT&side=BUY&type=MARKET&quoteOrderQty=50.0&timestamp="
    ));
    assert!(head.contains("&signature="));
    assert!(head.to_ascii_lowercase().contains("x-mbx-apikey: test-key"));

    let mut reported = false;
    for _ in 0..200 {
        let notifications = drain(&mut rx);
        if logged(&notifications, LogLevel::Success, "Binance order successful") {
            reported = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(reported, "order outcome should reach the sink");
    connector.disconnect().await.unwrap();
}

// ─── Coinbase ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn coinbase_subscribes_and_reads_ticker() {
    let (url, _server, first_frame) = serve(
        vec![
            r#"{"type":"subscriptions","channels":[{"name":"ticker","product_ids":["BTC-USD"]}]}"#,
            r#"{"type":"heartbeat","sequence":10}"#,
            r#"{"type":"ticker","product_id":"BTC-USD","price":"42999.99"}"#,
        ],
        false,
    )
    .await;
    let (sink, mut rx) = sink();
    let mut connector = CoinbaseConnector::new(Credentials::default(), RiskLevel::Moderate, sink)
        .with_endpoints(url, "http://127.0.0.1:9");

    connector.connect(true, "btcusdt").await.unwrap();
    let subscription = tokio::time::timeout(Duration::from_secs(2), first_frame)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        subscription,
        r#"{"type":"subscribe","product_ids":["BTC-USD"],"channels":["ticker"]}"#
    );

    wait_for_price(&mut connector, 42999.99).await;
    assert!(logged(&drain(&mut rx), LogLevel::Info, "Subscribed to Coinbase ticker for BTC-USD"));
    connector.disconnect().await.unwrap();
}
