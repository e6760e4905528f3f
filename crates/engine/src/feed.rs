use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use common::{Error, LogLevel, NotificationSink, Result};

/// How long `connect` waits for the stream handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Most recent price seen on a live stream.
///
/// Written only by the stream reader task, read by the tick loop.
#[derive(Debug, Clone, Default)]
pub struct LatestPrice(Arc<Mutex<Option<f64>>>);

impl LatestPrice {
    pub fn set(&self, price: f64) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = Some(price);
    }

    pub fn get(&self) -> Option<f64> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Disconnected,
    Connecting,
    Subscribed,
    Closed,
    Errored,
}

/// What to open and how to read prices from it.
pub struct FeedSpec {
    /// Exchange name used in log lines.
    pub exchange: &'static str,
    pub url: String,
    /// Sent once right after the handshake.
    pub subscribe: Option<String>,
    /// Extracts a price from a text frame; `None` for anything else.
    pub parse: fn(&str) -> Option<f64>,
}

/// A connected price stream with its reader task.
///
/// There is no reconnect: once the stream closes or errors the feed stays
/// dead and `latest` keeps its last value.
pub struct LiveFeed {
    exchange: &'static str,
    latest: LatestPrice,
    state: watch::Receiver<FeedState>,
    shutdown: Option<oneshot::Sender<()>>,
    reader: Option<JoinHandle<()>>,
    sink: Arc<dyn NotificationSink>,
}

impl LiveFeed {
    /// Open the stream, send the subscription if any and start the reader.
    ///
    /// Fails with `Error::ConnectionTimeout` if the handshake and the
    /// subscription have not both completed within `timeout`.
    pub async fn connect(
        spec: FeedSpec,
        timeout: Duration,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let FeedSpec {
            exchange,
            url,
            subscribe,
            parse,
        } = spec;

        let url = Url::parse(&url).map_err(|e| Error::WebSocket(format!("{url}: {e}")))?;
        let (state_tx, state) = watch::channel(FeedState::Connecting);

        sink.log(
            LogLevel::Info,
            &format!("Connecting to {exchange} WebSocket: {url}"),
        );
        let open = async {
            let (ws, _) = connect_async(url.as_str())
                .await
                .map_err(|e| Error::WebSocket(e.to_string()))?;
            sink.log(
                LogLevel::Success,
                &format!("{exchange} WebSocket connection established."),
            );
            let (mut write, read) = ws.split();
            if let Some(message) = subscribe {
                write
                    .send(Message::Text(message))
                    .await
                    .map_err(|e| Error::WebSocket(e.to_string()))?;
            }
            Ok::<_, Error>((write, read))
        };
        let (mut write, mut read) = within(timeout, exchange, open).await?;
        let _ = state_tx.send(FeedState::Subscribed);
        info!(exchange, "Price stream subscribed");

        let latest = LatestPrice::default();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let cell = latest.clone();
        let reader_sink = sink.clone();

        let reader = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        let _ = write.close().await;
                        let _ = state_tx.send(FeedState::Closed);
                        break;
                    }
                    frame = read.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(price) = parse(&text) {
                                cell.set(price);
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            reader_sink.log(
                                LogLevel::Warning,
                                &format!("{exchange} WebSocket connection closed."),
                            );
                            let _ = state_tx.send(FeedState::Closed);
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            debug!(exchange, error = %e, "Stream read failed");
                            reader_sink.log(
                                LogLevel::Error,
                                &format!("{exchange} WebSocket error."),
                            );
                            let _ = state_tx.send(FeedState::Errored);
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self {
            exchange,
            latest,
            state,
            shutdown: Some(shutdown_tx),
            reader: Some(reader),
            sink,
        })
    }

    pub fn latest(&self) -> &LatestPrice {
        &self.latest
    }

    pub fn state(&self) -> FeedState {
        *self.state.borrow()
    }

    /// Latest price, or `Error::PriceUnavailable` before the first one.
    pub fn price(&self) -> Result<f64> {
        self.latest
            .get()
            .ok_or_else(|| Error::PriceUnavailable(format!("{} WebSocket", self.exchange)))
    }

    /// Close the stream and wait briefly for the reader to finish.
    pub async fn close(&mut self) {
        let Some(shutdown) = self.shutdown.take() else {
            return;
        };
        self.sink.log(
            LogLevel::Info,
            &format!("Closing {} WebSocket connection.", self.exchange),
        );
        let _ = shutdown.send(());
        if let Some(mut reader) = self.reader.take() {
            if tokio::time::timeout(CLOSE_GRACE, &mut reader).await.is_err() {
                warn!(exchange = self.exchange, "Stream reader did not stop in time");
                reader.abort();
            }
        }
    }
}

/// Run `fut` under the connect timeout of `exchange`'s feed.
async fn within<T>(
    timeout: Duration,
    exchange: &str,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| Error::ConnectionTimeout {
            feed: exchange.to_string(),
            after: timeout,
        })?
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}
