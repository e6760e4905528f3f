use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{error, info, Instrument};
use uuid::Uuid;

use common::{BotConfig, Connector, Error, LogLevel, Notification, NotificationSink, Result};
use strategy::{SignalGenerator, StrategyRegistry};

use crate::connector_from_config;
use crate::feed::DEFAULT_CONNECT_TIMEOUT;
use crate::state::{BotSnapshot, BotState};
use crate::stats::TradeStats;

struct RunHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<BotState>,
}

/// The bot engine: `Idle → Running → Idle`.
///
/// While idle the bot holds its `BotState`; `start` moves it into the tick
/// loop task and `stop` takes it back. Only one run can be active.
pub struct Bot {
    sink: Arc<dyn NotificationSink>,
    registry: StrategyRegistry,
    connect_timeout: Duration,
    idle: Option<BotState>,
    run: Option<RunHandle>,
    snapshots: Arc<watch::Sender<BotSnapshot>>,
}

impl Bot {
    pub fn new(sink: Arc<dyn NotificationSink>, registry: StrategyRegistry) -> Self {
        Self::with_state(sink, registry, BotState::default())
    }

    /// A bot whose simulated trade outcomes come from `stats`.
    pub fn with_trade_stats(
        sink: Arc<dyn NotificationSink>,
        registry: StrategyRegistry,
        stats: TradeStats,
    ) -> Self {
        Self::with_state(sink, registry, BotState::new(stats))
    }

    fn with_state(
        sink: Arc<dyn NotificationSink>,
        registry: StrategyRegistry,
        state: BotState,
    ) -> Self {
        let (snapshots, _) = watch::channel(state.snapshot(false));
        Self {
            sink,
            registry,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            idle: Some(state),
            run: None,
            snapshots: Arc::new(snapshots),
        }
    }

    /// Handshake timeout for live connectors built by `start`.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> BotSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receive a snapshot after every tick and state change.
    pub fn subscribe(&self) -> watch::Receiver<BotSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn registry_mut(&mut self) -> &mut StrategyRegistry {
        &mut self.registry
    }

    /// Validate `config`, build and connect its connector, and launch the
    /// tick loop. Does nothing if a run is already active.
    pub async fn start(&mut self, config: BotConfig) -> Result<()> {
        if self.warn_if_running() {
            return Ok(());
        }
        let generator = self.prepare(&config)?;
        let connector = connector_from_config(&config, self.sink.clone(), self.connect_timeout)
            .map_err(|e| self.report("Failed to initialize connector", e))?;
        self.launch(config, generator, connector).await
    }

    /// Like `start`, with a caller-supplied connector.
    pub async fn start_with_connector(
        &mut self,
        config: BotConfig,
        connector: Box<dyn Connector>,
    ) -> Result<()> {
        if self.warn_if_running() {
            return Ok(());
        }
        let generator = self.prepare(&config)?;
        self.launch(config, generator, connector).await
    }

    /// Stop the tick loop and disconnect the connector. Warns if idle.
    pub async fn stop(&mut self) {
        let Some(run) = self.run.take() else {
            self.sink.log(LogLevel::Warning, "Bot is not running.");
            return;
        };

        let _ = run.stop.send(());
        let mut state = match run.task.await {
            Ok(state) => state,
            Err(e) => {
                let lost = self.snapshot();
                error!(
                    error = %e,
                    trade_count = lost.trade_count,
                    history_len = lost.history_len,
                    "Tick loop task failed, bot state lost"
                );
                self.sink.log(
                    LogLevel::Error,
                    &format!(
                        "Bot loop terminated abnormally: {e}. Price history ({} prices) and \
                         trade counters ({} trades) were reset.",
                        lost.history_len, lost.trade_count
                    ),
                );
                BotState::default()
            }
        };

        if let Some(mut connector) = state.end_run() {
            if let Err(e) = connector.disconnect().await {
                self.sink
                    .log(LogLevel::Error, &format!("Failed to disconnect: {e}"));
            }
        }

        self.snapshots.send_replace(state.snapshot(false));
        self.idle = Some(state);
        self.sink.notify(Notification::Status("STOPPED".into()));
        self.sink.log(LogLevel::Info, "Bot stopped by user.");
    }

    fn warn_if_running(&self) -> bool {
        if self.is_running() {
            self.sink.log(LogLevel::Warning, "Bot is already running.");
        }
        self.is_running()
    }

    fn prepare(&self, config: &BotConfig) -> Result<Box<dyn SignalGenerator>> {
        config
            .validate()
            .map_err(|e| self.report("Invalid configuration", e))?;
        self.registry
            .build(&config.strategy, &config.strategy_params)
            .map_err(|e| self.report("Failed to initialize strategy", e))
    }

    fn report(&self, context: &str, e: Error) -> Error {
        self.sink.log(LogLevel::Error, &format!("{context}: {e}"));
        e
    }

    async fn launch(
        &mut self,
        config: BotConfig,
        generator: Box<dyn SignalGenerator>,
        mut connector: Box<dyn Connector>,
    ) -> Result<()> {
        if let Err(e) = connector.connect(config.paper_trading, &config.symbol).await {
            let _ = connector.disconnect().await;
            return Err(self.report("Failed to connect", e));
        }

        let interval = config.tick_interval();
        let symbol = config.symbol.clone();
        let mut state = self.idle.take().unwrap_or_default();
        state.begin_run(config, connector, generator);

        self.sink
            .notify(Notification::Status(format!("RUNNING - {symbol}")));
        self.sink.log(LogLevel::Success, "Bot started successfully.");
        self.sink
            .notify(Notification::Performance(state.performance()));
        self.snapshots.send_replace(state.snapshot(true));

        let run_id = Uuid::new_v4();
        info!(%run_id, %symbol, ?interval, "Tick loop starting");

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(
            run_loop(
                state,
                interval,
                stop_rx,
                self.sink.clone(),
                self.snapshots.clone(),
            )
            .instrument(tracing::info_span!("bot_run", %run_id, %symbol)),
        );
        self.run = Some(RunHandle {
            stop: stop_tx,
            task,
        });
        Ok(())
    }
}

impl Drop for Bot {
    fn drop(&mut self) {
        if let Some(run) = self.run.take() {
            run.task.abort();
        }
    }
}

/// Tick every `interval` until `stop` fires, then hand the state back.
/// The first tick comes one interval after start.
async fn run_loop(
    mut state: BotState,
    interval: Duration,
    mut stop: oneshot::Receiver<()>,
    sink: Arc<dyn NotificationSink>,
    snapshots: Arc<watch::Sender<BotSnapshot>>,
) -> BotState {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            _ = ticker.tick() => {
                state.tick(sink.as_ref());
                snapshots.send_replace(state.snapshot(true));
            }
        }
    }

    sink.log(LogLevel::Info, "Bot loop stopped.");
    state
}
