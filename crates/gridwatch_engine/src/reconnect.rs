//! Backoff reconnector: owns the one streaming connection and drives the
//! pure link state machine from `gridwatch_core`.
//!
//! All socket work happens on a single driver task. The public
//! [`Reconnector`] handle only sends commands to it, so `start`/`stop` never
//! block and never fail; transport errors surface solely as `false` on the
//! connection-status topic.

use std::future::{self, Future};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use gridwatch_core::{update, Effect, LinkState, LinkView, Msg, ReconnectPolicy};
use gridwatch_logging::{gw_debug, gw_info, gw_warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};
use tokio_util::sync::CancellationToken;

use crate::broadcast::Topic;
use crate::demux::Demultiplexer;
use crate::transport::{Connector, FrameStream, TransportError};

#[derive(Debug, Clone)]
pub struct ReconnectSettings {
    pub url: String,
    pub policy: ReconnectPolicy,
    pub connect_timeout: Duration,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/ws/energy-data".to_string(),
            policy: ReconnectPolicy::default(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

pub struct Reconnector {
    commands: mpsc::UnboundedSender<Msg>,
    view: watch::Receiver<LinkView>,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Reconnector {
    /// Spawns the driver task; must be called inside a tokio runtime.
    /// The link stays idle until [`Reconnector::start`].
    pub fn spawn(
        settings: ReconnectSettings,
        connector: Arc<dyn Connector>,
        demux: Demultiplexer,
        status: Topic<bool>,
    ) -> Self {
        let state = LinkState::new(settings.policy);
        let (view_tx, view) = watch::channel(state.view());
        let (commands, command_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let driver = LinkDriver {
            state,
            url: settings.url,
            connect_timeout: settings.connect_timeout,
            connector,
            demux,
            status,
            view_tx,
            pending: None,
            stream: None,
            retry_at: None,
        };
        let task = tokio::spawn(driver.run(command_rx, shutdown.clone()));

        Self {
            commands,
            view,
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn start(&self) {
        self.send(Msg::Start);
    }

    /// Closes the connection and cancels any pending retry. Idempotent.
    pub fn stop(&self) {
        self.send(Msg::Stop);
    }

    pub fn view(&self) -> LinkView {
        *self.view.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<LinkView> {
        self.view.clone()
    }

    /// Stops the link and waits for the driver task to exit.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                gw_warn!("Link driver ended abnormally: {}", err);
            }
        }
    }

    fn send(&self, msg: Msg) {
        if self.commands.send(msg).is_err() {
            gw_debug!("Link driver already stopped; ignoring {:?}", msg);
        }
    }
}

impl Drop for Reconnector {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

type PendingConnect =
    Pin<Box<dyn Future<Output = Result<Box<dyn FrameStream>, TransportError>> + Send>>;

struct LinkDriver {
    state: LinkState,
    url: String,
    connect_timeout: Duration,
    connector: Arc<dyn Connector>,
    demux: Demultiplexer,
    status: Topic<bool>,
    view_tx: watch::Sender<LinkView>,
    pending: Option<PendingConnect>,
    stream: Option<Box<dyn FrameStream>>,
    retry_at: Option<Instant>,
}

impl LinkDriver {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Msg>, shutdown: CancellationToken) {
        loop {
            let msg = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                command = commands.recv() => match command {
                    Some(msg) => msg,
                    None => break,
                },
                _ = wait_until(self.retry_at), if self.retry_at.is_some() => {
                    self.retry_at = None;
                    Msg::RetryElapsed
                }
                outcome = poll_pending(&mut self.pending), if self.pending.is_some() => {
                    self.pending = None;
                    match outcome {
                        Ok(stream) => {
                            gw_info!("Connected to {}", self.url);
                            self.stream = Some(stream);
                            Msg::Opened
                        }
                        Err(err) => {
                            gw_warn!("Connection attempt to {} failed: {}", self.url, err);
                            Msg::Closed
                        }
                    }
                }
                frame = next_frame(&mut self.stream), if self.stream.is_some() => match frame {
                    Some(Ok(text)) => {
                        self.demux.route(&text);
                        continue;
                    }
                    Some(Err(err)) => {
                        gw_warn!("Stream error: {}", err);
                        self.stream = None;
                        Msg::Closed
                    }
                    None => {
                        gw_info!("Stream from {} ended", self.url);
                        self.stream = None;
                        Msg::Closed
                    }
                },
            };
            self.apply(msg).await;
        }

        self.apply(Msg::Stop).await;
        gw_debug!("Link driver for {} exited", self.url);
    }

    async fn apply(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let changed = state.consume_dirty();
        self.state = state;

        for effect in effects {
            self.execute(effect).await;
        }
        if changed {
            self.view_tx.send_replace(self.state.view());
        }
    }

    async fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::OpenConnection => {
                gw_info!("Connecting to {}", self.url);
                self.pending = Some(self.open());
            }
            Effect::CloseConnection => {
                self.pending = None;
                if let Some(mut stream) = self.stream.take() {
                    stream.close().await;
                }
            }
            Effect::ScheduleRetry { attempt, delay } => {
                gw_info!(
                    "Reconnecting in {:?} (attempt {}/{})",
                    delay,
                    attempt,
                    self.state.policy().max_attempts
                );
                self.retry_at = Some(Instant::now() + delay);
            }
            Effect::CancelRetry => self.retry_at = None,
            Effect::PublishStatus(connected) => {
                if !connected && self.state.exhausted() {
                    gw_warn!(
                        "Giving up on {} after {} reconnect attempts",
                        self.url,
                        self.state.policy().max_attempts
                    );
                }
                self.status.publish(connected);
            }
        }
    }

    fn open(&self) -> PendingConnect {
        let connector = Arc::clone(&self.connector);
        let url = self.url.clone();
        let limit = self.connect_timeout;
        Box::pin(async move {
            match timeout(limit, connector.connect(&url)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::ConnectTimeout(limit)),
            }
        })
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}

async fn poll_pending(
    pending: &mut Option<PendingConnect>,
) -> Result<Box<dyn FrameStream>, TransportError> {
    match pending {
        Some(connect) => connect.await,
        None => future::pending().await,
    }
}

async fn next_frame(
    stream: &mut Option<Box<dyn FrameStream>>,
) -> Option<Result<String, TransportError>> {
    match stream {
        Some(stream) => stream.next_frame().await,
        None => future::pending().await,
    }
}
