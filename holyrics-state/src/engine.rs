//! Recurring poller that keeps the state snapshot in sync with the controller
//!
//! The engine is an explicit two-state machine. `start` always replaces the
//! running loop, waiting for it to finish any tick in flight, so at most one
//! loop ever writes the snapshot and ticks are published strictly in order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use holyrics_client::{Command, CommandTransport};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::consumer::StateConsumer;
use crate::error::{Result, StateError};
use crate::extract::{merge_tick, parse_envelope, TickResponses};
use crate::snapshot::StateSnapshot;

/// Commands issued on every tick
const TICK_COMMANDS: [Command; 5] = [
    Command::GetCurrentPresentation { include_slides: true },
    Command::GetAlert,
    Command::GetF8,
    Command::GetF9,
    Command::GetF10,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
}

/// Counters describing the engine's activity so far
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub state: EngineState,
    pub interval: Option<Duration>,
    pub tick_count: u64,
    /// Individual commands that failed or returned unparseable bodies
    pub failed_calls: u64,
    /// Consumer hooks that panicked
    pub consumer_panics: u64,
    pub last_tick_at: Option<SystemTime>,
}

#[derive(Debug, Default)]
struct TickCounters {
    tick_count: u64,
    failed_calls: u64,
    consumer_panics: u64,
    last_tick_at: Option<SystemTime>,
}

/// State shared between the engine handle and its polling loop
struct Shared {
    transport: Arc<dyn CommandTransport>,
    snapshot: watch::Sender<Arc<StateSnapshot>>,
    consumers: RwLock<Vec<Arc<dyn StateConsumer>>>,
    counters: Mutex<TickCounters>,
}

impl Shared {
    /// Run one tick: fan out, merge, swap, notify
    async fn tick(&self) {
        let transport = self.transport.as_ref();
        let [presentation_cmd, alert_cmd, f8_cmd, f9_cmd, f10_cmd] = TICK_COMMANDS;

        let (presentation, alert, f8, f9, f10) = tokio::join!(
            fetch_data(transport, presentation_cmd),
            fetch_data(transport, alert_cmd),
            fetch_data(transport, f8_cmd),
            fetch_data(transport, f9_cmd),
            fetch_data(transport, f10_cmd),
        );

        let mut failures = 0u64;
        let mut settle = |command: Command, outcome: Result<Option<Value>>| match outcome {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    command = command.name(),
                    error = %e,
                    "Command failed, field degraded for this tick"
                );
                failures += 1;
                None
            }
        };

        let responses = TickResponses {
            presentation: settle(presentation_cmd, presentation),
            alert: settle(alert_cmd, alert),
            f8: settle(f8_cmd, f8),
            f9: settle(f9_cmd, f9),
            f10: settle(f10_cmd, f10),
        };

        let previous = self.snapshot.borrow().clone();
        let merged = merge_tick(&previous, &responses);
        let snapshot = Arc::new(merged.snapshot);
        self.snapshot.send_replace(Arc::clone(&snapshot));

        {
            let mut counters = self.counters.lock();
            counters.tick_count += 1;
            counters.failed_calls += failures;
            counters.last_tick_at = Some(SystemTime::now());
        }

        if !merged.changed.is_empty() {
            debug!(changed = ?merged.changed, "Snapshot changed");
        }

        let consumers = self.consumers.read().clone();
        let mut panics = 0u64;
        for consumer in consumers {
            if !guarded("publish_variables", || consumer.publish_variables(&snapshot)) {
                panics += 1;
            }
            if !guarded("check_feedbacks", || {
                consumer.check_feedbacks(&snapshot, &merged.changed)
            }) {
                panics += 1;
            }
        }

        if panics > 0 {
            self.counters.lock().consumer_panics += panics;
        }
    }
}

/// Run a consumer hook, containing a panic so the loop keeps ticking
fn guarded(hook: &'static str, call: impl FnOnce()) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(()) => true,
        Err(payload) => {
            warn!(hook, panic = panic_message(payload.as_ref()), "Consumer hook panicked");
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Send one command and pull `data` out of its response
async fn fetch_data(transport: &dyn CommandTransport, command: Command) -> Result<Option<Value>> {
    let body = transport.execute(command).await?;
    Ok(parse_envelope(&body)?.data)
}

/// Handle to a spawned polling loop
struct PollingTask {
    interval: Duration,
    handle: JoinHandle<()>,
    shutdown: oneshot::Sender<()>,
}

impl PollingTask {
    fn start(shared: Arc<Shared>, interval: Duration) -> Self {
        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(Self::polling_loop(shared, interval, shutdown_rx));

        Self {
            interval,
            handle,
            shutdown,
        }
    }

    fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }

    /// First tick fires one interval after start; a slow tick delays the
    /// next one rather than bursting to catch up
    async fn polling_loop(
        shared: Arc<Shared>,
        interval: Duration,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                // Fires on an explicit stop and when the handle is dropped
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            shared.tick().await;
        }

        debug!("Polling loop exited");
    }

    /// Signal the loop and wait for it, letting a tick in flight finish
    async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.handle
            .await
            .map_err(|e| StateError::Engine(format!("Failed to await polling task: {}", e)))
    }
}

/// Owns the state snapshot and the single polling loop that refreshes it
pub struct PollingEngine {
    shared: Arc<Shared>,
    task: Mutex<Option<PollingTask>>,
    /// Serialises `start` and `stop` across their awaits
    transition: tokio::sync::Mutex<()>,
}

impl PollingEngine {
    pub fn new(transport: Arc<dyn CommandTransport>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(StateSnapshot::default()));

        Self {
            shared: Arc::new(Shared {
                transport,
                snapshot,
                consumers: RwLock::new(Vec::new()),
                counters: Mutex::new(TickCounters::default()),
            }),
            task: Mutex::new(None),
            transition: tokio::sync::Mutex::new(()),
        }
    }

    /// Start polling every `interval`, replacing any loop already running
    ///
    /// A previous loop that died is logged and replaced rather than
    /// failing the restart.
    pub async fn start(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(StateError::Configuration(
                "Poll interval must be greater than 0".to_string(),
            ));
        }

        let _transition = self.transition.lock().await;
        let previous = self.task.lock().take();
        if let Some(previous) = previous {
            debug!(interval = ?previous.interval, "Replacing running polling loop");
            if let Err(e) = previous.shutdown().await {
                warn!(error = %e, "Previous polling loop ended abnormally");
            }
        }

        *self.task.lock() = Some(PollingTask::start(Arc::clone(&self.shared), interval));
        info!(interval = ?interval, "Polling engine running");

        Ok(())
    }

    /// Stop polling; a no-op when already stopped
    pub async fn stop(&self) -> Result<()> {
        let _transition = self.transition.lock().await;
        let previous = self.task.lock().take();

        if let Some(previous) = previous {
            previous.shutdown().await?;
            info!("Polling engine stopped");
        }

        Ok(())
    }

    /// `Running` only while a polling loop is alive
    pub fn state(&self) -> EngineState {
        match self.task.lock().as_ref() {
            Some(task) if task.is_alive() => EngineState::Running,
            _ => EngineState::Stopped,
        }
    }

    /// The most recently published snapshot
    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        self.shared.snapshot.borrow().clone()
    }

    /// Receiver that observes every snapshot swap
    pub fn subscribe(&self) -> watch::Receiver<Arc<StateSnapshot>> {
        self.shared.snapshot.subscribe()
    }

    pub fn add_consumer(&self, consumer: Arc<dyn StateConsumer>) {
        self.shared.consumers.write().push(consumer);
    }

    pub(crate) fn consumers(&self) -> Vec<Arc<dyn StateConsumer>> {
        self.shared.consumers.read().clone()
    }

    pub fn stats(&self) -> EngineStats {
        let interval = self.task.lock().as_ref().map(|task| task.interval);
        let counters = self.shared.counters.lock();

        EngineStats {
            state: self.state(),
            interval,
            tick_count: counters.tick_count,
            failed_calls: counters.failed_calls,
            consumer_panics: counters.consumer_panics,
            last_tick_at: counters.last_tick_at,
        }
    }
}

impl std::fmt::Debug for PollingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingEngine")
            .field("state", &self.state())
            .finish()
    }
}
