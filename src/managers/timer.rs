use crate::backends::traits::RemoteStore;
use crate::clock::Clock;
use crate::display::format_elapsed;
use crate::error::{Error, Result};
use crate::store::models::{NewTimeEntry, TimerSession, TimerStatus};
use crate::store::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

pub const TIMER_STORAGE_KEY: &str = "devlogify.timer";

#[derive(Debug, Clone, Serialize)]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    pub elapsed_seconds: i64,
    pub display: String,
    pub session: TimerSession,
}

/// Display refresh published by the tick task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerTick {
    pub elapsed_seconds: i64,
    pub display: String,
}

impl TimerTick {
    fn new(elapsed_seconds: i64) -> Self {
        Self {
            elapsed_seconds,
            display: format_elapsed(elapsed_seconds),
        }
    }
}

/// Owns the single work session: state machine, persistence and the display
/// tick. Dropping the engine aborts the tick.
pub struct TimerEngine {
    state: Arc<Mutex<TimerSession>>,
    storage: Arc<dyn KeyValueStore>,
    remote: Option<Arc<dyn RemoteStore>>,
    clock: Arc<dyn Clock>,
    ticker: std::sync::Mutex<Option<JoinHandle<()>>>,
    ticks: Arc<watch::Sender<TimerTick>>,
    tick_interval: Duration,
}

impl TimerEngine {
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, tick_interval: Duration) -> Self {
        let (ticks, _rx) = watch::channel(TimerTick::new(0));
        Self {
            state: Arc::new(Mutex::new(TimerSession::default())),
            storage,
            remote: None,
            clock,
            ticker: std::sync::Mutex::new(None),
            ticks: Arc::new(ticks),
            tick_interval,
        }
    }

    /// Remote the finished session is committed to
    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Rehydrate once per process start. Missing or malformed state means Idle.
    #[instrument(skip(self))]
    pub async fn load_from_storage(&self) -> TimerStatus {
        let session = match self.storage.get(TIMER_STORAGE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<TimerSession>(&raw) {
                Ok(session) if session.is_consistent() => session,
                Ok(_) => {
                    warn!("Persisted timer is running without an anchor, treating as idle");
                    TimerSession::default()
                }
                Err(e) => {
                    warn!(error = %e, "Persisted timer state is malformed, treating as idle");
                    TimerSession::default()
                }
            },
            Ok(None) => TimerSession::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read timer state, treating as idle");
                TimerSession::default()
            }
        };

        let status = session.status();
        let elapsed = session.elapsed_seconds(self.now_secs());
        *self.state.lock().await = session;

        debug!(status = status.as_str(), elapsed, "Timer loaded");
        self.ticks.send_replace(TimerTick::new(elapsed));
        if status == TimerStatus::Running {
            self.spawn_ticker();
        }
        status
    }

    #[instrument(skip(self))]
    pub async fn start(&self, task_id: Option<String>, task_title: Option<String>) -> Result<TimerSnapshot> {
        let session = {
            let mut state = self.state.lock().await;
            if state.status() != TimerStatus::Idle {
                return Err(Error::TimerAlreadyActive);
            }
            state.begin(self.now_secs(), task_id, task_title);
            state.clone()
        };

        self.persist(&session).await;
        self.spawn_ticker();

        info!(task = ?session.task_id, "Timer started");
        Ok(self.snapshot_of(session))
    }

    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<TimerSnapshot> {
        self.cancel_ticker();

        let session = {
            let mut state = self.state.lock().await;
            if state.status() != TimerStatus::Running {
                return Err(Error::TimerNotRunning);
            }
            state.pause(self.now_secs());
            state.clone()
        };

        self.persist(&session).await;
        self.ticks.send_replace(TimerTick::new(session.accumulated_seconds));

        info!(elapsed = session.accumulated_seconds, "Timer paused");
        Ok(self.snapshot_of(session))
    }

    #[instrument(skip(self))]
    pub async fn resume(&self) -> Result<TimerSnapshot> {
        let session = {
            let mut state = self.state.lock().await;
            if state.status() != TimerStatus::Paused {
                return Err(Error::TimerNotPaused);
            }
            state.resume(self.now_secs());
            state.clone()
        };

        self.persist(&session).await;
        self.spawn_ticker();

        info!("Timer resumed");
        Ok(self.snapshot_of(session))
    }

    /// Commit the session as a whole-minute time entry. On failure the session
    /// stays live so a retry commits the full elapsed time.
    #[instrument(skip(self))]
    pub async fn stop(&self, user_id: &str) -> Result<NewTimeEntry> {
        // The tick must not fire between computing the duration and resetting
        self.cancel_ticker();

        let (session, entry) = {
            let state = self.state.lock().await;
            if state.status() == TimerStatus::Idle {
                return Err(Error::NoActiveTimer);
            }

            let now = self.clock.now();
            let elapsed = state.elapsed_seconds(now.timestamp());
            let anchor = state
                .session_started_at_epoch_seconds
                .or(state.started_at_epoch_seconds);
            let started_at = anchor
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                .unwrap_or(now);

            let entry = NewTimeEntry {
                user_id: user_id.to_string(),
                task_id: state.task_id.clone(),
                duration_minutes: elapsed / 60,
                started_at,
                ended_at: now,
            };
            (state.clone(), entry)
        };

        let committed = match &self.remote {
            Some(remote) => remote.insert_time_entry(&entry).await,
            None => Err(Error::RemoteNotConfigured),
        };

        if let Err(e) = committed {
            warn!(error = %e, "Failed to commit time entry, session kept");
            if session.status() == TimerStatus::Running {
                self.spawn_ticker();
            }
            return Err(e);
        }

        let mut state = self.state.lock().await;
        // A session started while the write was in flight is not ours to clear
        if state.session_started_at_epoch_seconds == session.session_started_at_epoch_seconds {
            state.reset();
            self.clear_storage().await;
            self.ticks.send_replace(TimerTick::new(0));
        } else {
            debug!("A newer session is active, leaving its state in place");
        }
        drop(state);

        info!(minutes = entry.duration_minutes, task = ?entry.task_id, "Time entry committed");
        Ok(entry)
    }

    /// Reset to Idle without committing anything
    #[instrument(skip(self))]
    pub async fn discard(&self) {
        self.cancel_ticker();
        self.state.lock().await.reset();
        self.clear_storage().await;
        self.ticks.send_replace(TimerTick::new(0));
        info!("Timer discarded");
    }

    pub async fn status(&self) -> TimerStatus {
        self.state.lock().await.status()
    }

    pub async fn elapsed_seconds(&self) -> i64 {
        let now = self.now_secs();
        self.state.lock().await.elapsed_seconds(now)
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        let session = self.state.lock().await.clone();
        self.snapshot_of(session)
    }

    /// Observe display ticks. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<TimerTick> {
        self.ticks.subscribe()
    }

    /// Stop the display tick; persisted state is untouched
    pub fn shutdown(&self) {
        self.cancel_ticker();
    }

    fn snapshot_of(&self, session: TimerSession) -> TimerSnapshot {
        let elapsed = session.elapsed_seconds(self.now_secs());
        TimerSnapshot {
            status: session.status(),
            elapsed_seconds: elapsed,
            display: format_elapsed(elapsed),
            session,
        }
    }

    fn now_secs(&self) -> i64 {
        self.clock.now().timestamp()
    }

    async fn persist(&self, session: &TimerSession) {
        let raw = match serde_json::to_string(session) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize timer state");
                return;
            }
        };

        if let Err(e) = self.storage.set(TIMER_STORAGE_KEY, &raw).await {
            warn!(error = %e, "Failed to persist timer state");
        }
    }

    async fn clear_storage(&self) {
        if let Err(e) = self.storage.remove(TIMER_STORAGE_KEY).await {
            warn!(error = %e, "Failed to clear persisted timer state");
        }
    }

    fn spawn_ticker(&self) {
        let mut ticker = self.ticker.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(handle) = ticker.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let clock = self.clock.clone();
        let ticks = self.ticks.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_interval);
            loop {
                interval.tick().await;

                let elapsed = {
                    let guard = state.lock().await;
                    if guard.status() != TimerStatus::Running {
                        break;
                    }
                    guard.elapsed_seconds(clock.now().timestamp())
                };

                ticks.send_replace(TimerTick::new(elapsed));
            }
        });

        *ticker = Some(handle);
    }

    fn cancel_ticker(&self) {
        let mut ticker = self.ticker.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(handle) = ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}
