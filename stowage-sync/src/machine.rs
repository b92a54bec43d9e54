//! Sync state machine and scheduling.
//!
//! States: `Idle → Syncing → {Success, Error} → Idle`. Passes start from a
//! manual request or from the periodic timer; whichever takes the in-flight
//! guard first runs, the other is rejected (manual) or skipped (automatic).

use crate::cloud::{AccountStatus, RemoteChangeSource};
use crate::config::SyncConfig;
use crate::engine::{PassReport, ReconciliationEngine};
use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use stowage_storage::EntityStore;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// User-visible sync status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    Idle,
    Syncing,
    Success,
    Error(String),
}

impl SyncStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, SyncStatus::Success | SyncStatus::Error(_))
    }
}

/// What observers of the state machine see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    pub status: SyncStatus,
    pub last_sync: Option<DateTime<Utc>>,
}

/// Holds the in-flight flag for the lifetime of one pass.
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Inner<S: EntityStore> {
    engine: Mutex<ReconciliationEngine<S>>,
    config: SyncConfig,
    source: Arc<dyn RemoteChangeSource>,
    state_tx: watch::Sender<SyncSnapshot>,
    in_flight: AtomicBool,
    account_available: AtomicBool,
    /// Bumped on every transition; a pending reset to idle only fires if
    /// nothing happened in between.
    generation: AtomicU64,
    /// When the current terminal status is due to fall back to idle.
    reset_deadline: std::sync::Mutex<Option<Instant>>,
    timer: Mutex<Option<Timer>>,
}

/// A running periodic timer and the signal that stops it.
struct Timer {
    handle: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

/// Arbitrates manual and automatic passes and publishes the sync status.
///
/// Cloning yields another handle to the same machine.
pub struct SyncStateMachine<S: EntityStore> {
    inner: Arc<Inner<S>>,
}

impl<S: EntityStore> Clone for SyncStateMachine<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: EntityStore + 'static> SyncStateMachine<S> {
    /// Wraps an engine. The account starts out unavailable until told
    /// otherwise or refreshed.
    pub fn new(engine: ReconciliationEngine<S>) -> Self {
        let (state_tx, _) = watch::channel(SyncSnapshot {
            status: SyncStatus::Idle,
            last_sync: None,
        });
        let config = engine.config().clone();
        let source = Arc::clone(engine.source());
        Self {
            inner: Arc::new(Inner {
                engine: Mutex::new(engine),
                config,
                source,
                state_tx,
                in_flight: AtomicBool::new(false),
                account_available: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                reset_deadline: std::sync::Mutex::new(None),
                timer: Mutex::new(None),
            }),
        }
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.inner.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.inner.state_tx.borrow().clone()
    }

    pub fn status(&self) -> SyncStatus {
        self.inner.state_tx.borrow().status.clone()
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.inner.state_tx.borrow().last_sync
    }

    pub fn is_syncing(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Runs `f` against the engine once no pass holds it.
    pub async fn with_engine<R>(&self, f: impl FnOnce(&mut ReconciliationEngine<S>) -> R) -> R {
        let mut engine = self.inner.engine.lock().await;
        f(&mut *engine)
    }

    /// Replaces the engine's local store, returning the previous one.
    pub async fn rebind_store(&self, store: S) -> S {
        self.inner.engine.lock().await.rebind_store(store)
    }

    // ── Account ──────────────────────────────────────────────────

    pub fn is_account_available(&self) -> bool {
        self.inner.account_available.load(Ordering::Acquire)
    }

    /// Records an account change (signed in, signed out, switched).
    pub fn set_account_status(&self, status: AccountStatus) {
        let available = status.is_available();
        let was = self.inner.account_available.swap(available, Ordering::AcqRel);
        if was != available {
            info!("Cloud account status changed: {:?}", status);
        }
    }

    /// Asks the change source for the account status and records it.
    pub async fn refresh_account_status(&self) -> AccountStatus {
        let status = match self.inner.source.account_status().await {
            Ok(status) => status,
            Err(e) => {
                warn!("Failed to query account status: {}", e);
                AccountStatus::Unknown
            }
        };
        self.set_account_status(status);
        status
    }

    // ── Passes ───────────────────────────────────────────────────

    /// Runs a pass on the user's request.
    ///
    /// Rejected with `AccountUnavailable` when the account is unavailable;
    /// the status shows the error unless a running pass owns it. Rejected
    /// with `PassInProgress` (status untouched) when another pass is running.
    pub async fn manual_sync(&self) -> SyncResult<PassReport> {
        if !self.is_account_available() {
            warn!("Manual sync rejected: account unavailable");
            match PassGuard::acquire(&self.inner.in_flight) {
                Some(_guard) => {
                    let message = self.inner.config.account_unavailable_message.clone();
                    self.finish(SyncStatus::Error(message), None);
                }
                None => debug!("A pass is running; leaving its status alone"),
            }
            return Err(SyncError::AccountUnavailable);
        }

        let Some(_guard) = PassGuard::acquire(&self.inner.in_flight) else {
            debug!("Manual sync rejected: a pass is already running");
            return Err(SyncError::PassInProgress);
        };

        self.transition(SyncStatus::Syncing, None);
        let result = self.inner.engine.lock().await.run_pass().await;
        match result {
            Ok(report) => {
                self.finish(SyncStatus::Success, Some(Utc::now()));
                Ok(report)
            }
            Err(e) => {
                warn!("Manual sync failed: {}", e);
                self.finish(SyncStatus::Error(e.to_string()), None);
                Err(e)
            }
        }
    }

    /// Runs a pass on behalf of the timer.
    ///
    /// Skipped when the account is unavailable or a pass is running. A
    /// failure is only logged and the previous status is put back.
    pub async fn auto_sync(&self) -> Option<PassReport> {
        if !self.is_account_available() {
            debug!("Automatic sync skipped: account unavailable");
            return None;
        }
        let Some(_guard) = PassGuard::acquire(&self.inner.in_flight) else {
            debug!("Automatic sync skipped: a pass is already running");
            return None;
        };

        let previous = self.snapshot();
        self.transition(SyncStatus::Syncing, None);
        let result = self.inner.engine.lock().await.run_pass().await;
        match result {
            Ok(report) => {
                self.finish(SyncStatus::Success, Some(Utc::now()));
                Some(report)
            }
            Err(e) => {
                warn!("Automatic sync failed: {}", e);
                self.restore(previous.status);
                None
            }
        }
    }

    // ── Scheduling ───────────────────────────────────────────────

    /// Starts the periodic timer. No-op if it is already running.
    pub async fn start_auto_sync(&self) {
        let mut timer = self.inner.timer.lock().await;
        if timer.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return;
        }

        let period = self.inner.config.auto_sync_interval();
        let weak = Arc::downgrade(&self.inner);
        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_timer(weak, period, stop_rx));
        *timer = Some(Timer { handle, stop });
        info!("Automatic sync every {:?}", period);
    }

    /// Stops the periodic timer. A pass it already started runs to
    /// completion; no further pass is started.
    pub async fn stop_auto_sync(&self) {
        if let Some(timer) = self.inner.timer.lock().await.take() {
            let _ = timer.stop.send(true);
            info!("Automatic sync stopped");
        }
    }

    pub async fn is_auto_sync_running(&self) -> bool {
        self.inner
            .timer
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    // ── Transitions ──────────────────────────────────────────────

    fn transition(&self, status: SyncStatus, last_sync: Option<DateTime<Utc>>) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.state_tx.send_modify(|snapshot| {
            snapshot.status = status;
            if last_sync.is_some() {
                snapshot.last_sync = last_sync;
            }
        });
    }

    /// Transitions and, for terminal states, schedules the fall back to idle.
    fn finish(&self, status: SyncStatus, last_sync: Option<DateTime<Utc>>) {
        let terminal = status.is_terminal();
        self.transition(status, last_sync);
        if !terminal {
            return;
        }

        let deadline = self
            .inner
            .config
            .status_reset_after()
            .map(|delay| Instant::now() + delay);
        if let Ok(mut slot) = self.inner.reset_deadline.lock() {
            *slot = deadline;
        }
        if let Some(deadline) = deadline {
            self.schedule_reset(deadline);
        }
    }

    /// Puts back the status from before a silent failure. A terminal status
    /// keeps its original reset deadline.
    fn restore(&self, status: SyncStatus) {
        let terminal = status.is_terminal();
        self.transition(status, None);
        if !terminal {
            return;
        }
        let deadline = self.inner.reset_deadline.lock().ok().and_then(|slot| *slot);
        if let Some(deadline) = deadline {
            self.schedule_reset(deadline);
        }
    }

    fn schedule_reset(&self, deadline: Instant) {
        let generation = self.inner.generation.load(Ordering::Acquire);
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                if inner.generation.load(Ordering::Acquire) == generation {
                    inner.state_tx.send_modify(|snapshot| snapshot.status = SyncStatus::Idle);
                }
            }
        });
    }
}

async fn run_timer<S: EntityStore + 'static>(
    inner: Weak<Inner<S>>,
    period: std::time::Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        // Only the wait is interruptible; a started pass is never cancelled.
        tokio::select! {
            _ = interval.tick() => {}
            _ = stop.changed() => break,
        }
        if *stop.borrow() {
            break;
        }
        let Some(inner) = inner.upgrade() else {
            break;
        };
        SyncStateMachine { inner }.auto_sync().await;
    }
    debug!("Automatic sync timer exited");
}
