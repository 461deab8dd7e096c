//! Timer registry and tick scheduling
//!
//! The [`Scheduler`] owns every registered [`Timer`] behind a single lock.
//! The background tick loop, control actions and registry changes all go
//! through that lock, so a timer is never mutated from two places at once.
//! Observer callbacks run after the lock is released and receive a snapshot
//! taken while it was held.

pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};

use std::{
    any::Any,
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, RwLock},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{sync::watch, task::JoinHandle, time::timeout};
use tracing::{debug, error, info, trace, warn};

use crate::{
    error::TimerError,
    state::{Advance, Timer, TimerAction, TimerRecord, TimerState},
    tasks::tick_loop,
};

/// Default cadence of the tick loop
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// How long [`Scheduler::end_loop`] waits for the loop to exit
pub const LOOP_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Observer invoked with a snapshot of the timer that ticked or completed
pub type TimerCallback = Arc<dyn Fn(&Timer) + Send + Sync>;

/// Lifecycle of the tick loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerStatus {
    /// Loop not started
    Idle,
    /// Loop executing
    Active,
    /// Loop being torn down
    Stopping,
}

/// Configuration changes applied through [`Scheduler::reconfigure`].
/// `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerUpdate {
    pub label: Option<String>,
    pub duration: Option<u32>,
    pub hotkey: Option<Option<String>>,
    pub alert: Option<Option<Value>>,
    pub font: Option<Option<Value>>,
}

/// State shared between the scheduler handle and its tick loop
pub(crate) struct Shared {
    registry: Mutex<Vec<Timer>>,
    clock: Arc<dyn Clock>,
    pub(crate) tick_interval: Duration,
    on_complete: RwLock<Option<TimerCallback>>,
    on_tick: RwLock<Option<TimerCallback>>,
}

impl Shared {
    fn registry(&self) -> MutexGuard<'_, Vec<Timer>> {
        self.registry.lock().unwrap_or_else(|poisoned| {
            warn!("Timer registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// One tick pass: advance every running timer against a single clock
    /// reading, then notify observers outside the lock.
    pub(crate) fn tick(&self) -> usize {
        let now = self.clock.now();

        let events: Vec<(Timer, Advance)> = {
            let mut registry = self.registry();
            let mut events = Vec::new();

            for timer in registry.iter_mut().filter(|t| t.state().is_running()) {
                match catch_unwind(AssertUnwindSafe(|| timer.advance(now))) {
                    Ok(outcome) if outcome.ticked() => events.push((timer.clone(), outcome)),
                    Ok(_) => {}
                    Err(panic) => {
                        error!(
                            "Timer {} panicked while advancing: {}",
                            timer.id(),
                            panic_message(panic.as_ref())
                        );
                    }
                }
            }

            events
        };

        for (timer, outcome) in &events {
            if outcome.completed() {
                info!("Timer '{}' ({}) completed", timer.label(), timer.id());
                self.notify(&self.on_complete, timer, "completion");
            }
            trace!("Timer {} at {}", timer.id(), timer.display_time());
            self.notify(&self.on_tick, timer, "tick");
        }

        events.len()
    }

    fn notify(&self, slot: &RwLock<Option<TimerCallback>>, timer: &Timer, kind: &str) {
        // Clone the callback out so it may re-register observers without deadlocking
        let callback = slot.read().unwrap_or_else(|e| e.into_inner()).clone();
        let Some(callback) = callback else {
            return;
        };

        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(timer))) {
            error!(
                "{} observer panicked for timer {}: {}",
                kind,
                timer.id(),
                panic_message(panic.as_ref())
            );
        }
    }

    /// Insert or replace by identifier, keeping the position of a replaced entry
    fn insert(&self, registry: &mut Vec<Timer>, mut timer: Timer) -> Option<Timer> {
        if timer.anchor_if_running(self.clock.now()) {
            debug!("Re-anchored running timer {} on registration", timer.id());
        }

        match registry.iter_mut().find(|t| t.id() == timer.id()) {
            Some(slot) => {
                info!("Replacing timer {} with a new registration", timer.id());
                Some(std::mem::replace(slot, timer))
            }
            None => {
                debug!("Registered timer '{}' ({})", timer.label(), timer.id());
                registry.push(timer);
                None
            }
        }
    }
}

struct LoopControl {
    alive: watch::Sender<bool>,
    task: JoinHandle<()>,
}

struct Lifecycle {
    status: SchedulerStatus,
    control: Option<LoopControl>,
}

/// Owns the live set of timers and the tick cadence
pub struct Scheduler {
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

impl Scheduler {
    /// Create a scheduler driven by a [`MonotonicClock`]
    pub fn new(tick_interval: Duration) -> Self {
        Self::with_clock(tick_interval, Arc::new(MonotonicClock::new()))
    }

    /// Create a scheduler driven by the given clock
    pub fn with_clock(tick_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Vec::new()),
                clock,
                tick_interval,
                on_complete: RwLock::new(None),
                on_tick: RwLock::new(None),
            }),
            lifecycle: Mutex::new(Lifecycle {
                status: SchedulerStatus::Idle,
                control: None,
            }),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.shared.tick_interval
    }

    /// Current reading of the scheduler's clock
    pub fn now(&self) -> f64 {
        self.shared.clock.now()
    }

    /// Add a timer. An existing timer with the same identifier is replaced
    /// and returned.
    pub fn register(&self, timer: Timer) -> Option<Timer> {
        let mut registry = self.shared.registry();
        self.shared.insert(&mut registry, timer)
    }

    /// Remove a timer; returns whether it was present
    pub fn unregister(&self, id: &str) -> bool {
        let mut registry = self.shared.registry();
        let before = registry.len();
        registry.retain(|t| t.id().as_str() != id);
        let removed = registry.len() != before;
        if removed {
            debug!("Unregistered timer {}", id);
        }
        removed
    }

    /// Snapshot of one timer
    pub fn get(&self, id: &str) -> Option<Timer> {
        self.shared
            .registry()
            .iter()
            .find(|t| t.id().as_str() == id)
            .cloned()
    }

    /// Snapshot of all timers in registration order
    pub fn list(&self) -> Vec<Timer> {
        self.shared.registry().clone()
    }

    pub fn len(&self) -> usize {
        self.shared.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.registry().is_empty()
    }

    /// Remove every timer
    pub fn clear(&self) {
        self.shared.registry().clear();
    }

    /// Route a control action to a timer. Returns whether the timer exists.
    pub fn run_action(&self, id: &str, action: TimerAction) -> bool {
        let mut registry = self.shared.registry();
        let Some(timer) = registry.iter_mut().find(|t| t.id().as_str() == id) else {
            debug!("Ignoring {} for unknown timer {}", action, id);
            return false;
        };

        let now = self.shared.clock.now();
        let before = timer.state();
        match action {
            TimerAction::Start => timer.start(now),
            TimerAction::Pause => timer.pause(),
            TimerAction::Reset => timer.reset(),
            TimerAction::Toggle => timer.toggle(now),
        }
        debug!("Timer {}: {} ({} -> {})", id, action, before, timer.state());
        true
    }

    /// Like [`run_action`](Self::run_action) but takes the action by name.
    /// Unknown names are ignored and return `false`.
    pub fn run_action_named(&self, id: &str, action: &str) -> bool {
        match action.parse::<TimerAction>() {
            Ok(action) => self.run_action(id, action),
            Err(e) => {
                debug!("Ignoring action for timer {}: {}", id, e);
                false
            }
        }
    }

    /// Apply configuration changes to a timer and return its new snapshot,
    /// or `None` if it is not registered. Nothing changes if the update is
    /// invalid.
    pub fn reconfigure(&self, id: &str, update: TimerUpdate) -> Result<Option<Timer>, TimerError> {
        let mut registry = self.shared.registry();
        let Some(timer) = registry.iter_mut().find(|t| t.id().as_str() == id) else {
            return Ok(None);
        };

        if let Some(duration) = update.duration {
            timer.set_duration(duration)?;
        }
        if let Some(label) = update.label {
            timer.set_label(label);
        }
        if let Some(hotkey) = update.hotkey {
            timer.set_hotkey(hotkey);
        }
        if let Some(alert) = update.alert {
            timer.set_alert(alert);
        }
        if let Some(font) = update.font {
            timer.set_font(font);
        }

        Ok(Some(timer.clone()))
    }

    /// Serialize the current timer list
    pub fn to_records(&self) -> Vec<TimerRecord> {
        self.shared.registry().iter().map(Timer::to_record).collect()
    }

    /// Replace the registry with timers built from records. Invalid records
    /// are skipped. Returns how many timers were registered.
    pub fn load_records(&self, records: Vec<TimerRecord>) -> usize {
        let timers: Vec<Timer> = records
            .into_iter()
            .filter_map(|record| {
                let label = record.label.clone();
                Timer::from_record(record)
                    .map_err(|e| warn!("Skipping timer '{}': {}", label, e))
                    .ok()
            })
            .collect();

        let mut registry = self.shared.registry();
        registry.clear();
        for timer in timers {
            self.shared.insert(&mut registry, timer);
        }

        info!("Loaded {} timers", registry.len());
        registry.len()
    }

    /// Set the completion observer, replacing any previous one
    pub fn set_on_complete<F>(&self, callback: F)
    where
        F: Fn(&Timer) + Send + Sync + 'static,
    {
        *self.shared.on_complete.write().unwrap_or_else(|e| e.into_inner()) =
            Some(Arc::new(callback));
    }

    /// Set the tick observer, replacing any previous one
    pub fn set_on_tick<F>(&self, callback: F)
    where
        F: Fn(&Timer) + Send + Sync + 'static,
    {
        *self.shared.on_tick.write().unwrap_or_else(|e| e.into_inner()) =
            Some(Arc::new(callback));
    }

    pub fn clear_observers(&self) {
        *self.shared.on_complete.write().unwrap_or_else(|e| e.into_inner()) = None;
        *self.shared.on_tick.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Run one tick pass synchronously. Returns how many timers advanced.
    pub fn tick(&self) -> usize {
        self.shared.tick()
    }

    pub fn status(&self) -> SchedulerStatus {
        self.lifecycle().status
    }

    pub fn is_running(&self) -> bool {
        self.status() == SchedulerStatus::Active
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Spawn the tick loop on the current tokio runtime. Returns `false`
    /// if the loop is already running, still stopping, or no runtime is
    /// available.
    pub fn begin_loop(&self) -> bool {
        let mut lifecycle = self.lifecycle();
        match lifecycle.status {
            SchedulerStatus::Active => return false,
            SchedulerStatus::Stopping => {
                debug!("Tick loop is still stopping, not starting another");
                return false;
            }
            SchedulerStatus::Idle => {}
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("Cannot start tick loop outside a tokio runtime: {}", e);
                return false;
            }
        };

        let (alive, alive_rx) = watch::channel(true);
        let task = runtime.spawn(tick_loop(Arc::clone(&self.shared), alive_rx));
        lifecycle.control = Some(LoopControl { alive, task });
        lifecycle.status = SchedulerStatus::Active;
        true
    }

    /// Signal the tick loop to stop and wait for it to exit, for at most
    /// [`LOOP_SHUTDOWN_GRACE`]. A no-op when the loop is not running.
    ///
    /// The scheduler is back to idle once this returns, or once the future
    /// is dropped part-way through the wait.
    pub async fn end_loop(&self) {
        let control = {
            let mut lifecycle = self.lifecycle();
            let Some(control) = lifecycle.control.take() else {
                return;
            };
            lifecycle.status = SchedulerStatus::Stopping;
            control
        };
        let _idle = IdleOnDrop(&self.lifecycle);

        // The receiver only disappears once the loop has already exited
        let _ = control.alive.send(false);

        match timeout(LOOP_SHUTDOWN_GRACE, control.task).await {
            Ok(Ok(())) => debug!("Tick loop exited"),
            Ok(Err(e)) => warn!("Tick loop ended abnormally: {}", e),
            Err(_) => warn!(
                "Tick loop did not exit within {:?}, continuing shutdown",
                LOOP_SHUTDOWN_GRACE
            ),
        }
    }
}

/// Moves a stopping scheduler back to idle when dropped
struct IdleOnDrop<'a>(&'a Mutex<Lifecycle>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        let mut lifecycle = self.0.lock().unwrap_or_else(|e| e.into_inner());
        if lifecycle.status == SchedulerStatus::Stopping {
            lifecycle.status = SchedulerStatus::Idle;
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(control) = self.lifecycle().control.take() {
            let _ = control.alive.send(false);
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("timers", &self.len())
            .field("tick_interval", &self.shared.tick_interval)
            .field("status", &self.status())
            .finish()
    }
}

/// Count timers per state, for status reporting
pub fn state_counts(timers: &[Timer]) -> [(TimerState, usize); 4] {
    let count = |state| timers.iter().filter(|t| t.state() == state).count();
    [
        (TimerState::Stopped, count(TimerState::Stopped)),
        (TimerState::Running, count(TimerState::Running)),
        (TimerState::Paused, count(TimerState::Paused)),
        (TimerState::Completed, count(TimerState::Completed)),
    ]
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
