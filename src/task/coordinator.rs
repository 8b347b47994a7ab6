// src/task/coordinator.rs — single-flight background task runner with UI-thread completion.
use std::any::Any;
use std::fmt::Display;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::cancel::{CancelReason, CancelToken};
use super::outcome::{Outcome, TaskError, TaskResult};
use super::timer::TimeoutTimer;
use crate::config::AppConfig;
use crate::host::{BusyIndicator, MessageSource, Notifier, UiDispatcher};

#[derive(Clone, Copy, Debug)]
pub struct CoordinatorConfig {
    pub timeout: Duration,
    /// Never arm the timeout so breakpoints are not mistaken for hangs.
    pub debug_attached: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::config::DEFAULT_TASK_TIMEOUT_SECS),
            debug_attached: false,
        }
    }
}

impl From<&AppConfig> for CoordinatorConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            timeout: cfg.task_timeout,
            debug_attached: cfg.debug_attached,
        }
    }
}

/// Host collaborators the coordinator reports through.
pub struct HostServices {
    pub dispatcher: Arc<dyn UiDispatcher>,
    pub busy: Arc<dyn BusyIndicator>,
    pub messages: Arc<dyn MessageSource>,
    pub notifier: Arc<dyn Notifier>,
}

/// Runs at most one operation at a time on a fresh worker thread and delivers
/// its result on the UI thread. Cheap to clone; clones share the same gate.
#[derive(Clone)]
pub struct TaskCoordinator {
    inner: Arc<Inner>,
}

type AbortFn = Arc<dyn Fn(CancelReason) + Send + Sync>;
type CallbackSlot<C> = Arc<Mutex<Option<C>>>;
type WorkerBody = Box<dyn FnOnce() + Send + 'static>;
type SpawnFn = fn(String, WorkerBody) -> io::Result<()>;

struct Inner {
    config: CoordinatorConfig,
    gate: AtomicBool,
    next_id: AtomicU64,
    active: Mutex<Option<Active>>,
    host: HostServices,
    spawn: SpawnFn,
}

/// State of the invocation currently holding the gate.
struct Active {
    id: u64,
    description: String,
    outcome: Outcome,
    error: Option<String>,
    timer: Option<TimeoutTimer>,
    abort: AbortFn,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

fn spawn_named(name: String, body: WorkerBody) -> io::Result<()> {
    thread::Builder::new().name(name).spawn(body).map(drop)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::new()
    }
}

impl TaskCoordinator {
    pub fn new(config: CoordinatorConfig, host: HostServices) -> Self {
        Self::with_spawner(config, host, spawn_named)
    }

    fn with_spawner(config: CoordinatorConfig, host: HostServices, spawn: SpawnFn) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                gate: AtomicBool::new(false),
                next_id: AtomicU64::new(0),
                active: Mutex::new(None),
                host,
                spawn,
            }),
        }
    }

    /// True while an invocation holds the gate (from acceptance until just
    /// before its callback runs).
    pub fn is_busy(&self) -> bool {
        self.inner.gate.load(Ordering::Acquire)
    }

    /// Description of the running invocation, if any.
    pub fn current_task(&self) -> Option<String> {
        lock(&self.inner.active)
            .as_ref()
            .map(|a| a.description.clone())
    }

    /// Start `operation` on a worker thread. `callback` later runs on the UI
    /// thread with the result.
    ///
    /// Returns `false` without doing anything if another invocation is in
    /// flight; submissions are rejected, never queued. Also returns `false`
    /// if the worker thread cannot be started, in which case `callback` is
    /// dropped unrun.
    pub fn submit<T, E, F, C>(
        &self,
        description: impl Into<String>,
        use_timeout: bool,
        operation: F,
        callback: C,
    ) -> bool
    where
        T: Send + 'static,
        E: Display,
        F: FnOnce(&CancelToken) -> Result<T, E> + Send + 'static,
        C: FnOnce(TaskResult<T>) + Send + 'static,
    {
        let inner = &self.inner;
        let description = description.into();

        if inner
            .gate
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("rejected `{description}`: another task is running");
            return false;
        }

        let id = inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancelToken::new();
        let slot: CallbackSlot<C> = Arc::new(Mutex::new(Some(callback)));

        let abort: AbortFn = {
            let weak: Weak<Inner> = Arc::downgrade(inner);
            let slot = Arc::clone(&slot);
            let token = token.clone();
            Arc::new(move |reason| {
                if let Some(inner) = weak.upgrade() {
                    inner.abort::<T, C>(id, reason, &token, &slot);
                }
            })
        };

        // Held until the invocation is recorded so a fast worker cannot settle
        // against an empty slot.
        let mut active = lock(&inner.active);
        inner.host.busy.show();

        let worker = {
            let inner = Arc::clone(inner);
            let slot = Arc::clone(&slot);
            let token = token.clone();
            move || {
                let value = panic::catch_unwind(AssertUnwindSafe(|| operation(&token)));
                let Some(callback) = lock(&slot).take() else {
                    debug!(id, "worker finished after cancellation; result discarded");
                    return;
                };
                match value {
                    Ok(Ok(v)) => inner.settle(id, Outcome::Succeeded, None, Ok(v), callback),
                    Ok(Err(e)) => {
                        let message = e.to_string();
                        inner.settle(
                            id,
                            Outcome::Failed,
                            Some(message.clone()),
                            Err(TaskError::Failed { message }),
                            callback,
                        );
                    }
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        error!(id, "task panicked: {message}");
                        inner.settle(
                            id,
                            Outcome::Failed,
                            Some(message.clone()),
                            Err(TaskError::Failed { message }),
                            callback,
                        );
                    }
                }
            }
        };

        if let Err(e) = (inner.spawn)(format!("task-{id}"), Box::new(worker)) {
            error!("failed to start worker for `{description}`: {e}");
            drop(active);
            inner.host.busy.hide();
            inner.gate.store(false, Ordering::Release);
            return false;
        }

        let timer = if use_timeout && !inner.config.debug_attached {
            let abort = Arc::clone(&abort);
            match TimeoutTimer::arm(inner.config.timeout, move || abort(CancelReason::Timeout)) {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!("could not arm timeout for `{description}`: {e}");
                    None
                }
            }
        } else {
            None
        };

        info!(id, timeout = timer.is_some(), "started `{description}`");
        *active = Some(Active {
            id,
            description,
            outcome: Outcome::Pending,
            error: None,
            timer,
            abort,
        });
        true
    }

    /// Ask the running operation to stop. `by_user_request` selects silent
    /// cancellation over the timeout notice. No-op when idle or already terminal.
    pub fn cancel(&self, by_user_request: bool) {
        let abort = match lock(&self.inner.active).as_ref() {
            Some(a) if !a.outcome.is_terminal() => Arc::clone(&a.abort),
            _ => return,
        };
        abort(if by_user_request {
            CancelReason::User
        } else {
            CancelReason::Timeout
        });
    }

    pub fn stop(&self) {
        self.cancel(true);
    }
}

impl Inner {
    fn abort<T, C>(
        self: &Arc<Self>,
        id: u64,
        reason: CancelReason,
        token: &CancelToken,
        slot: &Mutex<Option<C>>,
    ) where
        T: Send + 'static,
        C: FnOnce(TaskResult<T>) + Send + 'static,
    {
        // Taking the callback first means a worker that sees the token can
        // never settle ahead of us.
        let Some(callback) = lock(slot).take() else {
            return;
        };
        token.cancel(reason);
        let (outcome, err) = match reason {
            CancelReason::User => {
                info!(id, "task cancelled by user");
                (Outcome::CancelledByUser, TaskError::Cancelled)
            }
            CancelReason::Timeout => {
                warn!(id, "task timed out after {:?}", self.config.timeout);
                (Outcome::TimedOut, TaskError::TimedOut)
            }
        };
        self.settle(id, outcome, None, Err(err), callback);
    }

    /// Record the terminal outcome, stop the timer, hide busy, then hand the
    /// callback to the UI thread.
    fn settle<T, C>(
        self: &Arc<Self>,
        id: u64,
        outcome: Outcome,
        error: Option<String>,
        result: TaskResult<T>,
        callback: C,
    ) where
        T: Send + 'static,
        C: FnOnce(TaskResult<T>) + Send + 'static,
    {
        {
            let mut guard = lock(&self.active);
            let Some(active) = guard.as_mut().filter(|a| a.id == id) else {
                warn!(id, "settle for an invocation that is no longer active");
                return;
            };
            active.outcome = outcome;
            active.error = error;
            if let Some(timer) = active.timer.take() {
                timer.stop();
            }
        }
        self.host.busy.hide();
        debug!(id, outcome = outcome.as_str(), "posting completion");

        let inner = Arc::clone(self);
        let posted = self
            .host
            .dispatcher
            .post(Box::new(move || inner.dispatch(id, result, callback)));
        if !posted {
            // No UI loop left to run the callback; free the gate anyway.
            error!(id, "UI dispatcher closed; completion dropped");
            let mut guard = lock(&self.active);
            if guard.as_ref().is_some_and(|a| a.id == id) {
                *guard = None;
                drop(guard);
                self.gate.store(false, Ordering::Release);
            }
        }
    }

    /// Runs on the UI thread, exactly once per accepted invocation.
    fn dispatch<T, C>(&self, id: u64, result: TaskResult<T>, callback: C)
    where
        C: FnOnce(TaskResult<T>),
    {
        let (description, outcome, error) = match lock(&self.active).as_ref() {
            Some(a) if a.id == id => (a.description.clone(), a.outcome, a.error.clone()),
            _ => {
                debug!(id, "stale completion ignored");
                return;
            }
        };

        let messages = &self.host.messages;
        let body = match outcome {
            Outcome::Failed => Some(match error.as_deref() {
                Some(msg) if !msg.is_empty() => messages.task_exception(&description, msg),
                _ => messages.task_failed(&description),
            }),
            Outcome::TimedOut => Some(messages.task_timed_out(&description)),
            Outcome::Pending | Outcome::Succeeded | Outcome::CancelledByUser => None,
        };
        if let Some(body) = body {
            self.host.notifier.notify(&messages.dialog_title(), &body);
        }

        // Clear and release before the callback so it may submit again.
        *lock(&self.active) = None;
        self.gate.store(false, Ordering::Release);

        callback(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NoBusyIndicator;
    use crate::strings::Strings;
    use crate::ui_queue::UiQueue;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Instant;

    #[derive(Default)]
    struct RecordingNotifier {
        shown: Mutex<Vec<(String, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, body: &str) {
            self.shown
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
        }
    }

    #[derive(Default)]
    struct CountingBusy {
        shows: AtomicUsize,
        hides: AtomicUsize,
    }

    impl BusyIndicator for CountingBusy {
        fn show(&self) {
            self.shows.fetch_add(1, Ordering::SeqCst);
        }
        fn hide(&self) {
            self.hides.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        queue: UiQueue,
        coord: TaskCoordinator,
        notifier: Arc<RecordingNotifier>,
        busy: Arc<CountingBusy>,
    }

    fn harness(config: CoordinatorConfig) -> Harness {
        harness_with(config, spawn_named)
    }

    fn harness_with(config: CoordinatorConfig, spawn: SpawnFn) -> Harness {
        let queue = UiQueue::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let busy = Arc::new(CountingBusy::default());
        let coord = TaskCoordinator::with_spawner(
            config,
            HostServices {
                dispatcher: Arc::new(queue.handle()),
                busy: busy.clone(),
                messages: Arc::new(Strings::english()),
                notifier: notifier.clone(),
            },
            spawn,
        );
        Harness {
            queue,
            coord,
            notifier,
            busy,
        }
    }

    fn pump_until(queue: &UiQueue, cond: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            queue.drain(16);
            assert!(Instant::now() < deadline, "timed out pumping the UI queue");
            thread::sleep(Duration::from_millis(2));
        }
    }

    type Seen<T> = Arc<Mutex<Vec<TaskResult<T>>>>;

    fn recorder<T: Send + 'static>() -> (Seen<T>, impl FnOnce(TaskResult<T>) + Send + 'static) {
        let seen: Seen<T> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |r| sink.lock().unwrap().push(r))
    }

    /// Spins until cancelled, bounded so a broken test cannot leak a thread forever.
    fn spin_until_cancelled(token: &CancelToken) -> Result<i32, String> {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !token.is_cancelled() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        Err("cancelled".into())
    }

    #[test]
    fn delivers_value_on_ui_thread() {
        let h = harness(CoordinatorConfig::default());
        let ui_thread = thread::current().id();
        let seen_thread = Arc::new(Mutex::new(None));
        let st = Arc::clone(&seen_thread);
        let (seen, record) = recorder::<i32>();

        assert!(h.coord.submit(
            "Loading answer",
            false,
            |_| Ok::<_, String>(42),
            move |r| {
                *st.lock().unwrap() = Some(thread::current().id());
                record(r);
            },
        ));
        pump_until(&h.queue, || !seen.lock().unwrap().is_empty());

        assert_eq!(*seen.lock().unwrap(), vec![Ok(42)]);
        assert_eq!(*seen_thread.lock().unwrap(), Some(ui_thread));
        assert!(!h.coord.is_busy());
        assert!(h.notifier.shown.lock().unwrap().is_empty());
        assert_eq!(h.busy.shows.load(Ordering::SeqCst), 1);
        assert_eq!(h.busy.hides.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn operation_error_is_contained_and_shown() {
        let h = harness(CoordinatorConfig::default());
        let (seen, record) = recorder::<i32>();

        assert!(h.coord.submit("Syncing", false, |_| Err::<i32, _>("boom"), record));
        pump_until(&h.queue, || !seen.lock().unwrap().is_empty());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Err(TaskError::Failed {
                message: "boom".into()
            })]
        );
        let shown = h.notifier.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].1.contains("boom"));
        assert!(shown[0].1.contains("Syncing"));
    }

    #[test]
    fn panic_is_caught_as_failure() {
        let h = harness(CoordinatorConfig::default());
        let (seen, record) = recorder::<i32>();

        assert!(h.coord.submit(
            "Exploding",
            false,
            |_| -> Result<i32, String> { panic!("boom") },
            record,
        ));
        pump_until(&h.queue, || !seen.lock().unwrap().is_empty());

        assert_eq!(seen.lock().unwrap()[0].as_ref().unwrap_err().outcome(), Outcome::Failed);
        assert!(h.notifier.shown.lock().unwrap()[0].1.contains("boom"));
        assert!(!h.coord.is_busy());
    }

    #[test]
    fn second_submission_is_rejected_while_busy() {
        let h = harness(CoordinatorConfig::default());
        let runs = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (seen, record) = recorder::<i32>();

        let r1 = Arc::clone(&runs);
        assert!(h.coord.submit(
            "First",
            false,
            move |_| {
                r1.fetch_add(1, Ordering::SeqCst);
                release_rx.recv().map(|_| 1).map_err(|e| e.to_string())
            },
            record,
        ));
        assert!(h.coord.is_busy());

        let r2 = Arc::clone(&runs);
        let rejected = h.coord.submit(
            "Second",
            false,
            move |_| {
                r2.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(2)
            },
            |_| panic!("rejected task must not call back"),
        );
        assert!(!rejected);

        release_tx.send(()).unwrap();
        pump_until(&h.queue, || !seen.lock().unwrap().is_empty());
        assert_eq!(*seen.lock().unwrap(), vec![Ok(1)]);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(h.busy.shows.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_can_resubmit() {
        let h = harness(CoordinatorConfig::default());
        let (seen, record) = recorder::<i32>();
        let accepted = Arc::new(AtomicBool::new(false));

        let coord = h.coord.clone();
        let acc = Arc::clone(&accepted);
        assert!(h.coord.submit(
            "Outer",
            false,
            |_| Ok::<_, String>(1),
            move |_first: TaskResult<i32>| {
                acc.store(coord.submit("Inner", false, |_| Ok::<_, String>(2), record), Ordering::SeqCst);
            },
        ));
        pump_until(&h.queue, || !seen.lock().unwrap().is_empty());

        assert!(accepted.load(Ordering::SeqCst));
        assert_eq!(*seen.lock().unwrap(), vec![Ok(2)]);
        assert!(!h.coord.is_busy());
    }

    #[test]
    fn timeout_cancels_and_notifies() {
        let h = harness(CoordinatorConfig {
            timeout: Duration::from_millis(50),
            debug_attached: false,
        });
        let (seen, record) = recorder::<i32>();

        assert!(h.coord.submit("Fetching trending", true, spin_until_cancelled, record));
        pump_until(&h.queue, || !seen.lock().unwrap().is_empty());

        assert_eq!(*seen.lock().unwrap(), vec![Err(TaskError::TimedOut)]);
        let shown = h.notifier.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].1.contains("Fetching trending"));
        assert!(!h.coord.is_busy());
    }

    #[test]
    fn user_cancel_is_silent() {
        let h = harness(CoordinatorConfig::default());
        let (seen, record) = recorder::<i32>();

        assert!(h.coord.submit("Long search", true, spin_until_cancelled, record));
        h.coord.stop();
        pump_until(&h.queue, || !seen.lock().unwrap().is_empty());

        assert_eq!(*seen.lock().unwrap(), vec![Err(TaskError::Cancelled)]);
        assert!(h.notifier.shown.lock().unwrap().is_empty());
        assert!(!h.coord.is_busy());
    }

    #[test]
    fn system_cancel_reports_timeout() {
        let h = harness(CoordinatorConfig::default());
        let (seen, record) = recorder::<i32>();

        assert!(h.coord.submit("Rating", false, spin_until_cancelled, record));
        h.coord.cancel(false);
        pump_until(&h.queue, || !seen.lock().unwrap().is_empty());

        assert_eq!(*seen.lock().unwrap(), vec![Err(TaskError::TimedOut)]);
        assert_eq!(h.notifier.shown.lock().unwrap().len(), 1);
    }

    #[test]
    fn late_result_after_cancel_is_dropped() {
        let h = harness(CoordinatorConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let (go_tx, go_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let c = Arc::clone(&calls);
        assert!(h.coord.submit(
            "Slow",
            false,
            move |_| {
                let _ = go_rx.recv();
                let _ = done_tx.send(());
                Ok::<_, String>(7)
            },
            move |r: TaskResult<i32>| {
                assert_eq!(r, Err(TaskError::Cancelled));
                c.fetch_add(1, Ordering::SeqCst);
            },
        ));
        h.coord.cancel(true);
        pump_until(&h.queue, || calls.load(Ordering::SeqCst) == 1);

        go_tx.send(()).unwrap();
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        thread::sleep(Duration::from_millis(20));
        h.queue.drain(16);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.busy.hides.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_after_settle_is_noop() {
        let h = harness(CoordinatorConfig::default());
        let (seen, record) = recorder::<i32>();

        assert!(h.coord.submit("Quick", false, |_| Ok::<_, String>(5), record));
        let deadline = Instant::now() + Duration::from_secs(5);
        while h.busy.hides.load(Ordering::SeqCst) == 0 {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(2));
        }
        h.coord.cancel(true);
        pump_until(&h.queue, || !seen.lock().unwrap().is_empty());
        assert_eq!(*seen.lock().unwrap(), vec![Ok(5)]);
    }

    #[test]
    fn cancel_when_idle_is_noop() {
        let h = harness(CoordinatorConfig::default());
        h.coord.cancel(true);
        h.coord.cancel(false);
        assert!(!h.coord.is_busy());
        assert_eq!(h.queue.drain(16), 0);
    }

    #[test]
    fn debug_attached_skips_timeout() {
        let h = harness(CoordinatorConfig {
            timeout: Duration::from_millis(10),
            debug_attached: true,
        });
        let (seen, record) = recorder::<i32>();

        assert!(h.coord.submit(
            "Debugging",
            true,
            |_| {
                thread::sleep(Duration::from_millis(80));
                Ok::<_, String>(3)
            },
            record,
        ));
        pump_until(&h.queue, || !seen.lock().unwrap().is_empty());
        assert_eq!(*seen.lock().unwrap(), vec![Ok(3)]);
    }

    #[test]
    fn no_busy_indicator_still_runs() {
        let queue = UiQueue::new();
        let coord = TaskCoordinator::new(
            CoordinatorConfig::default(),
            HostServices {
                dispatcher: Arc::new(queue.handle()),
                busy: Arc::new(NoBusyIndicator),
                messages: Arc::new(Strings::english()),
                notifier: Arc::new(RecordingNotifier::default()),
            },
        );
        let (seen, record) = recorder::<String>();
        assert!(coord.submit("Echo", false, |_| Ok::<_, String>("hi".to_string()), record));
        assert_eq!(coord.current_task().as_deref(), Some("Echo"));
        pump_until(&queue, || !seen.lock().unwrap().is_empty());
        assert_eq!(coord.current_task(), None);
    }

    #[test]
    fn fast_task_disarms_timeout() {
        let h = harness(CoordinatorConfig {
            timeout: Duration::from_millis(50),
            debug_attached: false,
        });
        let (seen, record) = recorder::<i32>();

        assert!(h.coord.submit("Quick with timeout", true, |_| Ok::<_, String>(9), record));
        pump_until(&h.queue, || !seen.lock().unwrap().is_empty());

        let until = Instant::now() + Duration::from_millis(200);
        while Instant::now() < until {
            h.queue.drain(16);
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(*seen.lock().unwrap(), vec![Ok(9)]);
        assert!(h.notifier.shown.lock().unwrap().is_empty());
        assert!(!h.coord.is_busy());
    }

    #[test]
    fn opaque_panic_gets_generic_failure_text() {
        let h = harness(CoordinatorConfig::default());
        let (seen, record) = recorder::<i32>();

        assert!(h.coord.submit(
            "Opaque",
            false,
            |_| -> Result<i32, String> { panic::panic_any(7u8) },
            record,
        ));
        pump_until(&h.queue, || !seen.lock().unwrap().is_empty());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Err(TaskError::Failed {
                message: String::new()
            })]
        );
        let shown = h.notifier.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].1, Strings::english().task_failed("Opaque"));
        assert!(!h.coord.is_busy());
    }

    fn refuse_spawn(_name: String, _body: WorkerBody) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "no threads left"))
    }

    #[test]
    fn spawn_failure_releases_gate_without_callback() {
        let h = harness_with(CoordinatorConfig::default(), refuse_spawn);
        let called = Arc::new(AtomicBool::new(false));
        let c = Arc::clone(&called);

        let accepted = h.coord.submit(
            "Unstartable",
            true,
            |_| Ok::<_, String>(1),
            move |_: TaskResult<i32>| c.store(true, Ordering::SeqCst),
        );

        assert!(!accepted);
        assert!(!h.coord.is_busy());
        assert_eq!(h.coord.current_task(), None);
        assert_eq!(h.busy.shows.load(Ordering::SeqCst), 1);
        assert_eq!(h.busy.hides.load(Ordering::SeqCst), 1);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(h.queue.drain(16), 0);
        assert!(!called.load(Ordering::SeqCst));
        assert!(h.notifier.shown.lock().unwrap().is_empty());
    }

    #[test]
    fn closed_ui_queue_still_frees_gate() {
        let Harness { queue, coord, busy, .. } = harness(CoordinatorConfig::default());
        drop(queue);

        assert!(coord.submit("Orphaned", false, |_| Ok::<_, String>(1), |_| {}));
        let deadline = Instant::now() + Duration::from_secs(5);
        while coord.is_busy() {
            assert!(Instant::now() < deadline, "gate never released");
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(coord.current_task(), None);
        assert_eq!(busy.hides.load(Ordering::SeqCst), 1);
        assert!(coord.submit("Next", false, |_| Ok::<_, String>(2), |_| {}));
    }
}
