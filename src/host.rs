// src/host.rs — narrow seams to the UI host; the coordinator only talks through these.

/// A unit of work marshaled onto the UI thread.
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs on the thread that owns UI state. Fire-and-forget.
pub trait UiDispatcher: Send + Sync {
    /// Returns `false` when the UI loop is gone and the job was dropped.
    fn post(&self, job: UiJob) -> bool;
}

/// Cosmetic busy cursor / spinner. May be toggled from any thread.
pub trait BusyIndicator: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// Localized text for non-success task outcomes.
pub trait MessageSource: Send + Sync {
    fn dialog_title(&self) -> String;
    fn task_failed(&self, description: &str) -> String;
    fn task_timed_out(&self, description: &str) -> String;
    fn task_exception(&self, description: &str, message: &str) -> String;
}

/// Modal dialog / notification. Only called on the UI thread.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Busy indicator for headless use.
pub struct NoBusyIndicator;

impl BusyIndicator for NoBusyIndicator {
    fn show(&self) {}
    fn hide(&self) {}
}
