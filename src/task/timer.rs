// src/task/timer.rs — one-shot countdown on its own thread.
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::trace;

/// Fires `on_fire` once after `after`, unless stopped first.
/// Dropping the timer stops it as well.
pub struct TimeoutTimer {
    stop_tx: Sender<()>,
}

impl TimeoutTimer {
    pub fn arm<F>(after: Duration, on_fire: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        thread::Builder::new()
            .name("task-timeout".into())
            .spawn(move || match stop_rx.recv_timeout(after) {
                Err(RecvTimeoutError::Timeout) => on_fire(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => trace!("timeout timer stopped"),
            })?;
        Ok(Self { stop_tx })
    }

    pub fn stop(self) {
        let _ = self.stop_tx.send(());
    }
}
