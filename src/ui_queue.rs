// src/ui_queue.rs — single-threaded executor drained by the UI loop each frame.
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use eframe::egui as eg;
use tracing::{debug, warn};

use crate::host::{UiDispatcher, UiJob};

/// Owned by the UI thread. Workers post through a [`UiHandle`].
pub struct UiQueue {
    rx: Receiver<UiJob>,
    handle: UiHandle,
}

#[derive(Clone)]
pub struct UiHandle {
    tx: Arc<Mutex<Sender<UiJob>>>,
    owner: ThreadId,
    repaint: Option<eg::Context>,
}

impl UiQueue {
    /// Must be created on the UI thread; that thread becomes the owner.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<UiJob>();
        Self {
            rx,
            handle: UiHandle {
                tx: Arc::new(Mutex::new(tx)),
                owner: thread::current().id(),
                repaint: None,
            },
        }
    }

    pub fn handle(&self) -> UiHandle {
        self.handle.clone()
    }

    /// Run up to `max` queued jobs. Jobs posted by a running job are picked up
    /// in the same call if the budget allows.
    pub fn drain(&self, max: usize) -> usize {
        debug_assert!(self.handle.is_ui_thread());
        let mut ran = 0usize;
        while ran < max {
            match self.rx.try_recv() {
                Ok(job) => {
                    job();
                    ran += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        ran
    }
}

impl Default for UiQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl UiHandle {
    /// Wake the egui loop after every post so queued jobs run promptly.
    pub fn with_repaint(mut self, ctx: eg::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.owner
    }
}

impl UiDispatcher for UiHandle {
    fn post(&self, job: UiJob) -> bool {
        let sent = {
            let tx = self.tx.lock().unwrap_or_else(|p| p.into_inner());
            tx.send(job).is_ok()
        };
        if !sent {
            warn!("UI queue closed; dropping job");
            return false;
        }
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        } else {
            debug!("posted UI job (no repaint context)");
        }
        true
    }
}
