// src/app/notice.rs — egui-side busy flag and modal notices.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use eframe::egui as eg;

use crate::host::{BusyIndicator, Notifier};

#[derive(Default)]
pub struct BusyFlag(AtomicBool);

impl BusyFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl BusyIndicator for BusyFlag {
    fn show(&self) {
        self.0.store(true, Ordering::Release);
    }
    fn hide(&self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

/// Notices queue up; the window shows the oldest until dismissed.
#[derive(Default)]
pub struct NoticeBoard {
    queue: Mutex<VecDeque<Notice>>,
}

impl NoticeBoard {
    pub fn front(&self) -> Option<Notice> {
        self.queue
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .front()
            .cloned()
    }

    pub fn dismiss(&self) {
        self.queue
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();
    }
}

impl Notifier for NoticeBoard {
    fn notify(&self, title: &str, body: &str) {
        tracing::debug!("notice: {body}");
        self.queue
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(Notice {
                title: title.to_string(),
                body: body.to_string(),
            });
    }
}

impl crate::app::ShellApp {
    pub(crate) fn ui_render_notice(&mut self, ctx: &eg::Context) {
        let Some(notice) = self.notices.front() else {
            return;
        };
        let mut dismissed = false;
        eg::Window::new(notice.title.as_str())
            .id(eg::Id::new("notice_window"))
            .collapsible(false)
            .resizable(false)
            .anchor(eg::Align2::CENTER_CENTER, eg::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(&notice.body);
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            });
        if dismissed || ctx.input(|i| i.key_pressed(eg::Key::Enter)) {
            self.notices.dismiss();
        }
    }
}
