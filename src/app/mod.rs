// src/app/mod.rs — egui shell: one list screen driven through the task coordinator.
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use eframe::egui as eg;
use tracing::{error, info};

use crate::api::{ListItem, ListKind, TraktClient};
use crate::config::AppConfig;
use crate::strings::Strings;
use crate::task::{CoordinatorConfig, HostServices, TaskCoordinator, TaskResult};
use crate::ui_queue::UiQueue;

pub mod list;
pub mod notice;
pub mod topbar;

use notice::{BusyFlag, NoticeBoard};

// ---- Tunables ----
const MAX_JOBS_PER_FRAME: usize = 8;
const BUSY_REPAINT_MS: u64 = 100;

struct ListMsg {
    kind: ListKind,
    result: TaskResult<Vec<ListItem>>,
}

pub struct ShellApp {
    // host plumbing
    queue: UiQueue,
    coord: TaskCoordinator,
    notices: Arc<NoticeBoard>,
    busy: Arc<BusyFlag>,
    client: Option<Arc<TraktClient>>,
    use_timeout: bool,

    // completed fetches, filled by coordinator callbacks
    list_tx: Sender<ListMsg>,
    list_rx: Receiver<ListMsg>,

    // screen state
    current: ListKind,
    search_query: String,
    items: Vec<ListItem>,
    status: String,
    updated_at: Option<DateTime<Local>>,
    first_frame: bool,
}

impl ShellApp {
    /// Must run on the UI thread (eframe calls the creator there).
    pub fn new(cc: &eframe::CreationContext<'_>, cfg: AppConfig) -> Self {
        let queue = UiQueue::new();
        let notices = Arc::new(NoticeBoard::default());
        let busy = Arc::new(BusyFlag::default());
        let strings = Strings::load(&cfg.strings_dir, &cfg.language);

        let coord = TaskCoordinator::new(
            CoordinatorConfig::from(&cfg),
            HostServices {
                dispatcher: Arc::new(queue.handle().with_repaint(cc.egui_ctx.clone())),
                busy: busy.clone(),
                messages: Arc::new(strings),
                notifier: notices.clone(),
            },
        );

        let (client, status) = match TraktClient::new(&cfg) {
            Ok(c) => (Some(Arc::new(c)), String::from("Ready.")),
            Err(e) => {
                error!("http client build failed: {e}");
                (None, format!("HTTP client unavailable: {e}"))
            }
        };

        let (list_tx, list_rx) = mpsc::channel::<ListMsg>();
        info!(
            timeout = ?cfg.task_timeout,
            debug_attached = cfg.debug_attached,
            "shell ready"
        );

        Self {
            queue,
            coord,
            notices,
            busy,
            client,
            use_timeout: true,
            list_tx,
            list_rx,
            current: ListKind::TrendingMovies,
            search_query: String::new(),
            items: Vec::new(),
            status,
            updated_at: None,
            first_frame: true,
        }
    }

    fn set_status<S: Into<String>>(&mut self, s: S) {
        self.status = s.into();
    }

    /// Submit a fetch for `kind`. Rejected while another task runs.
    pub(crate) fn start_fetch(&mut self, kind: ListKind) {
        let Some(client) = self.client.clone() else {
            self.set_status("No HTTP client; check the log.");
            return;
        };
        let description = match &kind {
            ListKind::Search(q) => format!("Searching for \"{}\"", q.trim()),
            other => format!("Loading {}", other.label().to_lowercase()),
        };

        let tx = self.list_tx.clone();
        let op_kind = kind.clone();
        let cb_kind = kind.clone();
        let accepted = self.coord.submit(
            description.clone(),
            self.use_timeout,
            move |cancel| client.fetch_list(&op_kind, cancel),
            move |result| {
                let _ = tx.send(ListMsg {
                    kind: cb_kind,
                    result,
                });
            },
        );

        if accepted {
            self.current = kind;
            self.set_status(format!("{description}…"));
        } else {
            self.set_status("Still working on the previous request.");
        }
    }

    /// Drain completed fetches without blocking.
    fn poll_list(&mut self) {
        while let Ok(msg) = self.list_rx.try_recv() {
            match msg.result {
                Ok(items) => {
                    let count = items.len();
                    self.items = items;
                    self.updated_at = Some(Local::now());
                    self.set_status(format!("{}: {count} titles.", msg.kind.label()));
                }
                Err(e) => {
                    self.set_status(format!("{} not updated ({e}).", msg.kind.label()));
                }
            }
        }
    }
}

impl eframe::App for ShellApp {
    fn update(&mut self, ctx: &eg::Context, _frame: &mut eframe::Frame) {
        self.queue.drain(MAX_JOBS_PER_FRAME);
        self.poll_list();

        if self.first_frame {
            self.first_frame = false;
            self.start_fetch(ListKind::TrendingMovies);
        }

        if ctx.input(|i| i.key_pressed(eg::Key::Escape)) {
            self.coord.stop();
        }

        eg::TopBottomPanel::top("topbar").show(ctx, |ui| self.ui_render_topbar(ui));
        eg::TopBottomPanel::bottom("status").show(ctx, |ui| self.ui_render_status(ui));
        eg::CentralPanel::default().show(ctx, |ui| self.ui_render_list(ui));
        self.ui_render_notice(ctx);

        if self.busy.is_set() {
            ctx.request_repaint_after(Duration::from_millis(BUSY_REPAINT_MS));
        }
    }
}
