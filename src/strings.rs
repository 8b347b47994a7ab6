// src/strings.rs — localized message table with built-in English fallback.
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use crate::host::MessageSource;

pub const KEY_DIALOG_TITLE: &str = "dialog.title";
pub const KEY_TASK_FAILED: &str = "task.failed";
pub const KEY_TASK_TIMED_OUT: &str = "task.timed_out";
pub const KEY_TASK_EXCEPTION: &str = "task.exception";

static ENGLISH: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (KEY_DIALOG_TITLE, "Trakt"),
        (KEY_TASK_FAILED, "{description} failed."),
        (
            KEY_TASK_TIMED_OUT,
            "{description} timed out. The service may be slow; try again shortly.",
        ),
        (KEY_TASK_EXCEPTION, "{description} failed: {message}"),
    ])
});

#[derive(Clone, Debug, Default)]
pub struct Strings {
    table: HashMap<String, String>,
}

impl Strings {
    pub fn english() -> Self {
        Self::default()
    }

    /// Read `<dir>/<language>.json`; anything missing falls back to English.
    pub fn load(dir: &Path, language: &str) -> Self {
        let path = dir.join(format!("{language}.json"));
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                info!("No strings for `{language}` at {}; using English", path.display());
                return Self::english();
            }
        };
        match serde_json::from_str::<HashMap<String, String>>(&raw) {
            Ok(table) => {
                debug!("Loaded {} strings from {}", table.len(), path.display());
                Self { table }
            }
            Err(err) => {
                warn!("Failed to parse {} ({err}); using English", path.display());
                Self::english()
            }
        }
    }

    fn template<'a>(&'a self, key: &'a str) -> &'a str {
        self.table
            .get(key)
            .map(String::as_str)
            .or_else(|| ENGLISH.get(key).copied())
            .unwrap_or(key)
    }

    fn render(&self, key: &str, description: &str, message: &str) -> String {
        self.template(key)
            .replace("{description}", description)
            .replace("{message}", message)
    }
}

impl MessageSource for Strings {
    fn dialog_title(&self) -> String {
        self.template(KEY_DIALOG_TITLE).to_string()
    }

    fn task_failed(&self, description: &str) -> String {
        self.render(KEY_TASK_FAILED, description, "")
    }

    fn task_timed_out(&self, description: &str) -> String {
        self.render(KEY_TASK_TIMED_OUT, description, "")
    }

    fn task_exception(&self, description: &str, message: &str) -> String {
        self.render(KEY_TASK_EXCEPTION, description, message)
    }
}
