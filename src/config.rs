use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_API_BASE: &str = "https://api.trakt.tv";
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEBUG_ENV_VAR: &str = "TRAKT_SHELL_DEBUG";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base: String,
    pub client_id: Option<String>,
    pub language: String,
    pub strings_dir: PathBuf,
    pub task_timeout: Duration,
    pub cache_ttl: Duration,
    pub debug_attached: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            client_id: None,
            language: "en".to_string(),
            strings_dir: PathBuf::from("lang"),
            task_timeout: Duration::from_secs(DEFAULT_TASK_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            debug_attached: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    api_base: Option<String>,
    #[serde(alias = "api_key")]
    client_id: Option<String>,
    language: Option<String>,
    strings_dir: Option<String>,
    task_timeout_secs: Option<u64>,
    cache_ttl_secs: Option<u64>,
    debug_attached: Option<bool>,
}

/// Load `config.json` from the working directory, then apply the debug env override.
pub fn load_config() -> AppConfig {
    let mut cfg = load_config_from(Path::new("config.json"));
    if env::var_os(DEBUG_ENV_VAR).is_some() {
        info!("{DEBUG_ENV_VAR} set; task timeouts disabled");
        cfg.debug_attached = true;
    }
    cfg
}

pub fn load_config_from(cfg_path: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();

    match fs::read_to_string(cfg_path) {
        Ok(raw) => match serde_json::from_str::<RawConfig>(&raw) {
            Ok(parsed) => {
                if let Some(base) = parsed.api_base {
                    cfg.api_base = base.trim_end_matches('/').to_string();
                }
                if parsed.client_id.is_some() {
                    cfg.client_id = parsed.client_id;
                    if raw.contains("\"api_key\"") {
                        warn!("`api_key` is deprecated; rename it to `client_id` in config.json.");
                    }
                }
                if let Some(lang) = parsed.language {
                    let lang = lang.trim();
                    if !lang.is_empty() {
                        cfg.language = lang.to_ascii_lowercase();
                    }
                }
                if let Some(dir) = parsed.strings_dir {
                    cfg.strings_dir = PathBuf::from(dir);
                }
                match parsed.task_timeout_secs {
                    Some(0) => warn!("task_timeout_secs must be positive; keeping default."),
                    Some(secs) => cfg.task_timeout = Duration::from_secs(secs),
                    None => {}
                }
                if let Some(secs) = parsed.cache_ttl_secs {
                    cfg.cache_ttl = Duration::from_secs(secs);
                }
                if let Some(flag) = parsed.debug_attached {
                    cfg.debug_attached = flag;
                }
                info!("Loaded config from {}", cfg_path.display());
            }
            Err(err) => {
                warn!("Failed to parse {} ({}). Using defaults.", cfg_path.display(), err);
            }
        },
        Err(_) => {
            info!("No {} found; using defaults", cfg_path.display());
        }
    }

    cfg
}
