// src/api.rs — thin blocking Trakt client with a short-lived response cache.
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::task::{CancelToken, Cancelled};

const PAGE_LIMIT: u32 = 40;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(u16),
    #[error("bad response: {0}")]
    Decode(String),
    #[error("cancelled")]
    Cancelled(#[from] Cancelled),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListKind {
    TrendingMovies,
    TrendingShows,
    PopularMovies,
    PopularShows,
    Search(String),
}

impl ListKind {
    pub const BROWSABLE: [Self; 4] = [
        Self::TrendingMovies,
        Self::TrendingShows,
        Self::PopularMovies,
        Self::PopularShows,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::TrendingMovies => "Trending movies",
            Self::TrendingShows => "Trending shows",
            Self::PopularMovies => "Popular movies",
            Self::PopularShows => "Popular shows",
            Self::Search(_) => "Search",
        }
    }

    fn path(&self) -> String {
        match self {
            Self::TrendingMovies => format!("/movies/trending?limit={PAGE_LIMIT}"),
            Self::TrendingShows => format!("/shows/trending?limit={PAGE_LIMIT}"),
            Self::PopularMovies => format!("/movies/popular?limit={PAGE_LIMIT}"),
            Self::PopularShows => format!("/shows/popular?limit={PAGE_LIMIT}"),
            Self::Search(q) => format!(
                "/search/movie,show?query={}&limit={PAGE_LIMIT}",
                urlencoding::encode(q.trim())
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListItem {
    pub title: String,
    pub year: Option<i32>,
    pub slug: Option<String>,
}

pub fn url_to_cache_key(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

/// In-memory JSON cache; entries older than `ttl` are treated as missing.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Value)>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, url: &str) -> Option<Value> {
        let key = url_to_cache_key(url);
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let found = entries
            .get(&key)
            .map(|(stored, v)| (stored.elapsed() < self.ttl, v.clone()));
        match found {
            Some((true, v)) => Some(v),
            Some((false, _)) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, url: &str, value: Value) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(url_to_cache_key(url), (Instant::now(), value));
    }
}

pub struct TraktClient {
    http: Client,
    base: String,
    cache: ResponseCache,
}

impl TraktClient {
    pub fn new(cfg: &AppConfig) -> Result<Self, ApiError> {
        use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("trakt-api-version", HeaderValue::from_static("2"));
        match cfg.client_id.as_deref().map(HeaderValue::from_str) {
            Some(Ok(v)) => {
                headers.insert("trakt-api-key", v);
            }
            Some(Err(_)) => warn!("client_id contains invalid header characters; ignoring"),
            None => warn!("No client_id in config.json; the API will reject requests"),
        }

        let http = Client::builder()
            .user_agent(concat!("trakt-shell/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(20))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base: cfg.api_base.clone(),
            cache: ResponseCache::new(cfg.cache_ttl),
        })
    }

    /// Fetch one list page. Checks `cancel` before the request and once the
    /// response is in, so an aborted task never touches the cache.
    pub fn fetch_list(&self, kind: &ListKind, cancel: &CancelToken) -> Result<Vec<ListItem>, ApiError> {
        let url = format!("{}{}", self.base, kind.path());
        ensure_live(cancel, &url)?;
        if let Some(hit) = self.cache.get(&url) {
            debug!("cache hit for {url}");
            return Ok(parse_items(&hit));
        }

        let resp = self.http.get(&url).send()?;
        ensure_live(cancel, &url)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        let body = resp.text()?;
        let value: Value =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        ensure_live(cancel, &url)?;

        self.cache.put(&url, value.clone());
        Ok(parse_items(&value))
    }
}

fn ensure_live(cancel: &CancelToken, url: &str) -> Result<(), ApiError> {
    cancel.check().map_err(|c| {
        debug!(reason = ?cancel.reason(), "abandoning {url}");
        ApiError::from(c)
    })
}

/// Pull `{title, year, slug}` out of list responses. Trending and search wrap
/// the media object under `movie` / `show`; popular lists it bare.
pub fn parse_items(value: &Value) -> Vec<ListItem> {
    let Some(arr) = value.as_array() else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(|entry| {
            let media = entry
                .get("movie")
                .or_else(|| entry.get("show"))
                .unwrap_or(entry);
            let title = media.get("title")?.as_str()?.trim();
            if title.is_empty() {
                return None;
            }
            Some(ListItem {
                title: title.to_string(),
                year: media
                    .get("year")
                    .and_then(Value::as_i64)
                    .and_then(|y| i32::try_from(y).ok()),
                slug: media
                    .pointer("/ids/slug")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect()
}
