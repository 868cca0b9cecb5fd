use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Status(StatusCode, String),
    NotFound(String),
    Io(std::io::Error, String),
    Parsing(serde_json::Error, String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, path) => write!(f, "Network error for {path}: {e}"),
            ApiError::Status(status, path) => write!(f, "HTTP {status} for {path}"),
            ApiError::NotFound(path) => write!(f, "Not found: {path}"),
            ApiError::Io(e, path) => write!(f, "Could not read {path}: {e}"),
            ApiError::Parsing(e, path) => write!(f, "Parse error for {path}: {e}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network(e, _) => Some(e),
            ApiError::Io(e, _) => Some(e),
            ApiError::Parsing(e, _) => Some(e),
            _ => None,
        }
    }
}

/// Anything that can hand back a named JSON resource as text.
///
/// Paths are relative (`teams.json`, `derived/team_leaders.json`,
/// `boxscores/g1.json`); each implementation decides what they are relative to.
pub trait DataSource {
    fn fetch(&self, path: &str) -> impl Future<Output = ApiResult<String>> + Send;
}

/// Strip the prefixes ingest-written references carry so every path is
/// relative to the data root.
pub fn normalize_path(path: &str) -> String {
    let mut p = path.trim();
    loop {
        let stripped = p
            .strip_prefix('/')
            .or_else(|| p.strip_prefix("./"))
            .or_else(|| p.strip_prefix("data/"));
        match stripped {
            Some(rest) => p = rest,
            None => break,
        }
    }
    p.to_owned()
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Data served over HTTP(S) from a static JSON tree, e.g. `https://host/data`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("courtstats/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str) -> ApiResult<String> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url));
        }
        if !status.is_success() {
            return Err(ApiError::Status(status, url));
        }
        response.text().await.map_err(|e| ApiError::Network(e, url))
    }
}

impl DataSource for HttpSource {
    async fn fetch(&self, path: &str) -> ApiResult<String> {
        self.get(path).await
    }
}

// ---------------------------------------------------------------------------
// Local directory
// ---------------------------------------------------------------------------

/// Data laid out on disk the way the ingest tool writes it:
/// `{root}/teams.json`, `{root}/derived/…`, `{root}/boxscores/…`.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl DataSource for DirSource {
    async fn fetch(&self, path: &str) -> ApiResult<String> {
        let full = self.root.join(path);
        let shown = full.display().to_string();
        match tokio::fs::read_to_string(&full).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ApiError::NotFound(shown)),
            Err(e) => Err(ApiError::Io(e, shown)),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory snapshot
// ---------------------------------------------------------------------------

/// Fixed set of resources held in memory, for embedded snapshots and tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    resources: HashMap<String, String>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(path, body);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, body: impl Into<String>) {
        self.resources.insert(path.into(), body.into());
    }

    /// Number of `fetch` calls served so far, hits and misses alike.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl DataSource for MemorySource {
    async fn fetch(&self, path: &str) -> ApiResult<String> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(path.to_owned()))
    }
}
