//! Adapters for the catalog, selection persistence and execution endpoints.
//!
//! Every request is spawned on the runtime and never awaited by the UI; the
//! outcome is pushed into shared state that the render loop reads.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Deserialize;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::catalog::matches_filter;
use crate::filter::CatalogRefresh;
use crate::models::{CatalogEntry, FilterSelection, Notice, Target};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} answered with {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("catalog file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Locks shared UI state, recovering the data if a task panicked mid-update.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Catalog data as last pushed by a fetch, plus the display flags.
#[derive(Debug, Default)]
pub struct CatalogState {
    pub data: Vec<CatalogEntry>,
    pub error: Option<String>,
    pub loading: bool,
    pub fetched_at: Option<DateTime<Local>>,
    /// Bumped by every refresh request; only the latest may land.
    generation: u64,
    /// Bumped whenever `data` is replaced.
    revision: u64,
}

impl CatalogState {
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.generation
    }

    /// Applies a fetch result unless a newer refresh has started since.
    pub fn finish(&mut self, generation: u64, result: Result<Vec<CatalogEntry>, BackendError>) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "dropping stale catalog response");
            return false;
        }
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = data;
                self.error = None;
                self.fetched_at = Some(Local::now());
            }
            Err(e) => {
                warn!(error = %e, "catalog refresh failed");
                self.data.clear();
                self.error = Some(e.to_string());
            }
        }
        self.revision += 1;
        true
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Saved selections and in-flight saves, keyed by target id.
#[derive(Debug, Default)]
pub struct PersistenceState {
    saving: HashSet<String>,
    saved: HashMap<String, Vec<String>>,
}

impl PersistenceState {
    pub fn is_saving(&self, target_id: &str) -> bool {
        self.saving.contains(target_id)
    }

    pub fn saved(&self, target_id: &str) -> Option<&[String]> {
        self.saved.get(target_id).map(Vec::as_slice)
    }

    pub fn begin_save(&mut self, target_id: &str) {
        self.saving.insert(target_id.to_string());
    }

    /// `checks` is `None` when the save failed and the old selection stands.
    pub fn finish_save(&mut self, target_id: &str, checks: Option<Vec<String>>) {
        self.saving.remove(target_id);
        if let Some(checks) = checks {
            self.saved.insert(target_id.to_string(), checks);
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogPayload {
    Wrapped { items: Vec<CatalogEntry> },
    Bare(Vec<CatalogEntry>),
}

impl CatalogPayload {
    fn into_items(self) -> Vec<CatalogEntry> {
        match self {
            CatalogPayload::Wrapped { items } => items,
            CatalogPayload::Bare(items) => items,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: String) -> Result<reqwest::Response, BackendError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status { status, url });
        }
        Ok(response)
    }

    pub async fn fetch_catalog(&self, filter: &FilterSelection) -> Result<Vec<CatalogEntry>, BackendError> {
        let url = self.endpoint("/api/v3/checks/catalog");
        let request = self.http.get(&url).query(&filter.query_params());
        let payload: CatalogPayload = self.send(request, url).await?.json().await?;
        Ok(payload.into_items())
    }

    pub async fn save_selection(&self, target: &Target, checks: &[String]) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("/api/{}/{}/checks", target.kind.collection(), target.id));
        let body = serde_json::json!({ "checks": checks });
        self.send(self.http.post(&url).json(&body), url).await?;
        Ok(())
    }

    pub async fn request_execution(&self, target: &Target, checks: &[String]) -> Result<(), BackendError> {
        let url = self.endpoint(&format!(
            "/api/{}/{}/checks/request_execution",
            target.kind.collection(),
            target.id
        ));
        let body = serde_json::json!({ "checks": checks });
        self.send(self.http.post(&url).json(&body), url).await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum CatalogSource {
    Remote(ApiClient),
    /// JSON file filtered locally; saves stay in memory.
    Local(PathBuf),
}

impl CatalogSource {
    pub async fn fetch_catalog(&self, filter: &FilterSelection) -> Result<Vec<CatalogEntry>, BackendError> {
        match self {
            CatalogSource::Remote(api) => api.fetch_catalog(filter).await,
            CatalogSource::Local(path) => {
                let entries = load_catalog_file(path).await?;
                Ok(entries.into_iter().filter(|e| matches_filter(e, filter)).collect())
            }
        }
    }

    async fn save_selection(&self, target: &Target, checks: &[String]) -> Result<(), BackendError> {
        match self {
            CatalogSource::Remote(api) => api.save_selection(target, checks).await,
            CatalogSource::Local(_) => Ok(()),
        }
    }

    async fn request_execution(&self, target: &Target, checks: &[String]) -> Result<(), BackendError> {
        match self {
            CatalogSource::Remote(api) => api.request_execution(target, checks).await,
            CatalogSource::Local(path) => {
                info!(target_id = %target.id, checks = ?checks, catalog = %path.display(), "execution requested without a remote backend");
                Ok(())
            }
        }
    }
}

pub async fn load_catalog_file(path: &Path) -> Result<Vec<CatalogEntry>, BackendError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|source| BackendError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let payload: CatalogPayload = serde_json::from_str(&raw).map_err(|source| BackendError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(payload.into_items())
}

/// Handle to the background side of the UI. Cheap to clone.
#[derive(Clone)]
pub struct Backend {
    source: Arc<CatalogSource>,
    rt: Handle,
    pub catalog: Arc<Mutex<CatalogState>>,
    pub persistence: Arc<Mutex<PersistenceState>>,
    pub notice: Arc<Mutex<Notice>>,
}

impl Backend {
    pub fn new(source: CatalogSource, rt: Handle) -> Self {
        Self {
            source: Arc::new(source),
            rt,
            catalog: Arc::default(),
            persistence: Arc::default(),
            notice: Arc::default(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(*self.source, CatalogSource::Remote(_))
    }

    pub fn is_saving(&self, target_id: &str) -> bool {
        lock(&self.persistence).is_saving(target_id)
    }

    pub fn saved_selection(&self, target_id: &str) -> Option<Vec<String>> {
        lock(&self.persistence).saved(target_id).map(<[String]>::to_vec)
    }

    /// Emits `(target id, target name, checks)` to the persistence endpoint.
    pub fn save_selection(&self, target: &Target, checks: Vec<String>) {
        info!(target_id = %target.id, target_name = %target.name, count = checks.len(), "saving check selection");
        lock(&self.persistence).begin_save(&target.id);

        let source = self.source.clone();
        let persistence = self.persistence.clone();
        let notice = self.notice.clone();
        let target = target.clone();
        self.rt.spawn(async move {
            let result = source.save_selection(&target, &checks).await;
            match result {
                Ok(()) => {
                    lock(&persistence).finish_save(&target.id, Some(checks));
                    debug!(target_id = %target.id, "check selection saved");
                }
                Err(e) => {
                    warn!(target_id = %target.id, error = %e, "saving check selection failed");
                    lock(&persistence).finish_save(&target.id, None);
                    lock(&notice).show(format!("Saving selection for {} failed: {}", target.name, e));
                }
            }
        });
    }

    pub fn request_execution(&self, target: &Target, checks: Vec<String>) {
        info!(target_id = %target.id, count = checks.len(), "requesting checks execution");
        lock(&self.notice).show_loading(format!("Requesting execution on {}...", target.name));

        let source = self.source.clone();
        let notice = self.notice.clone();
        let target = target.clone();
        self.rt.spawn(async move {
            let text = match source.request_execution(&target, &checks).await {
                Ok(()) => format!("Execution of {} checks requested on {}", checks.len(), target.name),
                Err(e) => {
                    warn!(target_id = %target.id, error = %e, "execution request failed");
                    format!("Execution request for {} failed: {}", target.name, e)
                }
            };
            lock(&notice).show(text);
        });
    }
}

impl CatalogRefresh for Backend {
    fn refresh(&self, filter: &FilterSelection) {
        let generation = lock(&self.catalog).begin();
        debug!(generation, filter = %filter, "refreshing catalog");

        let source = self.source.clone();
        let catalog = self.catalog.clone();
        let filter = filter.clone();
        self.rt.spawn(async move {
            let result = source.fetch_catalog(&filter).await;
            lock(&catalog).finish(generation, result);
        });
    }
}
