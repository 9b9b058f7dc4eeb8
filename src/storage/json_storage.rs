//! JSON file storage
//!
//! Keeps three files under the data directory: `tasks.json`, `results.json`,
//! and `pages.json`, each a map keyed by task id. State is held in memory
//! and flushed to disk on every mutation, so a crash loses at most the
//! mutation in progress.

use super::{Persistence, StorageError};
use crate::models::{CrawlResult, CrawlStatus, CrawlTask, CrawledPage};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

const TASKS_FILE: &str = "tasks.json";
const RESULTS_FILE: &str = "results.json";
const PAGES_FILE: &str = "pages.json";

struct Inner {
    tasks: HashMap<String, CrawlTask>,
    results: HashMap<String, CrawlResult>,
    pages: HashMap<String, Vec<CrawledPage>>,
}

/// File-backed storage rooted at a data directory
pub struct JsonStorage {
    data_dir: PathBuf,
    inner: Mutex<Inner>,
}

impl JsonStorage {
    /// Opens (or creates) the data directory and loads any existing state
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        let inner = Inner {
            tasks: load_map(&data_dir.join(TASKS_FILE))?,
            results: load_map(&data_dir.join(RESULTS_FILE))?,
            pages: load_map(&data_dir.join(PAGES_FILE))?,
        };
        debug!(dir = %data_dir.display(), tasks = inner.tasks.len(), "opened json storage");

        Ok(Self {
            data_dir,
            inner: Mutex::new(inner),
        })
    }

    fn flush<T: serde::Serialize>(
        &self,
        file: &str,
        map: &HashMap<String, T>,
    ) -> Result<(), StorageError> {
        let path = self.data_dir.join(file);
        let json = serde_json::to_string_pretty(map)?;
        fs::write(&path, json)?;
        Ok(())
    }
}

fn load_map<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<HashMap<String, T>, StorageError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(HashMap::new());
    }
    Ok(serde_json::from_str(&contents)?)
}

impl Persistence for JsonStorage {
    fn save_task(&self, task: &CrawlTask) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.tasks.insert(task.task_id.clone(), task.clone());
        self.flush(TASKS_FILE, &inner.tasks)
    }

    fn update_task_status(&self, task_id: &str, status: CrawlStatus) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let task = inner
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StorageError::UnknownTask(task_id.to_string()))?;
        task.status = status;
        task.updated_at = Utc::now();
        match status {
            CrawlStatus::InProgress => task.started_at = Some(task.updated_at),
            s if s.is_terminal() => task.completed_at = Some(task.updated_at),
            _ => {}
        }
        self.flush(TASKS_FILE, &inner.tasks)
    }

    fn save_page(&self, task_id: &str, page: &CrawledPage) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .pages
            .entry(task_id.to_string())
            .or_default()
            .push(page.clone());
        self.flush(PAGES_FILE, &inner.pages)
    }

    fn save_task_result(&self, result: &CrawlResult) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.results.insert(result.task_id.clone(), result.clone());
        self.flush(RESULTS_FILE, &inner.results)
    }
}
