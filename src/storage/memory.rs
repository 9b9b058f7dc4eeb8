//! In-memory storage, used by tests and short-lived runs

use super::{Persistence, StorageError};
use crate::models::{CrawlResult, CrawlStatus, CrawlTask, CrawledPage};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

/// Storage backend that keeps everything in process memory
#[derive(Default)]
pub struct MemoryStorage {
    tasks: Mutex<HashMap<String, CrawlTask>>,
    results: Mutex<HashMap<String, CrawlResult>>,
    pages: Mutex<HashMap<String, Vec<CrawledPage>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a stored task, if present
    pub fn task(&self, task_id: &str) -> Option<CrawlTask> {
        self.tasks.lock().unwrap().get(task_id).cloned()
    }

    /// Snapshot of a stored result, if present
    pub fn result(&self, task_id: &str) -> Option<CrawlResult> {
        self.results.lock().unwrap().get(task_id).cloned()
    }

    /// Pages saved under a task so far
    pub fn pages(&self, task_id: &str) -> Vec<CrawledPage> {
        self.pages
            .lock()
            .unwrap()
            .get(task_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl Persistence for MemoryStorage {
    fn save_task(&self, task: &CrawlTask) -> Result<(), StorageError> {
        self.tasks
            .lock()
            .unwrap()
            .insert(task.task_id.clone(), task.clone());
        Ok(())
    }

    fn update_task_status(&self, task_id: &str, status: CrawlStatus) -> Result<(), StorageError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| StorageError::UnknownTask(task_id.to_string()))?;
        task.status = status;
        task.updated_at = Utc::now();
        match status {
            CrawlStatus::InProgress => task.started_at = Some(task.updated_at),
            s if s.is_terminal() => task.completed_at = Some(task.updated_at),
            _ => {}
        }
        Ok(())
    }

    fn save_page(&self, task_id: &str, page: &CrawledPage) -> Result<(), StorageError> {
        self.pages
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default()
            .push(page.clone());
        Ok(())
    }

    fn save_task_result(&self, result: &CrawlResult) -> Result<(), StorageError> {
        self.results
            .lock()
            .unwrap()
            .insert(result.task_id.clone(), result.clone());
        Ok(())
    }
}
