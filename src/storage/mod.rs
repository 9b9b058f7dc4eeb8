//! Persistence for tasks, results, and crawled pages

mod json_storage;
mod memory;

pub use json_storage::JsonStorage;
pub use memory::MemoryStorage;

use crate::models::{CrawlResult, CrawlStatus, CrawlTask, CrawledPage};
use thiserror::Error;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("unknown task: {0}")]
    UnknownTask(String),
}

/// Storage backend used by the orchestrator
///
/// Implementations must be safe to call from multiple worker tasks. Saving
/// a page must not lose previously saved pages for other tasks.
pub trait Persistence: Send + Sync {
    /// Records a newly submitted task
    fn save_task(&self, task: &CrawlTask) -> Result<(), StorageError>;

    /// Updates the lifecycle status of an existing task
    fn update_task_status(&self, task_id: &str, status: CrawlStatus) -> Result<(), StorageError>;

    /// Appends a crawled page under its task
    fn save_page(&self, task_id: &str, page: &CrawledPage) -> Result<(), StorageError>;

    /// Saves the final result of a task
    fn save_task_result(&self, result: &CrawlResult) -> Result<(), StorageError>;
}
