//! FileGateway - one JSON file per task under a board directory
//!
//! ```text
//! .taskboard/
//! └── tasks/
//!     └── {id}.json
//! ```

use super::{GatewayResult, PersistenceGateway, TaskFilter};
use crate::error::GatewayError;
use crate::types::{LanePosition, NewTask, Task, TaskId, TaskPatch};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Gateway backed by a directory of task files
#[derive(Debug, Clone)]
pub struct FileGateway {
    /// Path to the board directory
    root: PathBuf,
}

impl FileGateway {
    /// Create a gateway for the given board directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root board directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to tasks directory
    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    /// Path to a task's JSON file
    pub fn task_path(&self, id: &TaskId) -> PathBuf {
        self.tasks_dir().join(format!("{}.json", id))
    }

    /// Check if the board directory has been created
    pub fn is_initialized(&self) -> bool {
        self.tasks_dir().is_dir()
    }

    /// Create the directory structure. Idempotent.
    pub async fn create_directories(&self) -> GatewayResult<()> {
        fs::create_dir_all(self.tasks_dir()).await?;
        Ok(())
    }

    /// Read a task file
    pub async fn read_task(&self, id: &TaskId) -> GatewayResult<Task> {
        let path = self.task_path(id);
        if !path.exists() {
            return Err(GatewayError::NotFound { id: id.to_string() });
        }

        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write a task file (atomic write via temp file)
    pub async fn write_task(&self, task: &Task) -> GatewayResult<()> {
        let path = self.task_path(&task.id);
        let content = serde_json::to_string_pretty(task)?;
        atomic_write(&path, content.as_bytes()).await
    }

    /// List all task IDs by reading the tasks directory
    pub async fn list_task_ids(&self) -> GatewayResult<Vec<TaskId>> {
        let tasks_dir = self.tasks_dir();
        if !tasks_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&tasks_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(TaskId::from_string(stem));
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    async fn modify(&self, id: &TaskId, f: impl FnOnce(&mut Task) + Send) -> GatewayResult<()> {
        let mut task = self.read_task(id).await?;
        f(&mut task);
        self.write_task(&task).await
    }
}

#[async_trait]
impl PersistenceGateway for FileGateway {
    async fn list(&self, filter: &TaskFilter) -> GatewayResult<Vec<Task>> {
        let ids = self.list_task_ids().await?;
        let mut tasks = Vec::with_capacity(ids.len());
        for id in ids {
            let task = self.read_task(&id).await?;
            if filter.matches(&task) {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }

    async fn create(&self, input: &NewTask) -> GatewayResult<TaskId> {
        let task = Task::from_new(TaskId::new(), input);
        self.write_task(&task).await?;
        Ok(task.id)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<()> {
        self.modify(id, |task| task.apply_patch(patch)).await
    }

    async fn delete(&self, id: &TaskId) -> GatewayResult<()> {
        let path = self.task_path(id);
        if !path.exists() {
            return Err(GatewayError::NotFound { id: id.to_string() });
        }
        fs::remove_file(&path).await?;
        Ok(())
    }

    async fn reorder(&self, id: &TaskId, position: &LanePosition) -> GatewayResult<()> {
        self.modify(id, |task| task.apply_position(position)).await
    }
}

/// Write to a temp file in the same directory, then rename over the target
async fn atomic_write(path: &Path, content: &[u8]) -> GatewayResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).await?;
    fs::rename(&temp_path, path).await?;

    Ok(())
}
