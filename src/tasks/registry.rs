use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Task, TaskKind, TaskResult, TaskStatus};

#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, Task>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, kind: TaskKind) -> Task {
        let task = Task::new(format!("task_{}", Uuid::new_v4().simple()), kind);
        self.tasks
            .write()
            .await
            .insert(task.task_id.clone(), task.clone());
        task
    }

    // Progress never goes backwards; terminal tasks are left untouched.
    pub async fn advance(&self, task_id: &str, status: TaskStatus, progress: u8) {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(task_id) else {
            return;
        };
        if task.status.is_terminal() || status.is_terminal() {
            return;
        }
        task.status = status;
        task.progress = task.progress.max(progress.min(100));
        task.updated_at = Utc::now();
    }

    pub async fn complete(&self, task_id: &str, result: TaskResult) {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.get_mut(task_id) {
            if task.status.is_terminal() {
                return;
            }
            task.status = TaskStatus::Completed;
            task.progress = 100;
            task.result = Some(result);
            task.updated_at = Utc::now();
        }
    }

    pub async fn fail(&self, task_id: &str, error: impl Into<String>) {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.get_mut(task_id) {
            if task.status.is_terminal() {
                return;
            }
            task.status = TaskStatus::Failed;
            task.progress = 0;
            task.error = Some(error.into());
            task.updated_at = Utc::now();
        }
    }

    pub async fn get(&self, task_id: &str) -> Result<Task> {
        self.tasks
            .read()
            .await
            .get(task_id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
    }

    pub async fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.read().await.values().cloned().collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }
}
