//! Background task status endpoints

use super::BackendClient;
use crate::error::Result;
use smartask_common::models::TaskStatus;

impl BackendClient {
    pub async fn list_tasks(&self) -> Result<Vec<TaskStatus>> {
        let url = self.endpoint(&["tasks"]);
        self.send_json(self.http().get(url), "list tasks").await
    }

    pub async fn task(&self, task_id: &str) -> Result<TaskStatus> {
        let url = self.endpoint(&["tasks", task_id]);
        self.send_json(self.http().get(url), &format!("task {}", task_id))
            .await
    }
}
