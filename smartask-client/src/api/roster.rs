//! Employee and team endpoints

use super::BackendClient;
use crate::error::Result;
use smartask_common::models::{Employee, Team};

impl BackendClient {
    pub async fn list_employees(&self) -> Result<Vec<Employee>> {
        let url = self.endpoint(&["api", "v1", "employees", ""]);
        self.send_json(self.http().get(url), "list employees").await
    }

    pub async fn create_employee(&self, employee: &Employee) -> Result<String> {
        let url = self.endpoint(&["api", "v1", "employees", ""]);
        tracing::info!(name = %employee.name, "Creating employee");
        self.send_text(self.http().post(url).json(employee), "create employee")
            .await
    }

    pub async fn update_employee(&self, id: &str, name: &str) -> Result<String> {
        let url = self.endpoint(&["api", "v1", "employees", id]);
        let body = serde_json::json!({ "name": name });
        self.send_text(
            self.http().put(url).json(&body),
            &format!("update employee {}", id),
        )
        .await
    }

    pub async fn delete_employee(&self, id: &str) -> Result<String> {
        let url = self.endpoint(&["api", "v1", "employees", id]);
        self.send_text(self.http().delete(url), &format!("delete employee {}", id))
            .await
    }

    pub async fn list_teams(&self) -> Result<Vec<Team>> {
        let url = self.endpoint(&["api", "v1", "teams", ""]);
        self.send_json(self.http().get(url), "list teams").await
    }
}
