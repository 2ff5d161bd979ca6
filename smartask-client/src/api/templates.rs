//! Vacation and minimum-staffing template endpoints

use super::{csv_part, BackendClient};
use crate::error::Result;
use reqwest::multipart::Form;
use smartask_common::models::{MinimumTemplate, VacationTemplate, VacationTemplateRequest};

impl BackendClient {
    pub async fn list_vacation_templates(&self) -> Result<Vec<VacationTemplate>> {
        let url = self.endpoint(&["vacation", ""]);
        self.send_json(self.http().get(url), "list vacation templates")
            .await
    }

    pub async fn create_vacation_template(&self, request: &VacationTemplateRequest) -> Result<String> {
        let url = self.endpoint(&["vacation", ""]);
        tracing::info!(name = %request.name, employees = request.vacations.len(), "Creating vacation template");
        self.send_text(self.http().post(url).json(request), "create vacation template")
            .await
    }

    /// Ask the backend to generate a random vacation template
    pub async fn random_vacation_template(&self, name: &str) -> Result<String> {
        let url = self.endpoint(&["vacation", "random", name]);
        tracing::info!(name = %name, "Generating random vacation template");
        self.send_text(
            self.http().post(url),
            &format!("random vacation template '{}'", name),
        )
        .await
    }

    pub async fn list_minimum_templates(&self) -> Result<Vec<MinimumTemplate>> {
        let url = self.endpoint(&["reference", ""]);
        self.send_json(self.http().get(url), "list minimum templates")
            .await
    }

    pub async fn minimum_template(&self, id: &str) -> Result<MinimumTemplate> {
        let url = self.endpoint(&["reference", id]);
        self.send_json(self.http().get(url), &format!("minimum template {}", id))
            .await
    }

    /// Upload a minimum-staffing CSV as a new template
    pub async fn create_minimum_template(&self, name: &str, csv: String) -> Result<MinimumTemplate> {
        let mut url = self.endpoint(&["reference", "create"]);
        url.query_pairs_mut().append_pair("name", name);

        let form = Form::new().part("file", csv_part(csv, format!("{}.csv", name))?);

        tracing::info!(name = %name, "Importing minimum template");
        self.send_json(
            self.http().post(url).multipart(form),
            &format!("create minimum template '{}'", name),
        )
        .await
    }
}
