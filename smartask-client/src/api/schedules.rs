//! Schedule endpoints: generation, listing, lookup, cleanup and analysis

use super::BackendClient;
use crate::error::Result;
use reqwest::multipart::Form;
use smartask_common::models::{AnalyzeResponse, GenerateScheduleRequest, Schedule};
use smartask_common::{CalendarId, RequestId};

impl BackendClient {
    /// Submit a schedule generation request
    ///
    /// Returns the backend's acknowledgement text. Generation runs as a
    /// background task; see [`BackendClient::list_tasks`].
    pub async fn generate_schedule(&self, request: &GenerateScheduleRequest) -> Result<String> {
        let url = self.endpoint(&["schedules", "generate"]);
        tracing::info!(title = %request.title, year = request.year, "Requesting schedule generation");
        self.send_text(self.http().post(url).json(request), "generate schedule")
            .await
    }

    pub async fn list_schedules(&self) -> Result<Vec<Schedule>> {
        let url = self.endpoint(&["schedules", "fetch"]);
        self.send_json(self.http().get(url), "list schedules").await
    }

    pub async fn fetch_schedule(&self, id: &CalendarId) -> Result<Schedule> {
        let url = self.endpoint(&["schedules", "fetch", id.as_str()]);
        self.send_json(self.http().get(url), &format!("schedule {}", id))
            .await
    }

    /// Resolve a calendar by its human title
    pub async fn schedule_by_title(&self, title: &str) -> Result<Schedule> {
        let url = self.endpoint(&["schedules", title]);
        self.send_json(self.http().get(url), &format!("schedule titled '{}'", title))
            .await
    }

    /// Delete every stored schedule
    pub async fn clean_schedules(&self) -> Result<()> {
        let url = self.endpoint(&["clearnreset", "clean-schedules"]);
        tracing::info!("Deleting all schedules");
        self.send_text(self.http().delete(url), "clean schedules")
            .await?;
        Ok(())
    }

    /// Post a prepared analysis form; see [`crate::submission`]
    pub async fn post_analysis(&self, form: Form) -> Result<RequestId> {
        let url = self.endpoint(&["schedules", "analyze"]);
        let response: AnalyzeResponse = self
            .send_json(self.http().post(url).multipart(form), "submit analysis")
            .await?;
        Ok(RequestId::new(response.request_id))
    }
}
