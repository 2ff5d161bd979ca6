//! Analysis submission
//!
//! Packages a calendar for the backend's analysis job and records the issued
//! request id in the caller's correlator. The result itself arrives later on
//! the broadcast topic.

use crate::api::{csv_part, BackendClient};
use crate::correlation::Correlator;
use crate::error::{ClientError, Result};
use reqwest::multipart::Form;
use serde_json::Value;
use smartask_common::grid::ScheduleGrid;
use smartask_common::models::{EmployeeTeamInfo, Schedule};
use smartask_common::{CalendarId, RequestId};
use tracing::info;

/// Everything the analysis job needs for one calendar
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub calendar_id: CalendarId,
    pub grid: ScheduleGrid,
    /// Vacation template payload, passed through as-is
    pub vacations: Value,
    /// Minimum-staffing template payload, passed through as-is
    pub minimums: Value,
    pub roster: Vec<EmployeeTeamInfo>,
    pub year: i32,
}

impl AnalysisInput {
    /// Gather the analysis input from a fetched schedule and its metadata
    ///
    /// Missing template payloads are sent as `null` and a missing roster as
    /// an empty list. A schedule without an id or year cannot be analyzed.
    pub fn from_schedule(schedule: &Schedule) -> Result<Self> {
        let calendar_id = schedule.calendar_id()?;
        let metadata = schedule.metadata.clone().unwrap_or_default();
        let year = metadata.year.ok_or_else(|| {
            ClientError::Common(smartask_common::Error::InvalidInput(format!(
                "schedule {} has no year in its metadata",
                calendar_id
            )))
        })?;

        Ok(Self {
            calendar_id,
            grid: ScheduleGrid::new(schedule.data.clone()),
            vacations: metadata.vacation_template_data.unwrap_or(Value::Null),
            minimums: metadata.minimums_template_data.unwrap_or(Value::Null),
            roster: metadata.employees_team_info,
            year,
        })
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.calendar_id)
    }

    /// Multipart body for `POST /schedules/analyze`
    pub fn to_form(&self) -> Result<Form> {
        let file = csv_part(self.grid.to_csv(), self.file_name())?;

        Ok(Form::new()
            .part("file", file)
            .text("vacations", to_json(&self.vacations)?)
            .text("minimums", to_json(&self.minimums)?)
            .text("employees", to_json(&self.roster)?)
            .text("year", self.year.to_string()))
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| ClientError::Common(e.into()))
}

/// Submit an analysis; returns the backend's request id
///
/// Nothing is registered here; see [`submit_and_register`].
pub async fn submit_analysis(client: &BackendClient, input: &AnalysisInput) -> Result<RequestId> {
    info!(
        calendar_id = %input.calendar_id,
        rows = input.grid.rows().len(),
        year = input.year,
        "Submitting calendar for analysis"
    );
    let request_id = client.post_analysis(input.to_form()?).await?;
    info!(calendar_id = %input.calendar_id, request_id = %request_id, "Analysis accepted");
    Ok(request_id)
}

/// Submit an analysis and map the issued request id to the calendar
///
/// The mapping is recorded once the response arrives. A result broadcast
/// before that moment is not recognized and is lost.
pub async fn submit_and_register(
    client: &BackendClient,
    correlator: &mut Correlator,
    input: &AnalysisInput,
) -> Result<RequestId> {
    let request_id = submit_analysis(client, input).await?;
    correlator.register(request_id.clone(), input.calendar_id.clone());
    Ok(request_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schedule(metadata: Value) -> Schedule {
        serde_json::from_value(json!({
            "id": "cal-A",
            "title": "March plan",
            "data": [["", "1"], ["E1", "M_A"]],
            "metadata": metadata,
        }))
        .unwrap()
    }

    #[test]
    fn test_from_schedule_reads_metadata() {
        let input = AnalysisInput::from_schedule(&schedule(json!({
            "year": 2025,
            "vacationTemplateData": {"E1": ["2025-01-02"]},
            "minimunsTemplateData": [["M", "2"]],
            "employeesTeamInfo": [{"name": "E1", "teams": ["A"]}],
        })))
        .unwrap();

        assert_eq!(input.calendar_id.as_str(), "cal-A");
        assert_eq!(input.year, 2025);
        assert_eq!(input.vacations["E1"][0], "2025-01-02");
        assert_eq!(input.minimums[0][1], "2");
        assert_eq!(input.roster[0].teams, vec!["A"]);
        assert_eq!(input.grid.to_csv(), ",1\nE1,M_A");
        assert_eq!(input.file_name(), "cal-A.csv");
    }

    #[test]
    fn test_missing_payloads_become_null() {
        let input = AnalysisInput::from_schedule(&schedule(json!({"year": "2025"}))).unwrap();
        assert!(input.vacations.is_null());
        assert!(input.minimums.is_null());
        assert!(input.roster.is_empty());
    }

    #[test]
    fn test_missing_year_rejected() {
        let err = AnalysisInput::from_schedule(&schedule(json!({}))).unwrap_err();
        assert!(err.to_string().contains("no year"));
    }
}
