//! Backend payload models
//!
//! Field names follow the backend's JSON (camelCase, including its
//! `minimuns` spelling). Timestamps and ids are decoded leniently because
//! the backend mixes string, numeric and object encodings.

use crate::ids::CalendarId;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// =============================================================================
// Schedules
// =============================================================================

/// A generated calendar: tabular shift data plus metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Row 0 is the header, column 0 the employee label
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub data: Vec<Vec<String>>,
    #[serde(default)]
    pub metadata: Option<ScheduleMetadata>,
}

impl Schedule {
    pub fn calendar_id(&self) -> Result<CalendarId> {
        self.id
            .clone()
            .map(CalendarId::new)
            .ok_or_else(|| Error::InvalidInput(format!("schedule '{}' has no id", self.title)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMetadata {
    #[serde(default)]
    pub schedule_name: Option<String>,
    #[serde(default)]
    pub algorithm_type: Option<String>,
    #[serde(default)]
    pub vacation_template_name: Option<String>,
    #[serde(default, rename = "minimunsTemplateName")]
    pub minimums_template_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub employees_team_info: Vec<EmployeeTeamInfo>,
    #[serde(default, deserialize_with = "lenient::year")]
    pub year: Option<i32>,
    #[serde(default)]
    pub vacation_template_data: Option<Value>,
    #[serde(default, rename = "minimunsTemplateData")]
    pub minimums_template_data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One roster line: an employee and the teams they may work in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeTeamInfo {
    pub name: String,
    #[serde(default)]
    pub teams: Vec<String>,
}

/// Body of `POST /schedules/generate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateScheduleRequest {
    pub title: String,
    pub algorithm: String,
    pub year: i32,
    pub init: NaiveDate,
    pub end: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// Maximum solver duration
    pub max_time: String,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacation_template: Option<String>,
    #[serde(rename = "minimuns", skip_serializing_if = "Option::is_none")]
    pub minimums: Option<String>,
}

/// Response of `POST /schedules/analyze`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub request_id: String,
}

// =============================================================================
// Background tasks
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    #[serde(rename = "COMPLETED", alias = "completed")]
    Completed,
    #[serde(rename = "FAILED", alias = "failed")]
    Failed,
    #[serde(rename = "in_progress", alias = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "pending", alias = "PENDING")]
    Pending,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::InProgress => "in progress",
            TaskState::Pending => "pending",
            TaskState::Unknown => "unknown",
        }
    }
}

/// Schedule request as stored with its task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub init: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub max_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub requested_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    pub status: TaskState,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "scheduleRequest")]
    pub request: Option<ScheduleRequest>,
}

/// Order tasks most recently updated first; tasks without a timestamp last
pub fn sort_recent_first(tasks: &mut [TaskStatus]) {
    tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

// =============================================================================
// Rule sets
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    #[default]
    Hard,
    Soft,
}

/// Free-form rule parameters; always a JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleParams(pub Map<String, Value>);

impl RuleParams {
    /// Parse editor text; blank text means no parameters
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        match serde_json::from_str::<Value>(trimmed)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(Error::InvalidInput("params must be a JSON object".to_string())),
        }
    }

    /// True for blank text or an empty object; invalid JSON is not empty
    pub fn is_empty_text(text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return true;
        }
        matches!(
            serde_json::from_str::<Value>(trimmed),
            Ok(Value::Object(map)) if map.is_empty()
        )
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub kind: RuleKind,
    /// e.g. per-employee-day, per-day-shift-team
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub params: RuleParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub rules: Vec<Rule>,
    #[serde(default, skip_serializing, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing, deserialize_with = "lenient::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Templates
// =============================================================================

/// Per-employee vacation days
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacationTemplate {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub vacations: Vec<Vec<String>>,
}

/// Body of `POST /vacation/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacationTemplateRequest {
    pub name: String,
    pub vacations: BTreeMap<String, Vec<String>>,
}

/// Minimum-staffing template (the backend calls these references)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimumTemplate {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, rename = "minimuns", deserialize_with = "lenient::null_as_default")]
    pub minimums: Vec<Vec<String>>,
}

// =============================================================================
// Roster
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default, deserialize_with = "lenient::id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub employees: Vec<Employee>,
}

const TEAM_PALETTE: [&str; 6] = ["primary", "secondary", "success", "warning", "info", "error"];

/// Assign a palette color to each distinct team, in first-seen order
pub fn team_color_mapping<'a, I>(teams: I) -> BTreeMap<String, &'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut mapping = BTreeMap::new();
    for team in teams {
        if !mapping.contains_key(team) {
            let color = TEAM_PALETTE[mapping.len() % TEAM_PALETTE.len()];
            mapping.insert(team.to_string(), color);
        }
    }
    mapping
}

// =============================================================================
// Holidays
// =============================================================================

/// Public holiday as returned by the holiday API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub date: NaiveDate,
    #[serde(default)]
    pub local_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country_code: String,
    /// Regional restriction; `None` means the holiday is national
    #[serde(default)]
    pub counties: Option<Vec<String>>,
}

impl Holiday {
    pub fn is_national(&self) -> bool {
        self.counties.is_none()
    }
}

/// Lenient decoders for fields the backend encodes inconsistently
mod lenient {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Accepts `"abc"`, `{"$oid": "abc"}`, `{"timestamp": .., "date": ..}` or numbers
    pub fn id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Object(map)) => {
                let oid = map.get("$oid").and_then(Value::as_str).map(str::to_string);
                Some(oid.unwrap_or_else(|| Value::Object(map).to_string()))
            }
            Some(other) => Some(other.to_string()),
        })
    }

    /// Accepts RFC 3339, zone-less ISO date-times (read as UTC) and epoch seconds
    pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => parse_timestamp(&s),
            Some(Value::Number(n)) => n.as_f64().and_then(|secs| {
                let whole = secs.trunc() as i64;
                let nanos = ((secs - secs.trunc()) * 1e9) as u32;
                Utc.timestamp_opt(whole, nanos).single()
            }),
            _ => None,
        })
    }

    pub(super) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    /// Accepts `2025` or `"2025"`
    pub fn year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }
}
