//! KPI metric records and their display policy
//!
//! The backend computes the KPIs; this module only validates the payload
//! shape, labels the known metrics and decides how values and differences
//! are shown.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Known KPI metrics, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKey {
    TmFails,
    ConsecutiveDays,
    WorkHolidays,
    MissedVacationDays,
    MissedWorkDays,
    MissedTeamMin,
    SingleTeamViolations,
    ShiftBalance,
    TwoTeamPreferenceLevel,
}

impl MetricKey {
    pub const ALL: [MetricKey; 9] = [
        MetricKey::TmFails,
        MetricKey::ConsecutiveDays,
        MetricKey::WorkHolidays,
        MetricKey::MissedVacationDays,
        MetricKey::MissedWorkDays,
        MetricKey::MissedTeamMin,
        MetricKey::SingleTeamViolations,
        MetricKey::ShiftBalance,
        MetricKey::TwoTeamPreferenceLevel,
    ];

    /// Key used in backend payloads
    pub fn key(&self) -> &'static str {
        match self {
            MetricKey::TmFails => "tmFails",
            MetricKey::ConsecutiveDays => "consecutiveDays",
            MetricKey::WorkHolidays => "workHolidays",
            MetricKey::MissedVacationDays => "missedVacationDays",
            MetricKey::MissedWorkDays => "missedWorkDays",
            MetricKey::MissedTeamMin => "missedTeamMin",
            MetricKey::SingleTeamViolations => "singleTeamViolations",
            MetricKey::ShiftBalance => "shiftBalance",
            MetricKey::TwoTeamPreferenceLevel => "twoTeamPreferenceLevel",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::TmFails => "Afternoon-Morning Sequence",
            MetricKey::ConsecutiveDays => "Consecutive Work-Day Violations",
            MetricKey::WorkHolidays => "Holidays and Sundays Work Days",
            MetricKey::MissedVacationDays => "Missed Vacation Days",
            MetricKey::MissedWorkDays => "Missed Working Days",
            MetricKey::MissedTeamMin => "Missed Minimums",
            MetricKey::SingleTeamViolations => "Single Team Violations",
            MetricKey::ShiftBalance => "Shift Balance",
            MetricKey::TwoTeamPreferenceLevel => "Two Team Preference Level",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MetricKey::TmFails => "Number of times an employee works an afternoon shift followed by a morning shift the next day.",
            MetricKey::ConsecutiveDays => "Number of times employees exceeded the maximum allowed run of five consecutive working days.",
            MetricKey::WorkHolidays => "Number of work days falling on holidays and Sundays that exceed the predefined threshold.",
            MetricKey::MissedVacationDays => "Total variance between actual and target vacation days for all employees.",
            MetricKey::MissedWorkDays => "Total variance between actual and target working days for all employees.",
            MetricKey::MissedTeamMin => "Count of employees below the required minimum staffing level, per team, shift and day.",
            MetricKey::SingleTeamViolations => "Number of employees allowed to work only one team but worked in more than one.",
            MetricKey::ShiftBalance => "Percentage deviation of the most unbalanced shift distribution exhibited by any employee.",
            MetricKey::TwoTeamPreferenceLevel => "Median distribution of work between primary and secondary team for employees assigned to two teams.",
        }
    }

    /// Percentage-valued metrics are shown with a `%` suffix and no tone
    pub fn is_percentage(&self) -> bool {
        matches!(self, MetricKey::ShiftBalance | MetricKey::TwoTeamPreferenceLevel)
    }

    pub fn from_key(key: &str) -> Option<MetricKey> {
        MetricKey::ALL.into_iter().find(|m| m.key() == key)
    }
}

/// KPI payload produced by the backend analysis
///
/// Known keys are typed and default to zero when absent. Anything else the
/// backend sends is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiMetrics {
    #[serde(default)]
    pub tm_fails: f64,
    #[serde(default)]
    pub consecutive_days: f64,
    #[serde(default)]
    pub work_holidays: f64,
    #[serde(default)]
    pub missed_vacation_days: f64,
    #[serde(default)]
    pub missed_work_days: f64,
    #[serde(default)]
    pub missed_team_min: f64,
    #[serde(default)]
    pub single_team_violations: f64,
    #[serde(default)]
    pub shift_balance: f64,
    #[serde(default)]
    pub two_team_preference_level: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KpiMetrics {
    /// Validate a raw analysis result
    ///
    /// The result must be a JSON object whose known keys are numeric.
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::InvalidInput(format!(
                "analysis result must be a JSON object, got {}",
                json_kind(value)
            )));
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn get(&self, key: MetricKey) -> f64 {
        match key {
            MetricKey::TmFails => self.tm_fails,
            MetricKey::ConsecutiveDays => self.consecutive_days,
            MetricKey::WorkHolidays => self.work_holidays,
            MetricKey::MissedVacationDays => self.missed_vacation_days,
            MetricKey::MissedWorkDays => self.missed_work_days,
            MetricKey::MissedTeamMin => self.missed_team_min,
            MetricKey::SingleTeamViolations => self.single_team_violations,
            MetricKey::ShiftBalance => self.shift_balance,
            MetricKey::TwoTeamPreferenceLevel => self.two_team_preference_level,
        }
    }
}

/// Directional coloring of a value or difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    /// More violations
    Adverse,
    Favorable,
    /// Percentage metrics carry no direction
    Neutral,
}

/// Format a count: integral values without decimals, others with two
pub fn format_count(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn count_tone(value: f64) -> Tone {
    if value > 0.0 {
        Tone::Adverse
    } else {
        Tone::Favorable
    }
}

/// One metric line of a single-calendar report
#[derive(Debug, Clone, PartialEq)]
pub struct KpiLine {
    pub metric: MetricKey,
    pub value: f64,
    pub display: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    NoIssues,
    IssuesFound,
}

/// Summary of one calendar's KPIs
#[derive(Debug, Clone, PartialEq)]
pub struct KpiReport {
    pub lines: Vec<KpiLine>,
    pub issue_count: usize,
    pub status: ReportStatus,
}

impl KpiReport {
    pub fn from_metrics(metrics: &KpiMetrics) -> Self {
        let lines: Vec<KpiLine> = MetricKey::ALL
            .into_iter()
            .map(|metric| {
                let value = metrics.get(metric);
                if metric.is_percentage() {
                    KpiLine {
                        metric,
                        value,
                        display: format!("{}%", format_count(value)),
                        tone: Tone::Neutral,
                    }
                } else {
                    KpiLine {
                        metric,
                        value,
                        display: format_count(value),
                        tone: count_tone(value),
                    }
                }
            })
            .collect();

        // Shift balance is informational; the preference level still counts
        let issue_count = lines
            .iter()
            .filter(|line| line.metric != MetricKey::ShiftBalance && line.value > 0.0)
            .count();

        let status = if issue_count == 0 {
            ReportStatus::NoIssues
        } else {
            ReportStatus::IssuesFound
        };

        Self {
            lines,
            issue_count,
            status,
        }
    }
}

/// Difference of one metric between two calendars
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDiff {
    pub metric: MetricKey,
    pub one: f64,
    pub two: f64,
    /// `two - one`
    pub difference: f64,
    pub display: String,
    pub tone: Tone,
}

/// Compare two calendars metric by metric (side two minus side one)
pub fn compare_metrics(one: &KpiMetrics, two: &KpiMetrics) -> Vec<MetricDiff> {
    MetricKey::ALL
        .into_iter()
        .map(|metric| {
            let (a, b) = (one.get(metric), two.get(metric));
            let difference = b - a;
            let (display, tone) = if metric.is_percentage() {
                (format!("{:.2}%", difference), Tone::Neutral)
            } else {
                (format_count(difference), count_tone(difference))
            };
            MetricDiff {
                metric,
                one: a,
                two: b,
                difference,
                display,
                tone,
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
