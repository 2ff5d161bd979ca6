//! Schedule generation form

use crate::error::{ClientError, FieldErrors, Result};
use chrono::{DateTime, NaiveDate, Utc};
use smartask_common::models::GenerateScheduleRequest;

/// Solver algorithms accepted by the backend: (value, label)
pub const ALGORITHMS: [(&str, &str); 4] = [
    ("CSP Scheduling", "Constraint Propagation Search"),
    ("hill climbing", "Hill Climbing"),
    ("genetic_algorithm", "Genetic Algorithm"),
    ("linear programming", "Integer Linear Programming"),
];

pub const DEFAULT_ALGORITHM: &str = "CSP Scheduling";

/// Raw user input for a generation request
///
/// `year` and `max_duration` are kept as typed text so that validation can
/// reject signs, decimals and blanks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationForm {
    pub title: String,
    pub year: String,
    pub max_duration: String,
    /// Blank selects [`DEFAULT_ALGORITHM`]
    pub algorithm: String,
    pub team: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub vacation_template: Option<String>,
    pub minimum_template: Option<String>,
}

impl GenerationForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if self.title.trim().is_empty() {
            errors.insert("title".to_string(), "Title is required".to_string());
        }

        let year = positive_integer(&self.year);
        if year.is_none() {
            errors.insert("year".to_string(), "Year must be a positive integer".to_string());
        }
        if positive_integer(&self.max_duration).is_none() {
            errors.insert(
                "max_duration".to_string(),
                "Duration must be a positive integer".to_string(),
            );
        }

        let algorithm = self.algorithm.trim();
        if !algorithm.is_empty() && !ALGORITHMS.iter().any(|(value, _)| *value == algorithm) {
            errors.insert(
                "algorithm".to_string(),
                format!("Unknown algorithm '{}'", algorithm),
            );
        }

        if let Some(year) = year {
            match self.period(year) {
                Some((start, end)) if start > end => {
                    errors.insert("end".to_string(), "End date must not precede start date".to_string());
                }
                Some(_) => {}
                None => {
                    errors.insert("year".to_string(), "Year is out of range".to_string());
                }
            }
        }

        errors
    }

    /// Validate and build the request body, stamped with `requested_at`
    pub fn build(&self, requested_at: DateTime<Utc>) -> Result<GenerateScheduleRequest> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(ClientError::Validation(errors));
        }

        // Both parse after a clean validation
        let year = positive_integer(&self.year).unwrap_or_default();
        let (init, end) = self
            .period(year)
            .ok_or_else(|| ClientError::InvalidState(format!("year {} out of range", year)))?;

        let algorithm = match self.algorithm.trim() {
            "" => DEFAULT_ALGORITHM.to_string(),
            value => value.to_string(),
        };

        Ok(GenerateScheduleRequest {
            title: self.title.trim().to_string(),
            algorithm,
            year,
            init,
            end,
            team: non_blank(&self.team),
            max_time: self.max_duration.clone(),
            requested_at,
            vacation_template: non_blank(&self.vacation_template),
            minimums: non_blank(&self.minimum_template),
        })
    }

    /// Start and end dates, defaulting to the whole year
    fn period(&self, year: i32) -> Option<(NaiveDate, NaiveDate)> {
        let start = match self.start {
            Some(date) => date,
            None => NaiveDate::from_ymd_opt(year, 1, 1)?,
        };
        let end = match self.end {
            Some(date) => date,
            None => NaiveDate::from_ymd_opt(year, 12, 31)?,
        };
        Some((start, end))
    }
}

/// ASCII digits only, value > 0
fn positive_integer(text: &str) -> Option<i32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<i32>().ok().filter(|value| *value > 0)
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> GenerationForm {
        GenerationForm {
            title: "Plan 2025".to_string(),
            year: "2025".to_string(),
            max_duration: "60".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_positive_integer_rules() {
        assert_eq!(positive_integer("2025"), Some(2025));
        assert_eq!(positive_integer("0"), None);
        assert_eq!(positive_integer("-3"), None);
        assert_eq!(positive_integer("+3"), None);
        assert_eq!(positive_integer("2.5"), None);
        assert_eq!(positive_integer(""), None);
        assert_eq!(positive_integer("99999999999"), None);
    }

    #[test]
    fn test_empty_form_reports_every_field() {
        let errors = GenerationForm::default().validate();
        assert_eq!(errors["title"], "Title is required");
        assert_eq!(errors["year"], "Year must be a positive integer");
        assert_eq!(errors["max_duration"], "Duration must be a positive integer");
        assert!(!errors.contains_key("algorithm"));
    }

    #[test]
    fn test_build_defaults_period_and_algorithm() {
        let requested_at = Utc::now();
        let request = valid_form().build(requested_at).unwrap();

        assert_eq!(request.algorithm, DEFAULT_ALGORITHM);
        assert_eq!(request.init, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(request.end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(request.max_time, "60");
        assert!(request.minimums.is_none());

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["maxTime"], "60");
        assert!(json.get("minimuns").is_none());
    }

    #[test]
    fn test_reversed_period_rejected() {
        let form = GenerationForm {
            start: NaiveDate::from_ymd_opt(2025, 6, 1),
            end: NaiveDate::from_ymd_opt(2025, 5, 1),
            ..valid_form()
        };
        match form.build(Utc::now()) {
            Err(ClientError::Validation(errors)) => assert!(errors.contains_key("end")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_templates_and_unknown_algorithm() {
        let form = GenerationForm {
            algorithm: "hill climbing".to_string(),
            minimum_template: Some("  base ".to_string()),
            vacation_template: Some(" ".to_string()),
            ..valid_form()
        };
        let request = form.build(Utc::now()).unwrap();
        assert_eq!(request.minimums.as_deref(), Some("base"));
        assert!(request.vacation_template.is_none());

        let form = GenerationForm {
            algorithm: "annealing".to_string(),
            ..valid_form()
        };
        assert!(form.validate().contains_key("algorithm"));
    }
}
