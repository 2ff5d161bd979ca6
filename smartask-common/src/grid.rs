//! Schedule grid handling
//!
//! A schedule is a table of shift codes: row 0 is the header, column 0 the
//! employee label, and column `n` (n >= 1) is day `n` of the year.
//!
//! Shift codes seen in practice: `0` (break), `F` (vacation), `M_A`, `M_B`
//! (morning shift per team), `T_A`, `T_B` (afternoon), `N_A`, `N_B` (night).

use crate::{Error, Result};
use chrono::{Datelike, NaiveDate, Weekday};

/// Header color for days that are public holidays
pub const HOLIDAY_COLOR: &str = "#800080";

/// Tabular schedule data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleGrid {
    rows: Vec<Vec<String>>,
}

impl ScheduleGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Comma-joined cells, newline-joined rows
    ///
    /// Cells must not contain commas or newlines; no quoting is applied.
    pub fn to_csv(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join(","))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Inverse of [`ScheduleGrid::to_csv`]
    ///
    /// Tolerates `\r\n` line endings and one trailing newline.
    pub fn from_csv(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        let body = text.strip_suffix('\n').unwrap_or(text);
        let rows = body
            .split('\n')
            .map(|line| {
                line.strip_suffix('\r')
                    .unwrap_or(line)
                    .split(',')
                    .map(str::to_string)
                    .collect()
            })
            .collect();
        Self { rows }
    }

    /// Label column plus days `start_day..=end_day` of `month`
    pub fn month_slice(&self, year: i32, month: u32, start_day: u32, end_day: u32) -> Result<Self> {
        let days = days_in_month(year, month)
            .ok_or_else(|| Error::InvalidInput(format!("invalid month {}", month)))?;
        if start_day == 0 || start_day > end_day || end_day > days {
            return Err(Error::InvalidInput(format!(
                "day range {}..={} outside 1..={} for month {}",
                start_day, end_day, days, month
            )));
        }

        let offset = day_of_year_offset(year, month);
        let start = (offset + start_day) as usize;
        let end = (offset + end_day + 1) as usize;

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut sliced = Vec::with_capacity(end - start + 1);
                sliced.push(row.first().cloned().unwrap_or_default());
                let upper = end.min(row.len());
                if start < upper {
                    sliced.extend(row[start..upper].iter().cloned());
                }
                sliced
            })
            .collect();

        Ok(Self { rows })
    }
}

/// Number of days in `month` (1-12), honoring leap years
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

/// Days of the year before the first of `month`
fn day_of_year_offset(year: i32, month: u32) -> u32 {
    (1..month).filter_map(|m| days_in_month(year, m)).sum()
}

pub fn weekday_of(year: i32, month: u32, day: u32) -> Option<Weekday> {
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.weekday())
}

/// Display abbreviation of a shift code
pub fn abbreviate(cell: &str) -> String {
    match cell.to_uppercase().as_str() {
        "0" => String::new(),
        "F" => "V".to_string(),
        "T_A" => "A_A".to_string(),
        "T_B" => "A_B".to_string(),
        "N_A" | "N_B" => "A_N".to_string(),
        _ => cell.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Break,
    Vacation,
    Afternoon,
    Morning,
    Night,
    Other,
}

impl CellKind {
    pub fn color(&self) -> Option<&'static str> {
        match self {
            CellKind::Break => Some("#ffffff"),
            CellKind::Vacation => Some("#ffcccb"),
            CellKind::Afternoon => Some("#f9e79f"),
            CellKind::Morning => Some("#d4edda"),
            CellKind::Night => Some("#9eb3caff"),
            CellKind::Other => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CellKind::Break => "Break",
            CellKind::Vacation => "Vacation",
            CellKind::Afternoon => "Afternoon",
            CellKind::Morning => "Morning",
            CellKind::Night => "Night",
            CellKind::Other => "Other",
        }
    }
}

/// Color category of a shift code
///
/// Checked in order; the first matching rule wins, so `M_A` is colored as
/// an afternoon cell and `T_A` as a morning cell.
pub fn classify(cell: &str) -> CellKind {
    let normalized = cell.to_uppercase();
    if normalized == "0" {
        CellKind::Break
    } else if normalized == "F" {
        CellKind::Vacation
    } else if normalized.contains('M') {
        CellKind::Afternoon
    } else if normalized.contains('T') {
        CellKind::Morning
    } else if normalized.contains('N') {
        CellKind::Night
    } else {
        CellKind::Other
    }
}

/// Legend entries shown under a rendered calendar
pub fn legend() -> Vec<(&'static str, &'static str)> {
    let mut entries = vec![(CellKind::Break.label(), "#ffffff"), ("Holiday", HOLIDAY_COLOR)];
    for kind in [CellKind::Vacation, CellKind::Morning, CellKind::Afternoon, CellKind::Night] {
        if let Some(color) = kind.color() {
            entries.push((kind.label(), color));
        }
    }
    entries
}
