//! Calendar windows during which a policy is in force.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::error::InterventionError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Whether `end` belongs to the window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WindowEnd {
    /// `[start, end)`, the default for every policy.
    Exclusive,
    /// `[start, end]`
    Inclusive,
}

/// The dates between which a policy applies.
///
/// An inverted window (`start >= end` for an exclusive end) is accepted but never activates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PolicyWindow {
    start: NaiveDate,
    end: NaiveDate,
    end_kind: WindowEnd,
}

impl PolicyWindow {
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> PolicyWindow {
        PolicyWindow {
            start,
            end,
            end_kind: WindowEnd::Exclusive,
        }
    }

    #[must_use]
    pub fn with_end(self, end_kind: WindowEnd) -> PolicyWindow {
        PolicyWindow { end_kind, ..self }
    }

    /// The window used when a record leaves its dates out: 1900-01-01 to 2100-01-01.
    #[must_use]
    pub fn unbounded() -> PolicyWindow {
        PolicyWindow::new(default_start(), default_end())
    }

    /// Reads a window from record values, see [`read_date`].
    pub fn from_values(start: &Value, end: &Value) -> Result<PolicyWindow, InterventionError> {
        Ok(PolicyWindow::new(read_date(start)?, read_date(end)?))
    }

    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn end_kind(&self) -> WindowEnd {
        self.end_kind
    }

    #[must_use]
    pub fn is_active(&self, date: NaiveDate) -> bool {
        match self.end_kind {
            WindowEnd::Exclusive => self.start <= date && date < self.end,
            WindowEnd::Inclusive => self.start <= date && date <= self.end,
        }
    }

    /// The dates on which a stateful policy's mutation is applied: always `[start, end)`, so
    /// the collaborator is back to its original state on `end` whatever `end_kind` says.
    #[must_use]
    pub fn is_mutating(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// False if no date can ever be active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self.end_kind {
            WindowEnd::Exclusive => self.start >= self.end,
            WindowEnd::Inclusive => self.start > self.end,
        }
    }
}

pub(crate) fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

pub(crate) fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2100, 1, 1).unwrap_or(NaiveDate::MAX)
}

/// Reads a calendar date from a record value.
///
/// Accepts `"YYYY-MM-DD"` or an ISO timestamp, which is truncated to its day. Any other JSON
/// type is a [`InterventionError::ConfigurationError`].
pub fn read_date(value: &Value) -> Result<NaiveDate, InterventionError> {
    let Value::String(text) = value else {
        return Err(InterventionError::ConfigurationError(format!(
            "date must be a string or a date, got `{value}`"
        )));
    };
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        return Ok(date);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|datetime| datetime.date())
        .ok_or_else(|| {
            InterventionError::ConfigurationError(format!("`{text}` is not a YYYY-MM-DD date"))
        })
}
