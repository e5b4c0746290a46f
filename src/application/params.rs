//! Typed parsing of the untyped string parameters handed over by a
//! dispatch layer (`empid`, `studentId`, `date`, `status`, amounts).
//!
//! Anything that does not parse is rejected here, before it can get near
//! a query.

use chrono::NaiveDate;

use crate::domain::{AttendanceStatus, Cents, parse_cents};

use super::AppError;

/// Parse an integer identifier parameter.
pub fn parse_id(name: &str, value: &str) -> Result<i64, AppError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::invalid(format!("{} must be an integer, got '{}'", name, value)))
}

/// Parse a decimal amount parameter into cents.
pub fn parse_amount(name: &str, value: &str) -> Result<Cents, AppError> {
    parse_cents(value)
        .map_err(|e| AppError::invalid(format!("{} '{}': {}", name, value, e)))
}

/// Parse a `YYYY-MM-DD` date parameter.
pub fn parse_date(name: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::invalid(format!("{} must be a YYYY-MM-DD date, got '{}'", name, value))
    })
}

pub fn parse_status(value: &str) -> Result<AttendanceStatus, AppError> {
    value.parse().map_err(AppError::InvalidArgument)
}
