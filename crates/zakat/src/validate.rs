//! Input validation.
//!
//! Every prompt in the console funnels its raw text through one of these
//! functions. They never touch the terminal, so the same rules apply to
//! scripted input and are easy to test.

use chrono::NaiveDate;
use thiserror::Error;

/// Date format accepted for all date input.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reasons an input value was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required text field was blank.
    #[error("{field} cannot be empty")]
    Empty {
        /// Name of the field.
        field: &'static str,
    },

    /// The value is not a number.
    #[error("{field} must be a number")]
    NotANumber {
        /// Name of the field.
        field: &'static str,
    },

    /// The value is zero or negative.
    #[error("{field} must be positive")]
    NotPositive {
        /// Name of the field.
        field: &'static str,
    },

    /// The value exceeds the allowed maximum.
    #[error("{field} must not exceed {max:.2}")]
    TooLarge {
        /// Name of the field.
        field: &'static str,
        /// Largest accepted value.
        max: f64,
    },

    /// The value is not a `YYYY-MM-DD` date.
    #[error("invalid date '{input}', use YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input.
        input: String,
    },

    /// The date lies after today.
    #[error("date {date} is in the future")]
    FutureDate {
        /// The rejected date.
        date: NaiveDate,
    },

    /// The value is not a positive whole number.
    #[error("invalid ID '{input}', enter a positive whole number")]
    InvalidId {
        /// The rejected input.
        input: String,
    },

    /// The answer to a yes/no question was not understood.
    #[error("please answer y or n")]
    InvalidConfirmation,

    /// A requested column does not exist.
    #[error("unknown column '{input}'")]
    UnknownColumn {
        /// The rejected column reference.
        input: String,
    },
}

/// Result type for validation functions.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Require a non-blank value, returning it trimmed.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] if the input is blank.
pub fn non_empty(field: &'static str, raw: &str) -> Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(value.to_string())
}

/// Parse a strictly positive, finite number with an optional upper bound.
///
/// # Errors
///
/// Returns an error if the input is not a number, is not positive, or is
/// greater than `max`.
pub fn positive_amount(field: &'static str, raw: &str, max: Option<f64>) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber { field })?;

    if !value.is_finite() {
        return Err(ValidationError::NotANumber { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { field });
    }
    if let Some(max) = max {
        if value > max {
            return Err(ValidationError::TooLarge { field, max });
        }
    }
    Ok(value)
}

/// Parse a `YYYY-MM-DD` date that is not after `today`.
///
/// # Errors
///
/// Returns an error if the input is malformed or lies in the future.
pub fn past_or_present_date(raw: &str, today: NaiveDate) -> Result<NaiveDate> {
    let input = raw.trim();
    let date =
        NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
            input: input.to_string(),
        })?;

    if date > today {
        return Err(ValidationError::FutureDate { date });
    }
    Ok(date)
}

/// Parse a record identifier.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidId`] unless the input is a positive integer.
pub fn record_id(raw: &str) -> Result<i64> {
    let input = raw.trim();
    match input.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidId {
            input: input.to_string(),
        }),
    }
}

/// Treat blank input as "keep the current value".
///
/// # Errors
///
/// Propagates the error from `parse` for non-blank input.
pub fn optional<T>(raw: &str, parse: impl FnOnce(&str) -> Result<T>) -> Result<Option<T>> {
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        parse(raw).map(Some)
    }
}

/// Interpret a yes/no answer. Blank means no.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidConfirmation`] for anything else.
pub fn confirmation(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(true),
        "" | "n" | "no" => Ok(false),
        _ => Err(ValidationError::InvalidConfirmation),
    }
}

/// Parse a comma-separated column selection against `available`.
///
/// Columns may be given by 1-based position or by name (case-insensitive).
/// Blank input selects every column and returns an empty list.
///
/// # Errors
///
/// Returns [`ValidationError::UnknownColumn`] for a reference that matches
/// nothing.
pub fn columns(raw: &str, available: &[&str]) -> Result<Vec<usize>> {
    let mut selected = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let index = match part.parse::<usize>() {
            Ok(n) if (1..=available.len()).contains(&n) => Some(n - 1),
            Ok(_) => None,
            Err(_) => available.iter().position(|c| c.eq_ignore_ascii_case(part)),
        };
        match index {
            Some(i) if !selected.contains(&i) => selected.push(i),
            Some(_) => {}
            None => {
                return Err(ValidationError::UnknownColumn {
                    input: part.to_string(),
                })
            }
        }
    }
    Ok(selected)
}
