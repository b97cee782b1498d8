//! Authenticated client for the academic portal.
//!
//! Every operation follows the same three steps: validate and resolve the caller's parameters
//! (campus names to codes, omitted terms and dates from the portal calendar), issue one
//! authenticated `GET`, then normalize the portal's inconsistently shaped rows into the records
//! exported here. Validation always runs before the first network call.

pub mod calendar;
pub mod campus;
pub mod classroom;
pub mod client;
pub mod descriptor;
pub mod directory;
pub mod student;
pub mod term;
pub mod timetable;

mod lenient;

pub use calendar::*;
pub use campus::*;
pub use classroom::*;
pub use client::*;
pub use descriptor::*;
pub use directory::*;
pub use student::*;
pub use term::*;
pub use timetable::*;

// crates.io
use time::{format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{_prelude::*, error::ValidationError};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const CLOCK_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");

time::serde::format_description!(date_text, Date, "[year]-[month]-[day]");
time::serde::format_description!(clock_text, Time, "[hour]:[minute]");

fn parse_date(text: &str) -> Option<Date> {
	Date::parse(text.trim(), DATE_FORMAT).ok()
}

fn parse_clock(text: &str) -> Option<Time> {
	Time::parse(text.trim(), CLOCK_FORMAT).ok()
}

/// Returns the trimmed value of a required identifier.
fn required(parameter: &'static str, value: &str) -> Result<String, ValidationError> {
	let value = value.trim();

	if value.is_empty() {
		return Err(ValidationError::MissingParameter { parameter });
	}

	Ok(value.to_owned())
}

/// Parses an optional `yyyy-MM-dd` caller date; blank counts as omitted.
fn optional_date(value: Option<&str>) -> Result<Option<Date>, ValidationError> {
	match value.map(str::trim).filter(|v| !v.is_empty()) {
		Some(text) =>
			parse_date(text).map(Some).ok_or_else(|| ValidationError::InvalidDate { value: text.into() }),
		None => Ok(None),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn required_identifiers_reject_blanks() {
		assert_eq!(required("build_id", " 0002011 "), Ok(String::from("0002011")));
		assert_eq!(
			required("build_id", "  "),
			Err(ValidationError::MissingParameter { parameter: "build_id" })
		);
	}

	#[test]
	fn caller_dates_use_iso_format() {
		assert_eq!(
			optional_date(Some("2025-04-01")).map(|d| d.map(|d| d.to_string())),
			Ok(Some(String::from("2025-04-01")))
		);
		assert_eq!(optional_date(Some("")), Ok(None));
		assert!(matches!(
			optional_date(Some("2025/04/01")),
			Err(ValidationError::InvalidDate { .. })
		));
		assert_eq!(parse_clock("08:00").map(|t| t.hour()), Some(8));
	}
}
