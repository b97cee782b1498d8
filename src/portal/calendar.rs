//! Teaching calendar: current week, current term and current date.

// crates.io
use time::macros::offset;
// self
use crate::{
	_prelude::*,
	error::UpstreamError,
	obs::OperationKind,
	portal::{
		AcademicClient, Endpoint, SemesterDescriptor, TermQuery, TermSelection, date_text,
		lenient, parse_date,
	},
};

/// Highest teaching week the portal can report.
pub const MAX_TEACHING_WEEK: u8 = 30;

/// Current teaching week and the date it was observed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TeachingWeek {
	/// Week number, `1..=30`.
	pub week: u8,
	/// Portal date the week refers to.
	#[serde(with = "date_text")]
	pub date: Date,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarPayload {
	#[serde(default, deserialize_with = "lenient::opt_text")]
	curr_week: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_text")]
	curr_term: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_text")]
	curr_date: Option<String>,
}
impl CalendarPayload {
	fn date(&self) -> Result<Date, UpstreamError> {
		match self.curr_date.as_deref() {
			Some(text) => parse_date(text).ok_or_else(|| {
				UpstreamError::unnormalizable(
					Endpoint::Calendar.path(),
					format!("currDate `{text}` is not a yyyy-MM-dd date"),
				)
			}),
			None => Ok(portal_today()),
		}
	}

	fn term(&self) -> Result<SemesterDescriptor, UpstreamError> {
		let text = self.curr_term.as_deref().ok_or(UpstreamError::MissingCurrentTerm)?;

		text.parse().map_err(|_| {
			UpstreamError::unnormalizable(
				Endpoint::Calendar.path(),
				format!("currTerm `{text}` is not a YYYY-YYYY-N term"),
			)
		})
	}
}

impl AcademicClient {
	/// Returns the current teaching week.
	///
	/// Fails with [`UpstreamError::TeachingWeek`] when the label is unparsable or outside
	/// `1..=30`.
	pub async fn get_teaching_week(&self) -> Result<TeachingWeek> {
		const KIND: OperationKind = OperationKind::TeachingWeek;

		self.run(KIND, Endpoint::Calendar, async {
			let calendar = self.calendar(KIND).await?;
			let label = calendar.curr_week.clone().unwrap_or_default();
			let week = parse_teaching_week(&label)
				.ok_or(UpstreamError::TeachingWeek { value: label })?;

			Ok(TeachingWeek { week, date: calendar.date()? })
		})
		.await
	}

	/// Portal's current term.
	pub(crate) async fn current_term(&self, kind: OperationKind) -> Result<SemesterDescriptor> {
		Ok(self.calendar(kind).await?.term()?)
	}

	/// Portal's current date, falling back to today in the portal's time zone.
	pub(crate) async fn current_date(&self, kind: OperationKind) -> Result<Date> {
		Ok(self.calendar(kind).await?.date()?)
	}

	/// Resolves a term selection into query values, consulting the calendar only when needed.
	pub(crate) async fn resolve_term(
		&self,
		kind: OperationKind,
		selection: TermSelection,
	) -> Result<TermQuery> {
		let current =
			if selection.needs_current_term() { Some(self.current_term(kind).await?) } else { None };

		Ok(selection.resolve(current).ok_or(UpstreamError::MissingCurrentTerm)?)
	}

	async fn calendar(&self, kind: OperationKind) -> Result<CalendarPayload> {
		Ok(self.fetch(kind, Endpoint::Calendar, &[]).await?.unwrap_or_default())
	}
}

/// Parses `第15周`-style labels (or bare digits) into a week number within `1..=30`.
pub fn parse_teaching_week(label: &str) -> Option<u8> {
	let trimmed = label.trim();
	let digits = trimmed
		.strip_prefix('第')
		.and_then(|rest| rest.strip_suffix('周'))
		.unwrap_or(trimmed)
		.trim();

	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}

	let week = digits.parse::<u8>().ok()?;

	(1..=MAX_TEACHING_WEEK).contains(&week).then_some(week)
}

fn portal_today() -> Date {
	OffsetDateTime::now_utc().to_offset(offset!(+8)).date()
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::date;
	// self
	use super::*;

	#[test]
	fn week_labels_parse_within_range() {
		assert_eq!(parse_teaching_week("第15周"), Some(15));
		assert_eq!(parse_teaching_week(" 第 3 周 "), Some(3));
		assert_eq!(parse_teaching_week("7"), Some(7));
		assert_eq!(parse_teaching_week("N/A"), None);
		assert_eq!(parse_teaching_week("第0周"), None);
		assert_eq!(parse_teaching_week("第31周"), None);
		assert_eq!(parse_teaching_week("第-1周"), None);
		assert_eq!(parse_teaching_week(""), None);
	}

	#[test]
	fn calendar_payload_exposes_term_and_date() {
		let payload: CalendarPayload = serde_json::from_str(
			r#"{"currWeek":15,"currTerm":"2024-2025-2","currDate":"2025-04-01"}"#,
		)
		.expect("Calendar payload should decode.");
		let term = payload.term().expect("Term should parse.");

		assert_eq!(payload.curr_week.as_deref(), Some("15"));
		assert_eq!(term.to_string(), "2024-2025-2");
		assert_eq!(payload.date().expect("Date should parse."), date!(2025 - 04 - 01));
	}

	#[test]
	fn missing_term_is_an_upstream_error() {
		let payload = CalendarPayload::default();

		assert!(matches!(payload.term(), Err(UpstreamError::MissingCurrentTerm)));
		assert!(payload.date().is_ok());
	}

	#[test]
	fn teaching_week_serializes_iso_dates() {
		let week = TeachingWeek { week: 15, date: date!(2025 - 04 - 01) };

		assert_eq!(
			serde_json::to_value(week).expect("Week should serialize."),
			serde_json::json!({ "week": 15, "date": "2025-04-01" })
		);
	}
}
