//! School year, semester half and term selection rules.
//!
//! Callers describe a term with an optional school year (`2024-2025`) and an optional half
//! marker (`一`/`二`). [`TermSelection::parse`] validates both before any network call;
//! [`TermSelection::resolve`] then combines the selection with the portal's current term when
//! part of it was left out.

// self
use crate::{_prelude::*, error::ValidationError};

/// Academic year spanning two consecutive calendar years, written `YYYY-YYYY`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchoolYear {
	start: u16,
}
impl SchoolYear {
	/// Creates the school year starting in `start`.
	pub const fn new(start: u16) -> Self {
		Self { start }
	}

	/// Calendar year the school year starts in.
	pub const fn start(self) -> u16 {
		self.start
	}

	/// Calendar year the school year ends in.
	pub const fn end(self) -> u16 {
		self.start + 1
	}
}
impl Display for SchoolYear {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}-{}", self.start, self.end())
	}
}
impl FromStr for SchoolYear {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || ValidationError::InvalidSchoolYear { value: s.to_owned() };
		let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
		let start = parse_year(start).ok_or_else(invalid)?;
		let end = parse_year(end).ok_or_else(invalid)?;

		if end != start + 1 {
			return Err(invalid());
		}

		Ok(Self { start })
	}
}

/// Half of a school year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemesterHalf {
	/// First half, caller marker `一`, portal code `1`.
	First,
	/// Second half, caller marker `二`, portal code `2`.
	Second,
}
impl SemesterHalf {
	/// Portal code sent in the `xq` query parameter.
	pub const fn code(self) -> &'static str {
		match self {
			SemesterHalf::First => "1",
			SemesterHalf::Second => "2",
		}
	}

	/// Caller-facing marker.
	pub const fn marker(self) -> &'static str {
		match self {
			SemesterHalf::First => "一",
			SemesterHalf::Second => "二",
		}
	}

	/// Looks a half up by its portal code.
	pub fn from_code(code: &str) -> Option<Self> {
		match code {
			"1" => Some(SemesterHalf::First),
			"2" => Some(SemesterHalf::Second),
			_ => None,
		}
	}
}
impl Display for SemesterHalf {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.marker())
	}
}
impl FromStr for SemesterHalf {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"一" => Ok(SemesterHalf::First),
			"二" => Ok(SemesterHalf::Second),
			_ => Err(ValidationError::InvalidSemesterHalf { value: s.to_owned() }),
		}
	}
}

/// Fully specified term, written `YYYY-YYYY-N` in its composite form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SemesterDescriptor {
	/// School year.
	pub school_year: SchoolYear,
	/// Half of the school year.
	pub half: SemesterHalf,
}
impl SemesterDescriptor {
	/// Creates a descriptor from its parts.
	pub const fn new(school_year: SchoolYear, half: SemesterHalf) -> Self {
		Self { school_year, half }
	}
}
impl Display for SemesterDescriptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}-{}", self.school_year, self.half.code())
	}
}
impl FromStr for SemesterDescriptor {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || ValidationError::InvalidSemester { value: s.to_owned() };
		let (year, half) = s.trim().rsplit_once('-').ok_or_else(invalid)?;
		let school_year = year.parse::<SchoolYear>().map_err(|_| invalid())?;
		let half = SemesterHalf::from_code(half).ok_or_else(invalid)?;

		Ok(Self { school_year, half })
	}
}

/// Which term a grade or timetable request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermSelection {
	/// Both school year and half were given.
	Term(SemesterDescriptor),
	/// Only the school year was given: the whole year, no half sent.
	SchoolYear(SchoolYear),
	/// Only the half was given: the current school year with this half.
	Half(SemesterHalf),
	/// Nothing was given: the current term.
	Current,
}
impl TermSelection {
	/// Validates optional caller values; blank strings count as omitted.
	pub fn parse(school_year: Option<&str>, half: Option<&str>) -> Result<Self, ValidationError> {
		let school_year = non_blank(school_year).map(str::parse::<SchoolYear>).transpose()?;
		let half = non_blank(half).map(str::parse::<SemesterHalf>).transpose()?;

		Ok(match (school_year, half) {
			(Some(school_year), Some(half)) =>
				TermSelection::Term(SemesterDescriptor::new(school_year, half)),
			(Some(school_year), None) => TermSelection::SchoolYear(school_year),
			(None, Some(half)) => TermSelection::Half(half),
			(None, None) => TermSelection::Current,
		})
	}

	/// Returns `true` when resolving the selection needs the portal's current term.
	pub fn needs_current_term(self) -> bool {
		matches!(self, TermSelection::Half(_) | TermSelection::Current)
	}

	/// Combines the selection with the current term into the portal's `xn`/`xq` pair.
	///
	/// `current` is only consulted when [`Self::needs_current_term`] is `true`; `None` is then
	/// returned if it is missing.
	pub fn resolve(self, current: Option<SemesterDescriptor>) -> Option<TermQuery> {
		match self {
			TermSelection::Term(term) =>
				Some(TermQuery { school_year: term.school_year, half: Some(term.half) }),
			TermSelection::SchoolYear(school_year) => Some(TermQuery { school_year, half: None }),
			TermSelection::Half(half) =>
				current.map(|term| TermQuery { school_year: term.school_year, half: Some(half) }),
			TermSelection::Current => current
				.map(|term| TermQuery { school_year: term.school_year, half: Some(term.half) }),
		}
	}
}

/// Resolved `xn` (school year) and `xq` (half) query values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TermQuery {
	/// School year sent as `xn`.
	pub school_year: SchoolYear,
	/// Half sent as `xq`; `None` targets the whole school year.
	pub half: Option<SemesterHalf>,
}
impl TermQuery {
	/// Query pairs in portal order.
	pub fn pairs(self) -> Vec<(&'static str, String)> {
		let mut pairs = vec![("xn", self.school_year.to_string())];

		if let Some(half) = self.half {
			pairs.push(("xq", half.code().to_owned()));
		}

		pairs
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_year(text: &str) -> Option<u16> {
	if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}

	text.parse().ok()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const CURRENT: SemesterDescriptor =
		SemesterDescriptor::new(SchoolYear::new(2024), SemesterHalf::Second);

	#[test]
	fn school_years_must_be_consecutive() {
		assert_eq!("2024-2025".parse::<SchoolYear>(), Ok(SchoolYear::new(2024)));
		assert!("2024-2026".parse::<SchoolYear>().is_err());
		assert!("2024".parse::<SchoolYear>().is_err());
		assert!("24-25".parse::<SchoolYear>().is_err());
		assert_eq!(SchoolYear::new(2023).to_string(), "2023-2024");
	}

	#[test]
	fn half_markers_are_strict() {
		assert_eq!("一".parse::<SemesterHalf>(), Ok(SemesterHalf::First));
		assert_eq!("二".parse::<SemesterHalf>(), Ok(SemesterHalf::Second));
		assert_eq!(
			"三".parse::<SemesterHalf>(),
			Err(ValidationError::InvalidSemesterHalf { value: "三".into() })
		);
		assert!("1".parse::<SemesterHalf>().is_err());
	}

	#[test]
	fn composite_semesters_round_trip_through_display() {
		let term = "2024-2025-1".parse::<SemesterDescriptor>().expect("Term should parse.");

		assert_eq!(term.half, SemesterHalf::First);
		assert_eq!(term.to_string(), "2024-2025-1");
		assert!("2024-2025-3".parse::<SemesterDescriptor>().is_err());
		assert!("2024-2026-1".parse::<SemesterDescriptor>().is_err());
	}

	#[test]
	fn selection_follows_the_term_rules() {
		let both = TermSelection::parse(Some("2023-2024"), Some("一")).expect("Both parse.");
		let year = TermSelection::parse(Some("2023-2024"), None).expect("Year parses.");
		let half = TermSelection::parse(None, Some("一")).expect("Half parses.");
		let neither = TermSelection::parse(Some(""), None).expect("Blank is omitted.");

		assert!(!both.needs_current_term() && !year.needs_current_term());
		assert_eq!(
			both.resolve(None).map(TermQuery::pairs),
			Some(vec![("xn", "2023-2024".into()), ("xq", "1".into())])
		);
		assert_eq!(year.resolve(None).map(TermQuery::pairs), Some(vec![("xn", "2023-2024".into())]));
		assert_eq!(
			half.resolve(Some(CURRENT)).map(TermQuery::pairs),
			Some(vec![("xn", "2024-2025".into()), ("xq", "1".into())])
		);
		assert_eq!(
			neither.resolve(Some(CURRENT)).map(TermQuery::pairs),
			Some(vec![("xn", "2024-2025".into()), ("xq", "2".into())])
		);
		assert_eq!(neither.resolve(None), None);
	}

	#[test]
	fn invalid_values_fail_before_resolution() {
		assert!(matches!(
			TermSelection::parse(Some("2024-2025"), Some("3")),
			Err(ValidationError::InvalidSemesterHalf { .. })
		));
		assert!(matches!(
			TermSelection::parse(Some("2024"), None),
			Err(ValidationError::InvalidSchoolYear { .. })
		));
	}
}
