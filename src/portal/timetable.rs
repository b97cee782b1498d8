//! Course, class and room timetables, normalized onto one record shape.
//!
//! The portal answers the three timetable endpoints (and the personal schedule) with three
//! different row layouts. Each layout is a [`TimetableSource`] variant with an explicit mapping
//! onto [`TimetableEntry`]; a single row that cannot be mapped fails the whole call.

// self
use crate::{
	_prelude::*,
	error::UpstreamError,
	obs::OperationKind,
	portal::{
		AcademicClient, Campus, Endpoint, TermSelection, clock_text, date_text, lenient,
		parse_clock, parse_date, required,
	},
};

/// Parameters of [`AcademicClient::get_course_timetable`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CourseTimetableQuery {
	/// Course name.
	#[serde(default)]
	pub course_name: String,
	/// School year such as `2024-2025`.
	#[serde(default)]
	pub school_year: Option<String>,
	/// Half marker, `一` or `二`.
	#[serde(default)]
	pub semester_half: Option<String>,
}

/// Parameters of [`AcademicClient::get_class_timetable`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ClassTimetableQuery {
	/// Administrative class id.
	#[serde(default)]
	pub class_id: String,
	/// School year such as `2024-2025`.
	#[serde(default)]
	pub school_year: Option<String>,
	/// Half marker, `一` or `二`.
	#[serde(default)]
	pub semester_half: Option<String>,
	/// Whether the class belongs to the overseas program; `false` when omitted.
	#[serde(default)]
	pub is_overseas: Option<bool>,
}

/// Parameters of [`AcademicClient::get_rooms_timetable`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RoomsTimetableQuery {
	/// Campus name or code; the default campus when omitted.
	#[serde(default)]
	pub campus: Option<String>,
	/// Building name, e.g. `C4`.
	#[serde(default)]
	pub build_name: String,
	/// Room id within the building.
	#[serde(default)]
	pub room_id: String,
	/// School year such as `2024-2025`.
	#[serde(default)]
	pub school_year: Option<String>,
	/// Half marker, `一` or `二`.
	#[serde(default)]
	pub semester_half: Option<String>,
}

/// When a timetable entry takes place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleDay {
	/// Recurring day of the week, `1` (Monday) to `7` (Sunday).
	Weekday {
		/// Day number.
		weekday: u8,
	},
	/// Single calendar date.
	Date {
		/// Date of the session.
		#[serde(with = "date_text")]
		date: Date,
	},
}

/// Which part of the day a timetable entry occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotRange {
	/// Inclusive range of teaching periods.
	Periods {
		/// First period.
		first: u8,
		/// Last period.
		last: u8,
	},
	/// Wall-clock range.
	Clock {
		/// Start time.
		#[serde(with = "clock_text")]
		start: Time,
		/// End time.
		#[serde(with = "clock_text")]
		end: Time,
	},
}

/// Normalized timetable record shared by every timetable operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimetableEntry {
	/// Course name.
	pub course_name: String,
	/// Day of the week or calendar date.
	pub day: ScheduleDay,
	/// Period or clock range.
	pub slot: SlotRange,
	/// Room, empty when the portal lists none.
	pub location: String,
	/// Teacher, when listed.
	pub teacher: Option<String>,
	/// Teaching weeks text such as `1-16`, when listed.
	pub weeks: Option<String>,
}

/// Course-centric row layout (personal schedule and course timetable).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CourseView {
	/// Course name.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub kcmc: Option<String>,
	/// Teacher name.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub jsxm: Option<String>,
	/// Location.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub jxdd: Option<String>,
	/// Weekday, `1..=7`.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub xqj: Option<String>,
	/// Period range such as `1-2`.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub jc: Option<String>,
	/// Weeks text.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub zc: Option<String>,
}

/// Class-centric row layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassView {
	/// Course name.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub course_name: Option<String>,
	/// Teacher name.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub teacher_name: Option<String>,
	/// Classroom.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub classroom: Option<String>,
	/// Weekday, `1..=7`.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub weekday: Option<String>,
	/// First period.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub start_section: Option<String>,
	/// Last period.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub end_section: Option<String>,
	/// Weeks text.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub weeks: Option<String>,
}

/// Room-centric row layout; the room itself comes from the request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
	/// Course name.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub course: Option<String>,
	/// Teacher name.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub teacher: Option<String>,
	/// `YYYY-MM-DD` date.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub date: Option<String>,
	/// `HH:MM` start time.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub start_time: Option<String>,
	/// `HH:MM` end time.
	#[serde(default, deserialize_with = "lenient::opt_text")]
	pub end_time: Option<String>,
}

/// Raw timetable row tagged with the layout it arrived in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimetableSource {
	/// Course-centric row.
	Course(CourseView),
	/// Class-centric row.
	Class(ClassView),
	/// Room-centric row plus the `"{build_name} {room_id}"` location it was requested for.
	Room {
		/// Raw row.
		view: RoomView,
		/// Location taken from the request.
		location: String,
	},
}
impl TimetableSource {
	/// Maps the row onto a [`TimetableEntry`], describing the first problem on failure.
	pub fn normalize(self) -> Result<TimetableEntry, String> {
		match self {
			TimetableSource::Course(view) => {
				let course_name = view.kcmc.ok_or("missing course name")?;

				Ok(TimetableEntry {
					day: weekday(view.xqj.as_deref(), &course_name)?,
					slot: period_range(view.jc.as_deref(), &course_name)?,
					location: view.jxdd.unwrap_or_default(),
					teacher: view.jsxm,
					weeks: view.zc,
					course_name,
				})
			},
			TimetableSource::Class(view) => {
				let course_name = view.course_name.ok_or("missing course name")?;
				let first = period(view.start_section.as_deref(), &course_name)?;
				let last = period(view.end_section.as_deref(), &course_name)?;

				Ok(TimetableEntry {
					day: weekday(view.weekday.as_deref(), &course_name)?,
					slot: ordered_periods(first, last, &course_name)?,
					location: view.classroom.unwrap_or_default(),
					teacher: view.teacher_name,
					weeks: view.weeks,
					course_name,
				})
			},
			TimetableSource::Room { view, location } => {
				let course_name = view.course.ok_or("missing course name")?;
				let date = view
					.date
					.as_deref()
					.and_then(parse_date)
					.ok_or_else(|| format!("`{course_name}` has no usable date"))?;
				let start = view.start_time.as_deref().and_then(parse_clock);
				let end = view.end_time.as_deref().and_then(parse_clock);
				let (Some(start), Some(end)) = (start, end) else {
					return Err(format!("`{course_name}` has no usable time range"));
				};

				if end < start {
					return Err(format!("`{course_name}` ends before it starts"));
				}

				Ok(TimetableEntry {
					day: ScheduleDay::Date { date },
					slot: SlotRange::Clock { start, end },
					location,
					teacher: view.teacher,
					weeks: None,
					course_name,
				})
			},
		}
	}
}

impl AcademicClient {
	/// Returns the timetable of one course.
	pub async fn get_course_timetable(
		&self,
		query: &CourseTimetableQuery,
	) -> Result<Vec<TimetableEntry>> {
		const KIND: OperationKind = OperationKind::CourseTimetable;
		const ENDPOINT: Endpoint = Endpoint::CourseTimetable;

		let course_name = required("course_name", &query.course_name)?;
		let selection =
			TermSelection::parse(query.school_year.as_deref(), query.semester_half.as_deref())?;

		self.run(KIND, ENDPOINT, async {
			let term = self.resolve_term(KIND, selection).await?;
			let mut params = vec![("courseName", course_name)];

			params.extend(term.pairs());

			let rows: Vec<CourseView> = self.fetch_list(KIND, ENDPOINT, &params).await?;

			Ok(normalize_all(ENDPOINT, rows.into_iter().map(TimetableSource::Course))?)
		})
		.await
	}

	/// Returns the timetable of one administrative class.
	pub async fn get_class_timetable(
		&self,
		query: &ClassTimetableQuery,
	) -> Result<Vec<TimetableEntry>> {
		const KIND: OperationKind = OperationKind::ClassTimetable;
		const ENDPOINT: Endpoint = Endpoint::ClassTimetable;

		let class_id = required("class_id", &query.class_id)?;
		let selection =
			TermSelection::parse(query.school_year.as_deref(), query.semester_half.as_deref())?;
		let is_overseas = query.is_overseas.unwrap_or(false);

		self.run(KIND, ENDPOINT, async {
			let term = self.resolve_term(KIND, selection).await?;
			let mut params = vec![("classId", class_id)];

			params.extend(term.pairs());
			params.push(("isOverseas", if is_overseas { "1" } else { "0" }.to_owned()));

			let rows: Vec<ClassView> = self.fetch_list(KIND, ENDPOINT, &params).await?;

			Ok(normalize_all(ENDPOINT, rows.into_iter().map(TimetableSource::Class))?)
		})
		.await
	}

	/// Returns the timetable of one room; entries carry `"{build_name} {room_id}"` as location.
	pub async fn get_rooms_timetable(
		&self,
		query: &RoomsTimetableQuery,
	) -> Result<Vec<TimetableEntry>> {
		const KIND: OperationKind = OperationKind::RoomsTimetable;
		const ENDPOINT: Endpoint = Endpoint::RoomTimetable;

		let build_name = required("build_name", &query.build_name)?;
		let room_id = required("room_id", &query.room_id)?;
		let campus = Campus::resolve(query.campus.as_deref(), self.descriptor().default_campus)?;
		let selection =
			TermSelection::parse(query.school_year.as_deref(), query.semester_half.as_deref())?;

		self.run(KIND, ENDPOINT, async {
			let term = self.resolve_term(KIND, selection).await?;
			let location = format!("{build_name} {room_id}");
			let mut params = vec![
				("campus", campus.code().to_owned()),
				("buildName", build_name),
				("roomId", room_id),
			];

			params.extend(term.pairs());

			let rows: Vec<RoomView> = self.fetch_list(KIND, ENDPOINT, &params).await?;

			Ok(normalize_all(
				ENDPOINT,
				rows.into_iter()
					.map(|view| TimetableSource::Room { view, location: location.clone() }),
			)?)
		})
		.await
	}
}

/// Normalizes every row or fails on the first one that cannot be mapped.
pub(crate) fn normalize_all<I>(
	endpoint: Endpoint,
	sources: I,
) -> Result<Vec<TimetableEntry>, UpstreamError>
where
	I: IntoIterator<Item = TimetableSource>,
{
	sources
		.into_iter()
		.enumerate()
		.map(|(index, source)| {
			source.normalize().map_err(|reason| {
				UpstreamError::unnormalizable(endpoint.path(), format!("row {index}: {reason}"))
			})
		})
		.collect()
}

fn weekday(text: Option<&str>, course: &str) -> Result<ScheduleDay, String> {
	text.and_then(|t| t.parse::<u8>().ok())
		.filter(|day| (1..=7).contains(day))
		.map(|weekday| ScheduleDay::Weekday { weekday })
		.ok_or_else(|| format!("`{course}` has no weekday within 1-7"))
}

fn period(text: Option<&str>, course: &str) -> Result<u8, String> {
	text.map(|t| t.trim().trim_end_matches('节'))
		.and_then(|t| t.parse::<u8>().ok())
		.filter(|p| *p >= 1)
		.ok_or_else(|| format!("`{course}` has no usable period"))
}

fn period_range(text: Option<&str>, course: &str) -> Result<SlotRange, String> {
	let text = text.ok_or_else(|| format!("`{course}` has no period range"))?;
	let (first, last) = match text.split_once('-') {
		Some((first, last)) => (first, last),
		None => (text, text),
	};

	ordered_periods(period(Some(first), course)?, period(Some(last), course)?, course)
}

fn ordered_periods(first: u8, last: u8, course: &str) -> Result<SlotRange, String> {
	if last < first {
		return Err(format!("`{course}` has an inverted period range"));
	}

	Ok(SlotRange::Periods { first, last })
}
