//! Personal operations for the configured student: schedule, grades, credits and GPA.

// self
use crate::{
	_prelude::*,
	error::UpstreamError,
	obs::OperationKind,
	portal::{
		AcademicClient, CourseView, Endpoint, SemesterDescriptor, TermSelection, TimetableEntry,
		TimetableSource, lenient, timetable,
	},
};

/// Parameters of [`AcademicClient::get_student_schedule`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ScheduleQuery {
	/// Composite term such as `2024-2025-1`; the current term when omitted.
	#[serde(default)]
	pub semester: Option<String>,
}

/// Parameters of [`AcademicClient::get_student_grade`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct GradeQuery {
	/// School year such as `2024-2025`.
	#[serde(default)]
	pub school_year: Option<String>,
	/// Half marker, `一` or `二`.
	#[serde(default)]
	pub semester_half: Option<String>,
}

/// Score exactly as the portal reported it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
	/// Numeric score, kept in its original JSON form.
	Number(serde_json::Number),
	/// Text mark such as `合格` or `P`.
	Text(String),
}

/// One graded course.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GradeRecord {
	/// Course name.
	pub course_name: String,
	/// Course credit.
	pub credit: f64,
	/// Score or mark, untouched.
	pub score: Score,
	/// Grade point, when the portal computed one.
	pub grade_point: Option<f64>,
}

/// Credit progress for one requirement category.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreditCategory {
	/// Requirement category name.
	pub category: String,
	/// Credits required for graduation.
	pub required: f64,
	/// Credits earned so far.
	pub earned: f64,
}

/// Overall GPA summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GpaSummary {
	/// Grade point average.
	pub gpa: f64,
	/// Average score, when reported.
	pub average_score: Option<f64>,
	/// Rank text such as `12/180`, when reported.
	pub rank: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GradeRow {
	#[serde(default, alias = "courseName", deserialize_with = "lenient::opt_text")]
	kcmc: Option<String>,
	#[serde(default, alias = "credit", deserialize_with = "lenient::opt_number")]
	xf: Option<f64>,
	#[serde(default, alias = "score")]
	cj: Option<Score>,
	#[serde(default, alias = "gradePoint", deserialize_with = "lenient::opt_number")]
	jd: Option<f64>,
}
impl GradeRow {
	fn into_record(self, index: usize) -> Result<GradeRecord, UpstreamError> {
		let endpoint = Endpoint::StudentGrade.path();
		let course_name = self
			.kcmc
			.ok_or_else(|| UpstreamError::unnormalizable(endpoint, format!("row {index} has no course name")))?;
		let credit = self.xf.ok_or_else(|| {
			UpstreamError::unnormalizable(endpoint, format!("`{course_name}` has no credit"))
		})?;
		let score = self.cj.ok_or_else(|| {
			UpstreamError::unnormalizable(endpoint, format!("`{course_name}` has no score"))
		})?;

		Ok(GradeRecord { course_name, credit, score, grade_point: self.jd })
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreditRow {
	#[serde(default, alias = "categoryName", deserialize_with = "lenient::opt_text")]
	category: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_number")]
	required: Option<f64>,
	#[serde(default, deserialize_with = "lenient::opt_number")]
	earned: Option<f64>,
}
impl CreditRow {
	fn into_category(self, index: usize) -> Result<CreditCategory, UpstreamError> {
		let endpoint = Endpoint::StudentCredit.path();

		match (self.category, self.required, self.earned) {
			(Some(category), Some(required), Some(earned)) =>
				Ok(CreditCategory { category, required, earned }),
			_ => Err(UpstreamError::unnormalizable(endpoint, format!("row {index} is incomplete"))),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GpaPayload {
	#[serde(default, deserialize_with = "lenient::opt_number")]
	gpa: Option<f64>,
	#[serde(default, deserialize_with = "lenient::opt_number")]
	average_score: Option<f64>,
	#[serde(default, deserialize_with = "lenient::opt_text")]
	rank: Option<String>,
}

impl AcademicClient {
	/// Returns the configured student's timetable for a term (the current term by default).
	pub async fn get_student_schedule(&self, query: &ScheduleQuery) -> Result<Vec<TimetableEntry>> {
		const KIND: OperationKind = OperationKind::StudentSchedule;
		const ENDPOINT: Endpoint = Endpoint::StudentSchedule;

		let semester = query
			.semester
			.as_deref()
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::parse::<SemesterDescriptor>)
			.transpose()?;

		self.run(KIND, ENDPOINT, async {
			let semester = match semester {
				Some(semester) => semester,
				None => self.current_term(KIND).await?,
			};
			let rows: Vec<CourseView> = self
				.fetch_list(
					KIND,
					ENDPOINT,
					&[("studentId", self.student_id().to_string()), ("semester", semester.to_string())],
				)
				.await?;

			Ok(timetable::normalize_all(ENDPOINT, rows.into_iter().map(TimetableSource::Course))?)
		})
		.await
	}

	/// Returns grades in portal order with scores untouched.
	///
	/// Term rules: both parts pick that term, only the school year picks the whole year, only
	/// the half picks that half of the current school year, neither picks the current term.
	pub async fn get_student_grade(&self, query: &GradeQuery) -> Result<Vec<GradeRecord>> {
		const KIND: OperationKind = OperationKind::StudentGrade;
		const ENDPOINT: Endpoint = Endpoint::StudentGrade;

		let selection =
			TermSelection::parse(query.school_year.as_deref(), query.semester_half.as_deref())?;

		self.run(KIND, ENDPOINT, async {
			let term = self.resolve_term(KIND, selection).await?;
			let mut params = vec![("studentId", self.student_id().to_string())];

			params.extend(term.pairs());

			let rows: Vec<GradeRow> = self.fetch_list(KIND, ENDPOINT, &params).await?;

			Ok(rows
				.into_iter()
				.enumerate()
				.map(|(index, row)| row.into_record(index))
				.collect::<Result<Vec<_>, _>>()?)
		})
		.await
	}

	/// Returns credit progress per requirement category.
	pub async fn get_student_credit(&self) -> Result<Vec<CreditCategory>> {
		const KIND: OperationKind = OperationKind::StudentCredit;
		const ENDPOINT: Endpoint = Endpoint::StudentCredit;

		self.run(KIND, ENDPOINT, async {
			let rows: Vec<CreditRow> = self
				.fetch_list(KIND, ENDPOINT, &[("studentId", self.student_id().to_string())])
				.await?;

			Ok(rows
				.into_iter()
				.enumerate()
				.map(|(index, row)| row.into_category(index))
				.collect::<Result<Vec<_>, _>>()?)
		})
		.await
	}

	/// Returns the GPA summary.
	pub async fn get_student_gpa(&self) -> Result<GpaSummary> {
		const KIND: OperationKind = OperationKind::StudentGpa;
		const ENDPOINT: Endpoint = Endpoint::StudentGpa;

		self.run(KIND, ENDPOINT, async {
			let payload: Option<GpaPayload> = self
				.fetch(KIND, ENDPOINT, &[("studentId", self.student_id().to_string())])
				.await?;
			let payload = payload.ok_or_else(|| {
				UpstreamError::unnormalizable(ENDPOINT.path(), "no GPA data was returned")
			})?;
			let gpa = payload
				.gpa
				.ok_or_else(|| UpstreamError::unnormalizable(ENDPOINT.path(), "gpa is missing"))?;

			Ok(GpaSummary { gpa, average_score: payload.average_score, rank: payload.rank })
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn grade_rows_keep_scores_verbatim() {
		let rows: Vec<GradeRow> = serde_json::from_str(
			r#"[
				{"kcmc":"高等数学","xf":"5","cj":92,"jd":"4.2"},
				{"kcmc":"体育","xf":1,"cj":"合格","jd":""},
				{"kcmc":"英语","xf":2.5,"cj":"85.5"}
			]"#,
		)
		.expect("Grade rows should decode.");
		let records = rows
			.into_iter()
			.enumerate()
			.map(|(index, row)| row.into_record(index))
			.collect::<Result<Vec<_>, _>>()
			.expect("Rows should normalize.");

		assert_eq!(records[0].score, Score::Number(92.into()));
		assert_eq!(records[0].grade_point, Some(4.2));
		assert_eq!(records[1].score, Score::Text("合格".into()));
		assert_eq!(records[1].grade_point, None);
		assert_eq!(records[2].score, Score::Text("85.5".into()));
		assert_eq!(records[2].credit, 2.5);
	}

	#[test]
	fn grade_rows_without_course_names_are_rejected() {
		let row: GradeRow =
			serde_json::from_str(r#"{"xf":2,"cj":80}"#).expect("Partial row should decode.");

		assert!(matches!(row.into_record(0), Err(UpstreamError::Unnormalizable { .. })));
	}

	#[test]
	fn credit_rows_require_all_fields() {
		let complete: CreditRow =
			serde_json::from_str(r#"{"category":"通识必修","required":"30","earned":24.5}"#)
				.expect("Credit row should decode.");
		let partial: CreditRow =
			serde_json::from_str(r#"{"category":"专业选修"}"#).expect("Partial row should decode.");

		assert_eq!(
			complete.into_category(0).expect("Complete row should normalize."),
			CreditCategory { category: "通识必修".into(), required: 30.0, earned: 24.5 }
		);
		assert!(partial.into_category(1).is_err());
	}

	#[test]
	fn scores_serialize_as_sent() {
		let record = GradeRecord {
			course_name: "体育".into(),
			credit: 1.0,
			score: Score::Text("合格".into()),
			grade_point: None,
		};

		assert_eq!(
			serde_json::to_value(&record).expect("Record should serialize."),
			serde_json::json!({
				"course_name": "体育",
				"credit": 1.0,
				"score": "合格",
				"grade_point": null,
			})
		);
	}
}
