//! Optional observability helpers for portal operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every operation inside an `hqu_academic.operation` span carrying
//!   the `operation` and `stage` fields, and to emit events for credential mints and
//!   authentication rejections.
//! - Enable `metrics` to increment the `hqu_academic_operation_total` counter for every
//!   attempt/success/failure/auth retry, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate, labeled with their tool names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Broker call minting a portal credential.
	MintCredential,
	/// `get_student_schedule`.
	StudentSchedule,
	/// `get_student_grade`.
	StudentGrade,
	/// `get_student_credit`.
	StudentCredit,
	/// `get_student_gpa`.
	StudentGpa,
	/// `get_teaching_week`.
	TeachingWeek,
	/// `get_empty_classroom_count`.
	EmptyClassroomCount,
	/// `get_empty_classroom_status`.
	EmptyClassroomStatus,
	/// `get_college_list`.
	CollegeList,
	/// `get_teacher_list`.
	TeacherList,
	/// `get_course_list`.
	CourseList,
	/// `get_building_list`.
	BuildingList,
	/// `get_classroom_list`.
	ClassroomList,
	/// `get_course_timetable`.
	CourseTimetable,
	/// `get_class_timetable`.
	ClassTimetable,
	/// `get_rooms_timetable`.
	RoomsTimetable,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::MintCredential => "mint_credential",
			OperationKind::StudentSchedule => "get_student_schedule",
			OperationKind::StudentGrade => "get_student_grade",
			OperationKind::StudentCredit => "get_student_credit",
			OperationKind::StudentGpa => "get_student_gpa",
			OperationKind::TeachingWeek => "get_teaching_week",
			OperationKind::EmptyClassroomCount => "get_empty_classroom_count",
			OperationKind::EmptyClassroomStatus => "get_empty_classroom_status",
			OperationKind::CollegeList => "get_college_list",
			OperationKind::TeacherList => "get_teacher_list",
			OperationKind::CourseList => "get_course_list",
			OperationKind::BuildingList => "get_building_list",
			OperationKind::ClassroomList => "get_classroom_list",
			OperationKind::CourseTimetable => "get_course_timetable",
			OperationKind::ClassTimetable => "get_class_timetable",
			OperationKind::RoomsTimetable => "get_rooms_timetable",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Portal rejected the credential and the request was retried once.
	AuthRetry,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
			OperationOutcome::AuthRetry => "auth_retry",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
