//! Tool registry: callable names, descriptions and JSON parameter schemas for every portal
//! operation, plus the dispatcher that turns a `tools/call` into a client call.
//!
//! Arguments are decoded straight into the client's query types. Required identifiers default
//! to empty strings during decoding so that a missing one surfaces as the same
//! [`ValidationError::MissingParameter`] the client raises for blank values.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::json;
// self
use crate::{
	_prelude::*,
	error::{UpstreamError, ValidationError},
	portal::{
		AcademicClient, BuildingListQuery, ClassTimetableQuery, ClassroomCountQuery,
		ClassroomListQuery, ClassroomStatusQuery, CourseTimetableQuery, GradeQuery,
		RoomsTimetableQuery, ScheduleQuery, TeacherListQuery,
	},
};

/// Every registered tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tool {
	/// `health_check`.
	HealthCheck,
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
impl Tool {
	/// Tools in the order `tools/list` reports them.
	pub const ALL: [Tool; 16] = [
		Tool::HealthCheck,
		Tool::StudentSchedule,
		Tool::StudentGrade,
		Tool::StudentCredit,
		Tool::StudentGpa,
		Tool::TeachingWeek,
		Tool::EmptyClassroomCount,
		Tool::EmptyClassroomStatus,
		Tool::CollegeList,
		Tool::TeacherList,
		Tool::CourseList,
		Tool::BuildingList,
		Tool::ClassroomList,
		Tool::CourseTimetable,
		Tool::ClassTimetable,
		Tool::RoomsTimetable,
	];

	/// Callable name.
	pub const fn name(self) -> &'static str {
		match self {
			Tool::HealthCheck => "health_check",
			Tool::StudentSchedule => "get_student_schedule",
			Tool::StudentGrade => "get_student_grade",
			Tool::StudentCredit => "get_student_credit",
			Tool::StudentGpa => "get_student_gpa",
			Tool::TeachingWeek => "get_teaching_week",
			Tool::EmptyClassroomCount => "get_empty_classroom_count",
			Tool::EmptyClassroomStatus => "get_empty_classroom_status",
			Tool::CollegeList => "get_college_list",
			Tool::TeacherList => "get_teacher_list",
			Tool::CourseList => "get_course_list",
			Tool::BuildingList => "get_building_list",
			Tool::ClassroomList => "get_classroom_list",
			Tool::CourseTimetable => "get_course_timetable",
			Tool::ClassTimetable => "get_class_timetable",
			Tool::RoomsTimetable => "get_rooms_timetable",
		}
	}

	/// Human-readable description shown to tool callers.
	pub const fn description(self) -> &'static str {
		match self {
			Tool::HealthCheck => "Report whether the academic tool server is running.",
			Tool::StudentSchedule =>
				"Get the configured student's course schedule for a term (default: current term).",
			Tool::StudentGrade =>
				"Get the configured student's grades. Omit school_year and semester_half for the current term; give only school_year for a whole year.",
			Tool::StudentCredit => "Get the configured student's earned credits per category.",
			Tool::StudentGpa => "Get the configured student's GPA summary.",
			Tool::TeachingWeek => "Get the current teaching week number (1-30).",
			Tool::EmptyClassroomCount => "Count free classrooms per building on a campus.",
			Tool::EmptyClassroomStatus =>
				"Get per-period occupancy of every room in a building for a day (default: today).",
			Tool::CollegeList => "List colleges.",
			Tool::TeacherList => "List the teachers of a college (college_id from get_college_list).",
			Tool::CourseList => "List courses.",
			Tool::BuildingList => "List the buildings of a campus.",
			Tool::ClassroomList =>
				"List the classrooms of a building (build from get_building_list).",
			Tool::CourseTimetable => "Get the timetable of a course for a term.",
			Tool::ClassTimetable => "Get the timetable of an administrative class for a term.",
			Tool::RoomsTimetable => "Get the timetable of a classroom for a term.",
		}
	}

	/// JSON schema of the tool's arguments.
	pub fn input_schema(self) -> Value {
		let campus = json!({
			"type": "string",
			"description": "Campus name (Xiamen Campus, Quanzhou Campus, Longzhouchi Campus, 厦门校区, 泉州校区, 龙舟池校区) or code (0001-0003). Default: the configured campus, Xiamen Campus unless overridden.",
		});
		let school_year =
			json!({ "type": "string", "description": "School year such as 2024-2025." });
		let semester_half = json!({
			"type": "string",
			"enum": ["一", "二"],
			"description": "Half of the school year: 一 (first) or 二 (second).",
		});
		let (properties, required): (Value, Vec<&str>) = match self {
			Tool::HealthCheck
			| Tool::StudentCredit
			| Tool::StudentGpa
			| Tool::TeachingWeek
			| Tool::CollegeList
			| Tool::CourseList => (json!({}), vec![]),
			Tool::StudentSchedule => (
				json!({
					"semester": {
						"type": "string",
						"description": "Term such as 2024-2025-1. Default: the current term.",
					},
				}),
				vec![],
			),
			Tool::StudentGrade =>
				(json!({ "school_year": school_year, "semester_half": semester_half }), vec![]),
			Tool::EmptyClassroomCount | Tool::BuildingList => (json!({ "campus": campus }), vec![]),
			Tool::EmptyClassroomStatus => (
				json!({
					"build_id": { "type": "string", "description": "Building id, e.g. 0002011." },
					"day": {
						"type": "string",
						"description": "Date in yyyy-MM-dd format. Default: the portal's current date.",
					},
					"campus": campus,
				}),
				vec!["build_id"],
			),
			Tool::TeacherList => (
				json!({ "college_id": { "type": "string", "description": "College id." } }),
				vec!["college_id"],
			),
			Tool::ClassroomList => (
				json!({
					"campus": campus,
					"build": { "type": "string", "description": "Building id." },
				}),
				vec!["build"],
			),
			Tool::CourseTimetable => (
				json!({
					"course_name": { "type": "string", "description": "Course name." },
					"school_year": school_year,
					"semester_half": semester_half,
				}),
				vec!["course_name"],
			),
			Tool::ClassTimetable => (
				json!({
					"class_id": { "type": "string", "description": "Administrative class id." },
					"school_year": school_year,
					"semester_half": semester_half,
					"is_overseas": {
						"type": "boolean",
						"description": "Whether the class is in the overseas program. Default: false.",
					},
				}),
				vec!["class_id"],
			),
			Tool::RoomsTimetable => (
				json!({
					"campus": campus,
					"build_name": { "type": "string", "description": "Building name, e.g. C4." },
					"room_id": { "type": "string", "description": "Room id within the building." },
					"school_year": school_year,
					"semester_half": semester_half,
				}),
				vec!["build_name", "room_id"],
			),
		};

		json!({ "type": "object", "properties": properties, "required": required })
	}

	/// Declaration reported by `tools/list`.
	pub fn spec(self) -> ToolSpec {
		ToolSpec {
			name: self.name(),
			description: self.description(),
			input_schema: self.input_schema(),
		}
	}
}
impl FromStr for Tool {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|tool| tool.name() == s)
			.ok_or_else(|| ValidationError::UnknownTool { name: s.to_owned() })
	}
}

/// Tool declaration as serialized into `tools/list`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
	/// Callable name.
	pub name: &'static str,
	/// Description.
	pub description: &'static str,
	/// JSON schema of the arguments.
	pub input_schema: Value,
}

/// Declarations of every registered tool.
pub fn tool_specs() -> Vec<ToolSpec> {
	Tool::ALL.into_iter().map(Tool::spec).collect()
}

/// Runs tool `name` with `arguments` and returns its JSON payload.
pub async fn dispatch(client: &AcademicClient, name: &str, arguments: Value) -> Result<Value> {
	let tool = name.parse::<Tool>()?;

	match tool {
		Tool::HealthCheck => Ok(health(client)),
		Tool::StudentSchedule => {
			let query = arguments_for::<ScheduleQuery>(tool, arguments)?;

			encode(tool, client.get_student_schedule(&query).await?)
		},
		Tool::StudentGrade => {
			let query = arguments_for::<GradeQuery>(tool, arguments)?;

			encode(tool, client.get_student_grade(&query).await?)
		},
		Tool::StudentCredit => encode(tool, client.get_student_credit().await?),
		Tool::StudentGpa => encode(tool, client.get_student_gpa().await?),
		Tool::TeachingWeek => encode(tool, client.get_teaching_week().await?),
		Tool::EmptyClassroomCount => {
			let query = arguments_for::<ClassroomCountQuery>(tool, arguments)?;

			encode(tool, client.get_empty_classroom_count(&query).await?)
		},
		Tool::EmptyClassroomStatus => {
			let query = arguments_for::<ClassroomStatusQuery>(tool, arguments)?;

			encode(tool, client.get_empty_classroom_status(&query).await?)
		},
		Tool::CollegeList => encode(tool, client.get_college_list().await?),
		Tool::TeacherList => {
			let query = arguments_for::<TeacherListQuery>(tool, arguments)?;

			encode(tool, client.get_teacher_list(&query).await?)
		},
		Tool::CourseList => encode(tool, client.get_course_list().await?),
		Tool::BuildingList => {
			let query = arguments_for::<BuildingListQuery>(tool, arguments)?;

			encode(tool, client.get_building_list(&query).await?)
		},
		Tool::ClassroomList => {
			let query = arguments_for::<ClassroomListQuery>(tool, arguments)?;

			encode(tool, client.get_classroom_list(&query).await?)
		},
		Tool::CourseTimetable => {
			let query = arguments_for::<CourseTimetableQuery>(tool, arguments)?;

			encode(tool, client.get_course_timetable(&query).await?)
		},
		Tool::ClassTimetable => {
			let query = arguments_for::<ClassTimetableQuery>(tool, arguments)?;

			encode(tool, client.get_class_timetable(&query).await?)
		},
		Tool::RoomsTimetable => {
			let query = arguments_for::<RoomsTimetableQuery>(tool, arguments)?;

			encode(tool, client.get_rooms_timetable(&query).await?)
		},
	}
}

/// Wraps a dispatch outcome into an MCP `tools/call` result.
pub fn call_result(outcome: Result<Value>) -> Value {
	match outcome {
		Ok(payload) => {
			let text = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());

			json!({ "content": [{ "type": "text", "text": text }], "isError": false })
		},
		Err(err) => {
			let message = err.to_string();

			json!({
				"content": [{ "type": "text", "text": message }],
				"isError": true,
				"structuredContent": { "kind": err.kind(), "message": message },
			})
		},
	}
}

fn health(client: &AcademicClient) -> Value {
	json!({
		"status": "ok",
		"message": "HQU academic tool server is running.",
		"student_id": client.student_id(),
		"credential_cached": client.credentials().cached().is_some(),
	})
}

fn arguments_for<T>(tool: Tool, arguments: Value) -> Result<T, ValidationError>
where
	T: DeserializeOwned + Default,
{
	match arguments {
		Value::Null => Ok(T::default()),
		Value::Object(_) => serde_json::from_value(arguments).map_err(|e| {
			ValidationError::InvalidArguments { tool: tool.name().into(), reason: e.to_string() }
		}),
		other => Err(ValidationError::InvalidArguments {
			tool: tool.name().into(),
			reason: format!("expected an object, got {other}"),
		}),
	}
}

fn encode<T>(tool: Tool, payload: T) -> Result<Value>
where
	T: Serialize,
{
	serde_json::to_value(payload)
		.map_err(|e| UpstreamError::unnormalizable(tool.name(), e.to_string()).into())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, broker::MINT_PATH, error::ErrorKind};

	#[test]
	fn every_tool_round_trips_its_name() {
		for tool in Tool::ALL {
			assert_eq!(tool.name().parse::<Tool>(), Ok(tool));
		}

		assert!(matches!("drop_tables".parse::<Tool>(), Err(ValidationError::UnknownTool { .. })));
		assert_eq!(tool_specs().len(), 16);
	}

	#[test]
	fn schemas_declare_required_identifiers() {
		let schema = Tool::RoomsTimetable.input_schema();

		assert_eq!(schema["required"], json!(["build_name", "room_id"]));
		assert_eq!(schema["properties"]["semester_half"]["enum"], json!(["一", "二"]));
		assert_eq!(Tool::CollegeList.input_schema()["required"], json!([]));

		let spec = serde_json::to_value(Tool::TeacherList.spec()).expect("Spec should serialize.");

		assert!(spec.get("inputSchema").is_some());
	}

	#[tokio::test]
	async fn bad_arguments_fail_without_network() {
		let (client, http) = scripted_client();
		let missing = dispatch(&client, "get_teacher_list", json!({})).await;
		let wrong_type = dispatch(&client, "get_class_timetable", json!({ "class_id": 5 })).await;
		let not_object = dispatch(&client, "get_building_list", json!(["0002"])).await;
		let unknown = dispatch(&client, "get_weather", Value::Null).await;

		for outcome in [missing, wrong_type, not_object, unknown] {
			let err = outcome.expect_err("Invalid calls must fail.");

			assert_eq!(err.kind(), ErrorKind::Validation, "Unexpected error: {err:?}.");
		}

		assert!(http.requests().is_empty());
		assert_eq!(http.calls_to(MINT_PATH), 0);
	}

	#[tokio::test]
	async fn health_check_reports_without_network() {
		let (client, http) = scripted_client();
		let payload = dispatch(&client, "health_check", Value::Null)
			.await
			.expect("Health check should succeed.");

		assert_eq!(payload["status"], "ok");
		assert_eq!(payload["student_id"], TEST_STUDENT_ID);
		assert!(http.requests().is_empty());
	}

	#[test]
	fn call_results_follow_the_tool_result_shape() {
		let ok = call_result(Ok(json!({ "week": 15 })));
		let err = call_result(Err(ValidationError::MissingParameter { parameter: "room_id" }.into()));

		assert_eq!(ok["isError"], false);
		assert!(ok["content"][0]["text"].as_str().is_some_and(|t| t.contains("\"week\": 15")));
		assert_eq!(err["isError"], true);
		assert_eq!(err["structuredContent"]["kind"], "validation");
		assert_eq!(err["content"][0]["text"], "Missing required parameter `room_id`.");
	}
}
