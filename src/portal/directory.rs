//! College, teacher, course, building and classroom directories.
//!
//! Every directory endpoint names its id and name fields differently, so rows are decoded as
//! JSON objects and read through a per-kind key table. Results are never cached: each call
//! returns the portal's current ordering.

// self
use crate::{
	_prelude::*,
	error::UpstreamError,
	obs::OperationKind,
	portal::{AcademicClient, Campus, Endpoint, Query, required},
};

/// Parameters of [`AcademicClient::get_teacher_list`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TeacherListQuery {
	/// College id from a prior [`AcademicClient::get_college_list`] call.
	#[serde(default)]
	pub college_id: String,
}

/// Parameters of [`AcademicClient::get_building_list`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BuildingListQuery {
	/// Campus name or code; the default campus when omitted.
	#[serde(default)]
	pub campus: Option<String>,
}

/// Parameters of [`AcademicClient::get_classroom_list`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ClassroomListQuery {
	/// Campus name or code; the default campus when omitted.
	#[serde(default)]
	pub campus: Option<String>,
	/// Building id from a prior [`AcademicClient::get_building_list`] call.
	#[serde(default)]
	pub build: String,
}

/// Directory kinds exposed by the portal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectoryKind {
	/// Colleges.
	College,
	/// Teachers of one college.
	Teacher,
	/// Courses.
	Course,
	/// Buildings of one campus.
	Building,
	/// Classrooms of one building.
	Classroom,
}
impl DirectoryKind {
	const fn keys(self) -> DirectoryKeys {
		match self {
			DirectoryKind::College =>
				DirectoryKeys { id: "collegeId", name: "collegeName", parent: None },
			DirectoryKind::Teacher =>
				DirectoryKeys { id: "teacherId", name: "teacherName", parent: Some("collegeId") },
			DirectoryKind::Course =>
				DirectoryKeys { id: "courseId", name: "courseName", parent: Some("collegeId") },
			DirectoryKind::Building =>
				DirectoryKeys { id: "buildId", name: "buildName", parent: None },
			DirectoryKind::Classroom =>
				DirectoryKeys { id: "roomId", name: "roomName", parent: Some("buildId") },
		}
	}

	const fn endpoint(self) -> Endpoint {
		match self {
			DirectoryKind::College => Endpoint::Colleges,
			DirectoryKind::Teacher => Endpoint::Teachers,
			DirectoryKind::Course => Endpoint::Courses,
			DirectoryKind::Building => Endpoint::Buildings,
			DirectoryKind::Classroom => Endpoint::Classrooms,
		}
	}
}

#[derive(Clone, Copy, Debug)]
struct DirectoryKeys {
	id: &'static str,
	name: &'static str,
	parent: Option<&'static str>,
}

/// One directory record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirectoryEntity {
	/// Portal identifier.
	pub id: String,
	/// Display name.
	pub display_name: String,
	/// Identifier of the owning college, campus or building, when known.
	pub parent: Option<String>,
}

type Row = serde_json::Map<String, Value>;

impl AcademicClient {
	/// Lists colleges.
	pub async fn get_college_list(&self) -> Result<Vec<DirectoryEntity>> {
		self.directory(OperationKind::CollegeList, DirectoryKind::College, Vec::new(), None).await
	}

	/// Lists the teachers of one college.
	pub async fn get_teacher_list(&self, query: &TeacherListQuery) -> Result<Vec<DirectoryEntity>> {
		let college_id = required("college_id", &query.college_id)?;

		self.directory(
			OperationKind::TeacherList,
			DirectoryKind::Teacher,
			vec![("collegeId", college_id.clone())],
			Some(college_id),
		)
		.await
	}

	/// Lists courses.
	pub async fn get_course_list(&self) -> Result<Vec<DirectoryEntity>> {
		self.directory(OperationKind::CourseList, DirectoryKind::Course, Vec::new(), None).await
	}

	/// Lists the buildings of a campus; each building's parent is the campus code.
	pub async fn get_building_list(&self, query: &BuildingListQuery) -> Result<Vec<DirectoryEntity>> {
		let campus = Campus::resolve(query.campus.as_deref(), self.descriptor().default_campus)?;

		self.directory(
			OperationKind::BuildingList,
			DirectoryKind::Building,
			vec![("campus", campus.code().to_owned())],
			Some(campus.code().to_owned()),
		)
		.await
	}

	/// Lists the classrooms of a building.
	pub async fn get_classroom_list(
		&self,
		query: &ClassroomListQuery,
	) -> Result<Vec<DirectoryEntity>> {
		let build = required("build", &query.build)?;
		let campus = Campus::resolve(query.campus.as_deref(), self.descriptor().default_campus)?;

		self.directory(
			OperationKind::ClassroomList,
			DirectoryKind::Classroom,
			vec![("campus", campus.code().to_owned()), ("build", build.clone())],
			Some(build),
		)
		.await
	}

	async fn directory(
		&self,
		kind: OperationKind,
		directory: DirectoryKind,
		query: Query,
		parent: Option<String>,
	) -> Result<Vec<DirectoryEntity>> {
		let endpoint = directory.endpoint();

		self.run(kind, endpoint, async {
			let rows: Vec<Row> = self.fetch_list(kind, endpoint, &query).await?;

			Ok(normalize_rows(directory, rows, parent.as_deref())?)
		})
		.await
	}
}

/// Maps raw rows onto [`DirectoryEntity`] values, failing on the first row without id or name.
pub(crate) fn normalize_rows(
	directory: DirectoryKind,
	rows: Vec<Row>,
	parent: Option<&str>,
) -> Result<Vec<DirectoryEntity>, UpstreamError> {
	let keys = directory.keys();
	let endpoint = directory.endpoint().path();

	rows.into_iter()
		.enumerate()
		.map(|(index, row)| {
			let id = field(&row, keys.id).or_else(|| field(&row, "id")).ok_or_else(|| {
				UpstreamError::unnormalizable(endpoint, format!("row {index} has no `{}`", keys.id))
			})?;
			let display_name =
				field(&row, keys.name).or_else(|| field(&row, "name")).ok_or_else(|| {
					UpstreamError::unnormalizable(endpoint, format!("row {index} has no `{}`", keys.name))
				})?;
			let parent = keys
				.parent
				.and_then(|key| field(&row, key))
				.or_else(|| parent.map(str::to_owned));

			Ok(DirectoryEntity { id, display_name, parent })
		})
		.collect()
}

fn field(row: &Row, key: &str) -> Option<String> {
	let text = match row.get(key)? {
		Value::String(text) => text.trim().to_owned(),
		Value::Number(number) => number.to_string(),
		_ => return None,
	};

	(!text.is_empty()).then_some(text)
}
