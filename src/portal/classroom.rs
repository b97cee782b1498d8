//! Free-classroom statistics and per-room period occupancy.

// self
use crate::{
	_prelude::*,
	error::UpstreamError,
	obs::OperationKind,
	portal::{AcademicClient, Campus, Endpoint, date_text, lenient, optional_date, required},
};

/// Parameters of [`AcademicClient::get_empty_classroom_count`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ClassroomCountQuery {
	/// Campus name or code; the default campus when omitted.
	#[serde(default)]
	pub campus: Option<String>,
}

/// Parameters of [`AcademicClient::get_empty_classroom_status`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ClassroomStatusQuery {
	/// Building id, e.g. `0002011`.
	#[serde(default)]
	pub build_id: String,
	/// `yyyy-MM-dd` date; the portal's current date when omitted.
	#[serde(default)]
	pub day: Option<String>,
	/// Campus name or code; the default campus when omitted.
	#[serde(default)]
	pub campus: Option<String>,
}

/// Free classrooms in one building.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmptyClassroomCount {
	/// Building id.
	pub building_id: String,
	/// Building name.
	pub building_name: String,
	/// Number of rooms currently free.
	pub free_rooms: u32,
}

/// Period occupancy of one room on one date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassroomOccupancy {
	/// Building the room belongs to.
	pub building_id: String,
	/// Room id.
	pub room_id: String,
	/// Room name.
	pub room_name: String,
	/// Date the snapshot describes.
	#[serde(with = "date_text")]
	pub date: Date,
	/// Occupied periods.
	pub occupied: BTreeSet<u8>,
	/// Free periods.
	pub free: BTreeSet<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountRow {
	#[serde(default, deserialize_with = "lenient::opt_text")]
	build_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_text")]
	build_name: Option<String>,
	#[serde(default, alias = "emptyCount", deserialize_with = "lenient::opt_text")]
	count: Option<String>,
}
impl CountRow {
	fn into_count(self) -> Result<EmptyClassroomCount, UpstreamError> {
		let endpoint = Endpoint::ClassroomCount.path();
		let building_id = self
			.build_id
			.ok_or_else(|| UpstreamError::unnormalizable(endpoint, "row has no buildId"))?;
		let building_name = self.build_name.unwrap_or_else(|| building_id.clone());
		let free_rooms = self.count.as_deref().and_then(|c| c.parse().ok()).ok_or_else(|| {
			UpstreamError::unnormalizable(endpoint, format!("`{building_id}` has no usable count"))
		})?;

		Ok(EmptyClassroomCount { building_id, building_name, free_rooms })
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomRow {
	#[serde(default, deserialize_with = "lenient::opt_text")]
	room_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_text")]
	room_name: Option<String>,
	#[serde(default)]
	periods: Vec<PeriodRow>,
}
impl RoomRow {
	fn into_occupancy(
		self,
		building_id: &str,
		date: Date,
	) -> Result<ClassroomOccupancy, UpstreamError> {
		let endpoint = Endpoint::ClassroomAnalysis.path();
		let room_id = self
			.room_id
			.ok_or_else(|| UpstreamError::unnormalizable(endpoint, "row has no roomId"))?;
		let mut occupied = BTreeSet::new();
		let mut free = BTreeSet::new();

		for period in self.periods {
			let (Some(number), Some(is_occupied)) =
				(period.period.as_deref().and_then(|p| p.parse::<u8>().ok()), period.occupied)
			else {
				return Err(UpstreamError::unnormalizable(
					endpoint,
					format!("room `{room_id}` has an unreadable period"),
				));
			};

			if is_occupied {
				occupied.insert(number);
			} else {
				free.insert(number);
			}
		}

		Ok(ClassroomOccupancy {
			building_id: building_id.to_owned(),
			room_name: self.room_name.unwrap_or_else(|| room_id.clone()),
			room_id,
			date,
			occupied,
			free,
		})
	}
}

#[derive(Debug, Deserialize)]
struct PeriodRow {
	#[serde(default, alias = "section", deserialize_with = "lenient::opt_text")]
	period: Option<String>,
	#[serde(default, alias = "used", deserialize_with = "lenient::opt_flag")]
	occupied: Option<bool>,
}

impl AcademicClient {
	/// Returns the number of free rooms per building, in portal order.
	pub async fn get_empty_classroom_count(
		&self,
		query: &ClassroomCountQuery,
	) -> Result<Vec<EmptyClassroomCount>> {
		const KIND: OperationKind = OperationKind::EmptyClassroomCount;
		const ENDPOINT: Endpoint = Endpoint::ClassroomCount;

		let campus = Campus::resolve(query.campus.as_deref(), self.descriptor().default_campus)?;

		self.run(KIND, ENDPOINT, async {
			let rows: Vec<CountRow> = self
				.fetch_list(
					KIND,
					ENDPOINT,
					&[("campus", campus.code().to_owned()), ("name", String::new())],
				)
				.await?;

			Ok(rows.into_iter().map(CountRow::into_count).collect::<Result<Vec<_>, _>>()?)
		})
		.await
	}

	/// Returns per-room period occupancy for one building.
	///
	/// `day` defaults to the portal's current date. An unknown `build_id` is reported by the
	/// portal and surfaces as an [`UpstreamError`].
	pub async fn get_empty_classroom_status(
		&self,
		query: &ClassroomStatusQuery,
	) -> Result<Vec<ClassroomOccupancy>> {
		const KIND: OperationKind = OperationKind::EmptyClassroomStatus;
		const ENDPOINT: Endpoint = Endpoint::ClassroomAnalysis;

		let build_id = required("build_id", &query.build_id)?;
		let day = optional_date(query.day.as_deref())?;
		let campus = Campus::resolve(query.campus.as_deref(), self.descriptor().default_campus)?;

		self.run(KIND, ENDPOINT, async {
			let day = match day {
				Some(day) => day,
				None => self.current_date(KIND).await?,
			};
			let rows: Option<Vec<RoomRow>> = self
				.fetch(
					KIND,
					ENDPOINT,
					&[
						("campus", campus.code().to_owned()),
						("buildId", build_id.clone()),
						("day", day.to_string()),
					],
				)
				.await?;
			let rows = rows.ok_or_else(|| {
				UpstreamError::unnormalizable(ENDPOINT.path(), format!("unknown building `{build_id}`"))
			})?;

			Ok(rows
				.into_iter()
				.map(|row| row.into_occupancy(&build_id, day))
				.collect::<Result<Vec<_>, _>>()?)
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::date;
	// self
	use super::*;

	#[test]
	fn periods_split_into_occupied_and_free() {
		let row: RoomRow = serde_json::from_str(
			r#"{"roomId":"C4-201","roomName":"C4-201","periods":[
				{"period":1,"occupied":true},
				{"period":"2","occupied":1},
				{"period":3,"occupied":false}
			]}"#,
		)
		.expect("Room row should decode.");
		let occupancy =
			row.into_occupancy("0002011", date!(2025 - 04 - 01)).expect("Row should normalize.");

		assert_eq!(occupancy.occupied, BTreeSet::from([1, 2]));
		assert_eq!(occupancy.free, BTreeSet::from([3]));
		assert_eq!(occupancy.building_id, "0002011");
	}

	#[test]
	fn count_rows_need_ids_and_counts() {
		let good: CountRow = serde_json::from_str(r#"{"buildId":"0002011","buildName":"C4","count":"12"}"#)
			.expect("Count row should decode.");
		let bad: CountRow =
			serde_json::from_str(r#"{"buildId":"0002011","count":"many"}"#).expect("Row should decode.");

		assert_eq!(
			good.into_count().expect("Row should normalize."),
			EmptyClassroomCount {
				building_id: "0002011".into(),
				building_name: "C4".into(),
				free_rooms: 12,
			}
		);
		assert!(bad.into_count().is_err());
	}
}
