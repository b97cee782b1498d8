// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::macros::{date, time};
// self
use hqu_academic::{
	_preludet::*,
	broker::MINT_PATH,
	error::{ErrorKind, UpstreamError},
	portal::{
		AcademicClient, ClassroomCountQuery, ClassroomStatusQuery, Endpoint, GradeQuery,
		RoomsTimetableQuery, ScheduleDay, Score, SlotRange, TeacherListQuery,
	},
};

const BEARER: &str = "Bearer portal-credential";

async fn mount_broker(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path(MINT_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(mint_body("portal-credential", Some(1800)));
		})
		.await
}

fn client(server: &MockServer) -> AcademicClient {
	reqwest_test_client(&server.base_url(), &server.base_url())
}

#[tokio::test]
async fn teaching_week_is_read_from_the_calendar() {
	let server = MockServer::start_async().await;
	let broker = mount_broker(&server).await;
	let calendar = server
		.mock_async(|when, then| {
			when.method(GET).path(Endpoint::Calendar.path()).header("authorization", BEARER);
			then.status(200).header("content-type", "application/json").body(portal_body(json!({
				"currWeek": "第15周",
				"currTerm": "2024-2025-2",
				"currDate": "2025-04-01",
			})));
		})
		.await;
	let week = client(&server).get_teaching_week().await.expect("Teaching week should resolve.");

	assert_eq!(week.week, 15);
	assert_eq!(week.date, date!(2025 - 04 - 01));

	broker.assert_calls_async(1).await;
	calendar.assert_calls_async(1).await;
}

#[tokio::test]
async fn unparsable_teaching_week_is_an_upstream_error() {
	let server = MockServer::start_async().await;

	mount_broker(&server).await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(Endpoint::Calendar.path());
			then.status(200)
				.header("content-type", "application/json")
				.body(portal_body(json!({ "currWeek": "N/A" })));
		})
		.await;

	let err = client(&server).get_teaching_week().await.expect_err("N/A is not a week.");

	assert_eq!(err.kind(), ErrorKind::Upstream);
	assert!(
		matches!(&err, Error::Upstream(UpstreamError::TeachingWeek { value }) if value == "N/A"),
		"Unexpected error: {err:?}."
	);
}

#[tokio::test]
async fn grades_keep_portal_order_and_raw_scores() {
	let server = MockServer::start_async().await;

	mount_broker(&server).await;

	let grades = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(Endpoint::StudentGrade.path())
				.query_param("studentId", TEST_STUDENT_ID)
				.query_param("xn", "2024-2025")
				.query_param("xq", "2");
			then.status(200).header("content-type", "application/json").body(portal_body(json!([
				{ "kcmc": "高等数学", "xf": "4", "cj": 95, "jd": "4.5" },
				{ "kcmc": "体育", "xf": 1, "cj": "合格", "jd": "" },
				{ "kcmc": "数据结构", "xf": 3.5, "cj": "88", "jd": 3.8 },
			])));
		})
		.await;
	let records = client(&server)
		.get_student_grade(&GradeQuery {
			school_year: Some("2024-2025".into()),
			semester_half: Some("二".into()),
		})
		.await
		.expect("Grades should normalize.");
	let names = records.iter().map(|r| r.course_name.as_str()).collect::<Vec<_>>();

	assert_eq!(names, ["高等数学", "体育", "数据结构"]);
	assert_eq!(records[0].credit, 4.0);
	assert_eq!(records[0].score, Score::Number(serde_json::Number::from(95_u64)));
	assert_eq!(records[1].score, Score::Text("合格".into()));
	assert_eq!(records[1].grade_point, None);
	assert_eq!(records[2].score, Score::Text("88".into()));
	assert_eq!(records[2].grade_point, Some(3.8));

	grades.assert_calls_async(1).await;
}

#[tokio::test]
async fn omitted_campus_matches_the_default_campus() {
	let server = MockServer::start_async().await;

	mount_broker(&server).await;

	let counts = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(Endpoint::ClassroomCount.path())
				.query_param("campus", "0002")
				.query_param("name", "");
			then.status(200).header("content-type", "application/json").body(portal_body(json!([
				{ "buildId": "0002011", "buildName": "C4", "count": "12" },
				{ "buildId": "0002012", "buildName": "C5", "count": 3 },
			])));
		})
		.await;
	let client = client(&server);
	let implicit = client
		.get_empty_classroom_count(&ClassroomCountQuery::default())
		.await
		.expect("Default campus should resolve.");
	let explicit = client
		.get_empty_classroom_count(&ClassroomCountQuery { campus: Some("Xiamen Campus".into()) })
		.await
		.expect("Explicit campus should resolve.");

	assert_eq!(implicit, explicit);
	assert_eq!(implicit[0].free_rooms, 12);
	assert_eq!(implicit[1].building_name, "C5");

	counts.assert_calls_async(2).await;
}

#[tokio::test]
async fn room_timetable_defaults_to_the_current_term() {
	let server = MockServer::start_async().await;

	mount_broker(&server).await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(Endpoint::Calendar.path());
			then.status(200).header("content-type", "application/json").body(portal_body(json!({
				"currWeek": "第6周",
				"currTerm": "2024-2025-1",
			})));
		})
		.await;

	let rooms = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(Endpoint::RoomTimetable.path())
				.query_param("campus", "0001")
				.query_param("buildName", "C4")
				.query_param("roomId", "201")
				.query_param("xn", "2024-2025")
				.query_param("xq", "1");
			then.status(200).header("content-type", "application/json").body(portal_body(json!([
				{
					"course": "数据结构",
					"teacher": "王老师",
					"date": "2024-10-08",
					"startTime": "08:00",
					"endTime": "09:35",
				},
			])));
		})
		.await;
	let entries = client(&server)
		.get_rooms_timetable(&RoomsTimetableQuery {
			campus: Some("泉州校区".into()),
			build_name: "C4".into(),
			room_id: "201".into(),
			..Default::default()
		})
		.await
		.expect("Room timetable should normalize.");

	assert_eq!(entries.len(), 1);
	assert_eq!(entries[0].location, "C4 201");
	assert_eq!(entries[0].day, ScheduleDay::Date { date: date!(2024 - 10 - 08) });
	assert_eq!(entries[0].slot, SlotRange::Clock { start: time!(8:00), end: time!(9:35) });

	rooms.assert_calls_async(1).await;
}

#[tokio::test]
async fn invalid_parameters_never_reach_the_network() {
	let server = MockServer::start_async().await;
	let anything = server
		.mock_async(|_when, then| {
			then.status(500);
		})
		.await;
	let client = client(&server);
	let outcomes = [
		client
			.get_empty_classroom_status(&ClassroomStatusQuery {
				build_id: "  ".into(),
				..Default::default()
			})
			.await
			.map(drop),
		client
			.get_empty_classroom_status(&ClassroomStatusQuery {
				build_id: "0002011".into(),
				day: Some("2025/04/01".into()),
				campus: None,
			})
			.await
			.map(drop),
		client.get_teacher_list(&TeacherListQuery::default()).await.map(drop),
		client
			.get_empty_classroom_count(&ClassroomCountQuery { campus: Some("Mars Campus".into()) })
			.await
			.map(drop),
		client
			.get_student_grade(&GradeQuery { school_year: None, semester_half: Some("三".into()) })
			.await
			.map(drop),
		client
			.get_rooms_timetable(&RoomsTimetableQuery {
				build_name: "C4".into(),
				..Default::default()
			})
			.await
			.map(drop),
	];

	for outcome in outcomes {
		let err = outcome.expect_err("Invalid parameters must fail.");

		assert_eq!(err.kind(), ErrorKind::Validation, "Unexpected error: {err:?}.");
	}

	anything.assert_calls_async(0).await;
}

#[tokio::test]
async fn repeated_rejection_is_an_auth_error() {
	let server = MockServer::start_async().await;
	let broker = mount_broker(&server).await;
	let calendar = server
		.mock_async(|when, then| {
			when.method(GET).path(Endpoint::Calendar.path());
			then.status(401);
		})
		.await;
	let err = client(&server).get_teaching_week().await.expect_err("Two rejections should fail.");

	assert_eq!(err.kind(), ErrorKind::Auth);
	assert!(matches!(err, Error::Auth { status: 401 }), "Unexpected error: {err:?}.");

	broker.assert_calls_async(2).await;
	calendar.assert_calls_async(2).await;
}
