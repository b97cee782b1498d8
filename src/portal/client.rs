//! Portal client, request plumbing and the authentication retry policy.

// crates.io
use serde::de::DeserializeOwned;
// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;
use crate::{
	_prelude::*,
	auth::{Credential, Identity, StudentId},
	broker::CredentialProvider,
	envelope::{self, Envelope},
	error::{ConfigError, UpstreamError},
	http::{PortalHttpClient, PortalRequest, PortalResponse},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	portal::PortalDescriptor,
};

/// Portal endpoints, one per information category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
	/// Teaching calendar (current week, term and date).
	Calendar,
	/// Personal course schedule.
	StudentSchedule,
	/// Personal grades.
	StudentGrade,
	/// Credit summary by category.
	StudentCredit,
	/// GPA summary.
	StudentGpa,
	/// Free classrooms per building.
	ClassroomCount,
	/// Per-room period occupancy.
	ClassroomAnalysis,
	/// College directory.
	Colleges,
	/// Teacher directory.
	Teachers,
	/// Course directory.
	Courses,
	/// Building directory.
	Buildings,
	/// Classroom directory.
	Classrooms,
	/// Timetable of one course.
	CourseTimetable,
	/// Timetable of one class.
	ClassTimetable,
	/// Timetable of one room.
	RoomTimetable,
}
impl Endpoint {
	/// Path relative to the portal base URL.
	pub const fn path(self) -> &'static str {
		match self {
			Endpoint::Calendar => "/academic/schoolCalendar",
			Endpoint::StudentSchedule => "/academic/student/schedule",
			Endpoint::StudentGrade => "/academic/student/grade",
			Endpoint::StudentCredit => "/academic/student/credit",
			Endpoint::StudentGpa => "/academic/student/gpa",
			Endpoint::ClassroomCount => "/academic/schoolroom/count",
			Endpoint::ClassroomAnalysis => "/academic/schoolroom/analysis",
			Endpoint::Colleges => "/academic/directory/colleges",
			Endpoint::Teachers => "/academic/directory/teachers",
			Endpoint::Courses => "/academic/directory/courses",
			Endpoint::Buildings => "/academic/directory/buildings",
			Endpoint::Classrooms => "/academic/directory/classrooms",
			Endpoint::CourseTimetable => "/academic/timetable/course",
			Endpoint::ClassTimetable => "/academic/timetable/class",
			Endpoint::RoomTimetable => "/academic/timetable/room",
		}
	}
}

/// Query string pairs in the order they are sent.
pub(crate) type Query = Vec<(&'static str, String)>;

/// Authenticated client for the academic portal.
///
/// The client is cheap to share behind an `Arc`; the only mutable state is the credential cache
/// owned by its [`CredentialProvider`]. Each portal request is attempted with the cached
/// credential and, when the portal answers 401/403, retried exactly once with a freshly minted
/// one. A second rejection surfaces as [`Error::Auth`].
#[derive(Debug)]
pub struct AcademicClient {
	http_client: Arc<dyn PortalHttpClient>,
	descriptor: PortalDescriptor,
	credentials: CredentialProvider,
}
impl AcademicClient {
	/// Builds a client using the reqwest transport bounded by the descriptor's timeout.
	#[cfg(feature = "reqwest")]
	pub fn new(identity: Identity, descriptor: PortalDescriptor) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::with_timeout(descriptor.timeout)?;

		Self::with_http_client(Arc::new(http_client), identity, descriptor)
	}

	/// Builds a client on top of a caller-supplied transport, shared with the credential
	/// provider.
	pub fn with_http_client(
		http_client: Arc<dyn PortalHttpClient>,
		identity: Identity,
		descriptor: PortalDescriptor,
	) -> Result<Self, ConfigError> {
		let credentials =
			CredentialProvider::new(http_client.clone(), Arc::new(identity), &descriptor.broker_base)?
				.with_preemptive_window(descriptor.preemptive_window);

		Ok(Self { http_client, descriptor, credentials })
	}

	/// Deployment description the client was built with.
	pub fn descriptor(&self) -> &PortalDescriptor {
		&self.descriptor
	}

	/// Credential provider shared by every operation.
	pub fn credentials(&self) -> &CredentialProvider {
		&self.credentials
	}

	/// Student the personal operations are made for.
	pub fn student_id(&self) -> &StudentId {
		&self.credentials.identity().student_id
	}

	/// Runs one operation inside its span and records attempt/success/failure outcomes.
	pub(crate) async fn run<T, F>(&self, kind: OperationKind, endpoint: Endpoint, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		let span = OperationSpan::new(kind, endpoint.path());

		span.instrument(async move {
			obs::record_operation_outcome(kind, OperationOutcome::Attempt);

			let result = fut.await;
			let outcome =
				if result.is_ok() { OperationOutcome::Success } else { OperationOutcome::Failure };

			obs::record_operation_outcome(kind, outcome);

			result
		})
		.await
	}

	/// Fetches an endpoint and returns the envelope's `data`, `None` when the portal sent none.
	pub(crate) async fn fetch<T>(
		&self,
		kind: OperationKind,
		endpoint: Endpoint,
		query: &[(&'static str, String)],
	) -> Result<Option<T>>
	where
		T: DeserializeOwned,
	{
		let path = endpoint.path();
		let mut url = self.descriptor.portal_url(path)?;

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
		}

		let response = self.send_authorized(kind, endpoint, url).await?;

		if !response.is_success() {
			return Err(UpstreamError::Status { endpoint: path, status: response.status }.into());
		}

		let envelope: Envelope<Value> = envelope::decode(&response.body)
			.map_err(|source| UpstreamError::Parse { endpoint: path, source })?;

		if !envelope.is_success() {
			return Err(UpstreamError::Portal {
				endpoint: path,
				code: envelope.code.clone(),
				message: envelope.message().to_owned(),
			}
			.into());
		}

		Ok(envelope.into_data().map_err(|source| UpstreamError::Parse { endpoint: path, source })?)
	}

	/// Fetches a listing endpoint; a missing `data` field is an empty list.
	pub(crate) async fn fetch_list<T>(
		&self,
		kind: OperationKind,
		endpoint: Endpoint,
		query: &[(&'static str, String)],
	) -> Result<Vec<T>>
	where
		T: DeserializeOwned,
	{
		Ok(self.fetch(kind, endpoint, query).await?.unwrap_or_default())
	}

	async fn send_authorized(
		&self,
		kind: OperationKind,
		endpoint: Endpoint,
		url: Url,
	) -> Result<PortalResponse> {
		let credential = self.credentials.obtain_credential(false).await?;
		let response = self.send_once(endpoint, url.clone(), &credential).await?;

		if !response.is_auth_rejected() {
			return Ok(response);
		}

		obs::log_auth_rejected(kind, response.status, false);
		obs::record_operation_outcome(kind, OperationOutcome::AuthRetry);

		let refreshed = self.credentials.replace_rejected(&credential).await?;
		let retried = self.send_once(endpoint, url, &refreshed).await?;

		if retried.is_auth_rejected() {
			obs::log_auth_rejected(kind, retried.status, true);

			return Err(Error::Auth { status: retried.status });
		}

		Ok(retried)
	}

	async fn send_once(
		&self,
		endpoint: Endpoint,
		url: Url,
		credential: &Credential,
	) -> Result<PortalResponse, UpstreamError> {
		let request = PortalRequest::get(url).with_bearer(credential.bearer.clone());

		self.http_client
			.execute(request)
			.await
			.map_err(|e| UpstreamError::transport(endpoint.path(), e))
	}
}
