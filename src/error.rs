//! Crate-level error types shared by the credential provider, the portal client, and the tool
//! layer.

// self
use crate::{_prelude::*, auth::IdentifierError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;
type JsonPathError = serde_path_to_error::Error<serde_json::Error>;

/// Stable error categories surfaced to tool callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// Caller-supplied parameter was missing or unrecognized.
	Validation,
	/// Token broker could not mint a credential.
	Credential,
	/// Portal rejected the request even after a forced refresh.
	Auth,
	/// Portal failed, timed out, or returned data that cannot be normalized.
	Upstream,
	/// Startup-time configuration problem.
	Config,
}
impl ErrorKind {
	/// Returns a stable label suitable for tool results and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::Validation => "validation",
			ErrorKind::Credential => "credential",
			ErrorKind::Auth => "auth",
			ErrorKind::Upstream => "upstream",
			ErrorKind::Config => "config",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Parameter problem detected before any network call.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Token broker failure.
	#[error(transparent)]
	Credential(#[from] CredentialError),
	/// Portal kept rejecting the credential after one forced refresh.
	#[error("Portal rejected the request after a forced credential refresh (HTTP {status}).")]
	Auth {
		/// HTTP status of the second rejection.
		status: u16,
	},
	/// Portal-side failure.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns the stable category of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::Validation(_) => ErrorKind::Validation,
			Error::Credential(_) => ErrorKind::Credential,
			Error::Auth { .. } => ErrorKind::Auth,
			Error::Upstream(_) => ErrorKind::Upstream,
			Error::Config(_) => ErrorKind::Config,
		}
	}
}

/// Caller-side parameter failures. No network call has been made when one of these surfaces.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// A required identifier was missing or blank.
	#[error("Missing required parameter `{parameter}`.")]
	MissingParameter {
		/// Parameter name as exposed to callers.
		parameter: &'static str,
	},
	/// Campus name is not in the campus table.
	#[error(
		"Unknown campus `{value}`; expected Xiamen Campus, Quanzhou Campus or Longzhouchi Campus."
	)]
	UnknownCampus {
		/// Value supplied by the caller.
		value: String,
	},
	/// School year is not a `YYYY-YYYY` pair of consecutive years.
	#[error("School year `{value}` must look like 2024-2025.")]
	InvalidSchoolYear {
		/// Value supplied by the caller.
		value: String,
	},
	/// Semester half marker is not one of the known markers.
	#[error("Semester half `{value}` must be 一 or 二.")]
	InvalidSemesterHalf {
		/// Value supplied by the caller.
		value: String,
	},
	/// Composite semester token is malformed.
	#[error("Semester `{value}` must look like 2024-2025-1 or 2024-2025-2.")]
	InvalidSemester {
		/// Value supplied by the caller.
		value: String,
	},
	/// Date is not in `yyyy-MM-dd` form.
	#[error("Date `{value}` must use the yyyy-MM-dd format.")]
	InvalidDate {
		/// Value supplied by the caller.
		value: String,
	},
	/// Tool name is not registered.
	#[error("Unknown tool `{name}`.")]
	UnknownTool {
		/// Requested tool name.
		name: String,
	},
	/// Tool arguments do not match the declared schema.
	#[error("Invalid arguments for `{tool}`: {reason}.")]
	InvalidArguments {
		/// Tool name.
		tool: String,
		/// Deserializer message.
		reason: String,
	},
}

/// Token broker failures.
#[derive(Debug, ThisError)]
pub enum CredentialError {
	/// Broker call exceeded the configured timeout.
	#[error("Token broker request timed out.")]
	Timeout,
	/// Broker could not be reached.
	#[error("Token broker is unreachable.")]
	Unreachable {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Broker answered with a non-success HTTP status.
	#[error("Token broker returned HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
	/// Broker answered with a non-success envelope code.
	#[error("Token broker rejected the identity: {code} {message}.")]
	Rejected {
		/// Broker status code.
		code: String,
		/// Broker message.
		message: String,
	},
	/// Broker body is not the expected JSON.
	#[error("Token broker returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
	/// Broker payload lacks the credential field.
	#[error("Token broker response is missing the access token.")]
	MissingCredential,
	/// Broker returned a zero or negative lifetime.
	#[error("Token broker returned a non-positive expiresIn value.")]
	NonPositiveTtl,
	/// Broker returned a lifetime too large to add to the current time.
	#[error("Token broker returned an out-of-range expiresIn value: {secs} seconds.")]
	TtlOutOfRange {
		/// Lifetime the broker sent.
		secs: i64,
	},
}
impl From<TransportError> for CredentialError {
	fn from(e: TransportError) -> Self {
		match e {
			TransportError::Timeout => Self::Timeout,
			TransportError::Network { source } => Self::Unreachable { source },
		}
	}
}

/// Portal failures surfaced per operation and never retried.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Portal call exceeded the configured timeout.
	#[error("Portal request to {endpoint} timed out.")]
	Timeout {
		/// Portal endpoint path.
		endpoint: &'static str,
	},
	/// Portal could not be reached.
	#[error("Portal endpoint {endpoint} is unreachable.")]
	Unreachable {
		/// Portal endpoint path.
		endpoint: &'static str,
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Portal answered with a non-success, non-auth HTTP status.
	#[error("Portal endpoint {endpoint} returned HTTP {status}.")]
	Status {
		/// Portal endpoint path.
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
	},
	/// Portal envelope carried a failure code.
	#[error("Portal endpoint {endpoint} reported {code}: {message}.")]
	Portal {
		/// Portal endpoint path.
		endpoint: &'static str,
		/// Portal status code.
		code: String,
		/// Portal message.
		message: String,
	},
	/// Portal body is not the expected JSON.
	#[error("Portal endpoint {endpoint} returned malformed JSON.")]
	Parse {
		/// Portal endpoint path.
		endpoint: &'static str,
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
	/// A record cannot be mapped onto the normalized shape.
	#[error("Portal endpoint {endpoint} returned an unusable record: {reason}.")]
	Unnormalizable {
		/// Portal endpoint path.
		endpoint: &'static str,
		/// What was wrong with the record.
		reason: String,
	},
	/// Teaching week label is unparsable or out of range.
	#[error("Portal reported teaching week `{value}`, expected a week between 1 and 30.")]
	TeachingWeek {
		/// Raw label reported by the portal.
		value: String,
	},
	/// Calendar does not expose the current term.
	#[error("Portal calendar does not report the current term.")]
	MissingCurrentTerm,
}
impl UpstreamError {
	pub(crate) fn transport(endpoint: &'static str, e: TransportError) -> Self {
		match e {
			TransportError::Timeout => Self::Timeout { endpoint },
			TransportError::Network { source } => Self::Unreachable { endpoint, source },
		}
	}

	pub(crate) fn unnormalizable(endpoint: &'static str, reason: impl Into<String>) -> Self {
		Self::Unnormalizable { endpoint, reason: reason.into() }
	}
}

/// Configuration and construction failures raised at startup.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Required environment variable is absent or blank.
	#[error("Environment variable {name} is required.")]
	MissingVar {
		/// Variable name.
		name: &'static str,
	},
	/// Environment variable holds an unusable value.
	#[error("Environment variable {name} is invalid: {reason}.")]
	InvalidVar {
		/// Variable name.
		name: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// Base URL cannot be parsed.
	#[error("The {endpoint} base URL is invalid.")]
	InvalidUrl {
		/// Which base URL failed.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than http(s).
	#[error("The {endpoint} base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Which base URL failed.
		endpoint: &'static str,
		/// Offending URL.
		url: String,
	},
	/// Identity field failed validation.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, timeouts) reported by a [`crate::http::PortalHttpClient`].
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Request exceeded its timeout.
	#[error("Request timed out.")]
	Timeout,
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}
