//! Process-wide identity used to mint portal credentials.

// self
use crate::auth::{StudentId, TokenSecret};

/// Identity configured at startup and shared read-only by every component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
	/// Student the portal calls are made for.
	pub student_id: StudentId,
	/// Device/app identity token registered with the broker.
	pub device_token: TokenSecret,
	/// API token authorizing calls to the broker itself.
	pub broker_token: TokenSecret,
}
impl Identity {
	/// Creates an identity from its three parts.
	pub fn new(
		student_id: StudentId,
		device_token: impl Into<String>,
		broker_token: impl Into<String>,
	) -> Self {
		Self {
			student_id,
			device_token: TokenSecret::new(device_token),
			broker_token: TokenSecret::new(broker_token),
		}
	}
}
