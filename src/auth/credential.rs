//! Portal credential record and lifecycle helpers.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Lifecycle status of a [`Credential`] at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialStatus {
	/// Usable and outside the preemptive window.
	Fresh,
	/// Still valid but inside the preemptive window; refresh before use.
	Stale,
	/// Past its lifetime.
	Expired,
}

/// Short-lived bearer credential minted by the token broker.
///
/// Records are immutable; the provider replaces them wholesale on refresh. `serial` grows by
/// one with every mint so waiters can tell whether someone else already replaced a rejected
/// credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	/// Bearer value sent to the portal.
	pub bearer: TokenSecret,
	/// Instant the broker answered.
	pub acquired_at: OffsetDateTime,
	/// Lifetime hinted by the broker.
	pub ttl: Duration,
	/// Provider-assigned generation number.
	pub serial: u64,
}
impl Credential {
	/// Creates a credential record.
	pub fn new(
		bearer: impl Into<String>,
		acquired_at: OffsetDateTime,
		ttl: Duration,
		serial: u64,
	) -> Self {
		Self { bearer: TokenSecret::new(bearer), acquired_at, ttl, serial }
	}

	/// Instant the credential stops being valid, clamped to the largest representable instant.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.acquired_at.saturating_add(self.ttl)
	}

	/// Computes the status at `instant` given a preemptive refresh window.
	pub fn status_at(&self, instant: OffsetDateTime, window: Duration) -> CredentialStatus {
		let expires_at = self.expires_at();

		if instant >= expires_at {
			return CredentialStatus::Expired;
		}
		if expires_at - instant <= window {
			return CredentialStatus::Stale;
		}

		CredentialStatus::Fresh
	}

	/// Returns `true` when the credential can be handed out without refreshing.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, window: Duration) -> bool {
		matches!(self.status_at(instant, window), CredentialStatus::Fresh)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("bearer", &"<redacted>")
			.field("acquired_at", &self.acquired_at)
			.field("ttl", &self.ttl)
			.field("serial", &self.serial)
			.finish()
	}
}
