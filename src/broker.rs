//! Credential provider backed by the Sends token broker.
//!
//! [`CredentialProvider::obtain_credential`] hands out the cached portal credential while it is
//! fresh and otherwise mints a new one through the broker. Every refresh runs inside one async
//! critical section, so callers that find the cache empty (or see the same credential rejected)
//! at the same time share a single broker call. The cache itself is a lock-protected
//! `Option<Credential>` that is swapped wholesale, never edited in place.

mod metrics;

pub use metrics::MintMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialStatus, Identity, TokenSecret},
	envelope::{self, Envelope},
	error::{ConfigError, CredentialError},
	http::{PortalHttpClient, PortalRequest},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
};

/// Path of the broker endpoint that mints portal credentials.
pub const MINT_PATH: &str = "/service/school/token";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MintPayload {
	#[serde(alias = "token")]
	access_token: Option<String>,
	expires_in: Option<i64>,
}

#[derive(Clone, Copy, Debug)]
enum RefreshCause {
	/// Cache is empty or no longer fresh.
	Missing,
	/// The portal rejected the credential with this serial (if any was cached).
	Rejected { serial: Option<u64> },
}
impl RefreshCause {
	fn can_reuse(self, current: &Credential, now: OffsetDateTime, window: Duration) -> bool {
		match self {
			RefreshCause::Missing => current.is_fresh_at(now, window),
			RefreshCause::Rejected { serial } =>
				Some(current.serial) != serial
					&& current.status_at(now, window) != CredentialStatus::Expired,
		}
	}
}

/// Owns the in-memory portal credential and serializes its refreshes.
pub struct CredentialProvider {
	http_client: Arc<dyn PortalHttpClient>,
	identity: Arc<Identity>,
	mint_url: Url,
	preemptive_window: Duration,
	cache: RwLock<Option<Credential>>,
	serial: AtomicU64,
	refresh_guard: AsyncMutex<()>,
	metrics: MintMetrics,
}
impl CredentialProvider {
	/// Default lifetime applied when the broker omits `expiresIn`.
	pub const DEFAULT_TTL: Duration = Duration::minutes(30);
	/// Credentials closer than this to expiry are refreshed before use.
	pub const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Creates a provider minting credentials at `{broker_base}/service/school/token`.
	pub fn new(
		http_client: Arc<dyn PortalHttpClient>,
		identity: Arc<Identity>,
		broker_base: &Url,
	) -> Result<Self, ConfigError> {
		let mint_url = format!("{}{MINT_PATH}", broker_base.as_str().trim_end_matches('/'));
		let mint_url = Url::parse(&mint_url)
			.map_err(|source| ConfigError::InvalidUrl { endpoint: "broker", source })?;

		Ok(Self {
			http_client,
			identity,
			mint_url,
			preemptive_window: Self::DEFAULT_PREEMPTIVE_WINDOW,
			cache: RwLock::new(None),
			serial: AtomicU64::new(0),
			refresh_guard: AsyncMutex::new(()),
			metrics: MintMetrics::default(),
		})
	}

	/// Overrides the preemptive window (negative values are treated as zero).
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Identity the provider mints credentials for.
	pub fn identity(&self) -> &Identity {
		&self.identity
	}

	/// Mint counters.
	pub fn metrics(&self) -> &MintMetrics {
		&self.metrics
	}

	/// Returns a copy of the cached credential, if any.
	pub fn cached(&self) -> Option<Credential> {
		self.cache.read().clone()
	}

	/// Returns a usable credential.
	///
	/// Without `force_refresh` a fresh cached credential is returned without I/O. With
	/// `force_refresh` the currently cached credential is treated as rejected: a new one is
	/// minted unless another caller already replaced it while this one waited.
	pub async fn obtain_credential(&self, force_refresh: bool) -> Result<Credential> {
		let now = OffsetDateTime::now_utc();
		let cached = self.cached();

		if !force_refresh {
			if let Some(current) = cached.filter(|c| c.is_fresh_at(now, self.preemptive_window)) {
				return Ok(current);
			}

			return self.refresh(RefreshCause::Missing).await;
		}

		self.refresh(RefreshCause::Rejected { serial: cached.map(|c| c.serial) }).await
	}

	/// Forced refresh after the portal rejected `rejected`.
	pub(crate) async fn replace_rejected(&self, rejected: &Credential) -> Result<Credential> {
		self.refresh(RefreshCause::Rejected { serial: Some(rejected.serial) }).await
	}

	async fn refresh(&self, cause: RefreshCause) -> Result<Credential> {
		const KIND: OperationKind = OperationKind::MintCredential;

		let span = OperationSpan::new(KIND, MINT_PATH);

		span.instrument(async move {
			let _singleflight = self.refresh_guard.lock().await;
			let now = OffsetDateTime::now_utc();
			let current = self.cached();

			if let Some(current) =
				current.filter(|c| cause.can_reuse(c, now, self.preemptive_window))
			{
				self.metrics.record_reuse();

				return Ok(current);
			}

			obs::record_operation_outcome(KIND, OperationOutcome::Attempt);
			self.metrics.record_attempt();

			match self.mint().await {
				Ok(credential) => {
					*self.cache.write() = Some(credential.clone());

					self.metrics.record_success();
					obs::record_operation_outcome(KIND, OperationOutcome::Success);
					obs::log_credential_minted(credential.serial, credential.ttl);

					Ok(credential)
				},
				Err(err) => {
					self.metrics.record_failure();
					obs::record_operation_outcome(KIND, OperationOutcome::Failure);

					Err(err.into())
				},
			}
		})
		.await
	}

	async fn mint(&self) -> Result<Credential, CredentialError> {
		let body = serde_json::json!({
			"studentId": self.identity.student_id.as_ref(),
			"deviceToken": self.identity.device_token.expose(),
		});
		let request = PortalRequest::post_json(self.mint_url.clone(), body)
			.with_bearer(self.identity.broker_token.clone());
		let response = self.http_client.execute(request).await?;

		if !response.is_success() {
			return Err(CredentialError::Status { status: response.status });
		}

		let envelope: Envelope<Value> = envelope::decode(&response.body)
			.map_err(|source| CredentialError::Parse { source })?;

		if !envelope.is_success() {
			return Err(CredentialError::Rejected {
				code: envelope.code.clone(),
				message: envelope.message().to_owned(),
			});
		}

		let payload = envelope
			.into_data::<MintPayload>()
			.map_err(|source| CredentialError::Parse { source })?
			.ok_or(CredentialError::MissingCredential)?;
		let bearer = TokenSecret::new(payload.access_token.unwrap_or_default());

		if bearer.is_blank() {
			return Err(CredentialError::MissingCredential);
		}

		let ttl = match payload.expires_in {
			Some(secs) if secs <= 0 => return Err(CredentialError::NonPositiveTtl),
			Some(secs) => Duration::seconds(secs),
			None => Self::DEFAULT_TTL,
		};
		let acquired_at = OffsetDateTime::now_utc();

		if acquired_at.checked_add(ttl).is_none() {
			return Err(CredentialError::TtlOutOfRange { secs: ttl.whole_seconds() });
		}

		let serial = self.serial.fetch_add(1, Ordering::Relaxed) + 1;

		Ok(Credential { bearer, acquired_at, ttl, serial })
	}
}
impl Debug for CredentialProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialProvider")
			.field("mint_url", &self.mint_url.as_str())
			.field("student_id", &self.identity.student_id)
			.field("cached_serial", &self.cache.read().as_ref().map(|c| c.serial))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, error::Error};

	fn provider(http: &Arc<ScriptedHttpClient>) -> CredentialProvider {
		CredentialProvider::new(
			http.clone(),
			Arc::new(test_identity()),
			&Url::parse(TEST_BROKER_BASE).expect("Broker fixture URL should parse."),
		)
		.expect("Provider should build for fixture URLs.")
	}

	#[tokio::test]
	async fn cached_credential_is_reused_until_forced() {
		let http = Arc::new(ScriptedHttpClient::default());

		http.reply(MINT_PATH, 200, mint_body("cred-1", Some(1800)))
			.reply(MINT_PATH, 200, mint_body("cred-2", Some(1800)));

		let provider = provider(&http);
		let first = provider.obtain_credential(false).await.expect("First mint should succeed.");
		let second = provider.obtain_credential(false).await.expect("Cached read should succeed.");
		let forced = provider.obtain_credential(true).await.expect("Forced mint should succeed.");

		assert_eq!(first.bearer.expose(), "cred-1");
		assert_eq!(second.serial, first.serial);
		assert_eq!(forced.bearer.expose(), "cred-2");
		assert_eq!(forced.serial, first.serial + 1);
		assert_eq!(http.calls_to(MINT_PATH), 2);
		assert_eq!(provider.metrics().successes(), 2);
	}

	#[tokio::test]
	async fn mint_sends_identity_and_broker_token() {
		let http = Arc::new(ScriptedHttpClient::default());

		http.reply(MINT_PATH, 200, mint_body("cred-1", None));

		let credential =
			provider(&http).obtain_credential(false).await.expect("Mint should succeed.");
		let request = http.requests().pop().expect("Broker request should be recorded.");
		let body = request.json_body.expect("Mint request should carry a JSON body.");

		assert_eq!(credential.ttl, CredentialProvider::DEFAULT_TTL);
		assert_eq!(request.bearer.as_ref().map(|b| b.expose()), Some(TEST_BROKER_TOKEN));
		assert_eq!(body["studentId"], TEST_STUDENT_ID);
		assert_eq!(body["deviceToken"], TEST_DEVICE_TOKEN);
	}

	#[tokio::test]
	async fn replaced_credential_is_shared_with_later_rejections() {
		let http = Arc::new(ScriptedHttpClient::default());

		http.reply(MINT_PATH, 200, mint_body("cred-1", Some(1800)))
			.reply(MINT_PATH, 200, mint_body("cred-2", Some(1800)));

		let provider = provider(&http);
		let rejected = provider.obtain_credential(false).await.expect("Mint should succeed.");
		let first = provider.replace_rejected(&rejected).await.expect("Refresh should succeed.");
		let second = provider.replace_rejected(&rejected).await.expect("Reuse should succeed.");

		assert_eq!(first.bearer.expose(), "cred-2");
		assert_eq!(second.serial, first.serial);
		assert_eq!(http.calls_to(MINT_PATH), 2);
		assert_eq!(provider.metrics().reused(), 1);
	}

	#[tokio::test]
	async fn broker_failures_map_to_credential_errors() {
		let cases = [
			(500, String::from("oops")),
			(200, String::from("not json")),
			(200, String::from(r#"{"code":"4001","msg":"device not bound"}"#)),
			(200, String::from(r#"{"code":"0000","data":{}}"#)),
			(200, mint_body("cred", Some(0))),
			(200, mint_body("   ", Some(1800))),
			(200, mint_body("cred", Some(1_000_000_000_000))),
			(200, String::from(r#"{"code":"4002","msg":"device expired","data":""}"#)),
		];

		for (status, body) in cases {
			let http = Arc::new(ScriptedHttpClient::default());

			http.reply(MINT_PATH, status, body);

			let err = provider(&http)
				.obtain_credential(false)
				.await
				.expect_err("Broker failure should surface.");

			assert!(matches!(err, Error::Credential(_)), "Unexpected error: {err:?}.");
		}
	}

	#[tokio::test]
	async fn oversized_ttl_is_rejected_on_every_call() {
		let http = Arc::new(ScriptedHttpClient::default());

		http.reply(MINT_PATH, 200, mint_body("cred-1", Some(1_000_000_000_000)));

		let provider = provider(&http);

		for _ in 0..2 {
			let err = provider.obtain_credential(false).await.expect_err("Huge TTL should fail.");

			assert!(
				matches!(
					err,
					Error::Credential(CredentialError::TtlOutOfRange { secs: 1_000_000_000_000 })
				),
				"Unexpected error: {err:?}."
			);
			assert!(provider.cached().is_none());
		}

		assert_eq!(http.calls_to(MINT_PATH), 2);
	}

	#[tokio::test]
	async fn rejection_with_odd_data_keeps_the_broker_code() {
		let http = Arc::new(ScriptedHttpClient::default());

		http.reply(MINT_PATH, 200, r#"{"code":"4002","msg":"device expired","data":""}"#);

		let err = provider(&http)
			.obtain_credential(false)
			.await
			.expect_err("Rejection should surface.");

		assert!(
			matches!(
				&err,
				Error::Credential(CredentialError::Rejected { code, message })
					if code == "4002" && message == "device expired"
			),
			"Unexpected error: {err:?}."
		);
	}

	#[tokio::test]
	async fn failed_mint_keeps_previous_credential() {
		let http = Arc::new(ScriptedHttpClient::default());

		http.reply(MINT_PATH, 200, mint_body("cred-1", Some(1800))).reply(MINT_PATH, 502, "");

		let provider = provider(&http);
		let first = provider.obtain_credential(false).await.expect("Mint should succeed.");
		let err = provider.obtain_credential(true).await.expect_err("Forced mint should fail.");

		assert!(matches!(err, Error::Credential(CredentialError::Status { status: 502 })));
		assert_eq!(provider.cached().map(|c| c.serial), Some(first.serial));
		assert_eq!(provider.metrics().failures(), 1);
	}
}
