//! Authenticated client for the HQU academic portal: broker-minted credentials with
//! singleflight refresh, validated campus/term/date parameters, normalized schedules, grades,
//! classrooms and directories, all exposed as MCP tools over stdio.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod broker;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod obs;
pub mod portal;
#[cfg(feature = "server")] pub mod server;
pub mod tools;

#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Scripted transport, fixtures and client builders shared by unit and integration tests.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		auth::{Identity, StudentId},
		error::TransportError,
		http::{PortalHttpClient, PortalRequest, PortalResponse, TransportFuture},
		portal::{AcademicClient, PortalDescriptor},
	};

	/// Student number used by every fixture identity.
	pub const TEST_STUDENT_ID: &str = "2125101001";
	/// Device token used by every fixture identity.
	pub const TEST_DEVICE_TOKEN: &str = "device-token-fixture";
	/// Broker API token used by every fixture identity.
	pub const TEST_BROKER_TOKEN: &str = "broker-token-fixture";
	/// Broker base URL served by [`ScriptedHttpClient`].
	pub const TEST_BROKER_BASE: &str = "https://broker.test";
	/// Portal base URL served by [`ScriptedHttpClient`].
	pub const TEST_PORTAL_BASE: &str = "https://portal.test";

	#[derive(Clone, Debug)]
	enum Scripted {
		Reply(PortalResponse),
		Timeout,
	}

	/// In-memory transport answering from per-path queues.
	///
	/// Each path serves its queued responses in order and keeps repeating the last one. Paths
	/// with nothing queued answer `404`. Every request is recorded.
	#[derive(Debug, Default)]
	pub struct ScriptedHttpClient {
		routes: Mutex<BTreeMap<String, VecDeque<Scripted>>>,
		requests: Mutex<Vec<PortalRequest>>,
	}
	impl ScriptedHttpClient {
		/// Queues a response for `path`.
		pub fn reply(&self, path: &str, status: u16, body: impl Into<String>) -> &Self {
			self.push(path, Scripted::Reply(PortalResponse::new(status, body.into())))
		}

		/// Queues a transport timeout for `path`.
		pub fn timeout(&self, path: &str) -> &Self {
			self.push(path, Scripted::Timeout)
		}

		/// Returns every request seen so far, oldest first.
		pub fn requests(&self) -> Vec<PortalRequest> {
			self.requests.lock().clone()
		}

		/// Counts the requests sent to `path`.
		pub fn calls_to(&self, path: &str) -> usize {
			self.requests.lock().iter().filter(|r| r.url.path() == path).count()
		}

		fn push(&self, path: &str, scripted: Scripted) -> &Self {
			self.routes.lock().entry(path.to_owned()).or_default().push_back(scripted);

			self
		}

		fn pop_reply(&self, path: &str) -> Scripted {
			let mut routes = self.routes.lock();
			let Some(queue) = routes.get_mut(path) else {
				return Scripted::Reply(PortalResponse::new(404, ""));
			};

			if queue.len() > 1 {
				queue.pop_front().unwrap_or(Scripted::Reply(PortalResponse::new(404, "")))
			} else {
				queue.front().cloned().unwrap_or(Scripted::Reply(PortalResponse::new(404, "")))
			}
		}
	}
	impl PortalHttpClient for ScriptedHttpClient {
		fn execute(&self, request: PortalRequest) -> TransportFuture<'_> {
			let scripted = self.pop_reply(request.url.path());

			self.requests.lock().push(request);

			Box::pin(async move {
				match scripted {
					Scripted::Reply(response) => Ok(response),
					Scripted::Timeout => Err(TransportError::Timeout),
				}
			})
		}
	}

	/// Identity built from the `TEST_*` fixtures.
	pub fn test_identity() -> Identity {
		Identity::new(
			StudentId::new(TEST_STUDENT_ID).expect("Fixture student id should be valid."),
			TEST_DEVICE_TOKEN,
			TEST_BROKER_TOKEN,
		)
	}

	/// Descriptor pointing at `portal_base` and `broker_base`.
	pub fn test_descriptor(portal_base: &str, broker_base: &str) -> PortalDescriptor {
		PortalDescriptor::builder()
			.portal_base(Url::parse(portal_base).expect("Fixture portal URL should parse."))
			.broker_base(Url::parse(broker_base).expect("Fixture broker URL should parse."))
			.build()
			.expect("Fixture descriptor should validate.")
	}

	/// Client wired to a fresh [`ScriptedHttpClient`].
	pub fn scripted_client() -> (AcademicClient, Arc<ScriptedHttpClient>) {
		let http = Arc::new(ScriptedHttpClient::default());
		let client = AcademicClient::with_http_client(
			http.clone(),
			test_identity(),
			test_descriptor(TEST_PORTAL_BASE, TEST_BROKER_BASE),
		)
		.expect("Scripted client should build.");

		(client, http)
	}

	/// Client using the real reqwest transport against local mock servers.
	#[cfg(feature = "reqwest")]
	pub fn reqwest_test_client(portal_base: &str, broker_base: &str) -> AcademicClient {
		AcademicClient::new(test_identity(), test_descriptor(portal_base, broker_base))
			.expect("Reqwest client should build.")
	}

	/// Broker success body carrying `token`.
	pub fn mint_body(token: &str, expires_in: Option<i64>) -> String {
		let mut data = serde_json::json!({ "accessToken": token });

		if let Some(expires_in) = expires_in {
			data["expiresIn"] = expires_in.into();
		}

		serde_json::json!({ "code": "0000", "msg": "ok", "data": data }).to_string()
	}

	/// Portal success body wrapping `data`.
	pub fn portal_body(data: Value) -> String {
		serde_json::json!({ "code": "0000", "msg": "success", "data": data }).to_string()
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Date, Duration, OffsetDateTime, Time};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(feature = "server")] use {color_eyre as _, tracing_subscriber as _};
#[cfg(test)] use {color_eyre as _, httpmock as _};
