//! Process configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local runs. Required values:
//! `HQU_STUDENT_ID`, `HQU_DEVICE_TOKEN` and `SENDS_API_TOKEN`. Optional values:
//! `SENDS_API_URL`, `HQU_PORTAL_URL`, `HQU_HTTP_TIMEOUT_SECS` and `HQU_DEFAULT_CAMPUS`.

// std
use std::{env, time::Duration as StdDuration};
// self
use crate::{
	_prelude::*,
	auth::{Identity, StudentId, TokenSecret},
	error::ConfigError,
	portal::{Campus, PortalDescriptor, descriptor},
};

/// Student number the portal calls are made for.
pub const STUDENT_ID_VAR: &str = "HQU_STUDENT_ID";
/// Device identity token registered with the broker.
pub const DEVICE_TOKEN_VAR: &str = "HQU_DEVICE_TOKEN";
/// API token authorizing broker calls.
pub const BROKER_TOKEN_VAR: &str = "SENDS_API_TOKEN";
/// Broker base URL override.
pub const BROKER_URL_VAR: &str = "SENDS_API_URL";
/// Portal base URL override.
pub const PORTAL_URL_VAR: &str = "HQU_PORTAL_URL";
/// Request timeout in whole seconds.
pub const TIMEOUT_VAR: &str = "HQU_HTTP_TIMEOUT_SECS";
/// Default campus name or code.
pub const DEFAULT_CAMPUS_VAR: &str = "HQU_DEFAULT_CAMPUS";

/// Everything needed to build an [`crate::portal::AcademicClient`].
#[derive(Clone, Debug)]
pub struct Config {
	/// Identity used for every broker mint.
	pub identity: Identity,
	/// Portal and broker endpoints plus defaults.
	pub descriptor: PortalDescriptor,
}
impl Config {
	/// Loads configuration from the process environment, reading `.env` first when present.
	pub fn from_env() -> Result<Self, ConfigError> {
		if !cfg!(test) {
			dotenvy::dotenv().ok();
		}

		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Loads configuration through an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
		let require = |name: &'static str| get(name).ok_or(ConfigError::MissingVar { name });
		let student_id = StudentId::new(require(STUDENT_ID_VAR)?)?;
		let device_token = TokenSecret::new(require(DEVICE_TOKEN_VAR)?);
		let broker_token = TokenSecret::new(require(BROKER_TOKEN_VAR)?);
		let mut builder = PortalDescriptor::builder();

		if let Some(url) = get(BROKER_URL_VAR) {
			builder = builder.broker_base(descriptor::parse_base("broker", &url)?);
		}
		if let Some(url) = get(PORTAL_URL_VAR) {
			builder = builder.portal_base(descriptor::parse_base("portal", &url)?);
		}
		if let Some(secs) = get(TIMEOUT_VAR) {
			let secs = secs
				.parse::<u64>()
				.ok()
				.filter(|secs| *secs > 0)
				.ok_or_else(|| ConfigError::InvalidVar {
					name: TIMEOUT_VAR,
					reason: format!("`{secs}` is not a positive number of seconds"),
				})?;

			builder = builder.timeout(StdDuration::from_secs(secs));
		}
		if let Some(campus) = get(DEFAULT_CAMPUS_VAR) {
			let campus = campus.parse::<Campus>().map_err(|e| ConfigError::InvalidVar {
				name: DEFAULT_CAMPUS_VAR,
				reason: e.to_string(),
			})?;

			builder = builder.default_campus(campus);
		}

		Ok(Self {
			identity: Identity { student_id, device_token, broker_token },
			descriptor: builder.build()?,
		})
	}
}
