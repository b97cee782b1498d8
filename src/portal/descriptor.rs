//! Static description of the portal deployment the client talks to.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, broker::CredentialProvider, error::ConfigError, portal::Campus};

/// Endpoints and defaults shared by every portal operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortalDescriptor {
	/// Base URL of the academic portal.
	pub portal_base: Url,
	/// Base URL of the token broker.
	pub broker_base: Url,
	/// Campus used when a caller omits one.
	pub default_campus: Campus,
	/// Bound applied to every outbound request.
	pub timeout: StdDuration,
	/// Credentials closer than this to expiry are refreshed before use.
	pub preemptive_window: Duration,
}
impl PortalDescriptor {
	/// Production portal base URL.
	pub const DEFAULT_PORTAL_URL: &'static str = "https://apps.hqu.edu.cn";
	/// Production broker base URL.
	pub const DEFAULT_BROKER_URL: &'static str = "https://api.sends.cc";
	/// Default request timeout.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

	/// Creates a builder seeded with the production defaults.
	pub fn builder() -> PortalDescriptorBuilder {
		PortalDescriptorBuilder::default()
	}

	/// Resolves a portal path (e.g. `/academic/schoolCalendar`) against the portal base,
	/// keeping any path prefix the base carries.
	pub fn portal_url(&self, path: &str) -> Result<Url, ConfigError> {
		let joined = format!("{}{path}", self.portal_base.as_str().trim_end_matches('/'));

		Url::parse(&joined).map_err(|source| ConfigError::InvalidUrl { endpoint: "portal", source })
	}

	fn validate(&self) -> Result<(), ConfigError> {
		validate_base("portal", &self.portal_base)?;
		validate_base("broker", &self.broker_base)?;

		if self.timeout.is_zero() {
			return Err(ConfigError::InvalidVar {
				name: "timeout",
				reason: "the request timeout must be positive".into(),
			});
		}

		Ok(())
	}
}

/// Builder for [`PortalDescriptor`] values.
#[derive(Debug, Default)]
pub struct PortalDescriptorBuilder {
	/// Portal base URL; the production portal when unset.
	pub portal_base: Option<Url>,
	/// Broker base URL; the production broker when unset.
	pub broker_base: Option<Url>,
	/// Default campus.
	pub default_campus: Campus,
	/// Request timeout; ten seconds when unset.
	pub timeout: Option<StdDuration>,
	/// Preemptive refresh window; sixty seconds when unset.
	pub preemptive_window: Option<Duration>,
}
impl PortalDescriptorBuilder {
	/// Sets the portal base URL.
	pub fn portal_base(mut self, url: Url) -> Self {
		self.portal_base = Some(url);

		self
	}

	/// Sets the broker base URL.
	pub fn broker_base(mut self, url: Url) -> Self {
		self.broker_base = Some(url);

		self
	}

	/// Overrides the default campus.
	pub fn default_campus(mut self, campus: Campus) -> Self {
		self.default_campus = campus;

		self
	}

	/// Overrides the request timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Overrides the preemptive refresh window.
	pub fn preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = Some(window);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<PortalDescriptor, ConfigError> {
		let portal_base = match self.portal_base {
			Some(url) => url,
			None => parse_base("portal", PortalDescriptor::DEFAULT_PORTAL_URL)?,
		};
		let broker_base = match self.broker_base {
			Some(url) => url,
			None => parse_base("broker", PortalDescriptor::DEFAULT_BROKER_URL)?,
		};
		let descriptor = PortalDescriptor {
			portal_base,
			broker_base,
			default_campus: self.default_campus,
			timeout: self.timeout.unwrap_or(PortalDescriptor::DEFAULT_TIMEOUT),
			preemptive_window: self
				.preemptive_window
				.unwrap_or(CredentialProvider::DEFAULT_PREEMPTIVE_WINDOW),
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

/// Parses a base URL, reporting which endpoint it belongs to on failure.
pub(crate) fn parse_base(endpoint: &'static str, value: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl { endpoint, source })?;

	validate_base(endpoint, &url)?;

	Ok(url)
}

fn validate_base(endpoint: &'static str, url: &Url) -> Result<(), ConfigError> {
	if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
		return Err(ConfigError::UnsupportedScheme { endpoint, url: url.to_string() });
	}

	Ok(())
}
