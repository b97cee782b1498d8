//! `{code, msg, data}` response envelope shared by the broker and the portal.

// crates.io
use serde::{Deserializer, de::DeserializeOwned};
// self
use crate::_prelude::*;

/// Envelope code both services use for success.
pub const SUCCESS_CODE: &str = "0000";

/// Decoded response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
	/// Service status code; numbers are read as their decimal text.
	#[serde(deserialize_with = "code_text")]
	pub code: String,
	/// Human-readable status message.
	#[serde(alias = "message")]
	pub msg: Option<String>,
	/// Payload, absent or `null` on failures and on some empty listings.
	pub data: Option<T>,
}
impl<T> Envelope<T> {
	/// Returns `true` when the envelope reports success.
	pub fn is_success(&self) -> bool {
		self.code == SUCCESS_CODE
	}

	/// Message text, empty when the service sent none.
	pub fn message(&self) -> &str {
		self.msg.as_deref().unwrap_or_default()
	}
}

impl Envelope<Value> {
	/// Interprets `data` as `T`; `None` when the payload is absent or `null`.
	///
	/// Decode the envelope as `Envelope<Value>` and check [`Envelope::is_success`] first, so a
	/// failure envelope keeps its code and message whatever shape its `data` has.
	pub fn into_data<T>(self) -> Result<Option<T>, serde_path_to_error::Error<serde_json::Error>>
	where
		T: DeserializeOwned,
	{
		match self.data {
			None | Some(Value::Null) => Ok(None),
			Some(data) => serde_path_to_error::deserialize(data).map(Some),
		}
	}
}

/// Decodes a JSON body, reporting the path of the first mismatch.
pub fn decode<T>(body: &[u8]) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: DeserializeOwned,
{
	let de = &mut serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(de)
}

fn code_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum CodeRepr {
		Text(String),
		Number(i64),
	}

	Ok(match CodeRepr::deserialize(deserializer)? {
		CodeRepr::Text(text) => text,
		CodeRepr::Number(number) => format!("{number:04}"),
	})
}
