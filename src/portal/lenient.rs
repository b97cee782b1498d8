//! Serde helpers for portal fields that arrive as either JSON strings or JSON numbers.

// crates.io
use serde::Deserializer;
// self
use crate::_prelude::*;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
	Text(String),
	Number(serde_json::Number),
	Bool(bool),
}
impl Scalar {
	fn into_text(self) -> String {
		match self {
			Scalar::Text(text) => text,
			Scalar::Number(number) => number.to_string(),
			Scalar::Bool(flag) => flag.to_string(),
		}
	}
}

/// Reads an optional scalar as text; blank strings become `None`.
pub(crate) fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<Scalar>::deserialize(deserializer)?;

	Ok(value.map(Scalar::into_text).map(|text| text.trim().to_owned()).filter(|t| !t.is_empty()))
}

/// Reads an optional scalar as a number; blank strings become `None`.
pub(crate) fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
	D: Deserializer<'de>,
{
	match opt_text(deserializer)? {
		Some(text) => text
			.parse::<f64>()
			.map(Some)
			.map_err(|_| serde::de::Error::custom(format!("`{text}` is not a number"))),
		None => Ok(None),
	}
}

/// Reads an optional flag that the portal sends as a boolean, `0`/`1`, or `"true"`/`"false"`.
pub(crate) fn opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
	D: Deserializer<'de>,
{
	match opt_text(deserializer)?.as_deref() {
		None => Ok(None),
		Some("1" | "true" | "Y" | "y") => Ok(Some(true)),
		Some("0" | "false" | "N" | "n") => Ok(Some(false)),
		Some(other) => Err(serde::de::Error::custom(format!("`{other}` is not a flag"))),
	}
}
