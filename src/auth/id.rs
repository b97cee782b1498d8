//! Validated student identifier.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier.
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier.
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier.
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Student number the portal knows the configured user by.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StudentId(String);
impl StudentId {
	const KIND: &'static str = "Student";

	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(Self::KIND, view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for StudentId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for StudentId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<StudentId> for String {
	fn from(value: StudentId) -> Self {
		value.0
	}
}
impl TryFrom<String> for StudentId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(Self::KIND, &value)?;

		Ok(Self(value))
	}
}
impl Debug for StudentId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Student({})", self.0)
	}
}
impl Display for StudentId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for StudentId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn student_ids_reject_whitespace_and_empty_values() {
		assert!(StudentId::new(" 2125101001").is_err(), "Leading whitespace must be rejected.");
		assert!(StudentId::new("").is_err());
		assert!(StudentId::new(format!("21{}25", '\u{00A0}')).is_err());

		let id = StudentId::new("2125101001").expect("Student fixture should be valid.");

		assert_eq!(id.as_ref(), "2125101001");
		assert_eq!(format!("{id:?}"), "Student(2125101001)");
	}

	#[test]
	fn serde_enforces_validation() {
		let id: StudentId =
			serde_json::from_str("\"2125101001\"").expect("Student id should deserialize.");

		assert_eq!(&*id, "2125101001");
		assert!(serde_json::from_str::<StudentId>("\"with space\"").is_err());
		assert!(StudentId::new("9".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}
}
