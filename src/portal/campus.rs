//! Campus name ↔ portal code table.

// self
use crate::{_prelude::*, error::ValidationError};

/// University campus known to the portal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Campus {
	/// Xiamen campus, portal code `0002`.
	#[default]
	Xiamen,
	/// Quanzhou campus, portal code `0001`.
	Quanzhou,
	/// Longzhouchi campus, portal code `0003`.
	Longzhouchi,
}
impl Campus {
	/// Every campus, in portal-code order.
	pub const ALL: [Campus; 3] = [Campus::Quanzhou, Campus::Xiamen, Campus::Longzhouchi];

	/// Portal code sent in the `campus` query parameter.
	pub const fn code(self) -> &'static str {
		match self {
			Campus::Quanzhou => "0001",
			Campus::Xiamen => "0002",
			Campus::Longzhouchi => "0003",
		}
	}

	/// English display name.
	pub const fn name(self) -> &'static str {
		match self {
			Campus::Quanzhou => "Quanzhou Campus",
			Campus::Xiamen => "Xiamen Campus",
			Campus::Longzhouchi => "Longzhouchi Campus",
		}
	}

	/// Chinese display name used by the portal UI.
	pub const fn local_name(self) -> &'static str {
		match self {
			Campus::Quanzhou => "泉州校区",
			Campus::Xiamen => "厦门校区",
			Campus::Longzhouchi => "龙舟池校区",
		}
	}

	/// Looks a campus up by its portal code.
	pub fn from_code(code: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|campus| campus.code() == code)
	}

	/// Resolves an optional caller value, falling back to `default` when it is absent or blank.
	pub fn resolve(value: Option<&str>, default: Campus) -> Result<Self, ValidationError> {
		match value.map(str::trim).filter(|v| !v.is_empty()) {
			Some(value) => value.parse(),
			None => Ok(default),
		}
	}
}
impl Display for Campus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.name())
	}
}
impl FromStr for Campus {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let value = s.trim();

		Self::ALL
			.into_iter()
			.find(|campus| {
				campus.name().eq_ignore_ascii_case(value)
					|| campus.local_name() == value
					|| campus.code() == value
			})
			.ok_or_else(|| ValidationError::UnknownCampus { value: s.to_owned() })
	}
}
