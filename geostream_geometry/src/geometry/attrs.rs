use std::fmt::{self, Debug, Display};

/// KML altitude interpretation for a geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AltitudeMode {
	ClampToGround,
	RelativeToGround,
	Absolute,
}

impl AltitudeMode {
	/// Parses the KML lexical value; `None` for an unknown mode.
	#[must_use]
	pub fn parse(value: &str) -> Option<Self> {
		match value.trim() {
			"clampToGround" => Some(AltitudeMode::ClampToGround),
			"relativeToGround" => Some(AltitudeMode::RelativeToGround),
			"absolute" => Some(AltitudeMode::Absolute),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> &'static str {
		match self {
			AltitudeMode::ClampToGround => "clampToGround",
			AltitudeMode::RelativeToGround => "relativeToGround",
			AltitudeMode::Absolute => "absolute",
		}
	}
}

impl Display for AltitudeMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Presentation attributes shared by the simple KML geometries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeometryAttrs {
	pub altitude_mode: Option<AltitudeMode>,
	pub tessellate: bool,
	pub extrude: bool,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_known_modes() {
		assert_eq!(AltitudeMode::parse("clampToGround"), Some(AltitudeMode::ClampToGround));
		assert_eq!(AltitudeMode::parse(" absolute "), Some(AltitudeMode::Absolute));
		assert_eq!(AltitudeMode::parse("relativeToGround"), Some(AltitudeMode::RelativeToGround));
		assert_eq!(AltitudeMode::parse("relativeToSeaFloor"), None);
		assert_eq!(AltitudeMode::parse(""), None);
	}

	#[test]
	fn round_trips_lexical_value() {
		for s in ["clampToGround", "relativeToGround", "absolute"] {
			assert_eq!(AltitudeMode::parse(s).unwrap().as_str(), s);
		}
	}
}
