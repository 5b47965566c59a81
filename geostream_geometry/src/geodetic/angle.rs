//! Validated angular coordinates.
//!
//! `Longitude` and `Latitude` are thin newtypes over decimal degrees. Construction is the
//! only place range checks happen, so every value of these types is known to be valid.

use anyhow::{Result, ensure};
use std::fmt::{self, Debug, Display};

/// A longitude in decimal degrees, always within `[-180, 180]`.
#[derive(Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Longitude(f64);

/// A latitude in decimal degrees, always within `[-90, 90]`.
#[derive(Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Latitude(f64);

impl Longitude {
	/// Creates a longitude from decimal degrees.
	///
	/// # Errors
	/// Returns an error if `degrees` is outside `[-180, 180]` or not finite.
	pub fn new(degrees: f64) -> Result<Self> {
		ensure!(
			degrees.is_finite() && (-180.0..=180.0).contains(&degrees),
			"invalid longitude {degrees}, must be within [-180, 180] degrees"
		);
		Ok(Self(degrees))
	}

	#[must_use]
	pub fn degrees(&self) -> f64 {
		self.0
	}
}

impl Latitude {
	/// Creates a latitude from decimal degrees.
	///
	/// # Errors
	/// Returns an error if `degrees` is outside `[-90, 90]` or not finite.
	pub fn new(degrees: f64) -> Result<Self> {
		ensure!(
			degrees.is_finite() && (-90.0..=90.0).contains(&degrees),
			"invalid latitude {degrees}, must be within [-90, 90] degrees"
		);
		Ok(Self(degrees))
	}

	#[must_use]
	pub fn degrees(&self) -> f64 {
		self.0
	}
}

impl Display for Longitude {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Display for Latitude {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Debug for Longitude {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Longitude({})", self.0)
	}
}

impl Debug for Latitude {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Latitude({})", self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn longitude_range() {
		assert!(Longitude::new(-180.0).is_ok());
		assert!(Longitude::new(180.0).is_ok());
		assert!(Longitude::new(0.0).is_ok());
		assert!(Longitude::new(-180.001).is_err());
		assert!(Longitude::new(180.001).is_err());
		assert!(Longitude::new(f64::NAN).is_err());
	}

	#[test]
	fn latitude_range() {
		assert!(Latitude::new(-90.0).is_ok());
		assert!(Latitude::new(90.0).is_ok());
		assert!(Latitude::new(-90.5).is_err());
		assert!(Latitude::new(90.5).is_err());
		assert!(Latitude::new(f64::INFINITY).is_err());
	}

	#[test]
	fn default_is_zero_degrees() {
		assert_eq!(Longitude::default().degrees(), 0.0);
		assert_eq!(Latitude::default().degrees(), 0.0);
	}
}
