use super::{Latitude, Longitude};
use anyhow::Result;
use std::fmt::{self, Debug};

/// A point on the WGS-84 ellipsoid, optionally with an elevation in meters.
///
/// Covers both the 2D and 3D cases: a point without `elevation` is a plain geographic
/// position, a point with one carries its altitude.
#[derive(Clone, Copy, Default, PartialEq)]
pub struct GeodeticPoint {
	pub longitude: Longitude,
	pub latitude: Latitude,
	pub elevation: Option<f64>,
}

impl GeodeticPoint {
	/// Creates a 2D point from decimal degrees.
	///
	/// # Errors
	/// Returns an error if either coordinate is out of range.
	pub fn new(longitude: f64, latitude: f64) -> Result<Self> {
		Ok(Self {
			longitude: Longitude::new(longitude)?,
			latitude: Latitude::new(latitude)?,
			elevation: None,
		})
	}

	/// Creates a 3D point from decimal degrees and an elevation in meters.
	///
	/// # Errors
	/// Returns an error if either coordinate is out of range.
	pub fn new_3d(longitude: f64, latitude: f64, elevation: f64) -> Result<Self> {
		Ok(Self {
			longitude: Longitude::new(longitude)?,
			latitude: Latitude::new(latitude)?,
			elevation: Some(elevation),
		})
	}

	#[must_use]
	pub fn from_angles(longitude: Longitude, latitude: Latitude, elevation: Option<f64>) -> Self {
		Self {
			longitude,
			latitude,
			elevation,
		}
	}

	#[must_use]
	pub fn is_3d(&self) -> bool {
		self.elevation.is_some()
	}

	/// Longitude in decimal degrees.
	#[must_use]
	pub fn lon(&self) -> f64 {
		self.longitude.degrees()
	}

	/// Latitude in decimal degrees.
	#[must_use]
	pub fn lat(&self) -> f64 {
		self.latitude.degrees()
	}
}

impl Debug for GeodeticPoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.elevation {
			Some(e) => write!(f, "({}, {}, {e})", self.lon(), self.lat()),
			None => write!(f, "({}, {})", self.lon(), self.lat()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn construction() {
		let p = GeodeticPoint::new(10.0, 20.0).unwrap();
		assert_eq!(p.lon(), 10.0);
		assert_eq!(p.lat(), 20.0);
		assert!(!p.is_3d());

		let p = GeodeticPoint::new_3d(10.0, 20.0, 30.0).unwrap();
		assert!(p.is_3d());
		assert_eq!(p.elevation, Some(30.0));
	}

	#[test]
	fn out_of_range_fails() {
		assert!(GeodeticPoint::new(181.0, 0.0).is_err());
		assert!(GeodeticPoint::new(0.0, 91.0).is_err());
		assert!(GeodeticPoint::new_3d(0.0, -91.0, 5.0).is_err());
	}
}
