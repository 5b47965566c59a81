use super::GeodeticPoint;
use std::fmt::{self, Debug};

/// An axis-aligned bounding box in geographic degrees, optionally with an elevation range.
///
/// Bounds are plain degree values, not validated coordinates: binary headers may carry
/// nonsense boxes (e.g. for empty shapefiles) and those must still be representable.
#[derive(Clone, Copy, PartialEq)]
pub struct GeodeticBounds {
	pub west: f64,
	pub south: f64,
	pub east: f64,
	pub north: f64,
	pub min_elevation: Option<f64>,
	pub max_elevation: Option<f64>,
}

impl GeodeticBounds {
	/// A degenerate box spanning a single point.
	#[must_use]
	pub fn from_point(p: &GeodeticPoint) -> Self {
		Self {
			west: p.lon(),
			south: p.lat(),
			east: p.lon(),
			north: p.lat(),
			min_elevation: p.elevation,
			max_elevation: p.elevation,
		}
	}

	#[must_use]
	pub fn from_degrees(west: f64, south: f64, east: f64, north: f64) -> Self {
		Self {
			west,
			south,
			east,
			north,
			min_elevation: None,
			max_elevation: None,
		}
	}

	#[must_use]
	pub fn with_elevation(mut self, min: f64, max: f64) -> Self {
		self.min_elevation = Some(min);
		self.max_elevation = Some(max);
		self
	}

	/// Grows the box to include `p`.
	pub fn include(&mut self, p: &GeodeticPoint) {
		self.west = self.west.min(p.lon());
		self.east = self.east.max(p.lon());
		self.south = self.south.min(p.lat());
		self.north = self.north.max(p.lat());
		if let Some(e) = p.elevation {
			self.min_elevation = Some(self.min_elevation.map_or(e, |m| m.min(e)));
			self.max_elevation = Some(self.max_elevation.map_or(e, |m| m.max(e)));
		}
	}

	/// Grows the box to cover `other` entirely.
	pub fn extend(&mut self, other: &GeodeticBounds) {
		self.west = self.west.min(other.west);
		self.east = self.east.max(other.east);
		self.south = self.south.min(other.south);
		self.north = self.north.max(other.north);
	}

	/// Tests whether `p` lies within the box (borders inclusive). Elevation is ignored.
	#[must_use]
	pub fn contains(&self, p: &GeodeticPoint) -> bool {
		p.lon() >= self.west && p.lon() <= self.east && p.lat() >= self.south && p.lat() <= self.north
	}

	/// Tests whether `other` lies entirely within the box.
	#[must_use]
	pub fn contains_bounds(&self, other: &GeodeticBounds) -> bool {
		other.west >= self.west && other.east <= self.east && other.south >= self.south && other.north <= self.north
	}

	/// Computes the bounding box of a point sequence, `None` for an empty one.
	#[must_use]
	pub fn of_points(points: &[GeodeticPoint]) -> Option<Self> {
		let (first, rest) = points.split_first()?;
		let mut bounds = Self::from_point(first);
		for p in rest {
			bounds.include(p);
		}
		Some(bounds)
	}
}

impl Debug for GeodeticBounds {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}, {}, {}, {}]", self.west, self.south, self.east, self.north)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn p(lon: f64, lat: f64) -> GeodeticPoint {
		GeodeticPoint::new(lon, lat).unwrap()
	}

	#[test]
	fn include_grows_box() {
		let mut b = GeodeticBounds::from_point(&p(1.0, 2.0));
		b.include(&p(-3.0, 7.0));
		assert_eq!(b, GeodeticBounds::from_degrees(-3.0, 2.0, 1.0, 7.0));
	}

	#[test]
	fn contains_is_border_inclusive() {
		let b = GeodeticBounds::from_degrees(0.0, 0.0, 10.0, 10.0);
		assert!(b.contains(&p(0.0, 0.0)));
		assert!(b.contains(&p(10.0, 10.0)));
		assert!(b.contains(&p(5.0, 5.0)));
		assert!(!b.contains(&p(10.5, 5.0)));
		assert!(!b.contains(&p(5.0, -0.5)));
	}

	#[test]
	fn of_points() {
		assert!(GeodeticBounds::of_points(&[]).is_none());
		let b = GeodeticBounds::of_points(&[p(1.0, 1.0), p(4.0, -2.0), p(2.0, 3.0)]).unwrap();
		assert_eq!(b, GeodeticBounds::from_degrees(1.0, -2.0, 4.0, 3.0));
	}

	#[test]
	fn elevation_range_tracked() {
		let mut b = GeodeticBounds::from_point(&GeodeticPoint::new_3d(0.0, 0.0, 10.0).unwrap());
		b.include(&GeodeticPoint::new_3d(1.0, 1.0, -5.0).unwrap());
		assert_eq!(b.min_elevation, Some(-5.0));
		assert_eq!(b.max_elevation, Some(10.0));
	}
}
