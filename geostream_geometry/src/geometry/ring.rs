use super::GeometryAttrs;
use crate::geodetic::{GeodeticBounds, GeodeticPoint};
use crate::math;
use anyhow::{Result, ensure};

/// A closed ring of at least four vertices.
///
/// The first and last vertices normally coincide; a ring whose last vertex differs from the
/// first is treated as implicitly closed. In cartographic degrees a clockwise ring is an
/// exterior boundary, a counter-clockwise ring an interior one.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearRing {
	points: Vec<GeodeticPoint>,
	pub attrs: GeometryAttrs,
}

impl LinearRing {
	/// # Errors
	/// Returns an error if fewer than four points are given.
	pub fn new(points: Vec<GeodeticPoint>) -> Result<Self> {
		ensure!(
			points.len() >= 4,
			"a linear ring needs at least 4 points, got {}",
			points.len()
		);
		Ok(Self {
			points,
			attrs: GeometryAttrs::default(),
		})
	}

	#[must_use]
	pub fn points(&self) -> &[GeodeticPoint] {
		&self.points
	}

	#[must_use]
	pub fn into_points(self) -> Vec<GeodeticPoint> {
		self.points
	}

	#[must_use]
	pub fn is_closed(&self) -> bool {
		self.points.first().map(|p| (p.lon(), p.lat())) == self.points.last().map(|p| (p.lon(), p.lat()))
	}

	/// True if the ring winds clockwise, i.e. bounds an exterior.
	#[must_use]
	pub fn is_clockwise(&self) -> bool {
		math::is_clockwise(&self.points)
	}

	/// Returns a copy of this ring with the vertex order reversed.
	#[must_use]
	pub fn reversed(&self) -> Self {
		let mut points = self.points.clone();
		points.reverse();
		Self {
			points,
			attrs: self.attrs,
		}
	}

	#[must_use]
	pub fn bounding_box(&self) -> Option<GeodeticBounds> {
		GeodeticBounds::of_points(&self.points)
	}

	/// Even-odd containment test for a single point, with a bounding-box prefilter.
	#[must_use]
	pub fn contains(&self, p: &GeodeticPoint) -> bool {
		match self.bounding_box() {
			Some(b) if b.contains(p) => math::point_in_ring(&self.points, p),
			_ => false,
		}
	}
}
