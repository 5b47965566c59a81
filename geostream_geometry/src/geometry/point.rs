use super::GeometryAttrs;
use crate::geodetic::GeodeticPoint;

/// A single position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub point: GeodeticPoint,
	pub attrs: GeometryAttrs,
}

impl Point {
	#[must_use]
	pub fn new(point: GeodeticPoint) -> Self {
		Self {
			point,
			attrs: GeometryAttrs::default(),
		}
	}
}

impl From<GeodeticPoint> for Point {
	fn from(point: GeodeticPoint) -> Self {
		Self::new(point)
	}
}
