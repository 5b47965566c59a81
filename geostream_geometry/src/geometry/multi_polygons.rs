use super::Polygon;

/// A collection of polygons, each with its own outer/inner ring structure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiPolygons {
	polygons: Vec<Polygon>,
}

impl MultiPolygons {
	#[must_use]
	pub fn new(polygons: Vec<Polygon>) -> Self {
		Self { polygons }
	}

	#[must_use]
	pub fn polygons(&self) -> &[Polygon] {
		&self.polygons
	}

	#[must_use]
	pub fn into_polygons(self) -> Vec<Polygon> {
		self.polygons
	}
}
