use super::Geometry;

/// A heterogeneous collection of geometries, the fallback for KML `MultiGeometry`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryBag {
	geometries: Vec<Geometry>,
}

impl GeometryBag {
	#[must_use]
	pub fn new(geometries: Vec<Geometry>) -> Self {
		Self { geometries }
	}

	#[must_use]
	pub fn geometries(&self) -> &[Geometry] {
		&self.geometries
	}

	#[must_use]
	pub fn into_geometries(self) -> Vec<Geometry> {
		self.geometries
	}
}
