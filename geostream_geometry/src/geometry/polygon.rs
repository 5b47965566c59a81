use super::{GeometryAttrs, LinearRing};

/// One outer ring plus zero or more inner rings (holes) contained by it.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
	outer: LinearRing,
	inners: Vec<LinearRing>,
	pub attrs: GeometryAttrs,
}

impl Polygon {
	#[must_use]
	pub fn new(outer: LinearRing) -> Self {
		Self {
			outer,
			inners: Vec::new(),
			attrs: GeometryAttrs::default(),
		}
	}

	#[must_use]
	pub fn with_inner_rings(outer: LinearRing, inners: Vec<LinearRing>) -> Self {
		Self {
			outer,
			inners,
			attrs: GeometryAttrs::default(),
		}
	}

	pub fn add_inner_ring(&mut self, ring: LinearRing) {
		self.inners.push(ring);
	}

	#[must_use]
	pub fn outer_ring(&self) -> &LinearRing {
		&self.outer
	}

	#[must_use]
	pub fn inner_rings(&self) -> &[LinearRing] {
		&self.inners
	}

	#[must_use]
	pub fn into_rings(self) -> (LinearRing, Vec<LinearRing>) {
		(self.outer, self.inners)
	}
}
