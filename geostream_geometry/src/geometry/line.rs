use super::GeometryAttrs;
use crate::geodetic::GeodeticPoint;
use anyhow::{Result, ensure};

/// An open polyline of at least two vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
	points: Vec<GeodeticPoint>,
	pub attrs: GeometryAttrs,
}

impl Line {
	/// # Errors
	/// Returns an error if fewer than two points are given.
	pub fn new(points: Vec<GeodeticPoint>) -> Result<Self> {
		ensure!(points.len() >= 2, "a line needs at least 2 points, got {}", points.len());
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
}
