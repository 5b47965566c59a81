//! The tagged-variant geometry model.
//!
//! Every concrete shape carries a [`GeometryAttrs`] block with the KML presentation
//! attributes (`altitudeMode`, `tessellate`, `extrude`). [`Geometry`] is the variant type
//! the event pipeline hands around.

mod attrs;
mod bag;
mod line;
mod model;
mod multi_line;
mod multi_point;
mod multi_polygons;
mod point;
mod polygon;
mod ring;

pub use attrs::{AltitudeMode, GeometryAttrs};
pub use bag::GeometryBag;
pub use line::Line;
pub use model::Model;
pub use multi_line::MultiLine;
pub use multi_point::MultiPoint;
pub use multi_polygons::MultiPolygons;
pub use point::Point;
pub use polygon::Polygon;
pub use ring::LinearRing;

use crate::geodetic::GeodeticBounds;
use std::fmt::Debug;

#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
	Point(Point),
	Line(Line),
	LinearRing(LinearRing),
	Polygon(Polygon),
	MultiPoint(MultiPoint),
	MultiLine(MultiLine),
	MultiPolygons(MultiPolygons),
	GeometryBag(GeometryBag),
	Model(Model),
}

impl Geometry {
	#[must_use]
	pub fn type_name(&self) -> &'static str {
		match self {
			Geometry::Point(_) => "Point",
			Geometry::Line(_) => "Line",
			Geometry::LinearRing(_) => "LinearRing",
			Geometry::Polygon(_) => "Polygon",
			Geometry::MultiPoint(_) => "MultiPoint",
			Geometry::MultiLine(_) => "MultiLine",
			Geometry::MultiPolygons(_) => "MultiPolygons",
			Geometry::GeometryBag(_) => "GeometryBag",
			Geometry::Model(_) => "Model",
		}
	}

	/// Total number of vertices over all parts.
	#[must_use]
	pub fn num_points(&self) -> usize {
		match self {
			Geometry::Point(_) => 1,
			Geometry::Line(g) => g.points().len(),
			Geometry::LinearRing(g) => g.points().len(),
			Geometry::Polygon(g) => {
				g.outer_ring().points().len() + g.inner_rings().iter().map(|r| r.points().len()).sum::<usize>()
			}
			Geometry::MultiPoint(g) => g.points().len(),
			Geometry::MultiLine(g) => g.lines().iter().map(|l| l.points().len()).sum(),
			Geometry::MultiPolygons(g) => {
				g.polygons().iter().map(|p| Geometry::Polygon(p.clone()).num_points()).sum()
			}
			Geometry::GeometryBag(g) => g.geometries().iter().map(Geometry::num_points).sum(),
			Geometry::Model(g) => usize::from(g.location.is_some()),
		}
	}

	/// True if any vertex carries an elevation.
	#[must_use]
	pub fn is_3d(&self) -> bool {
		match self {
			Geometry::Point(g) => g.point.is_3d(),
			Geometry::Line(g) => g.points().iter().any(|p| p.is_3d()),
			Geometry::LinearRing(g) => g.points().iter().any(|p| p.is_3d()),
			Geometry::Polygon(g) => {
				Geometry::LinearRing(g.outer_ring().clone()).is_3d()
					|| g.inner_rings().iter().any(|r| r.points().iter().any(|p| p.is_3d()))
			}
			Geometry::MultiPoint(g) => g.points().iter().any(|p| p.point.is_3d()),
			Geometry::MultiLine(g) => g.lines().iter().any(|l| l.points().iter().any(|p| p.is_3d())),
			Geometry::MultiPolygons(g) => g.polygons().iter().any(|p| Geometry::Polygon(p.clone()).is_3d()),
			Geometry::GeometryBag(g) => g.geometries().iter().any(Geometry::is_3d),
			Geometry::Model(g) => g.location.is_some_and(|p| p.is_3d()),
		}
	}

	/// The bounding box over all vertices, `None` for an empty geometry.
	#[must_use]
	pub fn bounding_box(&self) -> Option<GeodeticBounds> {
		match self {
			Geometry::Point(g) => Some(GeodeticBounds::from_point(&g.point)),
			Geometry::Line(g) => GeodeticBounds::of_points(g.points()),
			Geometry::LinearRing(g) => g.bounding_box(),
			Geometry::Polygon(g) => g.outer_ring().bounding_box(),
			Geometry::MultiPoint(g) => {
				GeodeticBounds::of_points(&g.points().iter().map(|p| p.point).collect::<Vec<_>>())
			}
			Geometry::MultiLine(g) => merge_boxes(g.lines().iter().map(|l| GeodeticBounds::of_points(l.points()))),
			Geometry::MultiPolygons(g) => {
				merge_boxes(g.polygons().iter().map(|p| p.outer_ring().bounding_box()))
			}
			Geometry::GeometryBag(g) => merge_boxes(g.geometries().iter().map(Geometry::bounding_box)),
			Geometry::Model(g) => g.location.as_ref().map(GeodeticBounds::from_point),
		}
	}

	#[must_use]
	pub fn attrs(&self) -> Option<&GeometryAttrs> {
		match self {
			Geometry::Point(g) => Some(&g.attrs),
			Geometry::Line(g) => Some(&g.attrs),
			Geometry::LinearRing(g) => Some(&g.attrs),
			Geometry::Polygon(g) => Some(&g.attrs),
			_ => None,
		}
	}

	/// Mutable access to the attribute block of the simple shapes.
	pub fn attrs_mut(&mut self) -> Option<&mut GeometryAttrs> {
		match self {
			Geometry::Point(g) => Some(&mut g.attrs),
			Geometry::Line(g) => Some(&mut g.attrs),
			Geometry::LinearRing(g) => Some(&mut g.attrs),
			Geometry::Polygon(g) => Some(&mut g.attrs),
			_ => None,
		}
	}
}

fn merge_boxes(boxes: impl Iterator<Item = Option<GeodeticBounds>>) -> Option<GeodeticBounds> {
	let mut merged: Option<GeodeticBounds> = None;
	for b in boxes.flatten() {
		match &mut merged {
			Some(m) => m.extend(&b),
			None => merged = Some(b),
		}
	}
	merged
}

impl From<Point> for Geometry {
	fn from(g: Point) -> Self {
		Geometry::Point(g)
	}
}

impl From<Line> for Geometry {
	fn from(g: Line) -> Self {
		Geometry::Line(g)
	}
}

impl From<LinearRing> for Geometry {
	fn from(g: LinearRing) -> Self {
		Geometry::LinearRing(g)
	}
}

impl From<Polygon> for Geometry {
	fn from(g: Polygon) -> Self {
		Geometry::Polygon(g)
	}
}

impl From<MultiPoint> for Geometry {
	fn from(g: MultiPoint) -> Self {
		Geometry::MultiPoint(g)
	}
}

impl From<MultiLine> for Geometry {
	fn from(g: MultiLine) -> Self {
		Geometry::MultiLine(g)
	}
}

impl From<MultiPolygons> for Geometry {
	fn from(g: MultiPolygons) -> Self {
		Geometry::MultiPolygons(g)
	}
}

impl From<GeometryBag> for Geometry {
	fn from(g: GeometryBag) -> Self {
		Geometry::GeometryBag(g)
	}
}

impl From<Model> for Geometry {
	fn from(g: Model) -> Self {
		Geometry::Model(g)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::geodetic::GeodeticPoint;

	fn p(lon: f64, lat: f64) -> GeodeticPoint {
		GeodeticPoint::new(lon, lat).unwrap()
	}

	#[test]
	fn num_points_counts_all_parts() {
		let line = Line::new(vec![p(0.0, 0.0), p(1.0, 0.0)]).unwrap();
		let ring = LinearRing::new(vec![p(0.0, 0.0), p(0.0, 1.0), p(1.0, 1.0), p(0.0, 0.0)]).unwrap();
		let poly = Polygon::new(ring.clone());
		assert_eq!(Geometry::from(line.clone()).num_points(), 2);
		assert_eq!(Geometry::from(poly).num_points(), 4);

		let bag = GeometryBag::new(vec![line.into(), ring.into()]);
		assert_eq!(Geometry::from(bag).num_points(), 6);
	}

	#[test]
	fn bounding_box_merges_parts() {
		let a = Line::new(vec![p(0.0, 0.0), p(1.0, 1.0)]).unwrap();
		let b = Line::new(vec![p(5.0, -2.0), p(6.0, 3.0)]).unwrap();
		let ml = Geometry::from(MultiLine::new(vec![a, b]));
		assert_eq!(ml.bounding_box().unwrap(), GeodeticBounds::from_degrees(0.0, -2.0, 6.0, 3.0));
	}

	#[test]
	fn is_3d_detects_elevation() {
		let flat = Line::new(vec![p(0.0, 0.0), p(1.0, 0.0)]).unwrap();
		assert!(!Geometry::from(flat).is_3d());
		let tall = Line::new(vec![
			GeodeticPoint::new_3d(0.0, 0.0, 5.0).unwrap(),
			p(1.0, 0.0),
		])
		.unwrap();
		assert!(Geometry::from(tall).is_3d());
	}
}
