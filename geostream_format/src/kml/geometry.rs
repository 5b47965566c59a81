//! KML geometry parsing, including the degenerate-shape coercions.

use super::GEOMETRY_TAGS;
use super::coord::parse_coord;
use super::reader::{KmlReader, XmlNode, XmlStart, is_true};
use anyhow::{Result, bail};
use geostream_geometry::{
	AltitudeMode, GeodeticPoint, Geometry, GeometryAttrs, GeometryBag, Latitude, Line, LinearRing, Longitude,
	Model, MultiPoint, Point, Polygon,
};
use log::{debug, info, warn};
use std::io::BufRead;

/// Coordinates plus the presentation attributes collected while scanning a geometry
/// element. `altitude_mode` remembers whether the value came from the KML namespace:
/// when both `kml:altitudeMode` and `gx:altitudeMode` appear, the KML one wins.
#[derive(Default)]
struct GeometryGroup {
	points: Vec<GeodeticPoint>,
	altitude_mode: Option<(AltitudeMode, bool)>,
	tessellate: bool,
	extrude: bool,
}

impl GeometryGroup {
	fn attrs(&self) -> GeometryAttrs {
		GeometryAttrs {
			altitude_mode: self.altitude_mode.map(|(mode, _)| mode),
			tessellate: self.tessellate,
			extrude: self.extrude,
		}
	}

	fn set_altitude_mode(&mut self, text: &str, from_kml_ns: bool) {
		let Some(mode) = AltitudeMode::parse(text) else {
			warn!("ignoring unknown altitudeMode value: {text}");
			return;
		};
		match self.altitude_mode {
			None => self.altitude_mode = Some((mode, from_kml_ns)),
			Some((_, false)) if from_kml_ns => self.altitude_mode = Some((mode, true)),
			Some(_) => debug!("skip duplicate altitudeMode value"),
		}
	}
}

impl<R: BufRead> KmlReader<R> {
	/// Parses one geometry element.
	///
	/// # Errors
	/// Returns an error for a geometry that cannot be represented (no valid
	/// coordinates, a polygon without an outer boundary); the caller logs and skips it.
	pub(crate) fn handle_geometry(&mut self, start: &XmlStart) -> Result<Option<Geometry>> {
		match start.local.as_str() {
			"Point" => self.parse_point(start),
			"LineString" => {
				let group = self.parse_coordinates(start)?;
				Ok(Some(coerce_line_string(group)?))
			}
			"LinearRing" => {
				let group = self.parse_coordinates(start)?;
				Ok(Some(coerce_linear_ring(group)?))
			}
			"Polygon" => self.parse_polygon(start),
			"MultiGeometry" => self.parse_multi_geometry(start),
			"Model" => self.parse_model(start),
			_ => Ok(None),
		}
	}

	fn parse_point(&mut self, start: &XmlStart) -> Result<Option<Geometry>> {
		let group = self.parse_coordinates(start)?;
		let attrs = group.attrs();
		Ok(group.points.into_iter().next().map(|p| {
			let mut point = Point::new(p);
			point.attrs = attrs;
			Geometry::Point(point)
		}))
	}

	fn parse_polygon(&mut self, start: &XmlStart) -> Result<Option<Geometry>> {
		let mut group = GeometryGroup::default();
		let mut outer: Option<LinearRing> = None;
		let mut inners: Vec<LinearRing> = Vec::new();
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => break,
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => match child.local.as_str() {
					"outerBoundaryIs" => {
						self.parse_coordinates_into(&child, &mut group)?;
						match group.points.len() {
							0 => {}
							1 => {
								info!("polygon with single coordinate converted to point: {:?}", group.points[0]);
								let mut point = Point::new(group.points[0]);
								self.skip_rest_of(start)?;
								point.attrs = group.attrs();
								return Ok(Some(Geometry::Point(point)));
							}
							n if n < 4 => {
								info!("polygon with {n} coordinates converted to line");
								let mut line = Line::new(std::mem::take(&mut group.points))?;
								self.skip_rest_of(start)?;
								line.attrs = group.attrs();
								return Ok(Some(Geometry::Line(line)));
							}
							_ => outer = Some(LinearRing::new(std::mem::take(&mut group.points))?),
						}
					}
					"innerBoundaryIs" => {
						let inner = self.parse_coordinates(&child)?;
						match inner.points.len() {
							0 => {}
							n if n < 4 => warn!("dropping inner ring with only {n} coordinates"),
							_ => inners.push(LinearRing::new(inner.points)?),
						}
					}
					"altitudeMode" => {
						let from_kml = self.is_kml_ns(child.ns.as_deref());
						if let Some(text) = self.non_empty_text()? {
							group.set_altitude_mode(&text, from_kml);
						}
					}
					"extrude" => group.extrude = group.extrude || is_true(self.read_text()?.trim()),
					"tessellate" => group.tessellate = group.tessellate || is_true(self.read_text()?.trim()),
					_ => self.skip_element()?,
				},
				XmlNode::Eof => bail!("document ended inside a polygon"),
				_ => {}
			}
		}
		let Some(outer) = outer else {
			bail!("bad polygon found, no outer ring");
		};
		let mut polygon = Polygon::with_inner_rings(outer, inners);
		polygon.attrs = group.attrs();
		Ok(Some(Geometry::Polygon(polygon)))
	}

	fn parse_multi_geometry(&mut self, start: &XmlStart) -> Result<Option<Geometry>> {
		let mut geometries: Vec<Geometry> = Vec::new();
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => break,
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => {
					if GEOMETRY_TAGS.contains(&child.local.as_str()) {
						match self.handle_geometry(&child) {
							Ok(Some(geometry)) => geometries.push(geometry),
							Ok(None) => {}
							Err(e) => warn!("failed geometry {}: {e:#}", child.local),
						}
					} else {
						self.skip_element()?;
					}
				}
				XmlNode::Eof => bail!("document ended inside MultiGeometry"),
				_ => {}
			}
		}

		if geometries.is_empty() {
			debug!("no valid geometries in MultiGeometry");
			return Ok(None);
		}
		if geometries.len() == 1 {
			info!("convert MultiGeometry to single geometry");
			return Ok(Some(geometries.remove(0)));
		}
		let all_points = geometries.iter().all(|g| matches!(g, Geometry::Point(_)));
		Ok(Some(if all_points {
			let points = geometries
				.into_iter()
				.map(|g| match g {
					Geometry::Point(p) => p,
					_ => unreachable!(),
				})
				.collect();
			Geometry::MultiPoint(MultiPoint::new(points))
		} else {
			Geometry::GeometryBag(GeometryBag::new(geometries))
		}))
	}

	fn parse_model(&mut self, start: &XmlStart) -> Result<Option<Geometry>> {
		let mut model = Model::default();
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => break,
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => match child.local.as_str() {
					"Location" => model.location = self.parse_location(&child)?,
					"altitudeMode" => {
						if let Some(text) = self.non_empty_text()? {
							match AltitudeMode::parse(&text) {
								Some(mode) => model.altitude_mode = Some(mode),
								None => warn!("ignoring unknown altitudeMode value: {text}"),
							}
						}
					}
					_ => self.skip_element()?,
				},
				XmlNode::Eof => bail!("document ended inside Model"),
				_ => {}
			}
		}
		Ok(Some(Geometry::Model(model)))
	}

	fn parse_location(&mut self, start: &XmlStart) -> Result<Option<GeodeticPoint>> {
		let mut longitude = None;
		let mut latitude = None;
		let mut altitude = None;
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => break,
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => {
					let Some(text) = self.non_empty_text()? else {
						continue;
					};
					match child.local.as_str() {
						"longitude" => match text.parse::<f64>().map_err(anyhow::Error::from).and_then(Longitude::new) {
							Ok(v) => longitude = Some(v),
							Err(_) => warn!("invalid longitude value: {text}"),
						},
						"latitude" => match text.parse::<f64>().map_err(anyhow::Error::from).and_then(Latitude::new) {
							Ok(v) => latitude = Some(v),
							Err(_) => warn!("invalid latitude value: {text}"),
						},
						"altitude" => match text.parse::<f64>() {
							Ok(v) => altitude = Some(v),
							Err(_) => warn!("invalid altitude value: {text}"),
						},
						_ => {}
					}
				}
				XmlNode::Eof => bail!("document ended inside Location"),
				_ => {}
			}
		}
		if longitude.is_none() && latitude.is_none() {
			return Ok(None);
		}
		Ok(Some(GeodeticPoint::from_angles(
			longitude.unwrap_or_default(),
			latitude.unwrap_or_default(),
			altitude,
		)))
	}

	/// Scans a geometry element for `<coordinates>` and the presentation attributes,
	/// at any nesting depth, until the element closes.
	fn parse_coordinates_into(&mut self, start: &XmlStart, group: &mut GeometryGroup) -> Result<()> {
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(()),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => match child.local.as_str() {
					"coordinates" => {
						if let Some(text) = self.non_empty_text()? {
							group.points = parse_coord(&text);
						}
					}
					"altitudeMode" => {
						let from_kml = self.is_kml_ns(child.ns.as_deref());
						if let Some(text) = self.non_empty_text()? {
							group.set_altitude_mode(&text, from_kml);
						}
					}
					"extrude" => group.extrude = group.extrude || is_true(self.read_text()?.trim()),
					"tessellate" => group.tessellate = group.tessellate || is_true(self.read_text()?.trim()),
					// descend into wrappers like <LinearRing> inside a boundary element
					_ => {}
				},
				XmlNode::Eof => bail!("document ended inside {}", start.local),
				_ => {}
			}
		}
	}

	fn parse_coordinates(&mut self, start: &XmlStart) -> Result<GeometryGroup> {
		let mut group = GeometryGroup::default();
		self.parse_coordinates_into(start, &mut group)?;
		Ok(group)
	}

	/// Consumes the remaining content of `start` after an early coercion return.
	fn skip_rest_of(&mut self, start: &XmlStart) -> Result<()> {
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(()),
				XmlNode::Eof => bail!("document ended inside {}", start.local),
				_ => {}
			}
		}
	}
}

fn coerce_line_string(group: GeometryGroup) -> Result<Geometry> {
	let attrs = group.attrs();
	match group.points.len() {
		0 => bail!("line string has no valid coordinates"),
		1 => {
			info!("line with single coordinate converted to point: {:?}", group.points[0]);
			let mut point = Point::new(group.points[0]);
			point.attrs = attrs;
			Ok(Geometry::Point(point))
		}
		_ => {
			let mut line = Line::new(group.points)?;
			line.attrs = attrs;
			Ok(Geometry::Line(line))
		}
	}
}

fn coerce_linear_ring(group: GeometryGroup) -> Result<Geometry> {
	let attrs = group.attrs();
	match group.points.len() {
		0 => bail!("linear ring has no valid coordinates"),
		1 => {
			info!("ring with single coordinate converted to point: {:?}", group.points[0]);
			let mut point = Point::new(group.points[0]);
			point.attrs = attrs;
			Ok(Geometry::Point(point))
		}
		n if n < 4 => {
			info!("ring with {n} coordinates converted to line");
			let mut line = Line::new(group.points)?;
			line.attrs = attrs;
			Ok(Geometry::Line(line))
		}
		_ => {
			let mut ring = LinearRing::new(group.points)?;
			ring.attrs = attrs;
			Ok(Geometry::LinearRing(ring))
		}
	}
}
