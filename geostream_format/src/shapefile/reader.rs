//! The `.shp` record stream.

use super::{DbfReader, MULTILINE_TYPE, MULTIPOINT_TYPE, NULL_TYPE, POINT_TYPE, POLYGON_TYPE, SIGNATURE, VERSION};
use anyhow::{Context, Result, bail, ensure};
use byteorder::{BigEndian, LittleEndian};
use geostream_core::events::{Feature, GisObject, Schema};
use geostream_core::io::{ValueReader, ValueReaderSlice};
use geostream_core::options::ShapefileOptions;
use geostream_core::stream::{EventQueue, GisInputStream};
use geostream_geometry::math::nest;
use geostream_geometry::{
	GeodeticBounds, GeodeticPoint, Geometry, Line, LinearRing, MultiLine, MultiPoint, MultiPolygons, Point,
};
use log::{debug, warn};
use std::path::Path;

const HEADER_LENGTH: usize = 100;
const WGS84_DATUM: &str = "GCS_WGS_1984";

/// Streams one shapefile (`.shp` + `.dbf` + optional `.prj`) as events.
///
/// If an attribute table is present its schema is surfaced first, then one feature per
/// `.shp` record with the DBF row's values attached. Without a `.dbf`, features carry no
/// attributes.
pub struct ShapefileReader {
	buf: Vec<u8>,
	offset: usize,
	/// Total file length in 16-bit words, from the header.
	file_length: usize,
	shape_type: i32,
	bounding_box: GeodeticBounds,
	dbf: Option<DbfReader>,
	schema_uri: Option<String>,
	skip_all: bool,
	queue: EventQueue,
	closed: bool,
}

impl ShapefileReader {
	/// Opens `<name>.shp` (and the co-located `.dbf`/`.prj` if present) in `directory`.
	///
	/// # Errors
	/// Returns an error if the `.shp` file is missing or its header is malformed, or,
	/// with `strict_prj_check`, if the `.prj` datum is not WGS-84.
	pub fn open(directory: &Path, name: &str, options: &ShapefileOptions) -> Result<Self> {
		let shp_path = directory.join(format!("{name}.shp"));
		ensure!(shp_path.exists(), "shp file missing for shapefile {name}");

		let prj_path = directory.join(format!("{name}.prj"));
		if prj_path.exists() {
			let wkt = std::fs::read_to_string(&prj_path)
				.with_context(|| format!("failed to read {}", prj_path.display()))?;
			check_datum(&wkt, options.strict_prj_check)?;
		}

		let dbf_path = directory.join(format!("{name}.dbf"));
		let dbf = if dbf_path.exists() {
			Some(DbfReader::open(&dbf_path)?)
		} else {
			None
		};

		let buf = std::fs::read(&shp_path).with_context(|| format!("failed to read {}", shp_path.display()))?;
		Self::from_parts(buf, dbf, options)
	}

	/// Builds a reader from an in-memory `.shp` image and an optional attribute table.
	///
	/// # Errors
	/// Returns an error if the header is malformed or the shape type is unsupported.
	pub fn from_parts(buf: Vec<u8>, dbf: Option<DbfReader>, options: &ShapefileOptions) -> Result<Self> {
		ensure!(buf.len() >= HEADER_LENGTH, "shp file too short for the 100 byte header");

		let mut be = ValueReaderSlice::new_be(&buf[..HEADER_LENGTH]);
		let signature = be.read_i32()?;
		ensure!(signature == SIGNATURE, "invalid shapefile signature {signature}");
		be.skip(5 * 4)?; // unused
		let file_length = be.read_i32()? as usize;

		let mut le = ValueReaderSlice::new_le(&buf[..HEADER_LENGTH]);
		le.set_position(28)?;
		let version = le.read_i32()?;
		ensure!(version == VERSION, "invalid shapefile version {version}");
		let shape_type = le.read_i32()?;
		ensure!(is_supported(shape_type), "unsupported shape type {shape_type}");

		let x_min = le.read_f64()?;
		let y_min = le.read_f64()?;
		let x_max = le.read_f64()?;
		let y_max = le.read_f64()?;
		let z_min = le.read_f64()?;
		let z_max = le.read_f64()?;
		// mMin and mMax are not used
		let mut bounding_box = GeodeticBounds::from_degrees(x_min, y_min, x_max, y_max);
		if is_3d(shape_type) {
			bounding_box = bounding_box.with_elevation(z_min, z_max);
		}

		let mut queue = EventQueue::new();
		let mut schema_uri = None;
		let mut skip_all = false;
		if let Some(dbf) = &dbf {
			let schema = dbf.schema();
			if options.schema_accepter.as_ref().is_none_or(|accept| accept(schema)) {
				schema_uri = Some(schema.uri().to_string());
				queue.add_last(GisObject::Schema(schema.clone()));
			} else {
				debug!("schema {} rejected, skipping all features", schema.uri());
				skip_all = true;
			}
		}

		Ok(Self {
			buf,
			offset: HEADER_LENGTH,
			file_length,
			shape_type,
			bounding_box,
			dbf,
			schema_uri,
			skip_all,
			queue,
			closed: false,
		})
	}

	/// The bounding box from the file header.
	#[must_use]
	pub fn bounding_box(&self) -> &GeodeticBounds {
		&self.bounding_box
	}

	fn read_feature(&mut self) -> Result<Option<Feature>> {
		if self.offset >= 2 * self.file_length {
			return Ok(None);
		}
		ensure!(
			self.offset + 8 <= self.buf.len(),
			"shapefile truncated inside a record header"
		);

		let mut header = ValueReaderSlice::<BigEndian>::new_be(&self.buf[self.offset..self.offset + 8]);
		let record_number = header.read_i32()?;
		let content_length = header.read_i32()? as usize; // in 16 bit words
		ensure!(content_length > 4, "shapefile contains badly formatted record");

		let body_start = self.offset + 8;
		let body_end = body_start + 2 * content_length;
		ensure!(body_end <= self.buf.len(), "shapefile truncated inside record {record_number}");
		self.offset = body_end;

		let mut body = ValueReaderSlice::<LittleEndian>::new_le(&self.buf[body_start..body_end]);
		let record_type = body.read_i32()?;
		let geometry = if record_type == NULL_TYPE {
			None
		} else {
			ensure!(
				record_type == self.shape_type,
				"shapefile contains record with unexpected shape type {record_type}, expecting {}",
				self.shape_type
			);
			match decode_geometry(&mut body, self.shape_type) {
				Ok(geometry) => Some(geometry),
				Err(e) => {
					warn!("skipping geometry of record {record_number}: {e:#}");
					None
				}
			}
		};

		let mut feature = match &mut self.dbf {
			Some(dbf) => match dbf.next_row()? {
				Some(row) => {
					let mut f = Feature::placemark();
					f.id = row.id;
					f.schema_uri = row.schema_uri;
					f.fields = row.fields;
					f
				}
				None => {
					debug!("attribute table exhausted before shp records, ending stream");
					return Ok(None);
				}
			},
			None => Feature::placemark(),
		};
		if feature.schema_uri.is_none() {
			feature.schema_uri = self.schema_uri.clone();
		}
		feature.geometry = geometry;
		Ok(Some(feature))
	}
}

impl GisInputStream for ShapefileReader {
	fn queue(&mut self) -> &mut EventQueue {
		&mut self.queue
	}

	fn read_next(&mut self) -> Result<Option<GisObject>> {
		if self.closed || self.skip_all {
			return Ok(None);
		}
		Ok(self.read_feature()?.map(GisObject::from))
	}

	fn close(&mut self) {
		self.closed = true;
		self.queue.clear();
		self.buf.clear();
		if let Some(dbf) = &mut self.dbf {
			dbf.close();
		}
	}

	fn enumerate_schemas(&self) -> Vec<&Schema> {
		self.dbf.as_ref().map(|d| d.schema()).into_iter().collect()
	}
}

fn check_datum(wkt: &str, strict: bool) -> Result<()> {
	match super::geogcs_datum(wkt) {
		Some(datum) if datum == WGS84_DATUM => Ok(()),
		Some(datum) => {
			if strict {
				bail!("shapefile is not a WGS 84 datum: {datum}");
			}
			warn!("shapefile is not a WGS 84 datum: {datum}");
			Ok(())
		}
		None => {
			warn!("prj file contains no GEOGCS entry");
			Ok(())
		}
	}
}

fn is_3d(shape_type: i32) -> bool {
	shape_type > 10 && shape_type <= 20
}

fn is_supported(shape_type: i32) -> bool {
	let base = shape_type % 10;
	let form = shape_type - base;
	matches!(base, NULL_TYPE | POINT_TYPE | MULTILINE_TYPE | POLYGON_TYPE | MULTIPOINT_TYPE)
		&& matches!(form, 0 | 10 | 20)
		&& !(base == NULL_TYPE && form != 0)
}

fn decode_geometry<'a>(
	body: &mut ValueReaderSlice<'a, LittleEndian>,
	shape_type: i32,
) -> Result<Geometry> {
	let with_z = is_3d(shape_type);
	let base = shape_type % 10;
	if base == POINT_TYPE {
		return decode_point(body, with_z);
	}

	// skip the per-record bounding box, it is reconstructed from the points
	body.skip(4 * 8)?;
	match base {
		MULTILINE_TYPE => decode_poly_line(body, with_z),
		POLYGON_TYPE => decode_polygon(body, with_z),
		MULTIPOINT_TYPE => decode_multipoint(body, with_z),
		_ => bail!("unsupported shape type {shape_type}"),
	}
}

fn decode_point<'a>(body: &mut ValueReaderSlice<'a, LittleEndian>, with_z: bool) -> Result<Geometry> {
	let lon = body.read_f64()?;
	let lat = body.read_f64()?;
	let point = if with_z {
		let z = body.read_f64()?;
		// a trailing measure value may follow, it is ignored
		GeodeticPoint::new_3d(lon, lat, z)?
	} else {
		GeodeticPoint::new(lon, lat)?
	};
	Ok(Geometry::Point(Point::new(point)))
}

/// Reads the interleaved X/Y array and, for Z types, the Z range and values. A buffer that
/// ends before all Z values are read is tolerated: the remaining values default to 0.
/// Trailing measure data is ignored entirely.
fn read_poly_points<'a>(
	body: &mut ValueReaderSlice<'a, LittleEndian>,
	n_points: usize,
	with_z: bool,
) -> Result<Vec<GeodeticPoint>> {
	let mut xy = Vec::with_capacity(n_points);
	for _ in 0..n_points {
		let x = body.read_f64()?;
		let y = body.read_f64()?;
		xy.push((x, y));
	}
	let mut z = vec![0.0; n_points];
	if with_z {
		body.skip(2 * 8)?; // z range
		for slot in z.iter_mut() {
			match body.read_f64() {
				Ok(value) => *slot = value,
				Err(_) => {
					warn!("found too few z-values, the rest will be taken as 0.0");
					break;
				}
			}
		}
	}
	xy.into_iter()
		.zip(z)
		.map(|((x, y), z)| {
			if with_z {
				GeodeticPoint::new_3d(x, y, z)
			} else {
				GeodeticPoint::new(x, y)
			}
		})
		.collect()
}

fn read_part_offsets<'a>(
	body: &mut ValueReaderSlice<'a, LittleEndian>,
	n_parts: usize,
	n_points: usize,
) -> Result<Vec<usize>> {
	let mut parts = Vec::with_capacity(n_parts + 1);
	for _ in 0..n_parts {
		parts.push(body.read_i32()? as usize);
	}
	parts.push(n_points);
	for pair in parts.windows(2) {
		ensure!(pair[0] <= pair[1] && pair[1] <= n_points, "invalid part offsets");
	}
	Ok(parts)
}

fn decode_poly_line<'a>(body: &mut ValueReaderSlice<'a, LittleEndian>, with_z: bool) -> Result<Geometry> {
	let n_parts = body.read_i32()? as usize;
	let n_points = body.read_i32()? as usize;
	let parts = read_part_offsets(body, n_parts, n_points)?;
	let points = read_poly_points(body, n_points, with_z)?;

	let mut lines = Vec::with_capacity(n_parts);
	for pair in parts.windows(2) {
		lines.push(Line::new(points[pair[0]..pair[1]].to_vec())?);
	}
	Ok(match lines.len() {
		1 => Geometry::Line(lines.remove(0)),
		_ => Geometry::MultiLine(MultiLine::new(lines)),
	})
}

/// Rebuilds nested polygons from the flattened ring array: clockwise rings open
/// polygons, counter-clockwise rings become holes of the polygon containing them.
fn decode_polygon<'a>(body: &mut ValueReaderSlice<'a, LittleEndian>, with_z: bool) -> Result<Geometry> {
	let n_parts = body.read_i32()? as usize;
	let n_points = body.read_i32()? as usize;
	let parts = read_part_offsets(body, n_parts, n_points)?;
	let points = read_poly_points(body, n_points, with_z)?;

	let mut rings = Vec::with_capacity(n_parts);
	for pair in parts.windows(2) {
		rings.push(LinearRing::new(points[pair[0]..pair[1]].to_vec())?);
	}
	let mut polygons = nest(rings);
	Ok(match polygons.len() {
		0 => bail!("polygon record contains no rings"),
		1 => Geometry::Polygon(polygons.remove(0)),
		_ => Geometry::MultiPolygons(MultiPolygons::new(polygons)),
	})
}

fn decode_multipoint<'a>(body: &mut ValueReaderSlice<'a, LittleEndian>, with_z: bool) -> Result<Geometry> {
	let n_points = body.read_i32()? as usize;
	let points = read_poly_points(body, n_points, with_z)?;
	let mut points: Vec<Point> = points.into_iter().map(Point::new).collect();
	Ok(match points.len() {
		1 => Geometry::Point(points.remove(0)),
		_ => Geometry::MultiPoint(MultiPoint::new(points)),
	})
}
