//! Streaming KML input and output.
//!
//! The reader is a pull parser tolerant of the lax KML Google Earth accepts: sloppy
//! coordinate strings, missing timestamp fields, HTML-style colors, degenerate
//! geometries, schema-aliased element names. The writer emits conforming KML 2.2.

mod coord;
mod geometry;
mod reader;
mod styles;
mod writer;

pub use coord::parse_coord;
pub use reader::KmlReader;
pub use writer::KmlWriter;

pub(crate) const KML_NS_22: &str = "http://www.opengis.net/kml/2.2";
pub(crate) const GOOGLE_KML_EXT_PREFIX: &str = "http://www.google.com/kml/ext/";
pub(crate) const W3_PREFIX: &str = "http://www.w3.org/";

/// The KML namespace families recognized without registration.
pub(crate) const KNOWN_KML_NAMESPACES: [&str; 7] = [
	"http://earth.google.com/kml/2.1",
	"http://earth.google.com/kml/2.2",
	"http://earth.google.com/kml/2.3",
	"http://earth.google.com/kml/3.0",
	"http://www.opengis.net/kml/2.2",
	"http://www.opengis.net/kml/2.3",
	"http://www.opengis.net/kml/3.0",
];

pub(crate) const FEATURE_TAGS: [&str; 5] =
	["Placemark", "NetworkLink", "GroundOverlay", "ScreenOverlay", "PhotoOverlay"];
pub(crate) const CONTAINER_TAGS: [&str; 2] = ["Folder", "Document"];
pub(crate) const GEOMETRY_TAGS: [&str; 6] =
	["Point", "LineString", "LinearRing", "Polygon", "MultiGeometry", "Model"];
