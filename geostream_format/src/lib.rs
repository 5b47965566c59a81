//! Format adapters: binary ESRI shapefiles, KML and CSV.
//!
//! Every adapter surfaces the same pull-based event contract from
//! [`geostream_core::stream`]; consumers never see format specifics.

pub mod csv;
pub mod kml;
pub mod shapefile;

pub use csv::CsvReader;
pub use kml::{KmlReader, KmlWriter};
pub use shapefile::{DbfReader, ShapefileReader};
