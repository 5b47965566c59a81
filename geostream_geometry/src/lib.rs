//! Geodetic primitives and the geometry model used by the geostream event pipeline.
//!
//! Coordinates are WGS-84 geographic degrees throughout; no reprojection happens here.

pub mod geodetic;
pub mod geometry;
pub mod math;

pub use geodetic::*;
pub use geometry::*;
