use super::AltitudeMode;
use crate::geodetic::GeodeticPoint;

/// A 3D model reference. Only the location and altitude interpretation are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Model {
	pub location: Option<GeodeticPoint>,
	pub altitude_mode: Option<AltitudeMode>,
}
