//! Features and rows: the attribute-carrying records of the stream.

use super::{Color, Element, FieldValue, SimpleField, TaggedMap};
use chrono::{DateTime, Utc};
use geostream_geometry::Geometry;

/// An ordered field-to-value mapping shared by [`Feature`] and [`Row`].
///
/// Insertion order is preserved; putting a value for an already-present field name
/// replaces the previous value in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldMap {
	entries: Vec<(SimpleField, FieldValue)>,
}

impl FieldMap {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn put(&mut self, field: SimpleField, value: FieldValue) {
		if let Some(entry) = self.entries.iter_mut().find(|(f, _)| f.name == field.name) {
			*entry = (field, value);
		} else {
			self.entries.push((field, value));
		}
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&FieldValue> {
		self
			.entries
			.iter()
			.find(|(f, _)| f.name == name)
			.map(|(_, v)| v)
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &(SimpleField, FieldValue)> {
		self.entries.iter()
	}
}

/// A feature without geometry: a schema reference plus attribute values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
	pub id: Option<String>,
	pub schema_uri: Option<String>,
	pub fields: FieldMap,
}

impl Row {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

/// North/south/east/west extent of a ground overlay, degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LatLonBox {
	pub north: Option<f64>,
	pub south: Option<f64>,
	pub east: Option<f64>,
	pub west: Option<f64>,
	pub rotation: Option<f64>,
}

/// Properties common to the overlay feature kinds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayData {
	pub color: Option<Color>,
	pub draw_order: Option<i32>,
	pub icon: Option<TaggedMap>,
}

/// Extra state of a `NetworkLink` feature.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkLinkData {
	pub link: Option<TaggedMap>,
	pub refresh_visibility: bool,
	pub fly_to_view: bool,
	pub open: bool,
}

/// What kind of feature this is, with the kind-specific extras.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureKind {
	Placemark,
	NetworkLink(NetworkLinkData),
	GroundOverlay {
		overlay: OverlayData,
		lat_lon_box: Option<LatLonBox>,
		altitude: Option<f64>,
		altitude_mode: Option<String>,
	},
	ScreenOverlay {
		overlay: OverlayData,
		rotation: Option<f64>,
	},
	PhotoOverlay {
		overlay: OverlayData,
		rotation: Option<f64>,
	},
}

/// A named, typed record with optional geometry and attribute values keyed by schema
/// fields. Shapefile records and KML placemarks both surface as features.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
	pub kind: FeatureKind,
	pub id: Option<String>,
	pub name: Option<String>,
	pub description: Option<String>,
	pub snippet: Option<String>,
	pub visibility: Option<bool>,
	pub style_url: Option<String>,
	pub schema_uri: Option<String>,
	pub fields: FieldMap,
	pub geometry: Option<Geometry>,
	/// Camera or LookAt as key/value pairs.
	pub view_group: Option<TaggedMap>,
	pub region: Option<TaggedMap>,
	pub start_time: Option<DateTime<Utc>>,
	pub end_time: Option<DateTime<Utc>>,
	/// Foreign-namespace XML preserved for round-trip.
	pub elements: Vec<Element>,
}

impl Feature {
	#[must_use]
	pub fn new(kind: FeatureKind) -> Self {
		Self {
			kind,
			id: None,
			name: None,
			description: None,
			snippet: None,
			visibility: None,
			style_url: None,
			schema_uri: None,
			fields: FieldMap::new(),
			geometry: None,
			view_group: None,
			region: None,
			start_time: None,
			end_time: None,
			elements: Vec::new(),
		}
	}

	/// A plain placemark.
	#[must_use]
	pub fn placemark() -> Self {
		Self::new(FeatureKind::Placemark)
	}

	/// Drops the geometry, turning this feature into a bare [`Row`].
	#[must_use]
	pub fn into_row(self) -> Row {
		Row {
			id: self.id,
			schema_uri: self.schema_uri,
			fields: self.fields,
		}
	}
}

impl Default for Feature {
	fn default() -> Self {
		Self::placemark()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::events::FieldType;

	#[test]
	fn field_map_preserves_order_and_replaces() {
		let mut map = FieldMap::new();
		map.put(SimpleField::new("b"), FieldValue::from("1"));
		map.put(SimpleField::new("a"), FieldValue::from("2"));
		map.put(SimpleField::new("b").with_type(FieldType::Int), FieldValue::Long(3));

		assert_eq!(map.len(), 2);
		let names: Vec<_> = map.iter().map(|(f, _)| f.name.as_str()).collect();
		assert_eq!(names, vec!["b", "a"]);
		assert_eq!(map.get("b"), Some(&FieldValue::Long(3)));
	}

	#[test]
	fn feature_to_row_keeps_fields() {
		let mut feature = Feature::placemark();
		feature.schema_uri = Some("#s".to_string());
		feature.fields.put(SimpleField::new("x"), FieldValue::from("y"));
		let row = feature.into_row();
		assert_eq!(row.schema_uri.as_deref(), Some("#s"));
		assert_eq!(row.fields.get("x"), Some(&FieldValue::String("y".to_string())));
	}
}
