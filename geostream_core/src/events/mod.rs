//! The GIS event objects produced and consumed by the streams.
//!
//! Events for one logical document arrive in order:
//! `DocumentStart → (Style|StyleMap|Schema)* → ContainerStart → Feature* → ContainerEnd`
//! with arbitrary container nesting. Objects are created by a reader, handed to the
//! consumer, and owned by the consumer thereafter.

mod atom;
mod container;
mod element;
mod feature;
mod network_link_control;
mod schema;
mod style;
mod tagged_map;
mod value;

pub use atom::{AtomHeader, AtomLink};
pub use container::{ContainerStart, ContainerType, DocumentStart, DocumentType};
pub use element::Element;
pub use feature::{Feature, FeatureKind, FieldMap, LatLonBox, NetworkLinkData, OverlayData, Row};
pub use network_link_control::NetworkLinkControl;
pub use schema::{FieldType, Schema, SimpleField};
pub use style::{
	BalloonStyle, Color, IconStyle, LabelStyle, LineStyle, ListStyle, PolyStyle, Style, StyleKey, StyleMap,
	StylePair, StyleSelector,
};
pub use tagged_map::TaggedMap;
pub use value::FieldValue;

/// One event of the pull stream.
#[derive(Clone, Debug, PartialEq)]
pub enum GisObject {
	DocumentStart(DocumentStart),
	ContainerStart(ContainerStart),
	ContainerEnd,
	Feature(Box<Feature>),
	Row(Row),
	Schema(Schema),
	Style(Style),
	StyleMap(StyleMap),
	Element(Element),
	NetworkLinkControl(NetworkLinkControl),
	AtomHeader(AtomHeader),
	Comment(String),
}

impl GisObject {
	#[must_use]
	pub fn type_name(&self) -> &'static str {
		match self {
			GisObject::DocumentStart(_) => "DocumentStart",
			GisObject::ContainerStart(_) => "ContainerStart",
			GisObject::ContainerEnd => "ContainerEnd",
			GisObject::Feature(_) => "Feature",
			GisObject::Row(_) => "Row",
			GisObject::Schema(_) => "Schema",
			GisObject::Style(_) => "Style",
			GisObject::StyleMap(_) => "StyleMap",
			GisObject::Element(_) => "Element",
			GisObject::NetworkLinkControl(_) => "NetworkLinkControl",
			GisObject::AtomHeader(_) => "AtomHeader",
			GisObject::Comment(_) => "Comment",
		}
	}
}

impl From<Feature> for GisObject {
	fn from(f: Feature) -> Self {
		GisObject::Feature(Box::new(f))
	}
}

impl From<Schema> for GisObject {
	fn from(s: Schema) -> Self {
		GisObject::Schema(s)
	}
}

impl From<Style> for GisObject {
	fn from(s: Style) -> Self {
		GisObject::Style(s)
	}
}

impl From<StyleMap> for GisObject {
	fn from(s: StyleMap) -> Self {
		GisObject::StyleMap(s)
	}
}

impl From<Row> for GisObject {
	fn from(r: Row) -> Self {
		GisObject::Row(r)
	}
}
