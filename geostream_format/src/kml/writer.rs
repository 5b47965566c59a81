//! The KML 2.2 output stream.
//!
//! Serializes the same event sequence the readers produce. Callers write events in
//! document order; shared styles, style maps and schemas must be written where they
//! should appear (the stream enforces no ordering of its own).

use super::KML_NS_22;
use anyhow::{Result, bail};
use geostream_core::events::{
	Color, ContainerStart, ContainerType, Element, Feature, FeatureKind, GisObject, LatLonBox,
	NetworkLinkControl, Schema, Style, StyleMap, TaggedMap,
};
use geostream_core::stream::GisOutputStream;
use geostream_core::utils::format_timestamp;
use geostream_geometry::{GeodeticPoint, Geometry, GeometryAttrs, LinearRing, Model, Polygon};
use log::debug;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;

const LAT_LON_ALT_BOX_KEYS: [&str; 7] =
	["north", "south", "east", "west", "minAltitude", "maxAltitude", "altitudeMode"];
const LOD_KEYS: [&str; 4] = ["minLodPixels", "maxLodPixels", "minFadeExtent", "maxFadeExtent"];

/// Writes GIS events as a KML 2.2 document.
pub struct KmlWriter<W: Write> {
	xml: Writer<W>,
	namespaces: Vec<(String, String)>,
	root_open: bool,
	containers: Vec<ContainerType>,
	closed: bool,
}

impl<W: Write> KmlWriter<W> {
	#[must_use]
	pub fn new(inner: W) -> Self {
		Self {
			xml: Writer::new(inner),
			namespaces: Vec::new(),
			root_open: false,
			containers: Vec::new(),
			closed: false,
		}
	}

	/// Finalizes the document and returns the underlying sink.
	///
	/// # Errors
	/// Returns an error if finalizing fails.
	pub fn into_inner(mut self) -> Result<W> {
		GisOutputStream::close(&mut self)?;
		Ok(self.xml.into_inner())
	}

	fn ensure_root(&mut self) -> Result<()> {
		if self.root_open {
			return Ok(());
		}
		self.root_open = true;
		self
			.xml
			.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
		let mut root = BytesStart::new("kml");
		root.push_attribute(("xmlns", KML_NS_22));
		for (prefix, uri) in &self.namespaces {
			root.push_attribute((format!("xmlns:{prefix}").as_str(), uri.as_str()));
		}
		self.xml.write_event(Event::Start(root))?;
		Ok(())
	}

	fn simple_element(&mut self, name: &str, text: &str) -> Result<()> {
		self.xml.write_event(Event::Start(BytesStart::new(name)))?;
		self.xml.write_event(Event::Text(BytesText::new(text)))?;
		self.xml.write_event(Event::End(BytesEnd::new(name)))?;
		Ok(())
	}

	fn bool_element(&mut self, name: &str, value: bool) -> Result<()> {
		self.simple_element(name, if value { "1" } else { "0" })
	}

	fn color_element(&mut self, name: &str, color: &Color) -> Result<()> {
		self.simple_element(name, &color.to_kml())
	}

	// ---- containers -------------------------------------------------------------

	fn write_container_start(&mut self, cs: &ContainerStart) -> Result<()> {
		let mut start = BytesStart::new(cs.container_type.as_str());
		if let Some(id) = &cs.id {
			start.push_attribute(("id", id.as_str()));
		}
		self.xml.write_event(Event::Start(start))?;
		if let Some(name) = &cs.name {
			self.simple_element("name", name)?;
		}
		if let Some(visibility) = cs.visibility {
			self.bool_element("visibility", visibility)?;
		}
		if cs.open {
			self.bool_element("open", true)?;
		}
		if let Some(snippet) = &cs.snippet {
			self.simple_element("snippet", snippet)?;
		}
		if let Some(description) = &cs.description {
			self.simple_element("description", description)?;
		}
		self.containers.push(cs.container_type);
		Ok(())
	}

	fn write_container_end(&mut self) -> Result<()> {
		let Some(container_type) = self.containers.pop() else {
			bail!("container end without a matching container start");
		};
		self.xml.write_event(Event::End(BytesEnd::new(container_type.as_str())))?;
		Ok(())
	}

	// ---- schemas ----------------------------------------------------------------

	fn write_schema(&mut self, schema: &Schema) -> Result<()> {
		let mut start = BytesStart::new("Schema");
		if let Some(name) = &schema.name {
			start.push_attribute(("name", name.as_str()));
		}
		if schema.uri().starts_with('#') {
			start.push_attribute(("id", schema.local_id()));
		}
		self.xml.write_event(Event::Start(start))?;
		for field in schema.fields() {
			let mut fs = BytesStart::new("SimpleField");
			fs.push_attribute(("type", field.field_type.kml_name()));
			fs.push_attribute(("name", field.name.as_str()));
			self.xml.write_event(Event::Start(fs))?;
			if let Some(alias) = &field.alias_name {
				self.simple_element("displayName", alias)?;
			}
			self.xml.write_event(Event::End(BytesEnd::new("SimpleField")))?;
		}
		self.xml.write_event(Event::End(BytesEnd::new("Schema")))?;
		Ok(())
	}

	// ---- styles -----------------------------------------------------------------

	fn write_style(&mut self, style: &Style) -> Result<()> {
		let mut start = BytesStart::new("Style");
		if let Some(id) = &style.id {
			start.push_attribute(("id", id.as_str()));
		}
		self.xml.write_event(Event::Start(start))?;
		if let Some(icon) = &style.icon {
			self.xml.write_event(Event::Start(BytesStart::new("IconStyle")))?;
			if let Some(color) = &icon.color {
				self.color_element("color", color)?;
			}
			if let Some(scale) = icon.scale {
				self.simple_element("scale", &scale.to_string())?;
			}
			if let Some(heading) = icon.heading {
				self.simple_element("heading", &heading.to_string())?;
			}
			if let Some(href) = &icon.href {
				self.xml.write_event(Event::Start(BytesStart::new("Icon")))?;
				if !href.is_empty() {
					self.simple_element("href", href)?;
				}
				self.xml.write_event(Event::End(BytesEnd::new("Icon")))?;
			}
			self.xml.write_event(Event::End(BytesEnd::new("IconStyle")))?;
		}
		if let Some(line) = &style.line {
			self.xml.write_event(Event::Start(BytesStart::new("LineStyle")))?;
			if let Some(color) = &line.color {
				self.color_element("color", color)?;
			}
			if let Some(width) = line.width {
				self.simple_element("width", &width.to_string())?;
			}
			self.xml.write_event(Event::End(BytesEnd::new("LineStyle")))?;
		}
		if let Some(poly) = &style.poly {
			self.xml.write_event(Event::Start(BytesStart::new("PolyStyle")))?;
			if let Some(color) = &poly.color {
				self.color_element("color", color)?;
			}
			if let Some(fill) = poly.fill {
				self.bool_element("fill", fill)?;
			}
			if let Some(outline) = poly.outline {
				self.bool_element("outline", outline)?;
			}
			self.xml.write_event(Event::End(BytesEnd::new("PolyStyle")))?;
		}
		if let Some(label) = &style.label {
			self.xml.write_event(Event::Start(BytesStart::new("LabelStyle")))?;
			if let Some(color) = &label.color {
				self.color_element("color", color)?;
			}
			if let Some(scale) = label.scale {
				self.simple_element("scale", &scale.to_string())?;
			}
			self.xml.write_event(Event::End(BytesEnd::new("LabelStyle")))?;
		}
		if let Some(balloon) = &style.balloon {
			self.xml.write_event(Event::Start(BytesStart::new("BalloonStyle")))?;
			if let Some(color) = &balloon.bg_color {
				self.color_element("bgColor", color)?;
			}
			if let Some(text) = &balloon.text {
				self.simple_element("text", text)?;
			}
			if let Some(color) = &balloon.text_color {
				self.color_element("textColor", color)?;
			}
			if let Some(mode) = &balloon.display_mode {
				self.simple_element("displayMode", mode)?;
			}
			self.xml.write_event(Event::End(BytesEnd::new("BalloonStyle")))?;
		}
		if let Some(list) = &style.list {
			self.xml.write_event(Event::Start(BytesStart::new("ListStyle")))?;
			if let Some(item_type) = &list.item_type {
				self.simple_element("listItemType", item_type)?;
			}
			if let Some(color) = &list.bg_color {
				self.color_element("bgColor", color)?;
			}
			self.xml.write_event(Event::End(BytesEnd::new("ListStyle")))?;
		}
		self.xml.write_event(Event::End(BytesEnd::new("Style")))?;
		Ok(())
	}

	fn write_style_map(&mut self, style_map: &StyleMap) -> Result<()> {
		let mut start = BytesStart::new("StyleMap");
		if let Some(id) = &style_map.id {
			start.push_attribute(("id", id.as_str()));
		}
		self.xml.write_event(Event::Start(start))?;
		for pair in style_map.pairs() {
			self.xml.write_event(Event::Start(BytesStart::new("Pair")))?;
			self.simple_element("key", pair.key.as_str())?;
			if let Some(url) = &pair.style_url {
				self.simple_element("styleUrl", url)?;
			}
			if let Some(style) = &pair.style {
				self.write_style(style)?;
			}
			self.xml.write_event(Event::End(BytesEnd::new("Pair")))?;
		}
		self.xml.write_event(Event::End(BytesEnd::new("StyleMap")))?;
		Ok(())
	}

	// ---- features ---------------------------------------------------------------

	fn write_feature(&mut self, feature: &Feature) -> Result<()> {
		let element_name = match &feature.kind {
			FeatureKind::Placemark => "Placemark",
			FeatureKind::NetworkLink(_) => "NetworkLink",
			FeatureKind::GroundOverlay { .. } => "GroundOverlay",
			FeatureKind::ScreenOverlay { .. } => "ScreenOverlay",
			FeatureKind::PhotoOverlay { .. } => "PhotoOverlay",
		};
		let mut start = BytesStart::new(element_name);
		if let Some(id) = &feature.id {
			start.push_attribute(("id", id.as_str()));
		}
		self.xml.write_event(Event::Start(start))?;

		if let Some(name) = &feature.name {
			self.simple_element("name", name)?;
		}
		if let Some(visibility) = feature.visibility {
			self.bool_element("visibility", visibility)?;
		}
		if let Some(snippet) = &feature.snippet {
			self.simple_element("snippet", snippet)?;
		}
		if let Some(description) = &feature.description {
			self.simple_element("description", description)?;
		}
		if let Some(url) = &feature.style_url {
			self.simple_element("styleUrl", url)?;
		}
		self.write_times(feature)?;
		if let Some(view) = &feature.view_group {
			self.write_tagged_map(view)?;
		}
		if let Some(region) = &feature.region {
			self.write_region(region)?;
		}
		self.write_extended_data(feature)?;
		for element in &feature.elements {
			self.write_foreign_element(element)?;
		}
		self.write_kind_specific(feature)?;
		if let Some(geometry) = &feature.geometry {
			self.write_geometry(geometry)?;
		}

		self.xml.write_event(Event::End(BytesEnd::new(element_name)))?;
		Ok(())
	}

	fn write_times(&mut self, feature: &Feature) -> Result<()> {
		match (feature.start_time, feature.end_time) {
			(None, None) => {}
			(Some(start), Some(end)) if start == end => {
				self.xml.write_event(Event::Start(BytesStart::new("TimeStamp")))?;
				self.simple_element("when", &format_timestamp(&start))?;
				self.xml.write_event(Event::End(BytesEnd::new("TimeStamp")))?;
			}
			(start, end) => {
				self.xml.write_event(Event::Start(BytesStart::new("TimeSpan")))?;
				if let Some(start) = start {
					self.simple_element("begin", &format_timestamp(&start))?;
				}
				if let Some(end) = end {
					self.simple_element("end", &format_timestamp(&end))?;
				}
				self.xml.write_event(Event::End(BytesEnd::new("TimeSpan")))?;
			}
		}
		Ok(())
	}

	fn write_tagged_map(&mut self, map: &TaggedMap) -> Result<()> {
		self.xml.write_event(Event::Start(BytesStart::new(map.tag())))?;
		for (key, value) in map.iter() {
			self.write_tagged_entry(key, value)?;
		}
		self.xml.write_event(Event::End(BytesEnd::new(map.tag())))?;
		Ok(())
	}

	fn write_tagged_entry(&mut self, key: &str, value: &str) -> Result<()> {
		if key.contains('/') {
			debug!("dropping nested extension value {key}");
			return Ok(());
		}
		if let Some((prefix, _)) = key.split_once(':')
			&& !self.namespaces.iter().any(|(p, _)| p == prefix)
		{
			debug!("dropping value {key} with undeclared prefix");
			return Ok(());
		}
		self.simple_element(key, value)
	}

	fn write_region(&mut self, region: &TaggedMap) -> Result<()> {
		self.xml.write_event(Event::Start(BytesStart::new("Region")))?;
		if region.iter().any(|(k, _)| LAT_LON_ALT_BOX_KEYS.contains(&k.as_str())) {
			self.xml.write_event(Event::Start(BytesStart::new("LatLonAltBox")))?;
			for key in LAT_LON_ALT_BOX_KEYS {
				if let Some(value) = region.get(key) {
					self.simple_element(key, value)?;
				}
			}
			self.xml.write_event(Event::End(BytesEnd::new("LatLonAltBox")))?;
		}
		if region.iter().any(|(k, _)| LOD_KEYS.contains(&k.as_str())) {
			self.xml.write_event(Event::Start(BytesStart::new("Lod")))?;
			for key in LOD_KEYS {
				if let Some(value) = region.get(key) {
					self.simple_element(key, value)?;
				}
			}
			self.xml.write_event(Event::End(BytesEnd::new("Lod")))?;
		}
		self.xml.write_event(Event::End(BytesEnd::new("Region")))?;
		Ok(())
	}

	fn write_extended_data(&mut self, feature: &Feature) -> Result<()> {
		if feature.fields.is_empty() {
			return Ok(());
		}
		self.xml.write_event(Event::Start(BytesStart::new("ExtendedData")))?;
		match &feature.schema_uri {
			Some(uri) => {
				let mut sd = BytesStart::new("SchemaData");
				sd.push_attribute(("schemaUrl", uri.as_str()));
				self.xml.write_event(Event::Start(sd))?;
				for (field, value) in feature.fields.iter() {
					let mut el = BytesStart::new("SimpleData");
					el.push_attribute(("name", field.name.as_str()));
					self.xml.write_event(Event::Start(el))?;
					self.xml.write_event(Event::Text(BytesText::new(&value.to_string())))?;
					self.xml.write_event(Event::End(BytesEnd::new("SimpleData")))?;
				}
				self.xml.write_event(Event::End(BytesEnd::new("SchemaData")))?;
			}
			None => {
				for (field, value) in feature.fields.iter() {
					let mut el = BytesStart::new("Data");
					el.push_attribute(("name", field.name.as_str()));
					self.xml.write_event(Event::Start(el))?;
					self.simple_element("value", &value.to_string())?;
					self.xml.write_event(Event::End(BytesEnd::new("Data")))?;
				}
			}
		}
		self.xml.write_event(Event::End(BytesEnd::new("ExtendedData")))?;
		Ok(())
	}

	fn write_kind_specific(&mut self, feature: &Feature) -> Result<()> {
		match &feature.kind {
			FeatureKind::Placemark => {}
			FeatureKind::NetworkLink(data) => {
				if data.refresh_visibility {
					self.bool_element("refreshVisibility", true)?;
				}
				if data.fly_to_view {
					self.bool_element("flyToView", true)?;
				}
				if data.open {
					self.bool_element("open", true)?;
				}
				if let Some(link) = &data.link {
					self.write_tagged_map(link)?;
				}
			}
			FeatureKind::GroundOverlay {
				overlay,
				lat_lon_box,
				altitude,
				altitude_mode,
			} => {
				self.write_overlay_common(overlay)?;
				if let Some(altitude) = altitude {
					self.simple_element("altitude", &altitude.to_string())?;
				}
				if let Some(mode) = altitude_mode {
					self.simple_element("altitudeMode", mode)?;
				}
				if let Some(lat_lon_box) = lat_lon_box {
					self.write_lat_lon_box(lat_lon_box)?;
				}
			}
			FeatureKind::ScreenOverlay { overlay, rotation }
			| FeatureKind::PhotoOverlay { overlay, rotation } => {
				self.write_overlay_common(overlay)?;
				if let Some(rotation) = rotation {
					self.simple_element("rotation", &rotation.to_string())?;
				}
			}
		}
		Ok(())
	}

	fn write_overlay_common(
		&mut self,
		overlay: &geostream_core::events::OverlayData,
	) -> Result<()> {
		if let Some(color) = &overlay.color {
			self.color_element("color", color)?;
		}
		if let Some(order) = overlay.draw_order {
			self.simple_element("drawOrder", &order.to_string())?;
		}
		if let Some(icon) = &overlay.icon {
			self.write_tagged_map(icon)?;
		}
		Ok(())
	}

	fn write_lat_lon_box(&mut self, lat_lon_box: &LatLonBox) -> Result<()> {
		self.xml.write_event(Event::Start(BytesStart::new("LatLonBox")))?;
		for (name, value) in [
			("north", lat_lon_box.north),
			("south", lat_lon_box.south),
			("east", lat_lon_box.east),
			("west", lat_lon_box.west),
			("rotation", lat_lon_box.rotation),
		] {
			if let Some(value) = value {
				self.simple_element(name, &value.to_string())?;
			}
		}
		self.xml.write_event(Event::End(BytesEnd::new("LatLonBox")))?;
		Ok(())
	}

	// ---- geometry ---------------------------------------------------------------

	fn write_geometry(&mut self, geometry: &Geometry) -> Result<()> {
		match geometry {
			Geometry::Point(point) => {
				self.xml.write_event(Event::Start(BytesStart::new("Point")))?;
				self.write_attrs(&point.attrs, false)?;
				self.simple_element("coordinates", &format_tuple(&point.point))?;
				self.xml.write_event(Event::End(BytesEnd::new("Point")))?;
			}
			Geometry::Line(line) => {
				self.xml.write_event(Event::Start(BytesStart::new("LineString")))?;
				self.write_attrs(&line.attrs, true)?;
				self.simple_element("coordinates", &format_coordinates(line.points()))?;
				self.xml.write_event(Event::End(BytesEnd::new("LineString")))?;
			}
			Geometry::LinearRing(ring) => {
				self.xml.write_event(Event::Start(BytesStart::new("LinearRing")))?;
				self.write_attrs(&ring.attrs, true)?;
				self.simple_element("coordinates", &format_coordinates(ring.points()))?;
				self.xml.write_event(Event::End(BytesEnd::new("LinearRing")))?;
			}
			Geometry::Polygon(polygon) => self.write_polygon(polygon)?,
			Geometry::MultiPoint(mp) => {
				self.xml.write_event(Event::Start(BytesStart::new("MultiGeometry")))?;
				for point in mp.points() {
					self.write_geometry(&Geometry::Point(*point))?;
				}
				self.xml.write_event(Event::End(BytesEnd::new("MultiGeometry")))?;
			}
			Geometry::MultiLine(ml) => {
				self.xml.write_event(Event::Start(BytesStart::new("MultiGeometry")))?;
				for line in ml.lines() {
					self.write_geometry(&Geometry::Line(line.clone()))?;
				}
				self.xml.write_event(Event::End(BytesEnd::new("MultiGeometry")))?;
			}
			Geometry::MultiPolygons(mp) => {
				self.xml.write_event(Event::Start(BytesStart::new("MultiGeometry")))?;
				for polygon in mp.polygons() {
					self.write_polygon(polygon)?;
				}
				self.xml.write_event(Event::End(BytesEnd::new("MultiGeometry")))?;
			}
			Geometry::GeometryBag(bag) => {
				self.xml.write_event(Event::Start(BytesStart::new("MultiGeometry")))?;
				for child in bag.geometries() {
					self.write_geometry(child)?;
				}
				self.xml.write_event(Event::End(BytesEnd::new("MultiGeometry")))?;
			}
			Geometry::Model(model) => self.write_model(model)?,
		}
		Ok(())
	}

	fn write_polygon(&mut self, polygon: &Polygon) -> Result<()> {
		self.xml.write_event(Event::Start(BytesStart::new("Polygon")))?;
		self.write_attrs(&polygon.attrs, true)?;
		self.xml.write_event(Event::Start(BytesStart::new("outerBoundaryIs")))?;
		self.write_bare_ring(polygon.outer_ring())?;
		self.xml.write_event(Event::End(BytesEnd::new("outerBoundaryIs")))?;
		for inner in polygon.inner_rings() {
			self.xml.write_event(Event::Start(BytesStart::new("innerBoundaryIs")))?;
			self.write_bare_ring(inner)?;
			self.xml.write_event(Event::End(BytesEnd::new("innerBoundaryIs")))?;
		}
		self.xml.write_event(Event::End(BytesEnd::new("Polygon")))?;
		Ok(())
	}

	fn write_bare_ring(&mut self, ring: &LinearRing) -> Result<()> {
		self.xml.write_event(Event::Start(BytesStart::new("LinearRing")))?;
		self.simple_element("coordinates", &format_coordinates(ring.points()))?;
		self.xml.write_event(Event::End(BytesEnd::new("LinearRing")))?;
		Ok(())
	}

	fn write_model(&mut self, model: &Model) -> Result<()> {
		self.xml.write_event(Event::Start(BytesStart::new("Model")))?;
		if let Some(mode) = model.altitude_mode {
			self.simple_element("altitudeMode", mode.as_str())?;
		}
		if let Some(location) = &model.location {
			self.xml.write_event(Event::Start(BytesStart::new("Location")))?;
			self.simple_element("longitude", &location.lon().to_string())?;
			self.simple_element("latitude", &location.lat().to_string())?;
			if let Some(altitude) = location.elevation {
				self.simple_element("altitude", &altitude.to_string())?;
			}
			self.xml.write_event(Event::End(BytesEnd::new("Location")))?;
		}
		self.xml.write_event(Event::End(BytesEnd::new("Model")))?;
		Ok(())
	}

	fn write_attrs(&mut self, attrs: &GeometryAttrs, with_tessellate: bool) -> Result<()> {
		if attrs.extrude {
			self.bool_element("extrude", true)?;
		}
		if with_tessellate && attrs.tessellate {
			self.bool_element("tessellate", true)?;
		}
		if let Some(mode) = attrs.altitude_mode {
			self.simple_element("altitudeMode", mode.as_str())?;
		}
		Ok(())
	}

	// ---- network link control and foreign elements ------------------------------

	fn write_network_link_control(&mut self, nlc: &NetworkLinkControl) -> Result<()> {
		self
			.xml
			.write_event(Event::Start(BytesStart::new("NetworkLinkControl")))?;
		if let Some(v) = nlc.min_refresh_period {
			self.simple_element("minRefreshPeriod", &v.to_string())?;
		}
		if let Some(v) = nlc.max_session_length {
			self.simple_element("maxSessionLength", &v.to_string())?;
		}
		if let Some(v) = &nlc.cookie {
			self.simple_element("cookie", v)?;
		}
		if let Some(v) = &nlc.message {
			self.simple_element("message", v)?;
		}
		if let Some(v) = &nlc.link_name {
			self.simple_element("linkName", v)?;
		}
		if let Some(v) = &nlc.link_description {
			self.simple_element("linkDescription", v)?;
		}
		if let Some(v) = &nlc.link_snippet {
			self.simple_element("linkSnippet", v)?;
		}
		if let Some(v) = &nlc.expires {
			self.simple_element("expires", &format_timestamp(v))?;
		}
		if let Some(view) = &nlc.view_group {
			self.write_tagged_map(view)?;
		}
		self.xml.write_event(Event::End(BytesEnd::new("NetworkLinkControl")))?;
		Ok(())
	}

	fn write_foreign_element(&mut self, element: &Element) -> Result<()> {
		let name = element.qualified_name();
		let mut start = BytesStart::new(name.as_str());
		if let (Some(prefix), Some(namespace)) = (&element.prefix, &element.namespace) {
			// keep the element self-contained even when the root lacks the declaration
			if !self.namespaces.iter().any(|(p, _)| p == prefix) {
				start.push_attribute((format!("xmlns:{prefix}").as_str(), namespace.as_str()));
			}
		}
		for (key, value) in &element.attributes {
			start.push_attribute((key.as_str(), value.as_str()));
		}
		self.xml.write_event(Event::Start(start))?;
		if !element.text.is_empty() {
			self.xml.write_event(Event::Text(BytesText::new(&element.text)))?;
		}
		for child in &element.children {
			self.write_foreign_element(child)?;
		}
		self.xml.write_event(Event::End(BytesEnd::new(name.as_str())))?;
		Ok(())
	}
}

impl<W: Write> GisOutputStream for KmlWriter<W> {
	fn write(&mut self, obj: &GisObject) -> Result<()> {
		if self.closed {
			bail!("write on a closed KML output stream");
		}
		if let GisObject::DocumentStart(ds) = obj {
			self.namespaces = ds.namespaces.clone();
			return self.ensure_root();
		}
		self.ensure_root()?;
		match obj {
			GisObject::DocumentStart(_) => unreachable!(),
			GisObject::ContainerStart(cs) => self.write_container_start(cs)?,
			GisObject::ContainerEnd => self.write_container_end()?,
			GisObject::Feature(feature) => self.write_feature(feature)?,
			GisObject::Schema(schema) => self.write_schema(schema)?,
			GisObject::Style(style) => self.write_style(style)?,
			GisObject::StyleMap(style_map) => self.write_style_map(style_map)?,
			GisObject::NetworkLinkControl(nlc) => self.write_network_link_control(nlc)?,
			GisObject::Element(element) => self.write_foreign_element(element)?,
			GisObject::Comment(comment) => {
				self.xml.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?;
			}
			GisObject::Row(_) => debug!("rows have no KML representation, skipping"),
			GisObject::AtomHeader(_) => debug!("atom headers have no KML representation, skipping"),
		}
		Ok(())
	}

	fn close(&mut self) -> Result<()> {
		if self.closed {
			return Ok(());
		}
		self.closed = true;
		self.ensure_root()?;
		while !self.containers.is_empty() {
			debug!("closing unbalanced container at end of document");
			self.write_container_end()?;
		}
		self.xml.write_event(Event::End(BytesEnd::new("kml")))?;
		Ok(())
	}
}

fn format_tuple(point: &GeodeticPoint) -> String {
	match point.elevation {
		Some(elevation) => format!("{},{},{elevation}", point.lon(), point.lat()),
		None => format!("{},{}", point.lon(), point.lat()),
	}
}

fn format_coordinates(points: &[GeodeticPoint]) -> String {
	points.iter().map(format_tuple).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;
	use geostream_core::events::{DocumentStart, DocumentType};
	use geostream_geometry::Point;

	fn write_all(events: &[GisObject]) -> String {
		let mut writer = KmlWriter::new(Vec::new());
		for obj in events {
			writer.write(obj).unwrap();
		}
		String::from_utf8(writer.into_inner().unwrap()).unwrap()
	}

	#[test]
	fn empty_document() {
		let kml = write_all(&[GisObject::DocumentStart(DocumentStart::new(DocumentType::Kml))]);
		assert!(kml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
		assert!(kml.contains("<kml xmlns=\"http://www.opengis.net/kml/2.2\"></kml>"));
	}

	#[test]
	fn placemark_with_point() {
		let mut feature = Feature::placemark();
		feature.name = Some("A".to_string());
		feature.geometry = Some(Geometry::Point(Point::new(
			GeodeticPoint::new_3d(10.0, 20.0, 30.0).unwrap(),
		)));
		let kml = write_all(&[GisObject::from(feature)]);
		assert!(kml.contains("<Placemark><name>A</name><Point><coordinates>10,20,30</coordinates></Point></Placemark>"));
	}

	#[test]
	fn containers_are_balanced_on_close() {
		let mut cs = ContainerStart::new(ContainerType::Document);
		cs.name = Some("d".to_string());
		let kml = write_all(&[GisObject::ContainerStart(cs)]);
		assert!(kml.contains("<Document><name>d</name></Document>"));
	}

	#[test]
	fn unmatched_container_end_is_an_error() {
		let mut writer = KmlWriter::new(Vec::new());
		assert!(writer.write(&GisObject::ContainerEnd).is_err());
	}

	#[test]
	fn escaping() {
		let mut feature = Feature::placemark();
		feature.name = Some("a < b & c".to_string());
		let kml = write_all(&[GisObject::from(feature)]);
		assert!(kml.contains("<name>a &lt; b &amp; c</name>"));
	}
}
