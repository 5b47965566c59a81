//! The streaming KML pull parser.

use super::{CONTAINER_TAGS, FEATURE_TAGS, GEOMETRY_TAGS, GOOGLE_KML_EXT_PREFIX, KNOWN_KML_NAMESPACES, W3_PREFIX};
use anyhow::{Context, Result, bail};
use geostream_core::events::{
	Color, ContainerStart, ContainerType, DocumentStart, DocumentType, Element, Feature, FeatureKind,
	FieldType, FieldValue, GisObject, LatLonBox, NetworkLinkControl, Schema, SimpleField, TaggedMap,
};
use geostream_core::options::KmlOptions;
use geostream_core::stream::{EventQueue, GisInputStream};
use geostream_core::utils::parse_timestamp;
use log::{debug, info, warn};
use quick_xml::events::Event;
use quick_xml::name::{QName, ResolveResult};
use quick_xml::reader::NsReader;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A start element with resolved namespace and decoded attributes.
#[derive(Clone, Debug)]
pub(crate) struct XmlStart {
	pub ns: Option<String>,
	pub local: String,
	pub prefix: Option<String>,
	pub attributes: Vec<(String, String)>,
}

impl XmlStart {
	pub fn attr(&self, name: &str) -> Option<&str> {
		self
			.attributes
			.iter()
			.find(|(k, _)| k == name)
			.map(|(_, v)| v.as_str())
	}
}

#[derive(Debug)]
pub(crate) enum XmlNode {
	Start(XmlStart),
	End { local: String },
	Text(String),
	Comment(String),
	Eof,
}

/// Reads a KML document as a stream of GIS events.
///
/// Inline styles and style maps are emitted before the feature or container that carries
/// them, in the order they will be referenced; `read` drains that look-ahead queue first.
pub struct KmlReader<R: BufRead> {
	xml: NsReader<R>,
	buf: Vec<u8>,
	pending_start: Option<XmlStart>,
	queue: EventQueue,
	schemata: Vec<Schema>,
	rejected_schemas: HashSet<String>,
	pub(crate) schema_aliases: HashMap<String, String>,
	kml_ns: HashSet<String>,
	options: KmlOptions,
	anon_schema_count: usize,
	root_seen: bool,
	closed: bool,
}

impl KmlReader<BufReader<File>> {
	/// Opens a KML file.
	///
	/// # Errors
	/// Returns an error if the file cannot be opened.
	pub fn from_path(path: &Path, options: KmlOptions) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
		Ok(Self::from_reader(BufReader::new(file), options))
	}
}

impl<'a> KmlReader<&'a [u8]> {
	/// Parses an in-memory KML document.
	#[must_use]
	pub fn from_bytes(bytes: &'a [u8], options: KmlOptions) -> Self {
		Self::from_reader(bytes, options)
	}
}

impl<R: BufRead> KmlReader<R> {
	#[must_use]
	pub fn from_reader(reader: R, options: KmlOptions) -> Self {
		let mut xml = NsReader::from_reader(reader);
		xml.config_mut().expand_empty_elements = true;
		// unbalanced tags must surface as fatal parse errors
		xml.config_mut().check_end_names = true;
		Self {
			xml,
			buf: Vec::new(),
			pending_start: None,
			queue: EventQueue::new(),
			schemata: Vec::new(),
			rejected_schemas: HashSet::new(),
			schema_aliases: HashMap::new(),
			kml_ns: KNOWN_KML_NAMESPACES.iter().map(|s| (*s).to_string()).collect(),
			options,
			anon_schema_count: 0,
			root_seen: false,
			closed: false,
		}
	}

	// ---- low level event access -------------------------------------------------

	fn resolve(&self, qname: QName) -> (Option<String>, String) {
		let (resolution, local) = self.xml.resolve_element(qname);
		let ns = match resolution {
			ResolveResult::Bound(namespace) => Some(String::from_utf8_lossy(namespace.as_ref()).into_owned()),
			_ => None,
		};
		(ns, String::from_utf8_lossy(local.as_ref()).into_owned())
	}

	pub(crate) fn next_node(&mut self) -> Result<XmlNode> {
		if let Some(start) = self.pending_start.take() {
			return Ok(XmlNode::Start(start));
		}
		loop {
			self.buf.clear();
			let event = self.xml.read_event_into(&mut self.buf)?.into_owned();
			return Ok(match event {
				Event::Start(e) => {
					let (ns, local) = self.resolve(e.name());
					let prefix = e
						.name()
						.prefix()
						.map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());
					let mut attributes = Vec::new();
					for attr in e.attributes().flatten() {
						let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
						let value = attr
							.unescape_value()
							.map_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned(), |v| v.into_owned());
						attributes.push((key, value));
					}
					XmlNode::Start(XmlStart {
						ns,
						local,
						prefix,
						attributes,
					})
				}
				Event::End(e) => {
					let (_, local) = self.resolve(e.name());
					XmlNode::End { local }
				}
				Event::Text(t) => XmlNode::Text(t.unescape()?.into_owned()),
				Event::CData(t) => XmlNode::Text(String::from_utf8_lossy(&t).into_owned()),
				Event::Comment(t) => XmlNode::Comment(String::from_utf8_lossy(&t).into_owned()),
				Event::Eof => XmlNode::Eof,
				Event::Decl(_) | Event::PI(_) | Event::DocType(_) => continue,
				Event::Empty(_) => continue, // expanded by configuration
			});
		}
	}

	pub(crate) fn push_node(&mut self, start: XmlStart) {
		debug_assert!(self.pending_start.is_none());
		self.pending_start = Some(start);
	}

	/// Collects all character data up to the end of the current element. Markup inside
	/// (e.g. `<name><b>x</b></name>`) is descended into and dropped.
	pub(crate) fn read_text(&mut self) -> Result<String> {
		let mut depth = 1u32;
		let mut text = String::new();
		loop {
			match self.next_node()? {
				XmlNode::Start(_) => depth += 1,
				XmlNode::End { .. } => {
					depth -= 1;
					if depth == 0 {
						return Ok(text);
					}
				}
				XmlNode::Text(t) => text.push_str(&t),
				XmlNode::Comment(_) => {}
				XmlNode::Eof => bail!("document ended inside an element"),
			}
		}
	}

	/// Trimmed element text, `None` when empty.
	pub(crate) fn non_empty_text(&mut self) -> Result<Option<String>> {
		let text = self.read_text()?;
		let trimmed = text.trim();
		Ok(if trimmed.is_empty() {
			None
		} else {
			Some(trimmed.to_string())
		})
	}

	/// Consumes the rest of the current element.
	pub(crate) fn skip_element(&mut self) -> Result<()> {
		let mut depth = 1u32;
		loop {
			match self.next_node()? {
				XmlNode::Start(_) => depth += 1,
				XmlNode::End { .. } => {
					depth -= 1;
					if depth == 0 {
						return Ok(());
					}
				}
				XmlNode::Eof => bail!("document ended inside an element"),
				_ => {}
			}
		}
	}

	pub(crate) fn is_kml_ns(&self, ns: Option<&str>) -> bool {
		// an empty namespace is old-style KML without a declaration
		match ns {
			Some(uri) if !uri.is_empty() => self.kml_ns.contains(uri),
			_ => true,
		}
	}

	fn is_foreign(&self, start: &XmlStart) -> bool {
		!self.is_kml_ns(start.ns.as_deref())
	}

	fn aliased(&self, local: &str) -> String {
		self
			.schema_aliases
			.get(local)
			.cloned()
			.unwrap_or_else(|| local.to_string())
	}

	// ---- document root ----------------------------------------------------------

	/// Advances to the first start element, registering an unrecognized KML-shaped root
	/// namespace, and queues the leading `DocumentStart`. Returns the root content
	/// element when the root is not `<kml>`.
	fn advance_to_root(&mut self) -> Result<Option<XmlStart>> {
		let mut ds = DocumentStart::new(DocumentType::Kml);
		let mut comments = Vec::new();
		let result = loop {
			match self.next_node()? {
				XmlNode::Comment(c) => comments.push(c),
				XmlNode::Text(_) => {}
				XmlNode::Eof => break None,
				XmlNode::End { .. } => break None,
				XmlNode::Start(start) => {
					for (key, value) in &start.attributes {
						if let Some(prefix) = key.strip_prefix("xmlns:") {
							ds.namespaces.push((prefix.to_string(), value.clone()));
						}
					}
					let ns_unregistered = start
						.ns
						.as_deref()
						.is_some_and(|ns| !ns.is_empty() && !self.kml_ns.contains(ns));
					if start.local == "kml" {
						if ns_unregistered {
							info!("registering unrecognized KML namespace: {}", start.ns.as_deref().unwrap());
							self.kml_ns.insert(start.ns.clone().unwrap());
						}
						break None; // children are handled by the main loop
					}
					if ns_unregistered
						&& (FEATURE_TAGS.contains(&start.local.as_str())
							|| CONTAINER_TAGS.contains(&start.local.as_str()))
					{
						info!("registering unrecognized KML namespace: {}", start.ns.as_deref().unwrap());
						self.kml_ns.insert(start.ns.clone().unwrap());
					}
					break Some(start);
				}
			}
		};
		self.queue.add_last(GisObject::DocumentStart(ds));
		for comment in comments {
			self.queue.add_last(GisObject::Comment(comment));
		}
		Ok(result)
	}

	// ---- element dispatch -------------------------------------------------------

	/// Handles one start element. `Ok(None)` means the element produced no event and
	/// parsing continues.
	fn dispatch_start(&mut self, start: XmlStart) -> Result<Option<GisObject>> {
		if self.is_foreign(&start) {
			debug!("handling {} as a foreign element", start.local);
			return Ok(Some(GisObject::Element(self.read_foreign_element(start)?)));
		}

		let element_name = self.aliased(&start.local);
		if FEATURE_TAGS.contains(&element_name.as_str()) {
			self.handle_feature(start, &element_name)
		} else if CONTAINER_TAGS.contains(&element_name.as_str()) {
			self.handle_container(start)
		} else if start.local == "Schema" {
			self.handle_schema(start)
		} else if start.local == "NetworkLinkControl" {
			Ok(Some(GisObject::NetworkLinkControl(self.handle_network_link_control()?)))
		} else if start.local == "Style" {
			debug!("out of order element: Style");
			Ok(Some(GisObject::Style(self.parse_style(&start)?)))
		} else if start.local == "StyleMap" {
			debug!("out of order element: StyleMap");
			Ok(Some(GisObject::StyleMap(self.parse_style_map(&start)?)))
		} else {
			// an unknown same-namespace wrapper: descend looking for known elements
			debug!("descending into unknown element {}", start.local);
			loop {
				match self.next_node()? {
					XmlNode::Start(inner) => return self.dispatch_start(inner),
					XmlNode::End { .. } => return Ok(None),
					XmlNode::Eof => return Ok(None),
					_ => {}
				}
			}
		}
	}

	// ---- containers -------------------------------------------------------------

	/// Parses the property prefix of a container. Scanning stops at the first feature,
	/// schema or nested container, which is pushed back for the main loop; an inline
	/// style encountered before that boundary is emitted ahead of the `ContainerStart`.
	fn handle_container(&mut self, start: XmlStart) -> Result<Option<GisObject>> {
		let container_type = if start.local == "Folder" {
			ContainerType::Folder
		} else {
			ContainerType::Document
		};
		let mut cs = ContainerStart::new(container_type);
		cs.id = start.attr("id").map(str::to_string);

		let mut early: Vec<GisObject> = Vec::new();
		let mut ended = false;
		loop {
			match self.next_node()? {
				XmlNode::End { .. } => {
					ended = true;
					break;
				}
				XmlNode::Start(child) => {
					let tag = self.aliased(&child.local);
					if !self.is_foreign(&child)
						&& (CONTAINER_TAGS.contains(&tag.as_str())
							|| FEATURE_TAGS.contains(&tag.as_str())
							|| tag == "Schema")
					{
						self.push_node(child);
						break;
					}
					if child.local == "open" && !self.is_foreign(&child) {
						if is_true(self.read_text()?.trim()) {
							cs.open = true;
						}
					} else if !self.handle_properties(&mut PropertyTarget::Container(&mut cs), &child, &mut early)? {
						debug!("ignore {}", child.local);
						self.skip_element()?;
					}
				}
				XmlNode::Comment(c) => early.push(GisObject::Comment(c)),
				XmlNode::Text(_) => {}
				XmlNode::Eof => bail!("document ended inside a container"),
			}
		}

		for obj in early {
			self.queue.add_last(obj);
		}
		self.queue.add_last(GisObject::ContainerStart(cs));
		if ended {
			self.queue.add_last(GisObject::ContainerEnd);
		}
		Ok(None)
	}

	// ---- features ---------------------------------------------------------------

	fn handle_feature(&mut self, start: XmlStart, type_name: &str) -> Result<Option<GisObject>> {
		let kind = match type_name {
			"NetworkLink" => FeatureKind::NetworkLink(Default::default()),
			"GroundOverlay" => FeatureKind::GroundOverlay {
				overlay: Default::default(),
				lat_lon_box: None,
				altitude: None,
				altitude_mode: None,
			},
			"ScreenOverlay" => FeatureKind::ScreenOverlay {
				overlay: Default::default(),
				rotation: None,
			},
			"PhotoOverlay" => FeatureKind::PhotoOverlay {
				overlay: Default::default(),
				rotation: None,
			},
			_ => FeatureKind::Placemark,
		};
		let mut feature = Feature::new(kind);
		feature.id = start.attr("id").map(str::to_string);

		let mut early: Vec<GisObject> = Vec::new();
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => break,
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => {
					let network_open = matches!(feature.kind, FeatureKind::NetworkLink(_))
						&& child.local == "open"
						&& !self.is_foreign(&child);
					if network_open {
						if is_true(self.read_text()?.trim())
							&& let FeatureKind::NetworkLink(data) = &mut feature.kind
						{
							data.open = true;
						}
					} else if self.handle_properties(&mut PropertyTarget::Feature(&mut feature), &child, &mut early)? {
						// common property, done
					} else if GEOMETRY_TAGS.contains(&child.local.as_str()) {
						match self.handle_geometry(&child) {
							Ok(Some(geometry)) => feature.geometry = Some(geometry),
							Ok(None) => {}
							Err(e) => warn!("failed geometry {}: {e:#}", child.local),
						}
					} else {
						self.handle_kind_specific(&mut feature, &child)?;
					}
				}
				XmlNode::Text(_) | XmlNode::Comment(_) => {}
				XmlNode::Eof => bail!("document ended inside a feature"),
			}
		}

		for obj in early {
			self.queue.add_last(obj);
		}
		let rejected = feature
			.schema_uri
			.as_deref()
			.is_some_and(|uri| self.rejected_schemas.contains(uri));
		if rejected {
			debug!("skipping feature of rejected schema");
		} else {
			self.queue.add_last(GisObject::from(feature));
		}
		Ok(None)
	}

	fn handle_kind_specific(&mut self, feature: &mut Feature, child: &XmlStart) -> Result<()> {
		match &mut feature.kind {
			FeatureKind::NetworkLink(data) => match child.local.as_str() {
				"refreshVisibility" => data.refresh_visibility = is_true(self.read_text()?.trim()),
				"flyToView" => data.fly_to_view = is_true(self.read_text()?.trim()),
				"Link" | "Url" => data.link = self.handle_tagged_data(child)?,
				_ => {
					debug!("ignore {}", child.local);
					self.skip_element()?;
				}
			},
			FeatureKind::GroundOverlay {
				overlay,
				lat_lon_box,
				altitude,
				altitude_mode,
			} => match child.local.as_str() {
				"color" => overlay.color = self.non_empty_text()?.and_then(|t| Color::parse(&t)),
				"drawOrder" => overlay.draw_order = self.parse_number_text::<i32>("drawOrder")?,
				"Icon" => overlay.icon = self.handle_tagged_data(child)?,
				"LatLonBox" => *lat_lon_box = Some(self.handle_lat_lon_box()?),
				"altitude" => *altitude = self.parse_number_text::<f64>("altitude")?,
				"altitudeMode" => *altitude_mode = self.non_empty_text()?,
				_ => {
					debug!("ignore {}", child.local);
					self.skip_element()?;
				}
			},
			FeatureKind::ScreenOverlay { overlay, rotation }
			| FeatureKind::PhotoOverlay { overlay, rotation } => match child.local.as_str() {
				"color" => overlay.color = self.non_empty_text()?.and_then(|t| Color::parse(&t)),
				"drawOrder" => overlay.draw_order = self.parse_number_text::<i32>("drawOrder")?,
				"Icon" => overlay.icon = self.handle_tagged_data(child)?,
				"rotation" => {
					if let Some(value) = self.parse_number_text::<f64>("rotation")? {
						if value.abs() <= 180.0 {
							*rotation = Some(value);
						} else {
							warn!("invalid overlay rotation value {value}");
						}
					}
				}
				_ => {
					debug!("ignore {}", child.local);
					self.skip_element()?;
				}
			},
			FeatureKind::Placemark => {
				debug!("ignore {}", child.local);
				self.skip_element()?;
			}
		}
		Ok(())
	}

	fn parse_number_text<T: std::str::FromStr>(&mut self, what: &str) -> Result<Option<T>> {
		Ok(self.non_empty_text()?.and_then(|text| match text.parse::<T>() {
			Ok(value) => Some(value),
			Err(_) => {
				warn!("invalid {what} value: {text}");
				None
			}
		}))
	}

	fn handle_lat_lon_box(&mut self) -> Result<LatLonBox> {
		let mut lat_lon_box = LatLonBox::default();
		loop {
			match self.next_node()? {
				XmlNode::End { .. } => return Ok(lat_lon_box),
				XmlNode::Start(child) => {
					let Some(text) = self.non_empty_text()? else {
						continue;
					};
					let Ok(angle) = text.parse::<f64>() else {
						warn!("invalid ground overlay angle {text} in {}", child.local);
						continue;
					};
					match child.local.as_str() {
						"north" => lat_lon_box.north = Some(angle),
						"south" => lat_lon_box.south = Some(angle),
						"east" => lat_lon_box.east = Some(angle),
						"west" => {
							// values below -180 come from a Google Earth dateline bug
							let angle = if angle < -180.0 {
								debug!("normalized ground overlay west value");
								angle + 360.0
							} else {
								angle
							};
							lat_lon_box.west = Some(angle);
						}
						"rotation" => lat_lon_box.rotation = Some(angle),
						_ => {}
					}
				}
				XmlNode::Eof => bail!("document ended inside LatLonBox"),
				_ => {}
			}
		}
	}

	// ---- shared feature properties ----------------------------------------------

	/// Handles the elements common to all features and containers. Returns `false`
	/// when the element is not a shared property (and has not been consumed).
	fn handle_properties(
		&mut self,
		target: &mut PropertyTarget<'_>,
		child: &XmlStart,
		early: &mut Vec<GisObject>,
	) -> Result<bool> {
		if self.is_foreign(child) {
			// atom:link, atom:author, xal:AddressDetails and gx extensions are kept as
			// foreign elements; anything else is dropped
			let ns = child.ns.as_deref().unwrap_or("");
			if child.local == "AddressDetails" || ns.starts_with(W3_PREFIX) || ns.starts_with(GOOGLE_KML_EXT_PREFIX)
			{
				let element = self.read_foreign_element(child.clone())?;
				match target {
					PropertyTarget::Feature(feature) => feature.elements.push(element),
					PropertyTarget::Container(_) => debug!("dropping foreign element on container"),
				}
			} else {
				debug!("skip unknown namespace {}", child.local);
				self.skip_element()?;
			}
			return Ok(true);
		}

		match child.local.as_str() {
			"name" => {
				let text = self.read_text()?;
				let trimmed = text.trim();
				match target {
					PropertyTarget::Feature(f) => f.name = Some(trimmed.to_string()),
					PropertyTarget::Container(c) => c.name = Some(trimmed.to_string()),
				}
			}
			"description" => {
				let text = self.read_text()?;
				match target {
					PropertyTarget::Feature(f) => f.description = Some(text.trim().to_string()),
					PropertyTarget::Container(c) => c.description = Some(text.trim().to_string()),
				}
			}
			"visibility" => {
				if is_true(self.read_text()?.trim()) {
					match target {
						PropertyTarget::Feature(f) => f.visibility = Some(true),
						PropertyTarget::Container(c) => c.visibility = Some(true),
					}
				}
			}
			"Snippet" | "snippet" => {
				let text = self.read_text()?;
				match target {
					PropertyTarget::Feature(f) => f.snippet = Some(text.trim().to_string()),
					PropertyTarget::Container(c) => c.snippet = Some(text.trim().to_string()),
				}
			}
			"styleUrl" => {
				let url = self.non_empty_text()?;
				match target {
					PropertyTarget::Feature(f) => f.style_url = url,
					PropertyTarget::Container(_) => debug!("dropping styleUrl on container"),
				}
			}
			"Style" => {
				let style = self.parse_style(child)?;
				early.push(GisObject::Style(style));
			}
			"StyleMap" => {
				let style_map = self.parse_style_map(child)?;
				early.push(GisObject::StyleMap(style_map));
			}
			"TimeStamp" | "TimeSpan" => {
				self.handle_time_primitive(target)?;
			}
			"Region" => {
				let region = self.handle_region(child)?;
				match target {
					PropertyTarget::Feature(f) => f.region = region,
					PropertyTarget::Container(_) => debug!("dropping Region on container"),
				}
			}
			"LookAt" | "Camera" => {
				let view = self.handle_tagged_data(child)?;
				match target {
					PropertyTarget::Feature(f) => f.view_group = view,
					PropertyTarget::Container(_) => debug!("dropping view on container"),
				}
			}
			"ExtendedData" => match target {
				PropertyTarget::Feature(f) => self.handle_extended_data(f, child)?,
				PropertyTarget::Container(_) => {
					debug!("dropping ExtendedData on container");
					self.skip_element()?;
				}
			},
			// consumed but discarded
			"open" | "address" | "phoneNumber" | "Metadata" => self.skip_element()?,
			_ => return Ok(false),
		}
		Ok(true)
	}

	fn handle_time_primitive(&mut self, target: &mut PropertyTarget<'_>) -> Result<()> {
		loop {
			match self.next_node()? {
				XmlNode::End { .. } => return Ok(()),
				XmlNode::Start(child) => {
					let slot = match child.local.as_str() {
						"when" => TimeSlot::Both,
						"begin" => TimeSlot::Start,
						"end" => TimeSlot::End,
						_ => {
							self.skip_element()?;
							continue;
						}
					};
					let Some(text) = self.non_empty_text()? else {
						continue;
					};
					match parse_timestamp(&text) {
						Ok(time) => {
							if let PropertyTarget::Feature(feature) = target {
								match slot {
									TimeSlot::Both => {
										feature.start_time = Some(time);
										feature.end_time = Some(time);
									}
									TimeSlot::Start => feature.start_time = Some(time),
									TimeSlot::End => feature.end_time = Some(time),
								}
							}
						}
						Err(e) => warn!("ignoring bad time {text}: {e}"),
					}
				}
				XmlNode::Eof => bail!("document ended inside a time primitive"),
				_ => {}
			}
		}
	}

	fn handle_region(&mut self, start: &XmlStart) -> Result<Option<TaggedMap>> {
		let mut region = TaggedMap::new("Region");
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => break,
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => match child.local.as_str() {
					"LatLonAltBox" | "Lod" => self.handle_tagged_data_into(&child, &mut region)?,
					_ => self.skip_element()?,
				},
				XmlNode::Eof => bail!("document ended inside a region"),
				_ => {}
			}
		}
		Ok(if region.is_empty() { None } else { Some(region) })
	}

	// ---- tagged name/value groups -----------------------------------------------

	pub(crate) fn handle_tagged_data(&mut self, start: &XmlStart) -> Result<Option<TaggedMap>> {
		let mut map = TaggedMap::new(&start.local);
		self.handle_tagged_data_into(start, &mut map)?;
		Ok(if map.is_empty() { None } else { Some(map) })
	}

	fn handle_tagged_data_into(&mut self, start: &XmlStart, map: &mut TaggedMap) -> Result<()> {
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(()),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => {
					if child.ns != start.ns {
						if child.ns.as_deref().is_some_and(|ns| ns.starts_with(GOOGLE_KML_EXT_PREFIX)) {
							let element = self.read_foreign_element(child)?;
							if !flatten_extension(map, &element, None) {
								debug!("no usable values in extension element");
							}
						} else {
							debug!("skip {}", child.local);
							self.skip_element()?;
						}
						continue;
					}
					// empty elements are ignored, except viewFormat which may be blank
					let value = if child.local == "viewFormat" {
						Some(self.read_text()?.trim().to_string())
					} else {
						self.non_empty_text()?
					};
					if let Some(value) = value {
						map.put(&child.local, value);
					}
				}
				XmlNode::Eof => bail!("document ended inside {}", start.local),
				_ => {}
			}
		}
	}

	// ---- extended data ----------------------------------------------------------

	fn handle_extended_data(&mut self, feature: &mut Feature, start: &XmlStart) -> Result<()> {
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(()),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => {
					if child.ns != start.ns {
						// opaque external-namespace extended data is not supported
						debug!("skip {}", child.local);
						self.skip_element()?;
					} else if child.local == "Data" {
						match child.attr("name").map(str::to_string) {
							Some(name) => {
								if let Some(value) = self.parse_data_value(&child)? {
									feature.fields.put(SimpleField::new(&name), FieldValue::String(value));
								}
							}
							None => {
								debug!("no name attribute for Data, skip element");
								self.skip_element()?;
							}
						}
					} else if child.local == "SchemaData" {
						match child.attr("schemaUrl").map(str::to_string) {
							Some(url) => {
								self.handle_schema_data(&url, feature, &child)?;
								// the last SchemaData reference wins
								feature.schema_uri = Some(url);
							}
							None => {
								debug!("no schemaUrl attribute for SchemaData, skip element");
								self.skip_element()?;
							}
						}
					} else {
						debug!("ignore {}", child.local);
						self.skip_element()?;
					}
				}
				XmlNode::Eof => bail!("document ended inside ExtendedData"),
				_ => {}
			}
		}
	}

	fn parse_data_value(&mut self, start: &XmlStart) -> Result<Option<String>> {
		let mut value = None;
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(value),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => {
					if child.local == "value" {
						value = Some(self.read_text()?);
					} else {
						self.skip_element()?;
					}
				}
				XmlNode::Eof => bail!("document ended inside Data"),
				_ => {}
			}
		}
	}

	fn handle_schema_data(&mut self, url: &str, feature: &mut Feature, start: &XmlStart) -> Result<()> {
		let local_id = url.strip_prefix('#').unwrap_or(url);
		let schema = self.schemata.iter().find(|s| s.local_id() == local_id).cloned();
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(()),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => {
					if child.local == "SimpleData" {
						let name = child.attr("name").map(str::to_string);
						let text = self.read_text()?;
						if let Some(name) = name {
							let field = schema
								.as_ref()
								.and_then(|s| s.get(&name))
								.cloned()
								.unwrap_or_else(|| SimpleField::new(&name));
							let value = FieldValue::parse_typed(field.field_type, &text);
							feature.fields.put(field, value);
						}
					} else {
						self.skip_element()?;
					}
				}
				XmlNode::Eof => bail!("document ended inside SchemaData"),
				_ => {}
			}
		}
	}

	// ---- schemas ----------------------------------------------------------------

	fn handle_schema(&mut self, start: XmlStart) -> Result<Option<GisObject>> {
		let mut name = non_empty_attr(&start, "name");
		let mut parent = non_empty_attr(&start, "parent");
		let uri = match start.attr("id") {
			Some(id) => format!("#{id}"),
			None => {
				self.anon_schema_count += 1;
				format!("urn:geostream:schema:anon-{}", self.anon_schema_count)
			}
		};
		let mut schema = Schema::new(&uri);

		let mut generated = 0;
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => break,
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => {
					if child.local == "SimpleField" {
						let field_name = child.attr("name").map_or_else(
							|| {
								generated += 1;
								format!("gen{}", generated - 1)
							},
							str::to_string,
						);
						let declared = child.attr("type").map(str::to_string);
						let field_type = match declared.as_deref() {
							Some(t) => match FieldType::parse_kml(t) {
								Some(ft) => ft,
								None => {
									warn!("invalid schema field {field_name}: unknown type {t}");
									self.skip_element()?;
									continue;
								}
							},
							None => FieldType::String,
						};
						let mut field = SimpleField::new(&field_name).with_type(field_type);
						field.alias_name = self.parse_display_name(&child)?;
						schema.put(field);
					} else if child.local == "parent" {
						// KML 2.0/2.1 puts parent as a child element
						if let Some(value) = self.non_empty_text()? {
							parent = Some(value);
						}
					} else if child.local == "name" {
						if let Some(value) = self.non_empty_text()? {
							name = Some(value);
						}
					} else {
						self.skip_element()?;
					}
				}
				XmlNode::Eof => bail!("document ended inside a schema"),
				_ => {}
			}
		}

		schema.name = name.clone();
		if let Some(parent) = parent {
			schema.parent = Some(parent.clone());
			if let Some(alias) = name {
				// old-style alias of a user element name to a standard feature
				self.schema_aliases.insert(alias, parent);
			}
		}

		self.schemata.push(schema.clone());
		if let Some(accept) = &self.options.schema_accepter
			&& !accept(&schema)
		{
			debug!("schema {} rejected", schema.uri());
			self.rejected_schemas.insert(schema.uri().to_string());
			return Ok(None);
		}
		Ok(Some(GisObject::Schema(schema)))
	}

	fn parse_display_name(&mut self, start: &XmlStart) -> Result<Option<String>> {
		let mut display_name = None;
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(display_name),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => {
					if child.local == "displayName" {
						display_name = self.non_empty_text()?;
					} else {
						self.skip_element()?;
					}
				}
				XmlNode::Eof => bail!("document ended inside SimpleField"),
				_ => {}
			}
		}
	}

	// ---- network link control ---------------------------------------------------

	fn handle_network_link_control(&mut self) -> Result<NetworkLinkControl> {
		let mut nlc = NetworkLinkControl::new();
		let mut in_update = false;
		let mut depth = 1u32;
		loop {
			match self.next_node()? {
				XmlNode::End { local } => {
					depth -= 1;
					if depth == 0 {
						return Ok(nlc);
					}
					if local == "Update" {
						in_update = false;
					}
				}
				XmlNode::Start(child) => {
					if in_update {
						match child.local.as_str() {
							"targetHref" => {
								nlc.target_href = self.non_empty_text()?;
								continue;
							}
							"Create" | "Delete" | "Change" => {
								nlc.update_type = Some(child.local.clone());
								// the update body itself is not modeled
								self.skip_element()?;
								continue;
							}
							_ => {
								depth += 1;
								continue;
							}
						}
					}
					match child.local.as_str() {
						"minRefreshPeriod" => nlc.min_refresh_period = self.parse_number_text("minRefreshPeriod")?,
						"maxSessionLength" => nlc.max_session_length = self.parse_number_text("maxSessionLength")?,
						"cookie" => nlc.cookie = self.non_empty_text()?,
						"message" => nlc.message = self.non_empty_text()?,
						"linkName" => nlc.link_name = self.non_empty_text()?,
						"linkDescription" => nlc.link_description = self.non_empty_text()?,
						"linkSnippet" => nlc.link_snippet = self.non_empty_text()?,
						"expires" => {
							if let Some(text) = self.non_empty_text()? {
								match parse_timestamp(&text) {
									Ok(time) => nlc.expires = Some(time),
									Err(e) => warn!("ignoring bad expires value {text}: {e}"),
								}
							}
						}
						"LookAt" | "Camera" => nlc.view_group = self.handle_tagged_data(&child)?,
						"Update" => {
							in_update = true;
							depth += 1;
						}
						_ => self.skip_element()?,
					}
				}
				XmlNode::Eof => bail!("document ended inside NetworkLinkControl"),
				_ => {}
			}
		}
	}

	// ---- foreign elements -------------------------------------------------------

	/// Reads an entire foreign-namespace subtree into an [`Element`].
	pub(crate) fn read_foreign_element(&mut self, start: XmlStart) -> Result<Element> {
		let mut element = Element {
			namespace: start.ns.clone(),
			prefix: start.prefix.clone(),
			name: start.local.clone(),
			attributes: start
				.attributes
				.iter()
				.filter(|(k, _)| !k.starts_with("xmlns"))
				.cloned()
				.collect(),
			text: String::new(),
			children: Vec::new(),
		};
		loop {
			match self.next_node()? {
				XmlNode::End { .. } => {
					element.text = element.text.trim().to_string();
					return Ok(element);
				}
				XmlNode::Start(child) => element.children.push(self.read_foreign_element(child)?),
				XmlNode::Text(t) => element.text.push_str(&t),
				XmlNode::Comment(_) => {}
				XmlNode::Eof => bail!("document ended inside a foreign element"),
			}
		}
	}
}

/// Where shared feature properties land.
pub(crate) enum PropertyTarget<'a> {
	Feature(&'a mut Feature),
	Container(&'a mut ContainerStart),
}

enum TimeSlot {
	Both,
	Start,
	End,
}

/// xsd:boolean: `1` or `true`.
pub(crate) fn is_true(value: &str) -> bool {
	value == "1" || value.eq_ignore_ascii_case("true")
}

fn non_empty_attr(start: &XmlStart, name: &str) -> Option<String> {
	start
		.attr(name)
		.map(str::trim)
		.filter(|v| !v.is_empty())
		.map(str::to_string)
}

/// Flattens a gx extension subtree into a tagged map, prefixing keys with `gx:` and
/// joining nested element names with `/`. `gx:altitudeMode` is stored under the plain
/// `altitudeMode` key; when both forms appear the KML one wins.
fn flatten_extension(map: &mut TaggedMap, element: &Element, name_prefix: Option<&str>) -> bool {
	let prefix = if element
		.namespace
		.as_deref()
		.is_some_and(|ns| ns.starts_with(GOOGLE_KML_EXT_PREFIX))
	{
		"gx"
	} else {
		element.prefix.as_deref().unwrap_or("")
	};

	if !element.children.is_empty() {
		let elt_name = if prefix.is_empty() {
			element.name.clone()
		} else {
			format!("{prefix}:{}", element.name)
		};
		let joined = match name_prefix {
			Some(p) => format!("{p}/{elt_name}"),
			None => elt_name,
		};
		let mut found = false;
		for child in &element.children {
			if flatten_extension(map, child, Some(&joined)) {
				found = true;
			}
		}
		return found;
	}

	if element.text.is_empty() {
		return false;
	}

	let mut elt_name = element.name.clone();
	if !prefix.is_empty() {
		if elt_name == "altitudeMode" {
			if map.contains_key("altitudeMode") {
				debug!("element has duplicate altitudeMode defined");
				return true;
			}
		} else {
			elt_name = format!("{prefix}:{elt_name}");
		}
	}
	let key = match name_prefix {
		Some(p) => format!("{p}/{elt_name}"),
		None => elt_name,
	};
	map.put(&key, element.text.clone());
	true
}

impl<R: BufRead> GisInputStream for KmlReader<R> {
	fn queue(&mut self) -> &mut EventQueue {
		&mut self.queue
	}

	fn read_next(&mut self) -> Result<Option<GisObject>> {
		if self.closed {
			return Ok(None);
		}
		if !self.root_seen {
			self.root_seen = true;
			let pending_root = self.advance_to_root()?;
			if let Some(start) = pending_root
				&& let Some(obj) = self.dispatch_start(start)?
			{
				self.queue.add_last(obj);
			}
			if let Some(saved) = self.queue.read_saved() {
				return Ok(Some(saved));
			}
		}
		loop {
			match self.next_node()? {
				XmlNode::Start(start) => {
					// feature and container handlers fill the queue instead of
					// returning; everything else comes back directly
					if let Some(obj) = self.dispatch_start(start)? {
						return Ok(Some(obj));
					}
					if let Some(saved) = self.queue.read_saved() {
						return Ok(Some(saved));
					}
				}
				XmlNode::End { local } => {
					if CONTAINER_TAGS.contains(&local.as_str()) {
						return Ok(Some(GisObject::ContainerEnd));
					}
				}
				XmlNode::Comment(comment) => return Ok(Some(GisObject::Comment(comment))),
				XmlNode::Text(_) => {}
				XmlNode::Eof => return Ok(None),
			}
		}
	}

	fn close(&mut self) {
		self.closed = true;
		self.queue.clear();
	}

	fn enumerate_schemas(&self) -> Vec<&Schema> {
		self.schemata.iter().collect()
	}
}
