//! Styles, style maps and the KML color encoding.

use log::{debug, warn};
use std::fmt::{self, Debug};

/// An RGBA color. The KML wire encoding is 8 hex digits in `AABBGGRR` order.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Color {
	pub red: u8,
	pub green: u8,
	pub blue: u8,
	pub alpha: u8,
}

impl Color {
	pub const WHITE: Color = Color::new(255, 255, 255, 255);

	#[must_use]
	pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
		Self { red, green, blue, alpha }
	}

	/// Parses a KML color value. A leading `#` (HTML style, tolerated by Google Earth)
	/// is skipped; anything that is not 8 hex digits afterwards is invalid and logged.
	#[must_use]
	pub fn parse(value: &str) -> Option<Self> {
		let mut v = value.trim();
		if let Some(rest) = v.strip_prefix('#') {
			debug!("skip '#' in color code: {value}");
			v = rest;
		}
		if v.len() == 8
			&& let Ok(bits) = u32::from_str_radix(v, 16)
		{
			return Some(Self {
				alpha: (bits >> 24) as u8,
				blue: (bits >> 16) as u8,
				green: (bits >> 8) as u8,
				red: bits as u8,
			});
		}
		warn!("invalid color value: {value}");
		None
	}

	/// Formats the color in KML `aabbggrr` order.
	#[must_use]
	pub fn to_kml(&self) -> String {
		format!("{:02x}{:02x}{:02x}{:02x}", self.alpha, self.blue, self.green, self.red)
	}
}

impl Debug for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Color({})", self.to_kml())
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IconStyle {
	pub color: Option<Color>,
	pub scale: Option<f64>,
	pub heading: Option<f64>,
	/// `Icon/href`; an empty string records an `Icon` element without a reference.
	pub href: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineStyle {
	pub color: Option<Color>,
	pub width: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolyStyle {
	pub color: Option<Color>,
	pub fill: Option<bool>,
	pub outline: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelStyle {
	pub color: Option<Color>,
	pub scale: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BalloonStyle {
	pub bg_color: Option<Color>,
	pub text: Option<String>,
	pub text_color: Option<Color>,
	pub display_mode: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListStyle {
	pub bg_color: Option<Color>,
	pub item_type: Option<String>,
}

/// A set of sub-styles, shared via `styleUrl` or inlined in a feature.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Style {
	pub id: Option<String>,
	pub icon: Option<IconStyle>,
	pub line: Option<LineStyle>,
	pub poly: Option<PolyStyle>,
	pub label: Option<LabelStyle>,
	pub balloon: Option<BalloonStyle>,
	pub list: Option<ListStyle>,
}

impl Style {
	#[must_use]
	pub fn new(id: Option<String>) -> Self {
		Self {
			id,
			..Self::default()
		}
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.icon.is_none()
			&& self.line.is_none()
			&& self.poly.is_none()
			&& self.label.is_none()
			&& self.balloon.is_none()
			&& self.list.is_none()
	}
}

/// The state a style-map pair applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StyleKey {
	#[default]
	Normal,
	Highlight,
}

impl StyleKey {
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		match self {
			StyleKey::Normal => "normal",
			StyleKey::Highlight => "highlight",
		}
	}
}

/// One `Pair` of a style map: a key plus a style reference and/or an inline style.
#[derive(Clone, Debug, PartialEq)]
pub struct StylePair {
	pub key: StyleKey,
	pub style_url: Option<String>,
	pub style: Option<Style>,
}

/// A mapping of `normal`/`highlight` to style references or inline styles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleMap {
	pub id: Option<String>,
	pairs: Vec<StylePair>,
}

impl StyleMap {
	#[must_use]
	pub fn new(id: Option<String>) -> Self {
		Self { id, pairs: Vec::new() }
	}

	#[must_use]
	pub fn contains_key(&self, key: StyleKey) -> bool {
		self.pairs.iter().any(|p| p.key == key)
	}

	/// Adds a pair unless the key is already present (the first pair for a key wins,
	/// as in Google Earth).
	pub fn add(&mut self, pair: StylePair) {
		if self.contains_key(pair.key) {
			warn!("style map already has a {} pair, ignoring duplicate", pair.key.as_str());
			return;
		}
		self.pairs.push(pair);
	}

	#[must_use]
	pub fn get(&self, key: StyleKey) -> Option<&StylePair> {
		self.pairs.iter().find(|p| p.key == key)
	}

	#[must_use]
	pub fn pairs(&self) -> &[StylePair] {
		&self.pairs
	}
}

/// A style or style map, wherever either is allowed.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleSelector {
	Style(Style),
	StyleMap(StyleMap),
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("ff0000ff", Some(Color::new(255, 0, 0, 255)))] // opaque red
	#[case("7fff0000", Some(Color::new(0, 0, 255, 127)))] // translucent blue
	#[case("#ffffffff", Some(Color::WHITE))]
	#[case(" ff00ff00 ", Some(Color::new(0, 255, 0, 255)))]
	#[case("ffffff", None)]
	#[case("zzzzzzzz", None)]
	#[case("", None)]
	fn color_parsing(#[case] text: &str, #[case] expected: Option<Color>) {
		assert_eq!(Color::parse(text), expected);
	}

	#[test]
	fn color_round_trip() {
		let c = Color::new(0x11, 0x22, 0x33, 0x44);
		assert_eq!(c.to_kml(), "44332211");
		assert_eq!(Color::parse(&c.to_kml()), Some(c));
	}

	#[test]
	fn style_map_keeps_first_pair_per_key() {
		let mut sm = StyleMap::new(None);
		sm.add(StylePair {
			key: StyleKey::Normal,
			style_url: Some("#a".to_string()),
			style: None,
		});
		sm.add(StylePair {
			key: StyleKey::Normal,
			style_url: Some("#b".to_string()),
			style: None,
		});
		assert_eq!(sm.pairs().len(), 1);
		assert_eq!(sm.get(StyleKey::Normal).unwrap().style_url.as_deref(), Some("#a"));
	}
}
