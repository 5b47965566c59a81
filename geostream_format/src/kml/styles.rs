//! Style and StyleMap parsing.

use super::reader::{KmlReader, XmlNode, XmlStart, is_true};
use anyhow::{Result, bail};
use geostream_core::events::{
	BalloonStyle, Color, IconStyle, LabelStyle, LineStyle, ListStyle, PolyStyle, Style, StyleKey, StyleMap,
	StylePair,
};
use log::{debug, warn};
use std::io::BufRead;

impl<R: BufRead> KmlReader<R> {
	pub(crate) fn parse_style(&mut self, start: &XmlStart) -> Result<Style> {
		let mut style = Style::new(start.attr("id").map(str::to_string));
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(style),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => match child.local.as_str() {
					"IconStyle" => style.icon = Some(self.parse_icon_style(&child)?),
					"LineStyle" => style.line = Some(self.parse_line_style(&child)?),
					"PolyStyle" => style.poly = Some(self.parse_poly_style(&child)?),
					"LabelStyle" => style.label = Some(self.parse_label_style(&child)?),
					"BalloonStyle" => style.balloon = Some(self.parse_balloon_style(&child)?),
					"ListStyle" => style.list = Some(self.parse_list_style(&child)?),
					_ => self.skip_element()?,
				},
				XmlNode::Eof => bail!("document ended inside a style"),
				_ => {}
			}
		}
	}

	fn parse_icon_style(&mut self, start: &XmlStart) -> Result<IconStyle> {
		let mut icon = IconStyle::default();
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(icon),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => match child.local.as_str() {
					"scale" => icon.scale = self.parse_style_number("scale")?,
					"heading" => icon.heading = self.parse_style_number("heading")?,
					"color" => icon.color = self.parse_color_text()?,
					"Icon" => {
						// an Icon element without an href still records its presence
						icon.href = Some(self.parse_icon_href(&child)?.unwrap_or_default());
					}
					_ => self.skip_element()?,
				},
				XmlNode::Eof => bail!("document ended inside IconStyle"),
				_ => {}
			}
		}
	}

	fn parse_icon_href(&mut self, start: &XmlStart) -> Result<Option<String>> {
		let mut href = None;
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(href),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => {
					if child.local == "href" {
						href = self.non_empty_text()?;
					} else {
						self.skip_element()?;
					}
				}
				XmlNode::Eof => bail!("document ended inside Icon"),
				_ => {}
			}
		}
	}

	fn parse_line_style(&mut self, start: &XmlStart) -> Result<LineStyle> {
		let mut line = LineStyle::default();
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(line),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => match child.local.as_str() {
					"width" => line.width = self.parse_style_number("width")?,
					"color" => {
						// an invalid line color falls back to white
						line.color = Some(self.parse_color_text()?.unwrap_or(Color::WHITE));
					}
					_ => self.skip_element()?,
				},
				XmlNode::Eof => bail!("document ended inside LineStyle"),
				_ => {}
			}
		}
	}

	fn parse_poly_style(&mut self, start: &XmlStart) -> Result<PolyStyle> {
		let mut poly = PolyStyle::default();
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(poly),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => match child.local.as_str() {
					"fill" => poly.fill = Some(is_true(self.read_text()?.trim())),
					"outline" => poly.outline = Some(is_true(self.read_text()?.trim())),
					"color" => poly.color = self.parse_color_text()?,
					_ => self.skip_element()?,
				},
				XmlNode::Eof => bail!("document ended inside PolyStyle"),
				_ => {}
			}
		}
	}

	fn parse_label_style(&mut self, start: &XmlStart) -> Result<LabelStyle> {
		let mut label = LabelStyle::default();
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(label),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => match child.local.as_str() {
					"scale" => label.scale = self.parse_style_number("scale")?,
					"color" => label.color = self.parse_color_text()?,
					_ => self.skip_element()?,
				},
				XmlNode::Eof => bail!("document ended inside LabelStyle"),
				_ => {}
			}
		}
	}

	fn parse_balloon_style(&mut self, start: &XmlStart) -> Result<BalloonStyle> {
		let mut balloon = BalloonStyle::default();
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(balloon),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => match child.local.as_str() {
					// empty text is preserved so the balloon style is retained
					"text" => balloon.text = Some(self.read_text()?.trim().to_string()),
					"bgColor" => balloon.bg_color = self.parse_color_text()?,
					"textColor" => balloon.text_color = self.parse_color_text()?,
					"displayMode" => balloon.display_mode = self.non_empty_text()?,
					// deprecated alias for bgColor
					"color" => balloon.bg_color = self.parse_color_text()?,
					_ => self.skip_element()?,
				},
				XmlNode::Eof => bail!("document ended inside BalloonStyle"),
				_ => {}
			}
		}
	}

	fn parse_list_style(&mut self, start: &XmlStart) -> Result<ListStyle> {
		let mut list = ListStyle::default();
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(list),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => match child.local.as_str() {
					"listItemType" => list.item_type = self.non_empty_text()?,
					"bgColor" => list.bg_color = self.parse_color_text()?,
					_ => self.skip_element()?,
				},
				XmlNode::Eof => bail!("document ended inside ListStyle"),
				_ => {}
			}
		}
	}

	pub(crate) fn parse_style_map(&mut self, start: &XmlStart) -> Result<StyleMap> {
		let mut style_map = StyleMap::new(start.attr("id").map(str::to_string));
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => return Ok(style_map),
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => {
					if child.local == "Pair" {
						self.parse_style_map_pair(&mut style_map, &child)?;
					} else {
						self.skip_element()?;
					}
				}
				XmlNode::Eof => bail!("document ended inside a style map"),
				_ => {}
			}
		}
	}

	fn parse_style_map_pair(&mut self, style_map: &mut StyleMap, start: &XmlStart) -> Result<()> {
		let mut key = None;
		let mut style_url = None;
		let mut style = None;
		loop {
			match self.next_node()? {
				XmlNode::End { local } if local == start.local => break,
				XmlNode::End { .. } => {}
				XmlNode::Start(child) => match child.local.as_str() {
					"key" => key = self.non_empty_text()?,
					"styleUrl" => style_url = self.non_empty_text()?,
					"Style" => style = Some(self.parse_style(&child)?),
					"StyleMap" => {
						debug!("skip nested StyleMap");
						self.skip_element()?;
					}
					_ => self.skip_element()?,
				},
				XmlNode::Eof => bail!("document ended inside a style map pair"),
				_ => {}
			}
		}

		if key.is_none() && style_url.is_none() && style.is_none() {
			return Ok(());
		}
		let key = match key.as_deref() {
			None => StyleKey::Normal, // default
			Some(k) if k.eq_ignore_ascii_case("normal") => StyleKey::Normal,
			Some(k) if k.eq_ignore_ascii_case("highlight") => StyleKey::Highlight,
			Some(k) => {
				warn!("unknown StyleMap key: {k}");
				StyleKey::Normal
			}
		};
		style_map.add(StylePair { key, style_url, style });
		Ok(())
	}

	fn parse_style_number(&mut self, what: &str) -> Result<Option<f64>> {
		Ok(self.non_empty_text()?.and_then(|text| match text.parse::<f64>() {
			Ok(value) => Some(value),
			Err(_) => {
				warn!("invalid {what} value: {text}");
				None
			}
		}))
	}

	fn parse_color_text(&mut self) -> Result<Option<Color>> {
		Ok(self.non_empty_text()?.and_then(|text| Color::parse(&text)))
	}
}
