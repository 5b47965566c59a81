//! Per-format input stream options.

use crate::events::Schema;
use std::fmt::{self, Debug};

/// A predicate over parsed schemas. When it returns `false` the schema event is dropped
/// and features referencing that schema are skipped.
pub type SchemaAccepter = Box<dyn Fn(&Schema) -> bool>;

/// Options of the shapefile input stream.
#[derive(Default)]
pub struct ShapefileOptions {
	/// Fail instead of warn when the `.prj` datum is not `GCS_WGS_1984`.
	pub strict_prj_check: bool,
	pub schema_accepter: Option<SchemaAccepter>,
}

impl ShapefileOptions {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_strict_prj_check(mut self, strict: bool) -> Self {
		self.strict_prj_check = strict;
		self
	}

	#[must_use]
	pub fn with_schema_accepter(mut self, accepter: SchemaAccepter) -> Self {
		self.schema_accepter = Some(accepter);
		self
	}
}

impl Debug for ShapefileOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ShapefileOptions")
			.field("strict_prj_check", &self.strict_prj_check)
			.field("schema_accepter", &self.schema_accepter.is_some())
			.finish()
	}
}

/// Options of the KML input stream.
pub struct KmlOptions {
	/// Charset assumed for documents without an XML declaration. Only UTF-8 input is
	/// fully supported; a declared document encoding always wins.
	pub encoding: String,
	/// Reserved for a link-following wrapper; the core stream itself never fetches
	/// referenced documents.
	pub follow_network_links: bool,
	pub schema_accepter: Option<SchemaAccepter>,
}

impl Default for KmlOptions {
	fn default() -> Self {
		Self {
			encoding: "UTF-8".to_string(),
			follow_network_links: false,
			schema_accepter: None,
		}
	}
}

impl KmlOptions {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_encoding(mut self, encoding: &str) -> Self {
		self.encoding = encoding.to_string();
		self
	}

	#[must_use]
	pub fn with_follow_network_links(mut self, follow: bool) -> Self {
		self.follow_network_links = follow;
		self
	}

	#[must_use]
	pub fn with_schema_accepter(mut self, accepter: SchemaAccepter) -> Self {
		self.schema_accepter = Some(accepter);
		self
	}
}

impl Debug for KmlOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("KmlOptions")
			.field("encoding", &self.encoding)
			.field("follow_network_links", &self.follow_network_links)
			.field("schema_accepter", &self.schema_accepter.is_some())
			.finish()
	}
}

/// Options of the CSV input stream.
pub struct CsvOptions {
	/// A pre-supplied schema; when present the first line is data, not a header.
	pub schema: Option<Schema>,
	/// Record separator; autodetected (`\n` or `\r\n`) when `None`.
	pub line_delimiter: Option<String>,
	pub value_delimiter: char,
	pub quote: char,
}

impl Default for CsvOptions {
	fn default() -> Self {
		Self {
			schema: None,
			line_delimiter: None,
			value_delimiter: ',',
			quote: '"',
		}
	}
}

impl CsvOptions {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_schema(mut self, schema: Schema) -> Self {
		self.schema = Some(schema);
		self
	}

	#[must_use]
	pub fn with_value_delimiter(mut self, delimiter: char) -> Self {
		self.value_delimiter = delimiter;
		self
	}

	#[must_use]
	pub fn with_quote(mut self, quote: char) -> Self {
		self.quote = quote;
		self
	}
}

impl Debug for CsvOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CsvOptions")
			.field("schema", &self.schema.as_ref().map(Schema::uri))
			.field("line_delimiter", &self.line_delimiter)
			.field("value_delimiter", &self.value_delimiter)
			.field("quote", &self.quote)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let kml = KmlOptions::default();
		assert_eq!(kml.encoding, "UTF-8");
		assert!(!kml.follow_network_links);

		let shp = ShapefileOptions::default();
		assert!(!shp.strict_prj_check);

		let csv = CsvOptions::default();
		assert_eq!(csv.value_delimiter, ',');
		assert_eq!(csv.quote, '"');
		assert!(csv.line_delimiter.is_none());
	}

	#[test]
	fn builders() {
		let opts = ShapefileOptions::new()
			.with_strict_prj_check(true)
			.with_schema_accepter(Box::new(|s| s.uri().starts_with("urn:")));
		assert!(opts.strict_prj_check);
		assert!(opts.schema_accepter.is_some());
	}
}
