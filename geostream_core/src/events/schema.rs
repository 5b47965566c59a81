//! Schemas: ordered, typed field sets identified by URI.

use std::fmt::{self, Debug};

/// The declared type of a [`SimpleField`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldType {
	#[default]
	String,
	Int,
	Short,
	Float,
	Double,
	Bool,
	Date,
	Oid,
	Geometry,
	Long,
}

impl FieldType {
	/// Parses a KML `SimpleField` `type` attribute. The legacy `wstring` maps to `String`;
	/// unknown names yield `None`.
	#[must_use]
	pub fn parse_kml(value: &str) -> Option<Self> {
		match value.trim().to_ascii_lowercase().as_str() {
			"string" | "wstring" => Some(FieldType::String),
			"int" | "uint" => Some(FieldType::Int),
			"short" | "ushort" => Some(FieldType::Short),
			"float" => Some(FieldType::Float),
			"double" => Some(FieldType::Double),
			"bool" => Some(FieldType::Bool),
			"long" => Some(FieldType::Long),
			_ => None,
		}
	}

	/// The KML lexical name of this type.
	#[must_use]
	pub fn kml_name(&self) -> &'static str {
		match self {
			FieldType::String | FieldType::Geometry | FieldType::Oid | FieldType::Date => "string",
			FieldType::Int => "int",
			FieldType::Short => "short",
			FieldType::Float => "float",
			FieldType::Double => "double",
			FieldType::Bool => "bool",
			FieldType::Long => "long",
		}
	}
}

/// One named, typed column of a schema.
#[derive(Clone, PartialEq, Eq)]
pub struct SimpleField {
	pub name: String,
	/// Display alias (`displayName` in KML).
	pub alias_name: Option<String>,
	pub field_type: FieldType,
	pub length: Option<u32>,
	pub precision: Option<u32>,
	/// Ordinal position within the owning schema, assigned on insertion.
	pub index: usize,
}

impl SimpleField {
	#[must_use]
	pub fn new(name: &str) -> Self {
		Self {
			name: name.to_string(),
			alias_name: None,
			field_type: FieldType::String,
			length: None,
			precision: None,
			index: 0,
		}
	}

	#[must_use]
	pub fn with_type(mut self, field_type: FieldType) -> Self {
		self.field_type = field_type;
		self
	}

	#[must_use]
	pub fn with_length(mut self, length: u32) -> Self {
		self.length = Some(length);
		self
	}

	#[must_use]
	pub fn with_precision(mut self, precision: u32) -> Self {
		self.precision = Some(precision);
		self
	}
}

impl Debug for SimpleField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{:?}", self.name, self.field_type)
	}
}

/// An ordered mapping of unique field names to [`SimpleField`]s, identified by a URI
/// (`urn:…` or `#localId`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
	uri: String,
	pub name: Option<String>,
	/// Old-style KML 2.0/2.1 parent element alias (usually `Placemark`).
	pub parent: Option<String>,
	fields: Vec<SimpleField>,
}

impl Schema {
	#[must_use]
	pub fn new(uri: &str) -> Self {
		Self {
			uri: uri.to_string(),
			name: None,
			parent: None,
			fields: Vec::new(),
		}
	}

	#[must_use]
	pub fn uri(&self) -> &str {
		&self.uri
	}

	/// The local id part of a `#localId` URI, or the full URI otherwise.
	#[must_use]
	pub fn local_id(&self) -> &str {
		self.uri.strip_prefix('#').unwrap_or(&self.uri)
	}

	/// Inserts a field, preserving insertion order. A field with an already-present name
	/// replaces the existing definition in place, keeping its ordinal.
	pub fn put(&mut self, mut field: SimpleField) {
		if let Some(existing) = self.fields.iter_mut().find(|f| f.name == field.name) {
			field.index = existing.index;
			*existing = field;
		} else {
			field.index = self.fields.len();
			self.fields.push(field);
		}
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&SimpleField> {
		self.fields.iter().find(|f| f.name == name)
	}

	/// Fields in insertion order.
	#[must_use]
	pub fn fields(&self) -> &[SimpleField] {
		&self.fields
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("string", Some(FieldType::String))]
	#[case("wstring", Some(FieldType::String))]
	#[case("INT", Some(FieldType::Int))]
	#[case("short", Some(FieldType::Short))]
	#[case("float", Some(FieldType::Float))]
	#[case("double", Some(FieldType::Double))]
	#[case("bool", Some(FieldType::Bool))]
	#[case("long", Some(FieldType::Long))]
	#[case("blob", None)]
	fn field_type_parsing(#[case] text: &str, #[case] expected: Option<FieldType>) {
		assert_eq!(FieldType::parse_kml(text), expected);
	}

	#[test]
	fn insertion_order_and_uniqueness() {
		let mut schema = Schema::new("#s1");
		schema.put(SimpleField::new("a"));
		schema.put(SimpleField::new("b").with_type(FieldType::Int));
		schema.put(SimpleField::new("c"));
		assert_eq!(
			schema.fields().iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
			vec!["a", "b", "c"]
		);
		assert_eq!(schema.get("b").unwrap().index, 1);

		// replacing keeps the original position
		schema.put(SimpleField::new("b").with_type(FieldType::Double));
		assert_eq!(schema.fields().len(), 3);
		assert_eq!(schema.get("b").unwrap().field_type, FieldType::Double);
		assert_eq!(schema.get("b").unwrap().index, 1);
	}

	#[test]
	fn local_id() {
		assert_eq!(Schema::new("#mySchema").local_id(), "mySchema");
		assert_eq!(Schema::new("urn:x:y").local_id(), "urn:x:y");
	}
}
