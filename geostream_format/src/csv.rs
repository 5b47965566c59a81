//! The CSV input stream: an optional header row becomes a schema, every record a row.

use anyhow::Result;
use geostream_core::events::{FieldValue, GisObject, Row, Schema, SimpleField};
use geostream_core::options::CsvOptions;
use geostream_core::stream::{EventQueue, GisInputStream};
use geostream_core::utils::read_csv_records;
use std::io::Read;

const DERIVED_SCHEMA_URI: &str = "#csvschema";

/// Reads delimited text as a schema followed by rows.
///
/// Without a supplied schema the first record is taken as the header and a schema of
/// string fields is derived from it; with one, every record is data. Field values are
/// always the raw token strings, whatever type the schema declares. Records shorter
/// than the schema leave the trailing fields absent; extra values are dropped.
pub struct CsvReader<'a> {
	records: Box<dyn Iterator<Item = Result<Vec<String>>> + 'a>,
	schema: Option<Schema>,
	queue: EventQueue,
	closed: bool,
}

impl<'a> CsvReader<'a> {
	#[must_use]
	pub fn new(reader: impl Read + Send + 'a, options: CsvOptions) -> Self {
		let eol = options
			.line_delimiter
			.as_ref()
			.and_then(|d| d.as_bytes().first().copied());
		let records = Box::new(read_csv_records(
			reader,
			options.value_delimiter as u8,
			options.quote as u8,
			eol,
		));
		let mut queue = EventQueue::new();
		if let Some(schema) = &options.schema {
			queue.add_last(GisObject::Schema(schema.clone()));
		}
		Self {
			records,
			schema: options.schema,
			queue,
			closed: false,
		}
	}

}

fn row_from(schema: &Schema, fields: Vec<String>) -> Row {
	let mut row = Row::new();
	row.schema_uri = Some(schema.uri().to_string());
	let mut values = fields.into_iter();
	for field in schema.fields() {
		let Some(value) = values.next() else {
			break;
		};
		// values stay raw strings, the declared field type is metadata for the consumer
		row.fields.put(field.clone(), FieldValue::String(value));
	}
	row
}

impl<'a> GisInputStream for CsvReader<'a> {
	fn queue(&mut self) -> &mut EventQueue {
		&mut self.queue
	}

	fn read_next(&mut self) -> Result<Option<GisObject>> {
		if self.closed {
			return Ok(None);
		}
		let Some(record) = self.records.next() else {
			return Ok(None);
		};
		let fields = record?;
		match &self.schema {
			None => {
				// first record is the header
				let mut schema = Schema::new(DERIVED_SCHEMA_URI);
				for header in &fields {
					schema.put(SimpleField::new(header));
				}
				self.schema = Some(schema.clone());
				Ok(Some(GisObject::Schema(schema)))
			}
			Some(schema) => Ok(Some(GisObject::Row(row_from(schema, fields)))),
		}
	}

	fn close(&mut self) {
		self.closed = true;
		self.queue.clear();
	}

	fn enumerate_schemas(&self) -> Vec<&Schema> {
		self.schema.iter().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use geostream_core::events::FieldType;
	use std::io::Cursor;

	fn read_all(reader: &mut CsvReader<'_>) -> Vec<GisObject> {
		let mut events = Vec::new();
		while let Some(obj) = reader.read().unwrap() {
			events.push(obj);
		}
		events
	}

	#[test]
	fn header_becomes_schema() {
		let data = "name,age\nJane,29\nJohn,30";
		let mut reader = CsvReader::new(Cursor::new(data.as_bytes().to_vec()), CsvOptions::default());
		let events = read_all(&mut reader);
		assert_eq!(events.len(), 3);
		let GisObject::Schema(schema) = &events[0] else {
			panic!("expected schema first")
		};
		assert_eq!(schema.uri(), "#csvschema");
		assert_eq!(schema.fields().len(), 2);
		let GisObject::Row(row) = &events[1] else {
			panic!("expected row")
		};
		assert_eq!(row.schema_uri.as_deref(), Some("#csvschema"));
		assert_eq!(row.fields.get("name"), Some(&FieldValue::String("Jane".to_string())));
	}

	#[test]
	fn supplied_schema_rows_keep_raw_strings() {
		let mut schema = Schema::new("#people");
		schema.put(SimpleField::new("name"));
		schema.put(SimpleField::new("age").with_type(FieldType::Int));
		let options = CsvOptions::new().with_schema(schema);

		let data = "Jane,29\nJohn,30";
		let mut reader = CsvReader::new(Cursor::new(data.as_bytes().to_vec()), options);
		let events = read_all(&mut reader);
		assert_eq!(events.len(), 3); // schema + two rows
		assert!(matches!(&events[0], GisObject::Schema(s) if s.uri() == "#people"));
		let GisObject::Row(row) = &events[1] else {
			panic!("expected row")
		};
		// the declared Int type does not convert the value
		assert_eq!(row.fields.get("age"), Some(&FieldValue::String("29".to_string())));
	}

	#[test]
	fn quoted_values_and_short_records() {
		let data = "a,b,c\n\"x,y\",2\n";
		let mut reader = CsvReader::new(Cursor::new(data.as_bytes().to_vec()), CsvOptions::default());
		let events = read_all(&mut reader);
		let GisObject::Row(row) = &events[1] else {
			panic!("expected row")
		};
		assert_eq!(row.fields.get("a"), Some(&FieldValue::String("x,y".to_string())));
		assert_eq!(row.fields.get("b"), Some(&FieldValue::String("2".to_string())));
		assert_eq!(row.fields.get("c"), None);
	}

	#[test]
	fn custom_value_delimiter() {
		let data = "a|b\n1|2";
		let options = CsvOptions::new().with_value_delimiter('|');
		let mut reader = CsvReader::new(Cursor::new(data.as_bytes().to_vec()), options);
		let events = read_all(&mut reader);
		assert_eq!(events.len(), 2);
		let GisObject::Row(row) = &events[1] else {
			panic!("expected row")
		};
		assert_eq!(row.fields.get("b"), Some(&FieldValue::String("2".to_string())));
	}

	#[test]
	fn empty_input_yields_nothing() {
		let mut reader = CsvReader::new(Cursor::new(Vec::new()), CsvOptions::default());
		assert!(read_all(&mut reader).is_empty());
	}
}
