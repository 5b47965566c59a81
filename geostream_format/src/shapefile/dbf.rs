//! dBase III/IV attribute table reader.
//!
//! The first object returned is the [`Schema`] derived from the column descriptors,
//! then one [`Row`] per live record. Deleted records (flag `0x2A`) are skipped.

use anyhow::{Context, Result, bail, ensure};
use geostream_core::events::{FieldType, FieldValue, GisObject, Row, Schema, SimpleField};
use geostream_core::io::{ValueReader, ValueReaderSlice};
use geostream_core::stream::{EventQueue, GisInputStream};
use log::debug;
use std::path::Path;

const HEADER_SIZE: usize = 32;
const DESCRIPTOR_SIZE: usize = 32;
const DESCRIPTOR_TERMINATOR: u8 = 0x0D;
const DELETED_FLAG: u8 = 0x2A;

struct DbfField {
	name: String,
	type_char: u8,
	length: usize,
	decimals: u32,
}

impl DbfField {
	fn field_type(&self) -> FieldType {
		match self.type_char {
			b'C' => FieldType::String,
			b'N' => {
				if self.decimals > 0 {
					FieldType::Double
				} else {
					FieldType::Long
				}
			}
			b'F' => FieldType::Double,
			b'L' => FieldType::Bool,
			b'D' => FieldType::Date,
			other => {
				debug!("unhandled dbf field type '{}', treating as string", other as char);
				FieldType::String
			}
		}
	}

	fn parse_value(&self, raw: &str) -> FieldValue {
		let trimmed = raw.trim();
		if trimmed.is_empty() {
			return FieldValue::Null;
		}
		match self.type_char {
			b'L' => match trimmed.as_bytes()[0] {
				b'Y' | b'y' | b'T' | b't' => FieldValue::Bool(true),
				b'N' | b'n' | b'F' | b'f' => FieldValue::Bool(false),
				_ => FieldValue::Null,
			},
			b'D' => FieldValue::parse_dbase_date(trimmed),
			_ => FieldValue::parse_typed(self.field_type(), trimmed),
		}
	}
}

/// Reads a `.dbf` attribute table as a stream of one schema plus rows.
pub struct DbfReader {
	buf: Vec<u8>,
	fields: Vec<DbfField>,
	schema: Schema,
	header_size: usize,
	record_size: usize,
	record_count: usize,
	next_record: usize,
	queue: EventQueue,
	closed: bool,
}

impl DbfReader {
	/// Opens a `.dbf` file.
	///
	/// # Errors
	/// Returns an error on io failure or a malformed header.
	pub fn open(path: &Path) -> Result<Self> {
		let buf = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
		let stem = path
			.file_stem()
			.map_or_else(|| "table".to_string(), |s| s.to_string_lossy().into_owned());
		Self::from_bytes(buf, &stem)
	}

	/// Parses an in-memory `.dbf` image. `name` seeds the schema URI.
	///
	/// # Errors
	/// Returns an error if the header or field descriptors are malformed.
	pub fn from_bytes(buf: Vec<u8>, name: &str) -> Result<Self> {
		ensure!(buf.len() >= HEADER_SIZE, "dbf file too short for header");
		let mut reader = ValueReaderSlice::new_le(&buf);
		reader.skip(4)?; // version + last-update date
		let record_count = reader.read_u32()? as usize;
		let header_size = reader.read_u16()? as usize;
		let record_size = reader.read_u16()? as usize;
		ensure!(
			header_size >= HEADER_SIZE && header_size <= buf.len(),
			"dbf header size {header_size} out of range"
		);
		ensure!(record_size > 0, "dbf record size must be positive");

		let mut fields = Vec::new();
		let mut schema = Schema::new(&format!("urn:geostream:schema:{name}"));
		schema.name = Some(name.to_string());
		let mut offset = HEADER_SIZE;
		while offset + DESCRIPTOR_SIZE <= header_size && buf[offset] != DESCRIPTOR_TERMINATOR {
			let descriptor = &buf[offset..offset + DESCRIPTOR_SIZE];
			let name_len = descriptor[..11].iter().position(|&b| b == 0).unwrap_or(11);
			let field_name = String::from_utf8_lossy(&descriptor[..name_len]).trim().to_string();
			let field = DbfField {
				name: field_name,
				type_char: descriptor[11],
				length: descriptor[16] as usize,
				decimals: u32::from(descriptor[17]),
			};
			let mut simple = SimpleField::new(&field.name)
				.with_type(field.field_type())
				.with_length(field.length as u32);
			if field.decimals > 0 {
				simple = simple.with_precision(field.decimals);
			}
			schema.put(simple);
			fields.push(field);
			offset += DESCRIPTOR_SIZE;
		}
		ensure!(!fields.is_empty(), "dbf file declares no fields");

		let widths: usize = fields.iter().map(|f| f.length).sum();
		ensure!(
			widths + 1 == record_size,
			"dbf record size {record_size} does not match field widths {widths} + deletion flag"
		);

		let mut queue = EventQueue::new();
		queue.add_last(GisObject::Schema(schema.clone()));

		Ok(Self {
			buf,
			fields,
			schema,
			header_size,
			record_size,
			record_count,
			next_record: 0,
			queue,
			closed: false,
		})
	}

	/// The schema derived from the column descriptors.
	#[must_use]
	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	/// The next live row, `None` when the table is exhausted.
	///
	/// # Errors
	/// Returns an error if a record lies outside the file.
	pub fn next_row(&mut self) -> Result<Option<Row>> {
		while self.next_record < self.record_count {
			let start = self.header_size + self.next_record * self.record_size;
			let end = start + self.record_size;
			if end > self.buf.len() {
				bail!("dbf record {} lies outside the file", self.next_record);
			}
			self.next_record += 1;
			let record = &self.buf[start..end];
			if record[0] == DELETED_FLAG {
				continue;
			}
			let mut row = Row::new();
			row.schema_uri = Some(self.schema.uri().to_string());
			let mut offset = 1;
			for field in &self.fields {
				let raw = String::from_utf8_lossy(&record[offset..offset + field.length]);
				offset += field.length;
				let simple = self
					.schema
					.get(&field.name)
					.cloned()
					.unwrap_or_else(|| SimpleField::new(&field.name));
				row.fields.put(simple, field.parse_value(&raw));
			}
			return Ok(Some(row));
		}
		Ok(None)
	}
}

impl GisInputStream for DbfReader {
	fn queue(&mut self) -> &mut EventQueue {
		&mut self.queue
	}

	fn read_next(&mut self) -> Result<Option<GisObject>> {
		if self.closed {
			return Ok(None);
		}
		Ok(self.next_row()?.map(GisObject::Row))
	}

	fn close(&mut self) {
		self.closed = true;
		self.queue.clear();
		self.buf.clear();
	}

	fn enumerate_schemas(&self) -> Vec<&Schema> {
		vec![&self.schema]
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	/// Builds a minimal dBase III image for tests.
	pub(crate) fn build_dbf(fields: &[(&str, u8, u8, u8)], records: &[(&[&str], bool)]) -> Vec<u8> {
		let record_size: usize = 1 + fields.iter().map(|f| f.2 as usize).sum::<usize>();
		let header_size = HEADER_SIZE + fields.len() * DESCRIPTOR_SIZE + 1;
		let mut buf = vec![0u8; header_size];
		buf[0] = 0x03;
		buf[4..8].copy_from_slice(&(records.len() as u32).to_le_bytes());
		buf[8..10].copy_from_slice(&(header_size as u16).to_le_bytes());
		buf[10..12].copy_from_slice(&(record_size as u16).to_le_bytes());
		for (i, (name, type_char, length, decimals)) in fields.iter().enumerate() {
			let offset = HEADER_SIZE + i * DESCRIPTOR_SIZE;
			buf[offset..offset + name.len()].copy_from_slice(name.as_bytes());
			buf[offset + 11] = *type_char;
			buf[offset + 16] = *length;
			buf[offset + 17] = *decimals;
		}
		buf[header_size - 1] = DESCRIPTOR_TERMINATOR;
		for (values, deleted) in records {
			buf.push(if *deleted { DELETED_FLAG } else { b' ' });
			for (value, field) in values.iter().zip(fields) {
				let mut cell = value.as_bytes().to_vec();
				cell.resize(field.2 as usize, b' ');
				buf.extend_from_slice(&cell);
			}
		}
		buf
	}

	#[test]
	fn schema_from_descriptors() {
		let buf = build_dbf(
			&[("NAME", b'C', 10, 0), ("COUNT", b'N', 8, 0), ("RATIO", b'N', 8, 3)],
			&[],
		);
		let reader = DbfReader::from_bytes(buf, "cities").unwrap();
		let schema = reader.schema();
		assert_eq!(schema.uri(), "urn:geostream:schema:cities");
		assert_eq!(schema.fields().len(), 3);
		assert_eq!(schema.get("NAME").unwrap().field_type, FieldType::String);
		assert_eq!(schema.get("COUNT").unwrap().field_type, FieldType::Long);
		assert_eq!(schema.get("RATIO").unwrap().field_type, FieldType::Double);
		assert_eq!(schema.get("RATIO").unwrap().precision, Some(3));
	}

	#[test]
	fn rows_typed_and_deleted_skipped() {
		let buf = build_dbf(
			&[("NAME", b'C', 6, 0), ("N", b'N', 4, 0), ("OK", b'L', 1, 0), ("DAY", b'D', 8, 0)],
			&[
				(&["alpha", "12", "T", "20090314"], false),
				(&["gone", "99", "F", "20090315"], true),
				(&["beta", "", "?", ""], false),
			],
		);
		let mut reader = DbfReader::from_bytes(buf, "t").unwrap();

		let row = reader.next_row().unwrap().unwrap();
		assert_eq!(row.fields.get("NAME"), Some(&FieldValue::String("alpha".to_string())));
		assert_eq!(row.fields.get("N"), Some(&FieldValue::Long(12)));
		assert_eq!(row.fields.get("OK"), Some(&FieldValue::Bool(true)));
		assert!(matches!(row.fields.get("DAY"), Some(FieldValue::Date(_))));

		// the deleted record is skipped entirely
		let row = reader.next_row().unwrap().unwrap();
		assert_eq!(row.fields.get("NAME"), Some(&FieldValue::String("beta".to_string())));
		assert_eq!(row.fields.get("N"), Some(&FieldValue::Null));
		assert_eq!(row.fields.get("OK"), Some(&FieldValue::Null));

		assert!(reader.next_row().unwrap().is_none());
	}

	#[test]
	fn stream_contract_schema_first() {
		let buf = build_dbf(&[("A", b'C', 4, 0)], &[(&["x"], false)]);
		let mut reader = DbfReader::from_bytes(buf, "t").unwrap();
		assert!(matches!(reader.read().unwrap(), Some(GisObject::Schema(_))));
		assert!(matches!(reader.read().unwrap(), Some(GisObject::Row(_))));
		assert!(reader.read().unwrap().is_none());
	}

	#[test]
	fn malformed_headers_rejected() {
		assert!(DbfReader::from_bytes(vec![0; 10], "t").is_err());
		// record size not matching declared field widths
		let mut buf = build_dbf(&[("A", b'C', 4, 0)], &[]);
		buf[10] = 99;
		assert!(DbfReader::from_bytes(buf, "t").is_err());
	}
}
