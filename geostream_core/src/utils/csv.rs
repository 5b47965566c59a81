//! A small CSV record reader with configurable separator and quote.
//!
//! Quoted fields use RFC 4180 double-quote escaping. Records end at `\n` or `\r\n` (or
//! at a caller-supplied terminator byte); blank lines are skipped.

use crate::io::ByteIterator;
use anyhow::{Error, Result, bail};
use std::io::Read;

fn parse_quoted_field(iter: &mut ByteIterator, quote: u8) -> Result<String> {
	if iter.expect_next_byte()? != quote {
		bail!(iter.format_error("expected quote while parsing a field"));
	}
	let mut bytes: Vec<u8> = Vec::new();
	loop {
		match iter.consume() {
			Some(b) if b == quote => match iter.peek() {
				Some(n) if n == quote => {
					bytes.push(quote);
					iter.advance();
				}
				_ => return String::from_utf8(bytes).map_err(Error::from),
			},
			Some(b) => bytes.push(b),
			None => bail!(iter.format_error("quoted field did not end")),
		}
	}
}

fn parse_bare_field(iter: &mut ByteIterator, separator: u8, eol: u8) -> Result<String> {
	let mut bytes: Vec<u8> = Vec::new();
	loop {
		match iter.peek() {
			Some(b) if b == separator || b == eol => break,
			Some(b'\r') | None => break,
			Some(b) => {
				bytes.push(b);
				iter.advance();
			}
		}
	}
	String::from_utf8(bytes).map_err(Error::from)
}

/// Iterates over CSV records as field vectors.
///
/// `eol` is the record terminator; pass `None` for the usual `\n` / `\r\n` handling.
pub fn read_csv_records<'a>(
	reader: impl Read + Send + 'a,
	separator: u8,
	quote: u8,
	eol: Option<u8>,
) -> impl Iterator<Item = Result<Vec<String>>> + 'a {
	let eol = eol.unwrap_or(b'\n');
	let mut iter = ByteIterator::from_reader(reader);

	std::iter::from_fn(move || -> Option<Result<Vec<String>>> {
		iter.peek()?;

		let mut fields = Vec::new();
		loop {
			let value = match iter.peek() {
				Some(b) if b == quote => match parse_quoted_field(&mut iter, quote) {
					Ok(v) => v,
					Err(e) => return Some(Err(e)),
				},
				Some(_) => match parse_bare_field(&mut iter, separator, eol) {
					Ok(v) => v,
					Err(e) => return Some(Err(e)),
				},
				None => String::new(),
			};
			fields.push(value);
			loop {
				match iter.consume() {
					Some(b'\r') => {}
					Some(b) if b == eol => {
						if fields.len() == 1 && fields.first().is_some_and(String::is_empty) {
							// blank line
							fields.clear();
							break;
						}
						return Some(Ok(fields));
					}
					None => {
						if fields.len() == 1 && fields.first().is_some_and(String::is_empty) {
							return None;
						}
						return Some(Ok(fields));
					}
					Some(b) if b == separator => break,
					Some(b) => {
						return Some(Err(
							iter.format_error(&format!("unexpected byte 0x{b:02x} after field"))
						));
					}
				}
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	fn collect(input: &str) -> Vec<Vec<String>> {
		read_csv_records(Cursor::new(input.as_bytes().to_vec()), b',', b'"', None)
			.map(|r| r.unwrap())
			.collect()
	}

	#[test]
	fn basic_records() {
		assert_eq!(
			collect("name,age\nJohn Doe,30\r\nJane Doe,29"),
			vec![vec!["name", "age"], vec!["John Doe", "30"], vec!["Jane Doe", "29"]]
		);
	}

	#[test]
	fn quoted_fields() {
		assert_eq!(
			collect("\"Doe, Jane\",29\n\"say \"\"hi\"\"\",x"),
			vec![vec!["Doe, Jane", "29"], vec!["say \"hi\"", "x"]]
		);
	}

	#[test]
	fn blank_lines_are_skipped() {
		assert_eq!(collect("a,b\n\nc,d\n\n"), vec![vec!["a", "b"], vec!["c", "d"]]);
	}

	#[test]
	fn empty_fields() {
		assert_eq!(collect("a,,c\n,,"), vec![vec!["a", "", "c"], vec!["", "", ""]]);
	}

	#[test]
	fn custom_separator_and_terminator() {
		let records: Vec<_> = read_csv_records(Cursor::new(b"a|b;c|d;".to_vec()), b'|', b'"', Some(b';'))
			.map(|r| r.unwrap())
			.collect();
		assert_eq!(records, vec![vec!["a", "b"], vec!["c", "d"]]);
	}

	#[test]
	fn unterminated_quote_is_an_error() {
		let mut iter = read_csv_records(Cursor::new(b"\"oops".to_vec()), b',', b'"', None);
		assert!(iter.next().unwrap().is_err());
	}

	#[test]
	fn empty_input() {
		assert!(collect("").is_empty());
	}
}
