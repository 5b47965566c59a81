//! A peekable byte iterator over a reader source.
//!
//! Used by the text-format parsers (CSV) that need one byte of look-ahead and positions
//! in their error messages.

use anyhow::{Error, Result, anyhow};
use std::io::Read;

const BUFFER_SIZE: usize = 4096;

pub struct ByteIterator<'a> {
	buffer: [u8; BUFFER_SIZE],
	buffer_len: usize,
	buffer_pos: usize,
	source: Box<dyn Read + 'a>,
	peeked_byte: Option<u8>,
	position: usize,
}

impl<'a> ByteIterator<'a> {
	pub fn from_reader(reader: impl Read + 'a) -> Self {
		let mut instance = ByteIterator {
			buffer: [0; BUFFER_SIZE],
			buffer_len: 0,
			buffer_pos: 0,
			source: Box::new(reader),
			peeked_byte: None,
			position: 0,
		};
		instance.fill_buffer();
		instance.advance();
		instance
	}

	#[inline]
	fn fill_buffer(&mut self) {
		self.buffer_len = self.source.read(&mut self.buffer).unwrap_or(0);
		self.buffer_pos = 0;
	}

	#[inline]
	fn next_byte(&mut self) -> Option<u8> {
		if self.buffer_pos >= self.buffer_len {
			self.fill_buffer();
			if self.buffer_len == 0 {
				return None;
			}
		}
		let byte = self.buffer[self.buffer_pos];
		self.buffer_pos += 1;
		Some(byte)
	}

	/// An error message carrying the current byte position.
	#[must_use]
	pub fn format_error(&self, msg: &str) -> Error {
		anyhow!("{msg} at position {}", self.position.saturating_sub(1))
	}

	#[inline]
	#[must_use]
	pub fn position(&self) -> usize {
		self.position
	}

	/// The next byte without consuming it, `None` at end of input.
	#[inline]
	#[must_use]
	pub fn peek(&self) -> Option<u8> {
		self.peeked_byte
	}

	#[inline]
	pub fn advance(&mut self) {
		self.peeked_byte = self.next_byte();
		self.position += 1;
	}

	/// Consumes and returns the current byte.
	#[inline]
	pub fn consume(&mut self) -> Option<u8> {
		let current_byte = self.peeked_byte;
		self.advance();
		current_byte
	}

	/// Like [`ByteIterator::consume`] but end of input is an error.
	///
	/// # Errors
	/// Returns an error at end of input.
	#[inline]
	pub fn expect_next_byte(&mut self) -> Result<u8> {
		if let Some(current_byte) = self.peeked_byte {
			self.advance();
			Ok(current_byte)
		} else {
			Err(self.format_error("unexpected end"))
		}
	}

	pub fn skip_whitespace(&mut self) {
		while let Some(byte) = self.peek() {
			if !byte.is_ascii_whitespace() {
				break;
			}
			self.advance();
		}
	}

	/// Consumes the remaining bytes into a UTF-8 string.
	///
	/// # Errors
	/// Returns an error if the bytes are not valid UTF-8.
	pub fn into_string(mut self) -> Result<String> {
		let mut result = Vec::new();
		while let Some(byte) = self.consume() {
			result.push(byte);
		}
		String::from_utf8(result).map_err(Error::from)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn peek_and_consume() {
		let mut b = ByteIterator::from_reader(Cursor::new(b"abc".to_vec()));
		assert_eq!(b.peek(), Some(b'a'));
		assert_eq!(b.consume(), Some(b'a'));
		assert_eq!(b.consume(), Some(b'b'));
		assert_eq!(b.peek(), Some(b'c'));
		assert_eq!(b.consume(), Some(b'c'));
		assert_eq!(b.consume(), None);
		assert_eq!(b.peek(), None);
	}

	#[test]
	fn expect_next_byte_fails_at_end() {
		let mut b = ByteIterator::from_reader(Cursor::new(b"x".to_vec()));
		assert_eq!(b.expect_next_byte().unwrap(), b'x');
		assert!(b.expect_next_byte().is_err());
	}

	#[test]
	fn skip_whitespace() {
		let mut b = ByteIterator::from_reader(Cursor::new(b" \t\n ab".to_vec()));
		b.skip_whitespace();
		assert_eq!(b.consume(), Some(b'a'));
	}

	#[test]
	fn into_string() {
		let b = ByteIterator::from_reader(Cursor::new(b"hello".to_vec()));
		assert_eq!(b.into_string().unwrap(), "hello");
	}

	#[test]
	fn spans_buffer_refills() {
		let data = vec![b'z'; BUFFER_SIZE + 10];
		let mut b = ByteIterator::from_reader(Cursor::new(data));
		let mut count = 0;
		while b.consume().is_some() {
			count += 1;
		}
		assert_eq!(count, BUFFER_SIZE + 10);
	}
}
