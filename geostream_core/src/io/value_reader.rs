//! Endian-aware reading of scalar values from a byte slice.
//!
//! Binary shapefiles mix byte orders (big-endian record headers, little-endian geometry),
//! so the reader is parameterised over [`byteorder::ByteOrder`] and two readers with
//! different orders can walk the same mapped buffer.

use anyhow::{Result, anyhow, bail};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek};
use std::marker::PhantomData;

/// A readable, seekable byte source.
pub trait SeekRead: Seek + Read {}

impl SeekRead for Cursor<&[u8]> {}

/// Reads scalar values in byte order `E` with position bookkeeping.
pub trait ValueReader<'a, E: ByteOrder + 'a> {
	fn get_reader(&mut self) -> &mut dyn SeekRead;

	fn len(&self) -> u64;
	fn position(&mut self) -> u64;

	/// # Errors
	/// Returns an error if `position` is beyond the end of the data.
	fn set_position(&mut self, position: u64) -> Result<()>;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn remaining(&mut self) -> u64 {
		self.len() - self.position()
	}

	fn has_remaining(&mut self) -> bool {
		self.remaining() > 0
	}

	fn read_u8(&mut self) -> Result<u8> {
		Ok(self.get_reader().read_u8()?)
	}

	fn read_i16(&mut self) -> Result<i16> {
		Ok(self.get_reader().read_i16::<E>()?)
	}

	fn read_u16(&mut self) -> Result<u16> {
		Ok(self.get_reader().read_u16::<E>()?)
	}

	fn read_i32(&mut self) -> Result<i32> {
		Ok(self.get_reader().read_i32::<E>()?)
	}

	fn read_u32(&mut self) -> Result<u32> {
		Ok(self.get_reader().read_u32::<E>()?)
	}

	fn read_f64(&mut self) -> Result<f64> {
		Ok(self.get_reader().read_f64::<E>()?)
	}

	fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>> {
		let mut vec = vec![0u8; length];
		self.get_reader().read_exact(&mut vec)?;
		Ok(vec)
	}

	fn read_string(&mut self, length: usize) -> Result<String> {
		let vec = self.read_bytes(length)?;
		Ok(String::from_utf8(vec)?)
	}

	/// Skips `length` bytes.
	fn skip(&mut self, length: u64) -> Result<()> {
		let position = self.position();
		self.set_position(position + length)
	}

	/// A reader over the next `length` bytes; the parent position advances past them.
	fn get_sub_reader<'b>(&'b mut self, length: u64) -> Result<Box<dyn ValueReader<'b, E> + 'b>>
	where
		E: 'b;
}

/// A [`ValueReader`] over a borrowed byte slice.
pub struct ValueReaderSlice<'a, E: ByteOrder> {
	_phantom: PhantomData<E>,
	cursor: Cursor<&'a [u8]>,
	len: u64,
}

impl<'a, E: ByteOrder> ValueReaderSlice<'a, E> {
	#[must_use]
	pub fn new(slice: &'a [u8]) -> ValueReaderSlice<'a, E> {
		ValueReaderSlice {
			_phantom: PhantomData,
			len: slice.len() as u64,
			cursor: Cursor::new(slice),
		}
	}
}

impl<'a> ValueReaderSlice<'a, LittleEndian> {
	#[must_use]
	pub fn new_le(slice: &'a [u8]) -> ValueReaderSlice<'a, LittleEndian> {
		ValueReaderSlice::new(slice)
	}
}

impl<'a> ValueReaderSlice<'a, BigEndian> {
	#[must_use]
	pub fn new_be(slice: &'a [u8]) -> ValueReaderSlice<'a, BigEndian> {
		ValueReaderSlice::new(slice)
	}
}

impl<'a, E: ByteOrder + 'a> ValueReader<'a, E> for ValueReaderSlice<'a, E> {
	fn get_reader(&mut self) -> &mut dyn SeekRead {
		&mut self.cursor
	}

	fn len(&self) -> u64 {
		self.len
	}

	fn position(&mut self) -> u64 {
		self.cursor.position()
	}

	fn set_position(&mut self, position: u64) -> Result<()> {
		if position > self.len {
			bail!("position {position} outside of length {}", self.len);
		}
		self.cursor.set_position(position);
		Ok(())
	}

	fn get_sub_reader<'b>(&'b mut self, length: u64) -> Result<Box<dyn ValueReader<'b, E> + 'b>>
	where
		E: 'b,
	{
		let start = self.cursor.position();
		let end = start + length;
		if end > self.len {
			bail!("requested sub-reader length exceeds remaining data");
		}
		self.cursor.set_position(end);
		Ok(Box::new(ValueReaderSlice {
			_phantom: PhantomData,
			len: length,
			cursor: Cursor::new(
				self
					.cursor
					.get_ref()
					.get(start as usize..end as usize)
					.ok_or(anyhow!("out of bounds"))?,
			),
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn endianness() -> Result<()> {
		let data = [0x00, 0x00, 0x27, 0x0A];
		assert_eq!(ValueReaderSlice::new_be(&data).read_i32()?, 9994);
		assert_eq!(ValueReaderSlice::new_le(&data).read_u16()?, 0);

		let one = 1.0f64.to_le_bytes();
		assert_eq!(ValueReaderSlice::new_le(&one).read_f64()?, 1.0);
		Ok(())
	}

	#[test]
	fn position_tracking() -> Result<()> {
		let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
		let mut reader = ValueReaderSlice::new_le(&data);
		assert_eq!(reader.len(), 8);
		reader.read_u32()?;
		assert_eq!(reader.position(), 4);
		assert_eq!(reader.remaining(), 4);
		reader.skip(2)?;
		assert_eq!(reader.read_u8()?, 7);
		assert!(reader.has_remaining());
		reader.read_u8()?;
		assert!(!reader.has_remaining());
		Ok(())
	}

	#[test]
	fn set_position_out_of_range() {
		let mut reader = ValueReaderSlice::new_le(&[0u8; 4]);
		assert!(reader.set_position(4).is_ok());
		assert!(reader.set_position(5).is_err());
	}

	#[test]
	fn sub_reader() -> Result<()> {
		let data = [1u8, 2, 3, 4, 5];
		let mut reader = ValueReaderSlice::new_le(&data);
		reader.set_position(1)?;
		let mut sub = reader.get_sub_reader(3)?;
		assert_eq!(sub.read_u8()?, 2);
		assert_eq!(sub.remaining(), 2);
		drop(sub);
		assert_eq!(reader.read_u8()?, 5);
		Ok(())
	}

	#[test]
	fn read_string() -> Result<()> {
		let mut reader = ValueReaderSlice::new_le(b"GEOGCS[\"x\"]");
		assert_eq!(reader.read_string(6)?, "GEOGCS");
		Ok(())
	}
}
