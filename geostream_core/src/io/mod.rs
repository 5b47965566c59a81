//! Byte-level reading helpers for the binary and text format adapters.

mod byte_iterator;
mod value_reader;

pub use byte_iterator::ByteIterator;
pub use value_reader::{ValueReader, ValueReaderSlice};
