//! The pull-stream contracts and the look-ahead event queue.
//!
//! Streams are single-threaded and cooperative: each `read()` advances the underlying
//! source just far enough to produce one event. A stream instance is not safe for
//! concurrent use.

use crate::events::{GisObject, Schema};
use anyhow::Result;
use std::collections::VecDeque;

/// Buffered look-ahead events a parser has already produced but must emit in a
/// different order (e.g. an inline style emitted before its feature).
///
/// `add_first` inserts at the emission front (earlier), `add_last` enqueues at the back
/// (later); `read_saved` always drains from the front.
#[derive(Debug, Default)]
pub struct EventQueue {
	deque: VecDeque<GisObject>,
}

impl EventQueue {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_first(&mut self, obj: GisObject) {
		self.deque.push_front(obj);
	}

	pub fn add_last(&mut self, obj: GisObject) {
		self.deque.push_back(obj);
	}

	#[must_use]
	pub fn has_saved(&self) -> bool {
		!self.deque.is_empty()
	}

	pub fn read_saved(&mut self) -> Option<GisObject> {
		self.deque.pop_front()
	}

	pub fn clear(&mut self) {
		self.deque.clear();
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.deque.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.deque.is_empty()
	}
}

/// A pull-based input stream of GIS events.
///
/// Implementations provide access to their [`EventQueue`] and a `read_next` that pulls
/// from the underlying byte source; the provided `read`/`pushback` methods implement the
/// shared contract: saved events drain first, pushed-back events return on the next call.
pub trait GisInputStream {
	/// The stream's look-ahead queue.
	fn queue(&mut self) -> &mut EventQueue;

	/// Produces the next event from the underlying source, `None` at end-of-stream.
	///
	/// # Errors
	/// Returns an error only for fatal conditions; after one the stream state is
	/// unspecified and the stream must be closed.
	fn read_next(&mut self) -> Result<Option<GisObject>>;

	/// Releases the underlying resources. Idempotent; `read` after `close` yields `None`.
	fn close(&mut self);

	/// Schemas seen so far, in document order.
	fn enumerate_schemas(&self) -> Vec<&Schema>;

	/// Returns the next event in document order, `None` at end-of-stream.
	///
	/// # Errors
	/// See [`GisInputStream::read_next`].
	fn read(&mut self) -> Result<Option<GisObject>> {
		if let Some(saved) = self.queue().read_saved() {
			return Ok(Some(saved));
		}
		self.read_next()
	}

	/// Re-inserts an event to be returned by the next `read`.
	fn pushback(&mut self, obj: GisObject) {
		self.queue().add_first(obj);
	}
}

/// The mirror-image output contract: `write` is called in the order events should
/// appear in the target document.
pub trait GisOutputStream {
	/// Serializes one event.
	///
	/// # Errors
	/// Returns an error if the event cannot be represented or the sink fails.
	fn write(&mut self, obj: &GisObject) -> Result<()>;

	/// Flushes and finalizes the target document. Idempotent.
	///
	/// # Errors
	/// Returns an error if finalizing the sink fails.
	fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::events::{ContainerStart, ContainerType};

	struct FixedStream {
		queue: EventQueue,
		remaining: Vec<GisObject>,
	}

	impl GisInputStream for FixedStream {
		fn queue(&mut self) -> &mut EventQueue {
			&mut self.queue
		}
		fn read_next(&mut self) -> Result<Option<GisObject>> {
			Ok(if self.remaining.is_empty() {
				None
			} else {
				Some(self.remaining.remove(0))
			})
		}
		fn close(&mut self) {}
		fn enumerate_schemas(&self) -> Vec<&Schema> {
			Vec::new()
		}
	}

	#[test]
	fn saved_events_drain_before_the_source() {
		let mut stream = FixedStream {
			queue: EventQueue::new(),
			remaining: vec![GisObject::ContainerEnd],
		};
		stream
			.queue()
			.add_last(GisObject::ContainerStart(ContainerStart::new(ContainerType::Folder)));
		stream.queue().add_first(GisObject::Comment("first".to_string()));

		assert_eq!(stream.read().unwrap().unwrap().type_name(), "Comment");
		assert_eq!(stream.read().unwrap().unwrap().type_name(), "ContainerStart");
		assert_eq!(stream.read().unwrap().unwrap().type_name(), "ContainerEnd");
		assert!(stream.read().unwrap().is_none());
	}

	#[test]
	fn pushback_returns_on_next_read() {
		let mut stream = FixedStream {
			queue: EventQueue::new(),
			remaining: vec![],
		};
		stream.pushback(GisObject::ContainerEnd);
		stream.pushback(GisObject::Comment("earlier".to_string()));
		assert_eq!(stream.read().unwrap().unwrap().type_name(), "Comment");
		assert_eq!(stream.read().unwrap().unwrap().type_name(), "ContainerEnd");
		assert!(stream.read().unwrap().is_none());
	}
}
