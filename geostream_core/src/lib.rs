//! Event model, stream contracts and shared utilities of the geostream pipeline.
//!
//! A GIS document of any format is read as a flat sequence of [`events::GisObject`]s in
//! document order. Format adapters implement [`stream::GisInputStream`] for input and
//! [`stream::GisOutputStream`] for output; everything in between is format-agnostic.

pub mod events;
pub mod io;
pub mod options;
pub mod stream;
pub mod utils;

pub use events::*;
pub use options::*;
pub use stream::*;
