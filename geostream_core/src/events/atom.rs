use chrono::{DateTime, Utc};

/// A link of an Atom feed header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AtomLink {
	pub href: String,
	pub rel: Option<String>,
}

/// The feed-level header of an Atom document. The Atom reader itself is an external
/// collaborator; this event type is the surface it hands into the pipeline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AtomHeader {
	pub id: Option<String>,
	pub title: Option<String>,
	pub updated: Option<DateTime<Utc>>,
	pub links: Vec<AtomLink>,
	pub authors: Vec<String>,
}
