use super::TaggedMap;
use chrono::{DateTime, Utc};

/// Top-level information of a KML `NetworkLinkControl`. The bodies of the
/// `Create`/`Delete`/`Change` update operations are consumed but not modeled;
/// only the operation name is kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkLinkControl {
	pub min_refresh_period: Option<f64>,
	pub max_session_length: Option<f64>,
	pub cookie: Option<String>,
	pub message: Option<String>,
	pub link_name: Option<String>,
	pub link_description: Option<String>,
	pub link_snippet: Option<String>,
	pub expires: Option<DateTime<Utc>>,
	pub view_group: Option<TaggedMap>,
	pub target_href: Option<String>,
	pub update_type: Option<String>,
}

impl NetworkLinkControl {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}
