/// An XML sub-tree in a foreign namespace, preserved verbatim for round-trip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
	pub namespace: Option<String>,
	pub prefix: Option<String>,
	pub name: String,
	pub attributes: Vec<(String, String)>,
	pub text: String,
	pub children: Vec<Element>,
}

impl Element {
	#[must_use]
	pub fn new(name: &str) -> Self {
		Self {
			name: name.to_string(),
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_namespace(name: &str, namespace: &str, prefix: Option<&str>) -> Self {
		Self {
			namespace: Some(namespace.to_string()),
			prefix: prefix.map(str::to_string),
			name: name.to_string(),
			..Self::default()
		}
	}

	/// The prefixed name as it appears on the wire.
	#[must_use]
	pub fn qualified_name(&self) -> String {
		match &self.prefix {
			Some(p) if !p.is_empty() => format!("{p}:{}", self.name),
			_ => self.name.clone(),
		}
	}

	#[must_use]
	pub fn attribute(&self, key: &str) -> Option<&str> {
		self
			.attributes
			.iter()
			.find(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn qualified_name() {
		assert_eq!(Element::new("link").qualified_name(), "link");
		let el = Element::with_namespace("link", "http://www.w3.org/2005/Atom", Some("atom"));
		assert_eq!(el.qualified_name(), "atom:link");
	}

	#[test]
	fn attribute_lookup() {
		let mut el = Element::new("link");
		el.attributes.push(("href".to_string(), "http://x/".to_string()));
		assert_eq!(el.attribute("href"), Some("http://x/"));
		assert_eq!(el.attribute("rel"), None);
	}
}
