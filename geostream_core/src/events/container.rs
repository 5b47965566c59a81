//! Document and container boundary events.

/// The source format of a document, carried by the leading [`DocumentStart`] event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentType {
	Kml,
	Shapefile,
	Csv,
}

/// The first event of every document stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentStart {
	pub doc_type: DocumentType,
	/// Prefix/URI pairs declared on the document root.
	pub namespaces: Vec<(String, String)>,
}

impl DocumentStart {
	#[must_use]
	pub fn new(doc_type: DocumentType) -> Self {
		Self {
			doc_type,
			namespaces: Vec::new(),
		}
	}
}

/// The kind of hierarchical scope a container opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerType {
	Folder,
	Document,
}

impl ContainerType {
	#[must_use]
	pub fn as_str(&self) -> &'static str {
		match self {
			ContainerType::Folder => "Folder",
			ContainerType::Document => "Document",
		}
	}
}

/// Opens a container scope. Every `ContainerStart` is matched by exactly one
/// `ContainerEnd` later in the stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerStart {
	pub container_type: ContainerType,
	pub id: Option<String>,
	pub name: Option<String>,
	pub description: Option<String>,
	pub snippet: Option<String>,
	pub visibility: Option<bool>,
	pub open: bool,
}

impl ContainerStart {
	#[must_use]
	pub fn new(container_type: ContainerType) -> Self {
		Self {
			container_type,
			id: None,
			name: None,
			description: None,
			snippet: None,
			visibility: None,
			open: false,
		}
	}
}
