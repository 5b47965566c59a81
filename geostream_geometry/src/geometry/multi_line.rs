use super::Line;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiLine {
	lines: Vec<Line>,
}

impl MultiLine {
	#[must_use]
	pub fn new(lines: Vec<Line>) -> Self {
		Self { lines }
	}

	#[must_use]
	pub fn lines(&self) -> &[Line] {
		&self.lines
	}

	#[must_use]
	pub fn into_lines(self) -> Vec<Line> {
		self.lines
	}
}
