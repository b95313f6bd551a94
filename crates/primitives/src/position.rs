use std::fmt;

/// A position in the text, measured in characters (not bytes).
pub type CharIdx = usize;

/// A zero-based line/column position.
///
/// Columns count characters within the line, excluding the line terminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
	pub line: usize,
	pub column: usize,
}

impl Position {
	/// Creates a new position.
	pub const fn new(line: usize, column: usize) -> Self {
		Self { line, column }
	}

	/// Position at the start of `line`.
	pub const fn line_start(line: usize) -> Self {
		Self { line, column: 0 }
	}
}

impl From<(usize, usize)> for Position {
	fn from((line, column): (usize, usize)) -> Self {
		Self { line, column }
	}
}

impl fmt::Display for Position {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.line, self.column)
	}
}
