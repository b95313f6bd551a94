use std::borrow::Cow;

use parking_lot::RwLock;
use thiserror::Error;

use crate::Position;

/// Errors raised when an edit does not fit the buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
	/// The line index is past the last line.
	#[error("line {line} out of bounds (line count {line_count})")]
	LineOutOfBounds { line: usize, line_count: usize },

	/// The column is past the end of its line.
	#[error("column {column} out of bounds on line {line} (length {len})")]
	ColumnOutOfBounds { line: usize, column: usize, len: usize },

	/// The end of a range precedes its start.
	#[error("inverted range {start}..{end}")]
	InvertedRange { start: Position, end: Position },
}

/// Line-addressable mutable text.
///
/// Implementations must agree with the host editor on what a line is: the
/// analysis engine replays the host's edits position-for-position.
pub trait TextBuffer: Clone + Send + 'static {
	/// Number of lines, including the empty line after a trailing newline.
	fn line_count(&self) -> usize;

	/// Text of `index` without its line terminator.
	fn line(&self, index: usize) -> Option<Cow<'_, str>>;

	/// Length of `index` in chars, excluding the terminator.
	fn line_len(&self, index: usize) -> Option<usize> {
		self.line(index).map(|line| line.chars().count())
	}

	/// Inserts `text` at `at`, returning the position just past the inserted text.
	fn insert(&mut self, at: Position, text: &str) -> Result<Position, EditError>;

	/// Deletes the text between `start` and `end`.
	fn delete(&mut self, start: Position, end: Position) -> Result<(), EditError>;

	/// Returns an independent copy of the buffer.
	fn copy(&self) -> Self {
		self.clone()
	}
}

/// Handle to a live buffer owned by the edit thread.
///
/// The analysis engine never holds the live buffer; it asks for a snapshot
/// whenever it needs to start over.
pub trait ContentRef<B>: Send + Sync {
	/// Copies the current content.
	fn snapshot(&self) -> B;
}

impl<B> ContentRef<B> for RwLock<B>
where
	B: TextBuffer + Sync,
{
	fn snapshot(&self) -> B {
		self.read().copy()
	}
}
