//! Rope-backed buffer and rope utilities.

use std::borrow::Cow;

use ropey::{Rope, RopeSlice};

use crate::buffer::{ContentRef, EditError, TextBuffer};
use crate::position::{CharIdx, Position};

/// Returns the number of lines, including the empty line after a trailing newline.
#[inline]
pub fn visible_line_count(text: RopeSlice) -> usize {
	text.len_lines()
}

/// Returns true for every char ropey treats as a line break.
#[inline]
pub fn is_line_break(ch: char) -> bool {
	matches!(ch, '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}')
}

/// Length of a rope line in chars, without its terminator.
fn content_len(line: RopeSlice) -> usize {
	let len = line.len_chars();
	if len == 0 {
		return 0;
	}
	let last = line.char(len - 1);
	if !is_line_break(last) {
		return len;
	}
	if last == '\n' && len >= 2 && line.char(len - 2) == '\r' {
		len - 2
	} else {
		len - 1
	}
}

/// Text buffer stored in a [`Rope`]; copies are O(1) and share structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RopeBuffer {
	rope: Rope,
}

impl RopeBuffer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the underlying rope.
	pub fn rope(&self) -> &Rope {
		&self.rope
	}

	fn check_line(&self, line: usize) -> Result<(), EditError> {
		let line_count = self.rope.len_lines();
		if line >= line_count {
			return Err(EditError::LineOutOfBounds { line, line_count });
		}
		Ok(())
	}

	/// Converts a position into a char index, validating it against the text.
	pub fn char_idx(&self, pos: Position) -> Result<CharIdx, EditError> {
		self.check_line(pos.line)?;
		let len = content_len(self.rope.line(pos.line));
		if pos.column > len {
			return Err(EditError::ColumnOutOfBounds {
				line: pos.line,
				column: pos.column,
				len,
			});
		}
		Ok(self.rope.line_to_char(pos.line) + pos.column)
	}

	/// Converts a char index back into a position.
	pub fn position_of(&self, idx: CharIdx) -> Position {
		let idx = idx.min(self.rope.len_chars());
		let line = self.rope.char_to_line(idx);
		Position::new(line, idx - self.rope.line_to_char(line))
	}
}

impl From<&str> for RopeBuffer {
	fn from(text: &str) -> Self {
		Self { rope: Rope::from_str(text) }
	}
}

impl From<String> for RopeBuffer {
	fn from(text: String) -> Self {
		Self::from(text.as_str())
	}
}

impl From<Rope> for RopeBuffer {
	fn from(rope: Rope) -> Self {
		Self { rope }
	}
}

impl std::fmt::Display for RopeBuffer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for chunk in self.rope.chunks() {
			f.write_str(chunk)?;
		}
		Ok(())
	}
}

impl TextBuffer for RopeBuffer {
	fn line_count(&self) -> usize {
		visible_line_count(self.rope.slice(..))
	}

	fn line(&self, index: usize) -> Option<Cow<'_, str>> {
		if index >= self.rope.len_lines() {
			return None;
		}
		let line = self.rope.line(index);
		let content = line.slice(..content_len(line));
		Some(match content.as_str() {
			Some(text) => Cow::Borrowed(text),
			None => Cow::Owned(content.to_string()),
		})
	}

	fn line_len(&self, index: usize) -> Option<usize> {
		(index < self.rope.len_lines()).then(|| content_len(self.rope.line(index)))
	}

	fn insert(&mut self, at: Position, text: &str) -> Result<Position, EditError> {
		let idx = self.char_idx(at)?;
		self.rope.insert(idx, text);
		Ok(self.position_of(idx + text.chars().count()))
	}

	fn delete(&mut self, start: Position, end: Position) -> Result<(), EditError> {
		if end < start {
			return Err(EditError::InvertedRange { start, end });
		}
		let from = self.char_idx(start)?;
		let to = self.char_idx(end)?;
		self.rope.remove(from..to);
		Ok(())
	}
}

impl RopeBuffer {
	/// Returns the text a [`TextBuffer::delete`] of the same range would remove.
	pub fn slice_text(&self, start: Position, end: Position) -> Result<String, EditError> {
		if end < start {
			return Err(EditError::InvertedRange { start, end });
		}
		let from = self.char_idx(start)?;
		let to = self.char_idx(end)?;
		Ok(self.rope.slice(from..to).to_string())
	}
}

impl ContentRef<RopeBuffer> for RopeBuffer {
	fn snapshot(&self) -> RopeBuffer {
		self.copy()
	}
}
