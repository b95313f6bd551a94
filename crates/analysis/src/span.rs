//! Style markers attached to line columns.

use bitflags::bitflags;

/// Identifier of a style in the host's color scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleId(pub u32);

impl StyleId {
	/// Plain text.
	pub const NORMAL: Self = Self(0);
}

bitflags! {
	/// Font and behavior modifiers carried by a span.
	#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
	pub struct SpanFlags: u8 {
		const BOLD = 1;
		const ITALIC = 1 << 1;
		const UNDERLINE = 1 << 2;
		const STRIKETHROUGH = 1 << 3;
		/// Completion should not trigger inside this span (comments, strings).
		const NO_COMPLETION = 1 << 4;
	}
}

/// A style marker: `style` applies from `column` up to the next span's
/// column on the same line, or to the end of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
	pub column: usize,
	pub style: StyleId,
	pub flags: SpanFlags,
}

impl Span {
	pub const fn new(column: usize, style: StyleId) -> Self {
		Self {
			column,
			style,
			flags: SpanFlags::empty(),
		}
	}

	/// Plain-text span starting at `column`.
	pub const fn normal(column: usize) -> Self {
		Self::new(column, StyleId::NORMAL)
	}

	#[must_use]
	pub const fn with_flags(mut self, flags: SpanFlags) -> Self {
		self.flags = flags;
		self
	}
}

/// Span list served for a line that cannot be read right now.
pub const DEFAULT_LINE: &[Span] = &[Span::normal(0)];

/// Enforces the per-line invariant: at least one span, column 0 covered.
pub fn normalize_line(mut spans: Vec<Span>) -> Vec<Span> {
	match spans.first() {
		None => spans.push(Span::normal(0)),
		Some(first) if first.column != 0 => spans.insert(0, Span::normal(0)),
		Some(_) => {}
	}
	spans
}
