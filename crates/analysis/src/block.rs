//! Foldable code regions and the collaborator that computes them.

use std::cmp::Ordering;

use quill_primitives::TextBuffer;
use quill_worker::{AbortToken, GenerationClock, RunTicket};

use crate::error::CollaboratorError;

/// A structural region of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CodeBlock {
	pub start_line: usize,
	pub start_column: usize,
	pub end_line: usize,
	pub end_column: usize,
	/// The guide line should extend to the bottom of the end line.
	pub to_bottom_of_end_line: bool,
}

impl CodeBlock {
	pub const fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
		Self {
			start_line,
			start_column,
			end_line,
			end_column,
			to_bottom_of_end_line: false,
		}
	}

	/// Number of lines strictly inside the block.
	pub const fn inner_lines(&self) -> usize {
		self.end_line.saturating_sub(self.start_line).saturating_sub(1)
	}

	/// Orders by `(end_line, end_column)`.
	pub fn cmp_by_end(a: &Self, b: &Self) -> Ordering {
		(a.end_line, a.end_column).cmp(&(b.end_line, b.end_column))
	}

	/// Orders by `(start_line, start_column)`.
	pub fn cmp_by_start(a: &Self, b: &Self) -> Ordering {
		(a.start_line, a.start_column).cmp(&(b.start_line, b.start_column))
	}
}

/// Index of the first block in `blocks` whose end line is at or after `line`.
///
/// `blocks` must be sorted by [`CodeBlock::cmp_by_end`]. Returns `None`
/// when every block ends before `line`.
pub fn binary_search_end_block(line: usize, blocks: &[CodeBlock]) -> Option<usize> {
	let idx = blocks.partition_point(|block| block.end_line < line);
	(idx < blocks.len()).then_some(idx)
}

/// Cancellation view handed to a [`BlockComputer`].
///
/// Also carries the suppress switch the computer may lower while it walks
/// the text.
#[derive(Debug, Clone)]
pub struct BlockDelegate {
	ticket: RunTicket,
	suppress_switch: usize,
}

impl BlockDelegate {
	pub fn new(ticket: RunTicket) -> Self {
		Self {
			ticket,
			suppress_switch: usize::MAX,
		}
	}

	/// A delegate that never reports cancellation.
	pub fn detached() -> Self {
		Self::new(GenerationClock::new().ticket(&AbortToken::new()))
	}

	/// True once the run is superseded or the worker aborted. Block computers
	/// should poll this and return early.
	pub fn is_cancelled(&self) -> bool {
		self.ticket.is_stale()
	}

	pub fn is_not_cancelled(&self) -> bool {
		!self.is_cancelled()
	}

	/// Caps how many blocks past the viewport a renderer should walk.
	pub fn set_suppress_switch(&mut self, suppress_switch: usize) {
		self.suppress_switch = suppress_switch;
	}

	pub fn suppress_switch(&self) -> usize {
		self.suppress_switch
	}
}

/// Computes structural blocks over a whole text snapshot.
pub trait BlockComputer<B: TextBuffer>: Send + Sync {
	/// Returns the blocks in `text`, in any order.
	///
	/// Should poll `delegate` and return early once it is cancelled; a
	/// cancelled run's result is discarded.
	fn compute_blocks(&self, text: &B, delegate: &mut BlockDelegate) -> Result<Vec<CodeBlock>, CollaboratorError>;
}

/// Block computer for languages without structural blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBlocks;

impl<B: TextBuffer> BlockComputer<B> for NoBlocks {
	fn compute_blocks(&self, _text: &B, _delegate: &mut BlockDelegate) -> Result<Vec<CodeBlock>, CollaboratorError> {
		Ok(Vec::new())
	}
}
