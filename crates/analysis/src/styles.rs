//! The bundle published to the host after each analysis run.

use std::sync::Arc;

use crate::block::{CodeBlock, binary_search_end_block};
use crate::store::SpanStore;

/// Spans plus structural blocks for one analyzed text.
///
/// Snapshots published by the same analysis share their [`SpanStore`];
/// only the block lists differ.
#[derive(Debug, Clone)]
pub struct Styles {
	pub spans: Arc<SpanStore>,
	/// Sorted by end position after [`Styles::finish_building`].
	pub blocks: Vec<CodeBlock>,
	/// Same blocks sorted by start position.
	pub blocks_by_start: Vec<CodeBlock>,
	/// Maximum number of blocks a renderer walks past the viewport.
	pub suppress_switch: usize,
	/// Guide lines follow indentation rather than block columns.
	pub indent_count_mode: bool,
}

impl Styles {
	pub fn new(spans: Arc<SpanStore>) -> Self {
		Self {
			spans,
			blocks: Vec::new(),
			blocks_by_start: Vec::new(),
			suppress_switch: usize::MAX,
			indent_count_mode: false,
		}
	}

	/// Sorts `blocks` by end (skipped when already sorted) and derives
	/// `blocks_by_start`.
	pub fn finish_building(&mut self) {
		if !self.blocks.is_sorted_by(|a, b| CodeBlock::cmp_by_end(a, b).is_le()) {
			self.blocks.sort_by(CodeBlock::cmp_by_end);
		}
		self.blocks_by_start.clone_from(&self.blocks);
		self.blocks_by_start.sort_by(CodeBlock::cmp_by_start);
	}

	/// Blocks worth drawing for lines `first..=last`.
	///
	/// Walks the end-sorted list from the first block ending at or after
	/// `first`, stops after `suppress_switch` blocks that start below the
	/// viewport.
	pub fn blocks_in_view(&self, first: usize, last: usize) -> Vec<CodeBlock> {
		let Some(from) = binary_search_end_block(first, &self.blocks) else {
			return Vec::new();
		};
		let mut visible = Vec::new();
		let mut below = 0usize;
		for block in &self.blocks[from..] {
			if block.start_line > last {
				below += 1;
				if below > self.suppress_switch {
					break;
				}
				continue;
			}
			visible.push(*block);
		}
		visible
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn styles_with(blocks: Vec<CodeBlock>) -> Styles {
		let mut styles = Styles::new(Arc::new(SpanStore::new()));
		styles.blocks = blocks;
		styles.finish_building();
		styles
	}

	#[test]
	fn test_finish_building_orders_both_lists() {
		let styles = styles_with(vec![CodeBlock::new(4, 0, 8, 0), CodeBlock::new(0, 0, 9, 0), CodeBlock::new(1, 2, 3, 0)]);
		let ends: Vec<_> = styles.blocks.iter().map(|b| b.end_line).collect();
		let starts: Vec<_> = styles.blocks_by_start.iter().map(|b| b.start_line).collect();
		assert_eq!(ends, vec![3, 8, 9]);
		assert_eq!(starts, vec![0, 1, 4]);
	}

	#[test]
	fn test_blocks_in_view_skips_blocks_above() {
		let styles = styles_with(vec![CodeBlock::new(0, 0, 2, 0), CodeBlock::new(3, 0, 6, 0), CodeBlock::new(5, 0, 20, 0)]);
		assert_eq!(styles.blocks_in_view(4, 10), vec![CodeBlock::new(3, 0, 6, 0), CodeBlock::new(5, 0, 20, 0)]);
		assert_eq!(styles.blocks_in_view(21, 30), Vec::new());
	}

	#[test]
	fn test_blocks_in_view_honors_suppress_switch() {
		let mut styles = styles_with(vec![
			CodeBlock::new(20, 0, 21, 0),
			CodeBlock::new(22, 0, 23, 0),
			CodeBlock::new(0, 0, 30, 0),
		]);
		assert_eq!(styles.blocks_in_view(0, 10), vec![CodeBlock::new(0, 0, 30, 0)]);
		styles.suppress_switch = 1;
		assert_eq!(styles.blocks_in_view(0, 10), Vec::new());
	}
}
