use std::sync::Arc;

use quill_analysis::{BlockComputer, BlockDelegate, CodeBlock, CollaboratorError};
use quill_primitives::TextBuffer;
use tracing::trace;

use crate::CLikeTokenizer;
use crate::lexer::{LexState, TokenKind};

/// Room added to the largest top-level block when setting the suppress switch.
const SUPPRESS_SLACK: usize = 50;

/// Pairs `{` and `}` into blocks spanning more than one line.
///
/// Braces inside comments and literals are ignored. Unmatched closing braces
/// are skipped; blocks still open at the end of the text are dropped.
#[derive(Debug, Clone)]
pub struct BraceBlocks {
	tokenizer: Arc<CLikeTokenizer>,
}

impl BraceBlocks {
	pub fn new(tokenizer: Arc<CLikeTokenizer>) -> Self {
		Self { tokenizer }
	}
}

impl<B: TextBuffer> BlockComputer<B> for BraceBlocks {
	fn compute_blocks(&self, text: &B, delegate: &mut BlockDelegate) -> Result<Vec<CodeBlock>, CollaboratorError> {
		let mut open: Vec<(usize, usize)> = Vec::new();
		let mut blocks = Vec::new();
		// Blocks opened under the current top-level block, and the most seen.
		let mut subtree = 0;
		let mut widest = 0;
		let mut state = LexState::Normal;

		for line in 0..text.line_count() {
			if delegate.is_cancelled() {
				trace!(line, "lang.blocks.cancelled");
				return Ok(blocks);
			}
			let content = text.line(line).unwrap_or_default();
			let (exit, tokens) = self.tokenizer.lex(&content, state);
			state = exit;
			for token in tokens {
				match token.kind {
					TokenKind::LBrace => {
						if open.is_empty() {
							widest = widest.max(subtree);
							subtree = 0;
						}
						subtree += 1;
						open.push((line, token.column));
					}
					TokenKind::RBrace => {
						if let Some((start_line, start_column)) = open.pop()
							&& start_line != line
						{
							blocks.push(CodeBlock::new(start_line, start_column, line, token.column));
						}
					}
					_ => {}
				}
			}
		}

		delegate.set_suppress_switch(widest.max(subtree) + SUPPRESS_SLACK);
		Ok(blocks)
	}
}
