//! Reference language collaborators for the analysis engine.
//!
//! [`CLikeTokenizer`] lexes C-family sources line by line, carrying only
//! whether a block comment is open across line ends. [`BraceBlocks`] reuses
//! the same lexer to pair braces into foldable blocks.

mod blocks;
mod lexer;
pub mod style;
mod tokenizer;

// Used by the integration tests only.
#[cfg(test)]
use parking_lot as _;
#[cfg(test)]
use tokio as _;

pub use blocks::BraceBlocks;
pub use lexer::{LexState, Token, TokenKind};
pub use tokenizer::CLikeTokenizer;
