use quill_analysis::{CollaboratorError, LineTokenizeResult, Span, SpanFlags, Tokenizer};

use crate::lexer::{Keywords, LexState, Token, TokenKind, scan_line};
use crate::style;

/// Line tokenizer for C-family languages.
///
/// The only state crossing a line end is an open block comment, so an edit
/// restyles past its own lines only when it opens or closes one.
#[derive(Debug, Clone)]
pub struct CLikeTokenizer {
	keywords: Keywords,
}

impl Default for CLikeTokenizer {
	fn default() -> Self {
		Self::new()
	}
}

impl CLikeTokenizer {
	pub fn new() -> Self {
		Self {
			keywords: Keywords::new(),
		}
	}

	/// Scans `line` from `entry` without going through the engine.
	pub fn lex(&self, line: &str, entry: LexState) -> (LexState, Vec<Token>) {
		scan_line(line, entry, &self.keywords)
	}
}

impl Tokenizer for CLikeTokenizer {
	type State = LexState;
	type Token = Token;

	fn initial_state(&self) -> LexState {
		LexState::Normal
	}

	fn tokenize_line(
		&self,
		line: &str,
		state: &LexState,
		_line_index: usize,
	) -> Result<LineTokenizeResult<LexState, Token>, CollaboratorError> {
		let (exit, tokens) = self.lex(line, *state);
		Ok(LineTokenizeResult::new(exit).with_tokens(tokens))
	}

	fn generate_spans_for_line(&self, result: &LineTokenizeResult<LexState, Token>) -> Vec<Span> {
		let tokens = result.tokens.as_deref().unwrap_or_default();
		let mut spans = Vec::with_capacity(tokens.len());
		let mut previous = None;
		let mut after_type = false;

		for (index, token) in tokens.iter().enumerate() {
			let column = token.column;
			let span = match token.kind {
				TokenKind::Whitespace => Span::normal(column),
				TokenKind::Number | TokenKind::Str | TokenKind::Char => {
					after_type = false;
					Span::new(column, style::LITERAL).with_flags(SpanFlags::NO_COMPLETION)
				}
				TokenKind::TypeKeyword => {
					after_type = true;
					Span::new(column, style::KEYWORD).with_flags(SpanFlags::BOLD)
				}
				TokenKind::Keyword => {
					after_type = false;
					Span::new(column, style::KEYWORD).with_flags(SpanFlags::BOLD)
				}
				TokenKind::LineComment | TokenKind::BlockComment | TokenKind::BlockCommentOpen => {
					Span::new(column, style::COMMENT).with_flags(SpanFlags::NO_COMPLETION)
				}
				TokenKind::Identifier => {
					let style = if after_type {
						after_type = false;
						style::IDENTIFIER_VAR
					} else if previous == Some(TokenKind::At) {
						style::ANNOTATION
					} else {
						let next = tokens[index + 1..].iter().find(|token| !token.kind.is_trivia());
						if next.is_some_and(|token| token.kind == TokenKind::LParen) {
							style::FUNCTION_NAME
						} else {
							// `Type name`: the next identifier is declared.
							after_type = true;
							style::IDENTIFIER_NAME
						}
					};
					Span::new(column, style)
				}
				kind => {
					let array_suffix = kind == TokenKind::LBracket
						|| (kind == TokenKind::RBracket && previous == Some(TokenKind::LBracket));
					if !array_suffix {
						after_type = false;
					}
					Span::new(column, style::OPERATOR)
				}
			};
			spans.push(span);
			if !token.kind.is_trivia() {
				previous = Some(token.kind);
			}
		}

		if spans.is_empty() {
			spans.push(Span::normal(0));
		}
		spans
	}
}
