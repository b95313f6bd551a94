//! Single-line scanner shared by the tokenizer and the block computer.

use rustc_hash::FxHashMap;

/// Lexical context carried across a line end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LexState {
	#[default]
	Normal,
	/// Inside a `/* */` comment that has not been closed yet.
	BlockComment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
	Whitespace,
	Identifier,
	Keyword,
	/// Primitive type names; the identifier after one is a declaration.
	TypeKeyword,
	Number,
	Str,
	Char,
	LineComment,
	BlockComment,
	/// Block comment still open at the end of the line.
	BlockCommentOpen,
	LBrace,
	RBrace,
	LParen,
	LBracket,
	RBracket,
	At,
	Operator,
}

impl TokenKind {
	/// Whitespace and comments, skipped when looking at neighbouring tokens.
	pub fn is_trivia(self) -> bool {
		matches!(
			self,
			Self::Whitespace | Self::LineComment | Self::BlockComment | Self::BlockCommentOpen
		)
	}
}

/// A token and the char column it starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
	pub kind: TokenKind,
	pub column: usize,
}

impl Token {
	pub const fn new(kind: TokenKind, column: usize) -> Self {
		Self { kind, column }
	}
}

const TYPE_KEYWORDS: &[&str] = &[
	"bool", "boolean", "byte", "char", "double", "float", "int", "long", "short", "unsigned", "var", "void",
];

const KEYWORDS: &[&str] = &[
	"abstract", "assert", "break", "case", "catch", "class", "const", "continue", "default", "do", "else", "enum",
	"extends", "false", "final", "finally", "for", "goto", "if", "implements", "import", "instanceof", "interface",
	"native", "new", "null", "package", "permits", "private", "protected", "public", "return", "sealed", "static",
	"struct", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "true", "try", "typedef",
	"volatile", "while",
];

/// Keyword table, built once per tokenizer and never mutated.
#[derive(Debug, Clone)]
pub(crate) struct Keywords {
	table: FxHashMap<&'static str, TokenKind>,
}

impl Keywords {
	pub(crate) fn new() -> Self {
		let mut table = FxHashMap::default();
		table.reserve(TYPE_KEYWORDS.len() + KEYWORDS.len());
		for word in TYPE_KEYWORDS {
			table.insert(*word, TokenKind::TypeKeyword);
		}
		for word in KEYWORDS {
			table.insert(*word, TokenKind::Keyword);
		}
		Self { table }
	}

	fn classify(&self, word: &str) -> TokenKind {
		self.table.get(word).copied().unwrap_or(TokenKind::Identifier)
	}
}

fn is_ident_start(ch: char) -> bool {
	ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
	ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// Index just past the `*/` closing a comment searched from `from`.
fn comment_end(chars: &[char], from: usize) -> Option<usize> {
	(from..chars.len().saturating_sub(1))
		.find(|&i| chars[i] == '*' && chars[i + 1] == '/')
		.map(|i| i + 2)
}

/// Index just past the literal opened by the quote at `start`; the end of
/// the line when it is not closed.
fn literal_end(chars: &[char], start: usize) -> usize {
	let quote = chars[start];
	let mut i = start + 1;
	while i < chars.len() {
		match chars[i] {
			'\\' => i += 2,
			ch if ch == quote => return i + 1,
			_ => i += 1,
		}
	}
	chars.len()
}

/// Scans one line from `entry`, returning the exit state and the tokens.
pub(crate) fn scan_line(line: &str, entry: LexState, keywords: &Keywords) -> (LexState, Vec<Token>) {
	let chars: Vec<char> = line.chars().collect();
	let mut tokens = Vec::new();
	let mut i = 0;

	if entry == LexState::BlockComment {
		match comment_end(&chars, 0) {
			Some(end) => {
				tokens.push(Token::new(TokenKind::BlockComment, 0));
				i = end;
			}
			None => {
				tokens.push(Token::new(TokenKind::BlockCommentOpen, 0));
				return (LexState::BlockComment, tokens);
			}
		}
	}

	while i < chars.len() {
		let start = i;
		let ch = chars[i];
		let next = chars.get(i + 1).copied();
		let kind = match ch {
			_ if ch.is_whitespace() => {
				while i < chars.len() && chars[i].is_whitespace() {
					i += 1;
				}
				TokenKind::Whitespace
			}
			'/' if next == Some('/') => {
				i = chars.len();
				TokenKind::LineComment
			}
			'/' if next == Some('*') => match comment_end(&chars, i + 2) {
				Some(end) => {
					i = end;
					TokenKind::BlockComment
				}
				None => {
					tokens.push(Token::new(TokenKind::BlockCommentOpen, start));
					return (LexState::BlockComment, tokens);
				}
			},
			'"' | '\'' => {
				i = literal_end(&chars, i).min(chars.len());
				if ch == '"' { TokenKind::Str } else { TokenKind::Char }
			}
			_ if ch.is_ascii_digit() => {
				while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '.' || chars[i] == '_') {
					i += 1;
				}
				TokenKind::Number
			}
			_ if is_ident_start(ch) => {
				while i < chars.len() && is_ident_continue(chars[i]) {
					i += 1;
				}
				let word: String = chars[start..i].iter().collect();
				keywords.classify(&word)
			}
			_ => {
				i += 1;
				match ch {
					'{' => TokenKind::LBrace,
					'}' => TokenKind::RBrace,
					'(' => TokenKind::LParen,
					'[' => TokenKind::LBracket,
					']' => TokenKind::RBracket,
					'@' => TokenKind::At,
					_ => TokenKind::Operator,
				}
			}
		};
		tokens.push(Token::new(kind, start));
	}
	(LexState::Normal, tokens)
}
