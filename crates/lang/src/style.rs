//! Style identifiers produced by [`CLikeTokenizer`](crate::CLikeTokenizer).

use quill_analysis::StyleId;

pub const NORMAL: StyleId = StyleId::NORMAL;
pub const KEYWORD: StyleId = StyleId(1);
pub const LITERAL: StyleId = StyleId(2);
pub const COMMENT: StyleId = StyleId(3);
pub const IDENTIFIER_NAME: StyleId = StyleId(4);
/// Identifier following a type, usually a declaration.
pub const IDENTIFIER_VAR: StyleId = StyleId(5);
pub const FUNCTION_NAME: StyleId = StyleId(6);
pub const ANNOTATION: StyleId = StyleId(7);
pub const OPERATOR: StyleId = StyleId(8);

/// Human-readable name of a style, for diagnostics.
pub fn name(style: StyleId) -> &'static str {
	match style {
		NORMAL => "normal",
		KEYWORD => "keyword",
		LITERAL => "literal",
		COMMENT => "comment",
		IDENTIFIER_NAME => "identifier",
		IDENTIFIER_VAR => "variable",
		FUNCTION_NAME => "function",
		ANNOTATION => "annotation",
		OPERATOR => "operator",
		_ => "unknown",
	}
}
