//! The language collaborator that turns one line into spans.

use crate::error::CollaboratorError;
use crate::span::Span;

/// Output of tokenizing one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineTokenizeResult<S, T> {
	/// Lexer state at the end of the line.
	pub state: S,
	pub tokens: Option<Vec<T>>,
	/// Spans computed directly; when absent they are derived via
	/// [`Tokenizer::generate_spans_for_line`].
	pub spans: Option<Vec<Span>>,
}

impl<S, T> LineTokenizeResult<S, T> {
	pub fn new(state: S) -> Self {
		Self {
			state,
			tokens: None,
			spans: None,
		}
	}

	#[must_use]
	pub fn with_tokens(mut self, tokens: Vec<T>) -> Self {
		self.tokens = Some(tokens);
		self
	}

	#[must_use]
	pub fn with_spans(mut self, spans: Vec<Span>) -> Self {
		self.spans = Some(spans);
		self
	}
}

/// Line-oriented lexer.
///
/// `tokenize_line` must be a pure function of the line text and the entry
/// state: the engine relies on equal inputs producing equal exit states to
/// stop re-analysis early. Tokenizers run on the analysis worker thread and
/// should keep shared tables immutable.
pub trait Tokenizer: Send + Sync + 'static {
	/// Lexer state carried from the end of one line to the start of the next.
	type State: Clone + PartialEq + Send + 'static;
	type Token: Send + 'static;

	/// State at the start of the text.
	fn initial_state(&self) -> Self::State;

	/// Tokenizes `line` starting from `state`. `line_index` is informational.
	fn tokenize_line(
		&self,
		line: &str,
		state: &Self::State,
		line_index: usize,
	) -> Result<LineTokenizeResult<Self::State, Self::Token>, CollaboratorError>;

	/// Convergence test between a recomputed and a recorded exit state.
	fn state_equals(&self, a: &Self::State, b: &Self::State) -> bool {
		a == b
	}

	/// Derives spans for a result that did not carry them.
	fn generate_spans_for_line(&self, _result: &LineTokenizeResult<Self::State, Self::Token>) -> Vec<Span> {
		vec![Span::normal(0)]
	}

	/// Called for every state the engine records.
	///
	/// Each recorded state later reaches exactly one of
	/// [`Tokenizer::on_replace_state`] or [`Tokenizer::on_abandon_state`].
	fn on_add_state(&self, _state: &Self::State) {}

	/// Called for a recorded state overwritten by a re-scan of its line.
	fn on_replace_state(&self, _previous: Self::State) {}

	/// Called for every recorded state discarded because its line was removed.
	fn on_abandon_state(&self, _state: Self::State) {}
}
