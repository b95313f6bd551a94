//! Common utilities for analysis integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use quill_analysis::{
	AnalysisCoordinator, AnalyzerConfig, ChannelReceiver, CollaboratorError, LineTokenizeResult, NoBlocks, Span,
	StateAccess, StyleEvent, StyleId, Tokenizer, normalize_line,
};
use quill_primitives::{Position, RopeBuffer, TextBuffer};
use tokio::sync::mpsc;

/// Tokenizer whose state is the brace nesting depth at the end of a line.
///
/// Each depth gets its own style. Lines containing `!` fail.
#[derive(Default)]
pub struct DepthLexer {
	/// Held by a test to park the worker inside `tokenize_line`.
	pub gate: Mutex<()>,
	pub calls: AtomicUsize,
	/// Set to probe [`StateAccess`] from inside the worker.
	pub probe: Mutex<Option<StateAccess<usize>>>,
	pub probed: Mutex<Vec<bool>>,
	pub threads: Mutex<Vec<String>>,
}

impl DepthLexer {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

/// Spans and exit depth of one line.
pub fn depth_spans(line: &str, entry: usize) -> (usize, Vec<Span>) {
	let mut depth = entry;
	let mut spans = vec![Span::new(0, StyleId(entry as u32))];
	for (column, ch) in line.chars().enumerate() {
		match ch {
			'{' => depth += 1,
			'}' => depth = depth.saturating_sub(1),
			_ => continue,
		}
		spans.push(Span::new(column + 1, StyleId(depth as u32)));
	}
	(depth, normalize_line(spans))
}

impl Tokenizer for DepthLexer {
	type State = usize;
	type Token = ();

	fn initial_state(&self) -> usize {
		0
	}

	fn tokenize_line(
		&self,
		line: &str,
		state: &usize,
		line_index: usize,
	) -> Result<LineTokenizeResult<usize, ()>, CollaboratorError> {
		drop(self.gate.lock());
		self.calls.fetch_add(1, Ordering::SeqCst);
		if let Some(name) = std::thread::current().name() {
			self.threads.lock().push(name.to_string());
		}
		if let Some(access) = self.probe.lock().as_ref()
			&& let Some(prev) = line_index.checked_sub(1)
		{
			let seen = access.get_state(prev).is_ok_and(|state| state.is_some());
			self.probed.lock().push(seen);
		}
		if line.contains('!') {
			return Err(CollaboratorError::Tokenize {
				line: line_index,
				message: "unexpected `!`".to_string(),
			});
		}
		let (exit, spans) = depth_spans(line, *state);
		Ok(LineTokenizeResult::new(exit).with_spans(spans))
	}
}

/// A coordinator wired to a live buffer and a channel receiver.
pub struct Fixture {
	pub coordinator: AnalysisCoordinator<DepthLexer>,
	pub lexer: Arc<DepthLexer>,
	pub live: Arc<RwLock<RopeBuffer>>,
	pub events: mpsc::UnboundedReceiver<StyleEvent>,
}

impl Fixture {
	pub fn new(text: &str) -> Self {
		Self::with_config(text, AnalyzerConfig::default())
	}

	pub fn with_config(text: &str, config: AnalyzerConfig) -> Self {
		let _ = tracing_subscriber::fmt::try_init();
		let lexer = Arc::new(DepthLexer::default());
		let coordinator = AnalysisCoordinator::new(Arc::clone(&lexer), Arc::new(NoBlocks), config);
		let (receiver, events) = ChannelReceiver::new();
		coordinator.set_receiver(Some(Arc::new(receiver)));
		Self {
			coordinator,
			lexer,
			live: Arc::new(RwLock::new(RopeBuffer::from(text))),
			events,
		}
	}

	pub fn reset(&mut self) {
		self.coordinator.reset(self.live.clone()).expect("spawn analysis worker");
	}

	/// Applies an insert to the live buffer and reports it.
	pub fn insert(&self, start: Position, text: &str) -> Position {
		let end = self.live.write().insert(start, text).expect("insert into live buffer");
		self.coordinator.insert(start, end, text);
		end
	}

	/// Applies a delete to the live buffer and reports it.
	pub fn delete(&self, start: Position, end: Position) {
		let deleted = self.live.read().slice_text(start, end).expect("slice live buffer");
		self.live.write().delete(start, end).expect("delete from live buffer");
		self.coordinator.delete(start, end, &deleted);
	}

	/// Spans a full analysis of the live buffer would produce.
	pub fn expected_spans(&self) -> Vec<Vec<Span>> {
		let live = self.live.read();
		let mut depth = 0;
		(0..live.line_count())
			.map(|line| {
				let content = live.line(line).unwrap_or_default();
				let (exit, spans) = depth_spans(&content, depth);
				depth = exit;
				spans
			})
			.collect()
	}

	pub async fn next_event(&mut self) -> StyleEvent {
		next_event(&mut self.events).await
	}

	/// Asserts nothing else gets published for a while.
	pub async fn assert_quiet(&mut self) {
		let extra = tokio::time::timeout(Duration::from_millis(200), self.events.recv()).await;
		assert!(extra.is_err(), "unexpected publication: {extra:?}");
	}
}

pub async fn next_event(events: &mut mpsc::UnboundedReceiver<StyleEvent>) -> StyleEvent {
	tokio::time::timeout(Duration::from_secs(5), events.recv())
		.await
		.expect("timed out waiting for a publication")
		.expect("receiver channel closed")
}
