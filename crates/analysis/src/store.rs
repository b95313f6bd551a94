//! Concurrent per-line span storage.
//!
//! Two lock levels: a structural lock over the line list and one lock per
//! line. The analysis worker is the only writer and takes both blocking;
//! readers only ever try-lock with a short bound and fall back to a single
//! plain span, so a render pass never stalls behind analysis.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};

use crate::span::{DEFAULT_LINE, Span, normalize_line};

type LineSlot = Arc<Mutex<Vec<Span>>>;

/// Upper bounds a [`Reader`] waits for a lock before serving the default span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTimeouts {
	/// Wait for the structural lock in [`Reader::move_to_line`].
	pub line_lock: Duration,
	/// Wait for the structural lock in [`Reader::spans_on_line`].
	pub spans_lock: Duration,
}

impl Default for ReadTimeouts {
	fn default() -> Self {
		Self {
			line_lock: Duration::from_micros(100),
			spans_lock: Duration::from_millis(1),
		}
	}
}

/// Per-line span lists shared between the analysis worker and readers.
#[derive(Default)]
pub struct SpanStore {
	lines: Mutex<Vec<LineSlot>>,
	timeouts: ReadTimeouts,
}

impl SpanStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_timeouts(timeouts: ReadTimeouts) -> Self {
		Self {
			lines: Mutex::default(),
			timeouts,
		}
	}

	pub fn timeouts(&self) -> ReadTimeouts {
		self.timeouts
	}

	/// Number of stored lines. Blocks on the structural lock.
	pub fn line_count(&self) -> usize {
		self.lines.lock().len()
	}

	/// Opens a bounded-wait read cursor.
	pub fn read(&self) -> Reader<'_> {
		Reader {
			store: self,
			line: None,
		}
	}

	/// Opens the writer interface. Only the analysis worker writes.
	pub fn modify(&self) -> Modifier<'_> {
		Modifier { store: self }
	}

	/// Copies every line's spans, waiting for all locks.
	pub fn snapshot(&self) -> Vec<Vec<Span>> {
		self.lines.lock().iter().map(|slot| slot.lock().clone()).collect()
	}
}

impl fmt::Debug for SpanStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let lines = self.lines.try_lock().map(|lines| lines.len());
		f.debug_struct("SpanStore")
			.field("lines", &lines)
			.field("timeouts", &self.timeouts)
			.finish()
	}
}

/// Read cursor over a [`SpanStore`].
///
/// Holds at most one line lock at a time: the line last selected by
/// [`Reader::move_to_line`]. Dropping the reader releases it.
pub struct Reader<'a> {
	store: &'a SpanStore,
	line: Option<HeldLine>,
}

/// A locked line together with the slot it was locked through.
struct HeldLine {
	slot: LineSlot,
	spans: ArcMutexGuard<RawMutex, Vec<Span>>,
}

impl Reader<'_> {
	/// Releases the current line and tries to lock `line`.
	///
	/// Returns false when the line does not exist or either lock could not be
	/// taken in time. Until the next successful move the reader then serves
	/// the default span.
	pub fn move_to_line(&mut self, line: usize) -> bool {
		self.line = None;
		let Some(lines) = self.store.lines.try_lock_for(self.store.timeouts.line_lock) else {
			return false;
		};
		self.line = lines.get(line).and_then(|slot| {
			let spans = slot.try_lock_arc()?;
			Some(HeldLine {
				slot: Arc::clone(slot),
				spans,
			})
		});
		self.line.is_some()
	}

	/// Number of spans on the current line; 1 when no line is held.
	pub fn span_count(&self) -> usize {
		self.current_spans().len()
	}

	pub fn span_at(&self, index: usize) -> Option<Span> {
		self.current_spans().get(index).copied()
	}

	/// Spans of the current line, or the default span when none is held.
	pub fn current_spans(&self) -> &[Span] {
		match &self.line {
			Some(held) => held.spans.as_slice(),
			None => DEFAULT_LINE,
		}
	}

	/// Copies the spans of an arbitrary line without moving the cursor.
	///
	/// The line held by this reader is served from its own lock.
	pub fn spans_on_line(&self, line: usize) -> Vec<Span> {
		let slot = {
			let Some(lines) = self.store.lines.try_lock_for(self.store.timeouts.spans_lock) else {
				return DEFAULT_LINE.to_vec();
			};
			match lines.get(line) {
				Some(slot) => Arc::clone(slot),
				None => return DEFAULT_LINE.to_vec(),
			}
		};
		if let Some(held) = self.line.as_ref().filter(|held| Arc::ptr_eq(&held.slot, &slot)) {
			return held.spans.to_vec();
		}
		match slot.try_lock() {
			Some(spans) => spans.clone(),
			None => DEFAULT_LINE.to_vec(),
		}
	}
}

/// Writer interface over a [`SpanStore`].
pub struct Modifier<'a> {
	store: &'a SpanStore,
}

impl Modifier<'_> {
	/// Replaces the spans of `line`, growing the store when `line` is past the end.
	pub fn set_spans_on_line(&self, line: usize, spans: Vec<Span>) {
		let spans = normalize_line(spans);
		let mut lines = self.store.lines.lock();
		while lines.len() <= line {
			lines.push(Arc::new(Mutex::new(DEFAULT_LINE.to_vec())));
		}
		*lines[line].lock() = spans;
	}

	/// Inserts a new line at `line`, shifting later lines down.
	pub fn add_line_at(&self, line: usize, spans: Vec<Span>) {
		let slot = Arc::new(Mutex::new(normalize_line(spans)));
		let mut lines = self.store.lines.lock();
		let at = line.min(lines.len());
		lines.insert(at, slot);
	}

	/// Removes `line`, shifting later lines up. Out-of-range lines are ignored.
	pub fn delete_line_at(&self, line: usize) {
		let mut lines = self.store.lines.lock();
		if line >= lines.len() {
			return;
		}
		// Wait out any reader still holding the line before it disappears.
		let slot = Arc::clone(&lines[line]);
		let _held = slot.lock();
		lines.remove(line);
	}
}
