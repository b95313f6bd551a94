//! The analysis worker: one thread per reset, draining edit messages.
//!
//! The worker owns a shadow copy of the text and replays every edit onto it
//! in order. Each message carries the generation it was submitted under;
//! any later submission makes its run stale. The structural part of an edit
//! (shadow text, state list, span lines) is always applied so the three stay
//! aligned.
//! Only the convergence scan and block computation stop early. Lines where a
//! scan stopped are kept in a [`ResumeSet`] and picked up by later scans.
//!
//! A run that fails or panics leaves the states untrustworthy. The worker
//! then keeps replaying edits onto the shadow text and starts over with a
//! full analysis on the first run that is not stale.

mod link;
mod resume;


use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use quill_primitives::{Position, TextBuffer, is_line_break};
use quill_worker::{RunTicket, panic_message};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

pub(crate) use self::link::{Shared, WorkerLink};
use self::resume::ResumeSet;
use crate::block::{BlockComputer, BlockDelegate};
use crate::error::{AnalysisError, Result};
use crate::metrics::RunOutcome;
use crate::receiver::LineRange;
use crate::span::Span;
use crate::store::{Modifier, SpanStore};
use crate::styles::Styles;
use crate::tokenizer::Tokenizer;

/// Messages consumed by the worker, in submission order.
#[derive(Debug)]
pub(crate) enum Message<B> {
	/// Start over on this text.
	Analyze(B),
	Edit(TextEdit),
}

/// A message stamped with the generation it was submitted under.
#[derive(Debug)]
pub(crate) struct Submitted<B> {
	pub(crate) generation: u64,
	pub(crate) message: Message<B>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EditKind {
	Insert(String),
	Delete,
}

/// An edit as the host applied it to the live text.
///
/// For an insert `end` is the position just past the inserted text once it
/// is in place; for a delete it is the end of the removed range before removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextEdit {
	pub(crate) start: Position,
	pub(crate) end: Position,
	pub(crate) kind: EditKind,
}

impl TextEdit {
	pub(crate) fn insert(start: Position, end: Position, text: impl Into<String>) -> Self {
		Self {
			start,
			end,
			kind: EditKind::Insert(text.into()),
		}
	}

	pub(crate) fn delete(start: Position, end: Position) -> Self {
		Self {
			start,
			end,
			kind: EditKind::Delete,
		}
	}

	fn line_delta(&self) -> usize {
		self.end.line.saturating_sub(self.start.line)
	}
}

/// Everything a worker reads but never replaces.
struct Collaborators<T: Tokenizer, B> {
	tokenizer: Arc<T>,
	blocks: Arc<dyn BlockComputer<B>>,
	shared: Arc<Shared<T::State>>,
	link: Arc<WorkerLink<T::State>>,
}

impl<T: Tokenizer, B: TextBuffer> Collaborators<T, B> {
	/// Tokenizes one line and records the exit state with the tokenizer.
	fn tokenize(&self, text: &B, line: usize, state: &T::State) -> Result<(T::State, Vec<Span>)> {
		let content = text.line(line).unwrap_or_default();
		let mut result = self.tokenizer.tokenize_line(&content, state, line)?;
		self.shared.metrics.record_line();
		let spans = match result.spans.take() {
			Some(spans) => spans,
			None => self.tokenizer.generate_spans_for_line(&result),
		};
		self.tokenizer.on_add_state(&result.state);
		Ok((result.state, spans))
	}

	/// State entering `line`.
	fn entry_state(&self, line: usize) -> T::State {
		line.checked_sub(1)
			.and_then(|prev| self.link.state(prev))
			.unwrap_or_else(|| self.tokenizer.initial_state())
	}
}

pub(crate) struct Worker<T: Tokenizer, B: TextBuffer> {
	ctx: Collaborators<T, B>,
	/// Replayed copy of the host text; `None` after the copy diverged.
	shadow: Option<B>,
	/// Spans aligned with the recorded states.
	store: Option<Arc<SpanStore>>,
	resume: ResumeSet,
	/// Recorded states are complete and trustworthy.
	analyzed: bool,
	/// `store` was delivered through `set_styles`.
	announced: bool,
	/// Lines changed since the last publication.
	dirty: Option<LineRange>,
}

impl<T: Tokenizer, B: TextBuffer> Worker<T, B> {
	pub(crate) fn new(
		tokenizer: Arc<T>,
		blocks: Arc<dyn BlockComputer<B>>,
		shared: Arc<Shared<T::State>>,
		link: Arc<WorkerLink<T::State>>,
	) -> Self {
		Self {
			ctx: Collaborators {
				tokenizer,
				blocks,
				shared,
				link,
			},
			shadow: None,
			store: None,
			resume: ResumeSet::default(),
			analyzed: false,
			announced: false,
			dirty: None,
		}
	}

	/// Message loop; returns once aborted or once every sender is gone.
	pub(crate) fn run(mut self, mut rx: mpsc::UnboundedReceiver<Submitted<B>>) {
		let _ = self.ctx.link.thread.set(thread::current().id());
		let analyzer = self.ctx.shared.id.get();
		debug!(analyzer, "analysis.worker.start");
		while !self.ctx.link.abort.is_aborted() {
			let Some(Submitted { generation, message }) = rx.blocking_recv() else {
				break;
			};
			let _ = self.dispatch(generation, message);
		}
		debug!(analyzer, "analysis.worker.exit");
	}

	/// Handles one message, isolating collaborator failures and panics.
	///
	/// A message submitted before the latest one is stale from the start.
	pub(crate) fn dispatch(&mut self, generation: u64, message: Message<B>) -> Result<RunOutcome> {
		let ticket = self.ctx.shared.clock.ticket_at(generation, &self.ctx.link.abort);
		let started = Instant::now();
		let result = panic::catch_unwind(AssertUnwindSafe(|| self.handle(message, &ticket))).unwrap_or_else(|payload| {
			let reason = panic_message(payload.as_ref()).unwrap_or_else(|| "non-string panic payload".to_string());
			Err(AnalysisError::Panicked(reason))
		});

		let analyzer = self.ctx.shared.id.get();
		match &result {
			Ok(outcome) => {
				if *outcome == RunOutcome::Stale {
					debug!(analyzer, generation, "analysis.run.stale");
				}
				self.ctx.shared.metrics.record_outcome(*outcome, started.elapsed());
			}
			Err(error) => {
				warn!(analyzer, generation, %error, "analysis.run.failed");
				self.ctx.shared.metrics.record_failure();
				self.analyzed = false;
				self.resume.clear();
			}
		}
		result
	}

	fn handle(&mut self, message: Message<B>, ticket: &RunTicket) -> Result<RunOutcome> {
		match message {
			Message::Analyze(text) => {
				self.shadow = Some(text);
				self.analyzed = false;
				if ticket.is_stale() {
					return Ok(RunOutcome::Stale);
				}
				self.analyze_full(ticket)
			}
			Message::Edit(edit) => {
				if self.shadow.is_none() {
					return Ok(RunOutcome::Skipped);
				}
				self.apply_to_shadow(&edit)?;
				if self.analyzed {
					return self.analyze_edit(&edit, ticket);
				}
				if ticket.is_stale() {
					return Ok(RunOutcome::Replayed);
				}
				self.analyze_full(ticket)
			}
		}
	}

	/// Replays `edit` onto the shadow text. On mismatch the shadow is dropped
	/// and the worker idles until the next reset.
	fn apply_to_shadow(&mut self, edit: &TextEdit) -> Result<()> {
		let Some(shadow) = self.shadow.as_mut() else {
			return Ok(());
		};
		let applied = match &edit.kind {
			EditKind::Insert(text) => match shadow.insert(edit.start, text) {
				Ok(actual) if actual == edit.end => Ok(()),
				Ok(actual) => Err(AnalysisError::ShadowDiverged {
					expected: edit.end,
					actual,
				}),
				Err(error) => Err(error.into()),
			},
			EditKind::Delete => shadow.delete(edit.start, edit.end).map_err(AnalysisError::from),
		};
		if let Err(error) = applied {
			warn!(analyzer = self.ctx.shared.id.get(), start = %edit.start, end = %edit.end, %error, "analysis.shadow.diverged");
			self.shadow = None;
			self.store = None;
			self.announced = false;
			return Err(error);
		}
		Ok(())
	}

	fn analyze_full(&mut self, ticket: &RunTicket) -> Result<RunOutcome> {
		let Some(text) = self.shadow.as_ref() else {
			return Ok(RunOutcome::Skipped);
		};
		let ctx = &self.ctx;
		ctx.shared.metrics.record_full_run();
		self.analyzed = false;
		self.resume.clear();
		for state in ctx.link.take_states() {
			ctx.tokenizer.on_abandon_state(state);
		}

		let store = Arc::new(SpanStore::with_timeouts(ctx.shared.config.read_timeouts()));
		let modifier = store.modify();
		let line_count = text.line_count();
		let mut state = ctx.tokenizer.initial_state();
		for line in 0..line_count {
			if ticket.is_stale() {
				return Ok(RunOutcome::Stale);
			}
			let (exit, spans) = ctx.tokenize(text, line, &state)?;
			ctx.link.push_state(exit.clone());
			modifier.add_line_at(line, spans);
			state = exit;
		}
		trace!(analyzer = ctx.shared.id.get(), lines = line_count, "analysis.run.full");

		self.store = Some(store);
		self.analyzed = true;
		self.announced = false;
		self.dirty = None;
		self.publish(None, ticket)
	}

	fn analyze_edit(&mut self, edit: &TextEdit, ticket: &RunTicket) -> Result<RunOutcome> {
		let (Some(text), Some(store)) = (self.shadow.as_ref(), self.store.clone()) else {
			return Ok(RunOutcome::Skipped);
		};
		self.ctx.shared.metrics.record_edit_run();
		let first = edit.start.line;
		let last = edit.end.line;

		self.dirty = self.dirty.map(|dirty| match edit.kind {
			EditKind::Insert(_) => dirty.after_insert(first, edit.line_delta()),
			EditKind::Delete => dirty.after_collapse(first, last),
		});

		let scanned = {
			let mut scan = Scan {
				ctx: &self.ctx,
				text,
				spans: store.modify(),
				resume: &mut self.resume,
				ticket,
			};
			match &edit.kind {
				EditKind::Insert(inserted) => scan.insert(edit.start, edit.end, inserted)?,
				EditKind::Delete => scan.delete(first, last)?,
			}
		};
		trace!(
			analyzer = self.ctx.shared.id.get(),
			start = %edit.start,
			end = %edit.end,
			changed = ?scanned.changed,
			interrupted = scanned.interrupted,
			"analysis.run.edit"
		);
		debug_assert_eq!(self.ctx.link.state_count(), text.line_count());

		let changed = self.dirty.take().map_or(scanned.changed, |dirty| dirty.union(scanned.changed));
		if scanned.interrupted {
			self.dirty = Some(changed);
			return Ok(RunOutcome::Stale);
		}
		self.publish(Some(changed), ticket)
	}

	/// Computes blocks and hands a new snapshot to the receiver.
	///
	/// `changed` is `None` after a full analysis. Publishes nothing once the
	/// run is stale; the host keeps the previous blocks.
	fn publish(&mut self, changed: Option<LineRange>, ticket: &RunTicket) -> Result<RunOutcome> {
		let (Some(text), Some(store)) = (self.shadow.as_ref(), self.store.as_ref()) else {
			return Ok(RunOutcome::Skipped);
		};
		if ticket.is_stale() {
			defer_changes(&mut self.dirty, changed);
			return Ok(RunOutcome::Stale);
		}

		let mut delegate = BlockDelegate::new(ticket.clone());
		let blocks = self.ctx.blocks.compute_blocks(text, &mut delegate)?;

		let mut styles = Styles::new(Arc::clone(store));
		styles.blocks = blocks;
		styles.suppress_switch = self.ctx.shared.config.cap_suppress_switch(delegate.suppress_switch());
		styles.finish_building();
		let styles = Arc::new(styles);

		let receiver = self.ctx.shared.receiver();
		// Checked as late as possible; a reset landing after this check can
		// still see these styles delivered after its empty styles.
		if delegate.is_cancelled() {
			defer_changes(&mut self.dirty, changed);
			return Ok(RunOutcome::Stale);
		}
		// Without a receiver the next delivery goes out through set_styles.
		let Some(receiver) = receiver else {
			return Ok(RunOutcome::Published);
		};
		let source = self.ctx.shared.id;
		match changed {
			Some(range) if self.announced => receiver.update_styles(source, styles, range),
			_ => receiver.set_styles(source, Some(styles), None),
		}
		self.announced = true;
		Ok(RunOutcome::Published)
	}
}

/// Keeps lines changed by an unpublished run for the next publication.
fn defer_changes(dirty: &mut Option<LineRange>, changed: Option<LineRange>) {
	if let Some(changed) = changed {
		*dirty = Some(dirty.map_or(changed, |dirty| dirty.union(changed)));
	}
}

/// Where an edit scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScanEnd {
	changed: LineRange,
	/// The run went stale before the states converged.
	interrupted: bool,
}

/// One edit's pass over states and spans.
struct Scan<'a, T: Tokenizer, B> {
	ctx: &'a Collaborators<T, B>,
	text: &'a B,
	spans: Modifier<'a>,
	resume: &'a mut ResumeSet,
	ticket: &'a RunTicket,
}

impl<T: Tokenizer, B: TextBuffer> Scan<'_, T, B> {
	fn tokenize(&self, line: usize, state: &T::State) -> Result<(T::State, Vec<Span>)> {
		self.ctx.tokenize(self.text, line, state)
	}

	fn same_state(&self, a: &T::State, b: Option<&T::State>) -> bool {
		b.is_some_and(|b| self.ctx.tokenizer.state_equals(a, b))
	}

	/// Text inserted from `start` to `end`, already applied to the shadow.
	fn insert(&mut self, start: Position, end: Position, inserted: &str) -> Result<ScanEnd> {
		let first = start.line;
		let last = end.line;
		let delta = last - first;
		let ctx = self.ctx;
		let link = &ctx.link;

		if delta > 0 && start.column == 0 && end.column == 0 {
			// Whole lines above an untouched line: that line only moves.
			self.resume.shift_from(first, delta);
			let entry = ctx.entry_state(first);
			let mut state = entry.clone();
			for line in first..last {
				let (exit, spans) = self.tokenize(line, &state)?;
				link.insert_state(line, exit.clone());
				self.spans.add_line_at(line, spans);
				state = exit;
			}
			let changed = LineRange::new(first, last);
			if self.same_state(&state, Some(&entry)) && !self.resume.contains(last) {
				return self.settle(changed);
			}
			return self.converge(last, state, changed);
		}

		let old_exit = link.state(first);
		// Text starting with a line break at the end of a line leaves that line as it was.
		let head_unchanged =
			delta > 0 && inserted.starts_with(is_line_break) && self.text.line_len(last) == Some(end.column);
		self.resume.shift_after(first, delta);

		let from = if head_unchanged { first + 1 } else { first };
		let mut state = ctx.entry_state(from);
		for line in from..=last {
			let (exit, spans) = self.tokenize(line, &state)?;
			if line == first {
				if let Some(previous) = link.replace_state(line, exit.clone()) {
					ctx.tokenizer.on_replace_state(previous);
				}
				self.spans.set_spans_on_line(line, spans);
				self.resume.remove(line);
			} else {
				link.insert_state(line, exit.clone());
				self.spans.add_line_at(line, spans);
			}
			state = exit;
		}

		let changed = LineRange::new(from, last + 1);
		if self.same_state(&state, old_exit.as_ref()) && !self.resume.contains(last + 1) {
			return self.settle(changed);
		}
		self.converge(last + 1, state, changed)
	}

	/// Text from `first` to `last` removed; the shadow already holds the joined line.
	fn delete(&mut self, first: usize, last: usize) -> Result<ScanEnd> {
		if last > first {
			self.resume.collapse(first, last);
			// The joined line ends like old line `last`, so that record stays.
			for state in self.ctx.link.drain_states(first..last) {
				self.ctx.tokenizer.on_abandon_state(state);
			}
			for _ in first..last {
				self.spans.delete_line_at(first + 1);
			}
		}
		let entry = self.ctx.entry_state(first);
		self.converge(first, entry, LineRange::new(first, first + 1))
	}

	/// Continues at the earliest pending line, if an earlier scan left any.
	fn settle(&mut self, changed: LineRange) -> Result<ScanEnd> {
		self.resume.truncate(self.text.line_count());
		match self.resume.first() {
			Some(next) => {
				let entry = self.ctx.entry_state(next);
				self.converge(next, entry, changed)
			}
			None => Ok(ScanEnd {
				changed,
				interrupted: false,
			}),
		}
	}

	/// Re-tokenizes from `line` until a recomputed exit state equals the
	/// recorded one and the next line is not pending, then moves on to the
	/// earliest pending line until none is left.
	fn converge(&mut self, mut line: usize, mut state: T::State, mut changed: LineRange) -> Result<ScanEnd> {
		let line_count = self.text.line_count();
		self.resume.truncate(line_count);
		loop {
			let converged = if line >= line_count {
				true
			} else {
				if self.ticket.is_stale() {
					self.resume.insert(line);
					return Ok(ScanEnd {
						changed,
						interrupted: true,
					});
				}
				let (exit, spans) = self.tokenize(line, &state)?;
				let recorded = self.ctx.link.replace_state(line, exit.clone());
				self.spans.set_spans_on_line(line, spans);
				self.resume.remove(line);
				changed = changed.union(LineRange::new(line, line + 1));
				let converged = self.same_state(&exit, recorded.as_ref()) && !self.resume.contains(line + 1);
				if let Some(previous) = recorded {
					self.ctx.tokenizer.on_replace_state(previous);
				}
				line += 1;
				state = exit;
				converged
			};

			if converged {
				let Some(next) = self.resume.first() else {
					return Ok(ScanEnd {
						changed,
						interrupted: false,
					});
				};
				line = next;
				state = self.ctx.entry_state(next);
			}
		}
	}
}
