//! Host-facing entry point: turns edit notifications into worker messages.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use quill_primitives::{ContentRef, Position, RopeBuffer, TextBuffer};
use quill_worker::spawn_named_thread;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::block::BlockComputer;
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};
use crate::metrics::MetricsSnapshot;
use crate::receiver::{AnalyzerId, StyleReceiver};
use crate::tokenizer::Tokenizer;
use crate::worker::{Message, Shared, Submitted, TextEdit, Worker, WorkerLink};

/// Sequence for worker thread names, shared by every coordinator.
static NEXT_WORKER: AtomicU64 = AtomicU64::new(1);

struct LiveWorker<S, B> {
	tx: mpsc::UnboundedSender<Submitted<B>>,
	link: Arc<WorkerLink<S>>,
}

/// Drives background analysis of one text.
///
/// Every method returns immediately; the work happens on a dedicated worker
/// thread that is replaced on each [`reset`](Self::reset). Results reach the
/// [`StyleReceiver`] set with [`set_receiver`](Self::set_receiver).
pub struct AnalysisCoordinator<T: Tokenizer, B: TextBuffer = RopeBuffer> {
	shared: Arc<Shared<T::State>>,
	tokenizer: Arc<T>,
	blocks: Arc<dyn BlockComputer<B>>,
	content: Option<Arc<dyn ContentRef<B>>>,
	live: Option<LiveWorker<T::State, B>>,
}

impl<T: Tokenizer, B: TextBuffer> AnalysisCoordinator<T, B> {
	pub fn new(tokenizer: Arc<T>, blocks: Arc<dyn BlockComputer<B>>, config: AnalyzerConfig) -> Self {
		Self {
			shared: Arc::new(Shared::new(config)),
			tokenizer,
			blocks,
			content: None,
			live: None,
		}
	}

	pub fn id(&self) -> AnalyzerId {
		self.shared.id
	}

	pub fn config(&self) -> &AnalyzerConfig {
		&self.shared.config
	}

	pub fn metrics(&self) -> MetricsSnapshot {
		self.shared.metrics.snapshot()
	}

	/// Sets or clears the receiver. Publications made while none is set are lost.
	pub fn set_receiver(&self, receiver: Option<Arc<dyn StyleReceiver>>) {
		*self.shared.receiver.write() = receiver;
	}

	/// Starts over on `content`: retires the current worker, publishes empty
	/// styles and spawns a fresh worker on a snapshot of the text.
	pub fn reset(&mut self, content: Arc<dyn ContentRef<B>>) -> Result<()> {
		self.content = Some(content);
		self.rerun()
	}

	/// Re-analyzes the last content passed to [`reset`](Self::reset). Does
	/// nothing before the first reset.
	pub fn rerun(&mut self) -> Result<()> {
		let Some(content) = self.content.clone() else {
			return Ok(());
		};
		self.retire_worker();

		let link = Arc::new(WorkerLink::new());
		let (tx, rx) = mpsc::unbounded_channel();
		let generation = self.shared.clock.bump();
		let _ = tx.send(Submitted {
			generation,
			message: Message::Analyze(content.snapshot()),
		});
		if let Some(receiver) = self.shared.receiver() {
			receiver.set_styles(self.shared.id, None, None);
		}

		let worker = Worker::new(
			Arc::clone(&self.tokenizer),
			Arc::clone(&self.blocks),
			Arc::clone(&self.shared),
			Arc::clone(&link),
		);
		let name = format!("{}-{}", self.shared.config.thread_name_prefix, NEXT_WORKER.fetch_add(1, Ordering::Relaxed));
		debug!(analyzer = self.shared.id.get(), thread = %name, "analysis.coordinator.reset");
		// Visible before the first line is tokenized, for tokenizers reading states.
		*self.shared.live.write() = Some(Arc::clone(&link));
		if let Err(error) = spawn_named_thread(name, move || worker.run(rx)) {
			*self.shared.live.write() = None;
			return Err(AnalysisError::Spawn(error));
		}
		self.live = Some(LiveWorker { tx, link });
		Ok(())
	}

	/// Reports text inserted between `start` and `end`, where `end` is the
	/// position just past the inserted text in the live buffer.
	pub fn insert(&self, start: Position, end: Position, text: &str) {
		self.send(TextEdit::insert(start, end, text));
	}

	/// Reports the text between `start` and `end` removed from the live buffer.
	pub fn delete(&self, start: Position, end: Position, deleted: &str) {
		trace!(analyzer = self.shared.id.get(), chars = deleted.chars().count(), "analysis.coordinator.delete");
		self.send(TextEdit::delete(start, end));
	}

	fn send(&self, edit: TextEdit) {
		let Some(live) = &self.live else {
			return;
		};
		let generation = self.shared.clock.bump();
		let message = Message::Edit(edit);
		if live.tx.send(Submitted { generation, message }).is_err() {
			trace!(analyzer = self.shared.id.get(), "analysis.coordinator.worker_gone");
		}
	}

	/// Stops the worker and detaches the receiver. The coordinator can be
	/// reused with another [`reset`](Self::reset).
	pub fn destroy(&mut self) {
		self.retire_worker();
		self.content = None;
		*self.shared.receiver.write() = None;
	}

	/// Line state of `line`; see [`StateAccess::get_state`].
	pub fn get_state(&self, line: usize) -> Result<Option<T::State>> {
		self.shared.state_on_worker(line)
	}

	/// A handle a tokenizer can keep to read line states while it runs.
	pub fn state_access(&self) -> StateAccess<T::State> {
		StateAccess {
			shared: Arc::clone(&self.shared),
		}
	}

	fn retire_worker(&mut self) {
		let Some(live) = self.live.take() else {
			return;
		};
		live.link.abort.abort();
		let mut current = self.shared.live.write();
		if current.as_ref().is_some_and(|link| Arc::ptr_eq(link, &live.link)) {
			*current = None;
		}
		// Dropping the sender wakes an idle worker so it can exit.
		drop(live.tx);
	}
}

impl<T: Tokenizer, B: TextBuffer> Drop for AnalysisCoordinator<T, B> {
	fn drop(&mut self) {
		self.destroy();
	}
}

/// Read access to the line states of a coordinator's live worker.
pub struct StateAccess<S> {
	shared: Arc<Shared<S>>,
}

impl<S> Clone for StateAccess<S> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
		}
	}
}

impl<S: Clone> StateAccess<S> {
	/// Exit state recorded for `line`, or `None` past the recorded lines.
	///
	/// Only valid on the live worker thread, where the states cannot change
	/// underneath the caller; anywhere else this fails with
	/// [`AnalysisError::NotWorkerThread`].
	pub fn get_state(&self, line: usize) -> Result<Option<S>> {
		self.shared.state_on_worker(line)
	}
}
