//! State shared between a coordinator and the worker it spawned.

use std::ops::Range;
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, RwLock};
use quill_worker::{AbortToken, GenerationClock};

use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};
use crate::metrics::AnalysisMetrics;
use crate::receiver::{AnalyzerId, StyleReceiver};

/// One worker instance: its thread identity, abort flag and line states.
///
/// The state list is locked per operation and never across a collaborator
/// call, so a tokenizer may read states while it runs.
pub(crate) struct WorkerLink<S> {
	pub(crate) thread: OnceLock<ThreadId>,
	pub(crate) abort: AbortToken,
	states: Mutex<Vec<S>>,
}

impl<S: Clone> WorkerLink<S> {
	pub(crate) fn new() -> Self {
		Self {
			thread: OnceLock::new(),
			abort: AbortToken::new(),
			states: Mutex::new(Vec::new()),
		}
	}

	pub(crate) fn state(&self, line: usize) -> Option<S> {
		self.states.lock().get(line).cloned()
	}

	pub(crate) fn state_count(&self) -> usize {
		self.states.lock().len()
	}

	pub(crate) fn push_state(&self, state: S) {
		self.states.lock().push(state);
	}

	/// Overwrites the state of `line`, returning the previous one. Appends
	/// when `line` is past the end.
	pub(crate) fn replace_state(&self, line: usize, state: S) -> Option<S> {
		let mut states = self.states.lock();
		match states.get_mut(line) {
			Some(slot) => Some(std::mem::replace(slot, state)),
			None => {
				states.push(state);
				None
			}
		}
	}

	pub(crate) fn insert_state(&self, line: usize, state: S) {
		let mut states = self.states.lock();
		let at = line.min(states.len());
		states.insert(at, state);
	}

	pub(crate) fn drain_states(&self, lines: Range<usize>) -> Vec<S> {
		let mut states = self.states.lock();
		let end = lines.end.min(states.len());
		let start = lines.start.min(end);
		states.drain(start..end).collect()
	}

	pub(crate) fn take_states(&self) -> Vec<S> {
		std::mem::take(&mut *self.states.lock())
	}

	#[cfg(test)]
	pub(crate) fn states(&self) -> Vec<S> {
		self.states.lock().clone()
	}
}

/// Coordinator-wide state every worker it spawns can see.
pub(crate) struct Shared<S> {
	pub(crate) id: AnalyzerId,
	pub(crate) clock: GenerationClock,
	pub(crate) config: AnalyzerConfig,
	pub(crate) metrics: AnalysisMetrics,
	pub(crate) receiver: RwLock<Option<Arc<dyn StyleReceiver>>>,
	/// The current worker; replaced on every reset.
	pub(crate) live: RwLock<Option<Arc<WorkerLink<S>>>>,
}

impl<S: Clone> Shared<S> {
	pub(crate) fn new(config: AnalyzerConfig) -> Self {
		Self {
			id: AnalyzerId::next(),
			clock: GenerationClock::new(),
			config,
			metrics: AnalysisMetrics::new(),
			receiver: RwLock::new(None),
			live: RwLock::new(None),
		}
	}

	pub(crate) fn receiver(&self) -> Option<Arc<dyn StyleReceiver>> {
		self.receiver.read().clone()
	}

	/// Reads a line state; only the live worker's own thread may do this.
	pub(crate) fn state_on_worker(&self, line: usize) -> Result<Option<S>> {
		let link = self.live.read().clone().ok_or(AnalysisError::NotWorkerThread)?;
		if link.thread.get() != Some(&thread::current().id()) {
			return Err(AnalysisError::NotWorkerThread);
		}
		Ok(link.state(line))
	}
}
