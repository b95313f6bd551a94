//! Run counters for one coordinator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

/// Smoothing factor for the run-duration moving average.
const EMA_ALPHA: f64 = 0.2;

#[derive(Debug, Clone, Copy, Default)]
struct Ema {
	value: f64,
	initialized: bool,
}

impl Ema {
	fn update(&mut self, next: f64) {
		if self.initialized {
			self.value = EMA_ALPHA * next + (1.0 - EMA_ALPHA) * self.value;
		} else {
			self.value = next;
			self.initialized = true;
		}
	}
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
	/// Results were handed to the receiver.
	Published,
	/// A newer message or an abort superseded the run.
	Stale,
	/// The text changed while analysis was invalid; only the shadow copy was updated.
	Replayed,
	/// No text to analyze until the next reset.
	Skipped,
}

/// Counters shared by every worker a coordinator spawns.
#[derive(Debug, Default)]
pub struct AnalysisMetrics {
	full_runs: AtomicU64,
	edit_runs: AtomicU64,
	published: AtomicU64,
	stale: AtomicU64,
	replayed: AtomicU64,
	skipped: AtomicU64,
	failed: AtomicU64,
	lines_tokenized: AtomicU64,
	run_ms: Mutex<Ema>,
}

impl AnalysisMetrics {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn record_full_run(&self) {
		self.full_runs.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_edit_run(&self) {
		self.edit_runs.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_line(&self) {
		self.lines_tokenized.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_outcome(&self, outcome: RunOutcome, elapsed: Duration) {
		let counter = match outcome {
			RunOutcome::Published => &self.published,
			RunOutcome::Stale => &self.stale,
			RunOutcome::Replayed => &self.replayed,
			RunOutcome::Skipped => &self.skipped,
		};
		counter.fetch_add(1, Ordering::Relaxed);
		if outcome == RunOutcome::Published {
			self.run_ms.lock().update(elapsed.as_secs_f64() * 1000.0);
		}
	}

	pub(crate) fn record_failure(&self) {
		self.failed.fetch_add(1, Ordering::Relaxed);
	}

	pub fn snapshot(&self) -> MetricsSnapshot {
		let run_ms = *self.run_ms.lock();
		MetricsSnapshot {
			full_runs: self.full_runs.load(Ordering::Relaxed),
			edit_runs: self.edit_runs.load(Ordering::Relaxed),
			published: self.published.load(Ordering::Relaxed),
			stale: self.stale.load(Ordering::Relaxed),
			replayed: self.replayed.load(Ordering::Relaxed),
			skipped: self.skipped.load(Ordering::Relaxed),
			failed: self.failed.load(Ordering::Relaxed),
			lines_tokenized: self.lines_tokenized.load(Ordering::Relaxed),
			avg_published_run: run_ms.initialized.then(|| Duration::from_secs_f64(run_ms.value / 1000.0)),
		}
	}
}

/// Point-in-time copy of [`AnalysisMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsSnapshot {
	/// Runs that analyzed the whole text.
	pub full_runs: u64,
	/// Runs that patched an existing analysis after one edit.
	pub edit_runs: u64,
	pub published: u64,
	pub stale: u64,
	pub replayed: u64,
	pub skipped: u64,
	/// Runs that hit a collaborator error or panic.
	pub failed: u64,
	pub lines_tokenized: u64,
	/// Moving average duration of published runs.
	pub avg_published_run: Option<Duration>,
}
