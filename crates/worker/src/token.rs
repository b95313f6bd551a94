use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Monotonic generation counter shared between a producer and its worker.
///
/// The producer bumps it for every submitted piece of work; a run that sees
/// a different value than the one it captured has been superseded.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	current: Arc<AtomicU64>,
}

impl GenerationClock {
	/// Creates a clock at generation 0.
	pub fn new() -> Self {
		Self::default()
	}

	/// Advances the clock and returns the new generation.
	pub fn bump(&self) -> u64 {
		self.current.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}

	/// Returns the current generation.
	pub fn current(&self) -> u64 {
		self.current.load(Ordering::Acquire)
	}

	/// Captures the current generation for a run guarded by `abort`.
	pub fn ticket(&self, abort: &AbortToken) -> RunTicket {
		self.ticket_at(self.current(), abort)
	}

	/// Ticket for work submitted at `generation`; already stale when the
	/// clock has moved past it.
	pub fn ticket_at(&self, generation: u64, abort: &AbortToken) -> RunTicket {
		RunTicket {
			generation,
			clock: self.clone(),
			abort: abort.clone(),
		}
	}
}

/// Terminal abort flag for one worker instance.
#[derive(Debug, Default, Clone)]
pub struct AbortToken {
	cancel: CancellationToken,
}

impl AbortToken {
	pub fn new() -> Self {
		Self::default()
	}

	/// Flags the worker aborted. Idempotent.
	pub fn abort(&self) {
		self.cancel.cancel();
	}

	pub fn is_aborted(&self) -> bool {
		self.cancel.is_cancelled()
	}
}

/// Generation captured at the start of a run.
#[derive(Debug, Clone)]
pub struct RunTicket {
	generation: u64,
	clock: GenerationClock,
	abort: AbortToken,
}

impl RunTicket {
	/// Generation this run was started under.
	pub const fn generation(&self) -> u64 {
		self.generation
	}

	/// Returns true when the worker was aborted or newer work was submitted.
	pub fn is_stale(&self) -> bool {
		self.abort.is_aborted() || self.clock.current() != self.generation
	}

	/// Returns true when the worker itself was aborted.
	pub fn is_aborted(&self) -> bool {
		self.abort.is_aborted()
	}
}
