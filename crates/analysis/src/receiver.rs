//! Publication surface between the analysis worker and the host.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use crate::styles::Styles;

/// Identity of one coordinator, attached to every publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnalyzerId(u64);

impl AnalyzerId {
	pub(crate) fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}

	pub const fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for AnalyzerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "analyzer#{}", self.0)
	}
}

/// Half-open range of lines, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
	pub start: usize,
	pub end: usize,
}

impl LineRange {
	pub const fn new(start: usize, end: usize) -> Self {
		Self { start, end }
	}

	pub const fn len(&self) -> usize {
		self.end.saturating_sub(self.start)
	}

	pub const fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub const fn contains(&self, line: usize) -> bool {
		self.start <= line && line < self.end
	}

	/// Smallest range covering both.
	#[must_use]
	pub fn union(self, other: Self) -> Self {
		Self::new(self.start.min(other.start), self.end.max(other.end))
	}

	/// Follows the lines of this range across `delta` lines inserted after `line`.
	pub(crate) fn after_insert(self, line: usize, delta: usize) -> Self {
		let shift = |bound: usize| if bound > line { bound + delta } else { bound };
		Self::new(shift(self.start), shift(self.end))
	}

	/// Follows the lines of this range across lines `first + 1..=last` being
	/// merged into `first`.
	pub(crate) fn after_collapse(self, first: usize, last: usize) -> Self {
		let delta = last.saturating_sub(first);
		let start = if self.start > last {
			self.start - delta
		} else {
			self.start.min(first)
		};
		let end = if self.end > last + 1 {
			self.end - delta
		} else {
			self.end.min(first + 1)
		};
		Self::new(start, end.max(start))
	}
}

/// Work the host should run on its own thread after adopting new styles.
pub type MainThreadAction = Box<dyn FnOnce() + Send>;

/// Host-side consumer of analysis results.
///
/// Called from the analysis worker thread; implementations hand the
/// snapshot over to their own thread and return quickly.
pub trait StyleReceiver: Send + Sync {
	/// Replaces all styles. `None` means no styles are available yet.
	fn set_styles(&self, source: AnalyzerId, styles: Option<Arc<Styles>>, action: Option<MainThreadAction>);

	/// Reports that `range` changed in a new snapshot of the current styles.
	fn update_styles(&self, source: AnalyzerId, styles: Arc<Styles>, range: LineRange);
}

/// A publication forwarded by [`ChannelReceiver`].
pub enum StyleEvent {
	Replaced {
		source: AnalyzerId,
		styles: Option<Arc<Styles>>,
		action: Option<MainThreadAction>,
	},
	Updated {
		source: AnalyzerId,
		styles: Arc<Styles>,
		range: LineRange,
	},
}

impl StyleEvent {
	pub fn source(&self) -> AnalyzerId {
		match self {
			Self::Replaced { source, .. } | Self::Updated { source, .. } => *source,
		}
	}

	/// The published styles, `None` for a reset.
	pub fn styles(&self) -> Option<&Arc<Styles>> {
		match self {
			Self::Replaced { styles, .. } => styles.as_ref(),
			Self::Updated { styles, .. } => Some(styles),
		}
	}
}

impl fmt::Debug for StyleEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Replaced { source, styles, action } => f
				.debug_struct("Replaced")
				.field("source", source)
				.field("styles", &styles.is_some())
				.field("action", &action.is_some())
				.finish(),
			Self::Updated { source, range, .. } => f
				.debug_struct("Updated")
				.field("source", source)
				.field("range", range)
				.finish(),
		}
	}
}

/// Receiver that forwards every publication into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelReceiver {
	tx: mpsc::UnboundedSender<StyleEvent>,
}

impl ChannelReceiver {
	pub fn new() -> (Self, mpsc::UnboundedReceiver<StyleEvent>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}
}

impl StyleReceiver for ChannelReceiver {
	fn set_styles(&self, source: AnalyzerId, styles: Option<Arc<Styles>>, action: Option<MainThreadAction>) {
		// A closed channel means the host stopped listening.
		let _ = self.tx.send(StyleEvent::Replaced { source, styles, action });
	}

	fn update_styles(&self, source: AnalyzerId, styles: Arc<Styles>, range: LineRange) {
		let _ = self.tx.send(StyleEvent::Updated { source, styles, range });
	}
}
