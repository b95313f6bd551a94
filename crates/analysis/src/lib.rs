//! Incremental, cancellable background analysis of line-oriented text.
//!
//! * [`AnalysisCoordinator`]: host-facing entry point, one per open text.
//! * [`Tokenizer`]: language collaborator producing per-line spans and exit states.
//! * [`BlockComputer`]: language collaborator producing structural blocks.
//! * [`SpanStore`]: spans shared with render threads under bounded-wait reads.
//! * [`Styles`] / [`StyleReceiver`]: what gets published and who receives it.
//!
//! After an edit only the lines whose entry state changed are re-tokenized:
//! the scan stops at the first line whose recomputed exit state equals the
//! recorded one. Every edit supersedes in-flight work, so the host only ever
//! sees results for the latest text.

mod block;
mod config;
mod coordinator;
mod error;
mod metrics;
mod receiver;
mod span;
mod store;
mod styles;
mod tokenizer;
mod worker;

// Used by the integration tests only.
#[cfg(test)]
use tracing_subscriber as _;

pub use block::{BlockComputer, BlockDelegate, CodeBlock, NoBlocks, binary_search_end_block};
pub use config::AnalyzerConfig;
pub use coordinator::{AnalysisCoordinator, StateAccess};
pub use error::{AnalysisError, CollaboratorError, ConfigError, Result};
pub use metrics::{AnalysisMetrics, MetricsSnapshot, RunOutcome};
pub use receiver::{AnalyzerId, ChannelReceiver, LineRange, MainThreadAction, StyleEvent, StyleReceiver};
pub use span::{DEFAULT_LINE, Span, SpanFlags, StyleId, normalize_line};
pub use store::{Modifier, ReadTimeouts, Reader, SpanStore};
pub use styles::Styles;
pub use tokenizer::{LineTokenizeResult, Tokenizer};
