use std::io;
use std::path::PathBuf;

use quill_primitives::{EditError, Position};
use thiserror::Error;

/// Failures reported by a tokenizer or block computer.
#[derive(Debug, Error)]
pub enum CollaboratorError {
	#[error("tokenizer failed on line {line}: {message}")]
	Tokenize { line: usize, message: String },

	#[error("block computation failed: {0}")]
	Blocks(String),

	#[error(transparent)]
	Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors surfaced by the analysis engine.
#[derive(Debug, Error)]
pub enum AnalysisError {
	/// Line states are only readable from the live analysis worker thread.
	#[error("line state accessed outside the live analysis worker thread")]
	NotWorkerThread,

	#[error(transparent)]
	Collaborator(#[from] CollaboratorError),

	/// An edit did not apply to the worker's shadow copy of the text.
	#[error("shadow edit rejected: {0}")]
	Edit(#[from] EditError),

	/// An insert ended somewhere else in the shadow copy than in the host text.
	#[error("shadow copy diverged: insert ended at {actual}, host reported {expected}")]
	ShadowDiverged { expected: Position, actual: Position },

	#[error("analysis collaborator panicked: {0}")]
	Panicked(String),

	#[error("failed to spawn analysis worker: {0}")]
	Spawn(#[source] io::Error),
}

/// Errors loading an [`crate::AnalyzerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: io::Error,
	},

	/// Error parsing TOML syntax or an unknown key.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// A value parsed but is out of range.
	#[error("invalid value for {field}: {reason}")]
	Invalid { field: &'static str, reason: String },
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
