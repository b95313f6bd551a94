//! Analyzer tuning knobs, loadable from TOML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::store::ReadTimeouts;

/// Configuration for one [`crate::AnalysisCoordinator`].
///
/// Every field has a default, so an empty document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
	/// Worker threads are named `{prefix}-{n}`.
	pub thread_name_prefix: String,
	/// Bound on the structural-lock wait when a reader moves to a line.
	pub line_lock_timeout_us: u64,
	/// Bound on the structural-lock wait when a reader copies a line.
	pub spans_lock_timeout_us: u64,
	/// Upper limit applied to the suppress switch a block computer reports.
	pub suppress_switch_cap: Option<usize>,
}

impl Default for AnalyzerConfig {
	fn default() -> Self {
		let timeouts = ReadTimeouts::default();
		Self {
			thread_name_prefix: "quill-analyzer".to_string(),
			line_lock_timeout_us: timeouts.line_lock.as_micros() as u64,
			spans_lock_timeout_us: timeouts.spans_lock.as_micros() as u64,
			suppress_switch_cap: None,
		}
	}
}

impl AnalyzerConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads and parses a TOML file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.thread_name_prefix.trim().is_empty() {
			return Err(ConfigError::Invalid {
				field: "thread_name_prefix",
				reason: "must not be empty".to_string(),
			});
		}
		if self.suppress_switch_cap == Some(0) {
			return Err(ConfigError::Invalid {
				field: "suppress_switch_cap",
				reason: "must be at least 1".to_string(),
			});
		}
		Ok(())
	}

	pub fn read_timeouts(&self) -> ReadTimeouts {
		ReadTimeouts {
			line_lock: Duration::from_micros(self.line_lock_timeout_us),
			spans_lock: Duration::from_micros(self.spans_lock_timeout_us),
		}
	}

	/// Applies `suppress_switch_cap` to a value reported by a block computer.
	pub fn cap_suppress_switch(&self, reported: usize) -> usize {
		self.suppress_switch_cap.map_or(reported, |cap| reported.min(cap))
	}
}
