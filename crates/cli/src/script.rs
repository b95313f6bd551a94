//! Edit scripts: a TOML list of inserts and deletes replayed in order.
//!
//! ```toml
//! [[edit]]
//! kind = "insert"
//! at = [1, 0]
//! text = "int c;\n"
//!
//! [[edit]]
//! kind = "delete"
//! start = [2, 8]
//! end = [5, 6]
//! ```

use std::fmt;
use std::path::Path;

use anyhow::Context;
use quill_primitives::Position;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditScript {
	#[serde(default, rename = "edit")]
	pub edits: Vec<ScriptEdit>,
}

/// One scripted edit; positions are `[line, column]`, zero-based.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScriptEdit {
	Insert { at: [usize; 2], text: String },
	Delete { start: [usize; 2], end: [usize; 2] },
}

impl ScriptEdit {
	pub fn start(&self) -> Position {
		match self {
			Self::Insert { at, .. } => position(*at),
			Self::Delete { start, .. } => position(*start),
		}
	}
}

impl fmt::Display for ScriptEdit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Insert { at, text } => write!(f, "insert {:?} at {}", text, position(*at)),
			Self::Delete { start, end } => write!(f, "delete {}..{}", position(*start), position(*end)),
		}
	}
}

pub fn position([line, column]: [usize; 2]) -> Position {
	Position::new(line, column)
}

impl EditScript {
	pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
		Ok(toml::from_str(input)?)
	}

	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let input =
			std::fs::read_to_string(path).with_context(|| format!("reading edit script {}", path.display()))?;
		Self::from_toml_str(&input).with_context(|| format!("parsing edit script {}", path.display()))
	}
}
