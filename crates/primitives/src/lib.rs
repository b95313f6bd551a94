//! Core text types shared by the analysis engine: positions, the
//! line-addressable buffer abstraction, and a rope-backed implementation.

/// Line-addressable buffer abstraction and live-content handles.
pub mod buffer;
/// Line/column positions.
pub mod position;
/// Rope-backed buffer and rope utilities.
pub mod rope;

pub use buffer::{ContentRef, EditError, TextBuffer};
pub use position::{CharIdx, Position};
pub use rope::{RopeBuffer, is_line_break, visible_line_count};
pub use ropey::{Rope, RopeSlice};
