//! Lines where an interrupted scan left the recorded states unverified.
//!
//! An entry `r` means the state recorded for line `r` may not be the result
//! of tokenizing line `r` from the state recorded for line `r - 1`. A scan
//! may only stop at line `k` when `k + 1` is not an entry.

use std::collections::BTreeSet;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ResumeSet {
	lines: BTreeSet<usize>,
}

impl ResumeSet {
	pub(crate) fn insert(&mut self, line: usize) {
		self.lines.insert(line);
	}

	pub(crate) fn remove(&mut self, line: usize) {
		self.lines.remove(&line);
	}

	pub(crate) fn contains(&self, line: usize) -> bool {
		self.lines.contains(&line)
	}

	pub(crate) fn clear(&mut self) {
		self.lines.clear();
	}

	/// Earliest pending line.
	pub(crate) fn first(&self) -> Option<usize> {
		self.lines.first().copied()
	}

	/// Moves entries at or after `line` down by `delta`.
	pub(crate) fn shift_from(&mut self, line: usize, delta: usize) {
		if delta == 0 {
			return;
		}
		let moved = self.lines.split_off(&line);
		self.lines.extend(moved.into_iter().map(|entry| entry + delta));
	}

	/// Moves entries after `line` down by `delta`.
	pub(crate) fn shift_after(&mut self, line: usize, delta: usize) {
		self.shift_from(line + 1, delta);
	}

	/// Lines `first + 1..=last` were merged into `first`: drops their entries
	/// and moves later entries up.
	pub(crate) fn collapse(&mut self, first: usize, last: usize) {
		if last <= first {
			return;
		}
		let mut tail = self.lines.split_off(&(first + 1));
		let moved = tail.split_off(&(last + 1));
		let delta = last - first;
		self.lines.extend(moved.into_iter().map(|entry| entry - delta));
	}

	/// Drops entries at or past `line_count`.
	pub(crate) fn truncate(&mut self, line_count: usize) {
		self.lines.retain(|&line| line < line_count);
	}
}
