//! Plain-text rendering of analysis results.

use std::fmt::Write as _;

use quill_analysis::{CodeBlock, LineRange, MetricsSnapshot, Span, Styles};
use quill_lang::style;

use crate::script::ScriptEdit;

fn span(span: &Span) -> String {
	let mut out = format!("{}:{}", span.column, style::name(span.style));
	if !span.flags.is_empty() {
		let flags: Vec<String> = span.flags.iter_names().map(|(name, _)| name.to_lowercase()).collect();
		let _ = write!(out, "({})", flags.join("|"));
	}
	out
}

pub fn line(index: usize, spans: &[Span]) -> String {
	let spans: Vec<String> = spans.iter().map(span).collect();
	format!("{index:>4} | {}", spans.join(" "))
}

pub fn block(block: &CodeBlock) -> String {
	format!(
		"{}:{}..{}:{}",
		block.start_line, block.start_column, block.end_line, block.end_column
	)
}

/// One line per replayed edit. `range` is `None` when the edit forced a full analysis.
pub fn edit(number: usize, edit: &ScriptEdit, range: Option<LineRange>, tokenized: u64) -> String {
	let restyled = match range {
		Some(range) => format!("lines {}..{}", range.start, range.end),
		None => "everything".to_string(),
	};
	format!("edit #{number}: {edit} -> restyled {restyled}, {tokenized} lines tokenized")
}

pub fn styles(styles: &Styles) -> String {
	let mut out = String::from("spans:\n");
	for (index, spans) in styles.spans.snapshot().iter().enumerate() {
		let _ = writeln!(out, "{}", line(index, spans));
	}
	let _ = writeln!(out, "blocks ({}, suppress switch {}):", styles.blocks.len(), styles.suppress_switch);
	for code_block in &styles.blocks_by_start {
		let _ = writeln!(out, "  {}", block(code_block));
	}
	out
}

pub fn metrics(metrics: &MetricsSnapshot) -> String {
	let average = metrics
		.avg_published_run
		.map_or_else(|| "-".to_string(), |average| format!("{average:?}"));
	format!(
		"metrics: full runs {}, edit runs {}, published {}, stale {}, replayed {}, skipped {}, failed {}, lines tokenized {}, avg publish {}",
		metrics.full_runs,
		metrics.edit_runs,
		metrics.published,
		metrics.stale,
		metrics.replayed,
		metrics.skipped,
		metrics.failed,
		metrics.lines_tokenized,
		average,
	)
}
