//! `quill`: runs the analysis engine over a source file.
//!
//! The file is analyzed once, then every edit of an optional script is
//! applied to the live text and reported to the engine, waiting for each
//! resulting publication so the output lists what every edit restyled.

mod cli;
mod report;
mod script;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use parking_lot::RwLock;
use quill_analysis::{AnalysisCoordinator, AnalyzerConfig, ChannelReceiver, LineRange, StyleEvent, Styles};
use quill_lang::{BraceBlocks, CLikeTokenizer};
use quill_primitives::{RopeBuffer, TextBuffer};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::{Cli, Command};
use crate::script::{EditScript, ScriptEdit, position};

/// Upper bound on waiting for one publication.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	match cli.command {
		Command::Analyze { file, config, edits } => analyze(&file, config.as_deref(), edits.as_deref()).await,
	}
}

async fn analyze(file: &Path, config: Option<&Path>, edits: Option<&Path>) -> anyhow::Result<()> {
	let config = match config {
		Some(path) => AnalyzerConfig::load(path)?,
		None => AnalyzerConfig::default(),
	};
	let script = match edits {
		Some(path) => EditScript::load(path)?,
		None => EditScript::default(),
	};
	let source = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;

	let tokenizer = Arc::new(CLikeTokenizer::new());
	let blocks = Arc::new(BraceBlocks::new(Arc::clone(&tokenizer)));
	let mut coordinator: AnalysisCoordinator<CLikeTokenizer> = AnalysisCoordinator::new(tokenizer, blocks, config);
	let (receiver, mut events) = ChannelReceiver::new();
	coordinator.set_receiver(Some(Arc::new(receiver)));

	let live = Arc::new(RwLock::new(RopeBuffer::from(source)));
	coordinator.reset(live.clone())?;
	let (mut styles, _) = next_publication(&mut events).await.context("initial analysis")?;
	info!(analyzer = %coordinator.id(), lines = live.read().line_count(), "analysis.cli.analyzed");

	for (index, edit) in script.edits.iter().enumerate() {
		let number = index + 1;
		let before = coordinator.metrics().lines_tokenized;
		debug!(edit = number, at = %edit.start(), "analysis.cli.edit");
		apply(&coordinator, &live, edit).with_context(|| format!("edit #{number}: {edit}"))?;
		let (next, range) = next_publication(&mut events)
			.await
			.with_context(|| format!("edit #{number}: {edit}"))?;
		styles = next;
		let tokenized = coordinator.metrics().lines_tokenized.saturating_sub(before);
		println!("{}", report::edit(number, edit, range, tokenized));
	}

	println!("{}: {} lines", file.display(), live.read().line_count());
	print!("{}", report::styles(&styles));
	println!("{}", report::metrics(&coordinator.metrics()));
	coordinator.destroy();
	Ok(())
}

/// Applies `edit` to the live text and reports it to the engine.
fn apply(
	coordinator: &AnalysisCoordinator<CLikeTokenizer>,
	live: &RwLock<RopeBuffer>,
	edit: &ScriptEdit,
) -> anyhow::Result<()> {
	let mut buffer = live.write();
	match edit {
		ScriptEdit::Insert { at, text } => {
			let start = position(*at);
			let end = buffer.insert(start, text)?;
			coordinator.insert(start, end, text);
		}
		ScriptEdit::Delete { start, end } => {
			let (start, end) = (position(*start), position(*end));
			let deleted = buffer.slice_text(start, end)?;
			buffer.delete(start, end)?;
			coordinator.delete(start, end, &deleted);
		}
	}
	Ok(())
}

/// Waits for the next styles, skipping the empty styles sent on reset.
///
/// The range is `None` when the whole text was analyzed.
async fn next_publication(
	events: &mut mpsc::UnboundedReceiver<StyleEvent>,
) -> anyhow::Result<(Arc<Styles>, Option<LineRange>)> {
	loop {
		let event = match tokio::time::timeout(PUBLISH_TIMEOUT, events.recv()).await {
			Ok(Some(event)) => event,
			Ok(None) => bail!("analysis stopped publishing"),
			Err(_) => bail!("no analysis result within {PUBLISH_TIMEOUT:?}"),
		};
		match event {
			StyleEvent::Replaced { styles: None, .. } => continue,
			StyleEvent::Replaced {
				styles: Some(styles),
				action,
				..
			} => {
				if let Some(action) = action {
					action();
				}
				return Ok((styles, None));
			}
			StyleEvent::Updated { styles, range, .. } => return Ok((styles, Some(range))),
		}
	}
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("quill_analysis=trace,quill_cli=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	});
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
