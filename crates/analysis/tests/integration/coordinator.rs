use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use quill_analysis::{AnalysisError, AnalyzerConfig, LineRange, StyleEvent};
use quill_primitives::{Position, TextBuffer};

use crate::common::{Fixture, next_event};

fn spans_of(event: &StyleEvent) -> Vec<Vec<quill_analysis::Span>> {
	event.styles().expect("styles published").spans.snapshot()
}

#[tokio::test]
async fn test_reset_clears_then_publishes_full_analysis() {
	let mut fixture = Fixture::new("a {\n  b\n}\nc");
	fixture.reset();

	assert!(matches!(fixture.next_event().await, StyleEvent::Replaced { styles: None, .. }));
	let full = fixture.next_event().await;
	assert!(matches!(full, StyleEvent::Replaced { styles: Some(_), .. }));
	assert_eq!(full.source(), fixture.coordinator.id());
	assert_eq!(spans_of(&full), fixture.expected_spans());

	let metrics = fixture.coordinator.metrics();
	assert_eq!(metrics.full_runs, 1);
	assert_eq!(metrics.lines_tokenized, 4);
}

#[tokio::test]
async fn test_inserted_line_publishes_only_that_line() {
	let mut fixture = Fixture::new("a\n{\nb\n}\nc");
	fixture.reset();
	fixture.next_event().await;
	let full = fixture.next_event().await;

	fixture.insert(Position::new(1, 0), "x\n");
	let update = fixture.next_event().await;
	let StyleEvent::Updated { range, styles, .. } = &update else {
		panic!("expected an update, got {update:?}");
	};
	assert_eq!(*range, LineRange::new(1, 2));
	assert!(Arc::ptr_eq(&styles.spans, &full.styles().expect("styles").spans));
	assert_eq!(spans_of(&update), fixture.expected_spans());
	assert_eq!(fixture.coordinator.metrics().lines_tokenized, 6);
}

#[tokio::test]
async fn test_opening_brace_restyles_to_end_of_text() {
	let mut fixture = Fixture::new("a\nb\nc\nd");
	fixture.reset();
	fixture.next_event().await;
	fixture.next_event().await;

	fixture.insert(Position::new(1, 1), "{");
	let update = fixture.next_event().await;
	let StyleEvent::Updated { range, .. } = &update else {
		panic!("expected an update, got {update:?}");
	};
	assert_eq!(*range, LineRange::new(1, 4));
	assert_eq!(spans_of(&update), fixture.expected_spans());
}

#[tokio::test]
async fn test_superseded_edits_publish_only_the_latest_result() {
	let mut fixture = Fixture::new("a {\nb\n}\nc");
	let lexer = Arc::clone(&fixture.lexer);
	{
		let _parked = lexer.gate.lock();
		fixture.reset();
		fixture.insert(Position::new(0, 0), "x");
		fixture.insert(Position::new(1, 1), "{");
		fixture.insert(Position::new(3, 1), "\n}");
		fixture.delete(Position::new(0, 0), Position::new(0, 1));
		fixture.insert(Position::new(4, 1), " end");
	}

	assert!(matches!(fixture.next_event().await, StyleEvent::Replaced { styles: None, .. }));
	let latest = fixture.next_event().await;
	assert!(matches!(latest, StyleEvent::Replaced { styles: Some(_), .. }));
	assert_eq!(spans_of(&latest), fixture.expected_spans());
	fixture.assert_quiet().await;

	let metrics = fixture.coordinator.metrics();
	assert_eq!(metrics.published, 1);
	assert_eq!(metrics.replayed, 4);
}

#[tokio::test]
async fn test_failed_run_recovers_with_full_analysis() {
	let mut fixture = Fixture::new("a\n{\nb");
	fixture.reset();
	fixture.next_event().await;
	fixture.next_event().await;

	fixture.insert(Position::new(2, 1), "!");
	fixture.delete(Position::new(2, 1), Position::new(2, 2));

	let recovered = fixture.next_event().await;
	assert!(matches!(recovered, StyleEvent::Replaced { styles: Some(_), .. }));
	assert_eq!(spans_of(&recovered), fixture.expected_spans());
	assert_eq!(fixture.coordinator.metrics().failed, 1);
}

#[tokio::test]
async fn test_state_access_only_on_worker_thread() {
	let config = AnalyzerConfig {
		thread_name_prefix: "probe-analyzer".to_string(),
		..AnalyzerConfig::default()
	};
	let mut fixture = Fixture::with_config("{\n{\n}\n}", config);
	*fixture.lexer.probe.lock() = Some(fixture.coordinator.state_access());

	assert!(matches!(fixture.coordinator.get_state(0), Err(AnalysisError::NotWorkerThread)));
	fixture.reset();
	fixture.next_event().await;
	fixture.next_event().await;

	assert!(matches!(fixture.coordinator.get_state(0), Err(AnalysisError::NotWorkerThread)));
	let access = fixture.coordinator.state_access();
	assert!(matches!(access.get_state(1), Err(AnalysisError::NotWorkerThread)));

	assert_eq!(*fixture.lexer.probed.lock(), vec![true, true, true]);
	let threads = fixture.lexer.threads.lock().clone();
	assert_eq!(threads.len(), 4);
	assert!(threads.iter().all(|name| name.starts_with("probe-analyzer-")));
}

#[tokio::test]
async fn test_destroy_stops_publication() {
	let mut fixture = Fixture::new("a\nb");
	fixture.reset();
	fixture.next_event().await;
	fixture.next_event().await;

	fixture.coordinator.destroy();
	fixture.insert(Position::new(0, 1), "{");
	let closed = tokio::time::timeout(Duration::from_secs(5), fixture.events.recv())
		.await
		.expect("channel closes once the receiver is detached");
	assert!(closed.is_none());
	assert_eq!(fixture.coordinator.metrics().edit_runs, 0);
}

#[tokio::test]
async fn test_rerun_before_reset_does_nothing() {
	let mut fixture = Fixture::new("a");
	fixture.coordinator.rerun().expect("rerun without content");
	fixture.insert(Position::new(0, 1), "b");
	assert!(fixture.events.try_recv().is_err());
	assert_eq!(fixture.lexer.calls(), 0);
}

#[tokio::test]
async fn test_rerun_starts_over_on_current_text() {
	let mut fixture = Fixture::new("a\nb");
	fixture.reset();
	fixture.next_event().await;
	fixture.next_event().await;

	fixture.live.write().insert(Position::new(1, 1), "{\nc").expect("edit behind the analyzer's back");
	fixture.coordinator.rerun().expect("rerun");

	assert!(matches!(fixture.next_event().await, StyleEvent::Replaced { styles: None, .. }));
	let full = next_event(&mut fixture.events).await;
	assert_eq!(spans_of(&full), fixture.expected_spans());
	assert_eq!(fixture.coordinator.metrics().full_runs, 2);
}
