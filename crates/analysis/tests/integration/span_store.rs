use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use quill_analysis::{DEFAULT_LINE, ReadTimeouts, Span, SpanStore, StyleId};

fn pattern(style: u32) -> Vec<Span> {
	vec![Span::new(0, StyleId(style)), Span::new(4, StyleId(style + 1))]
}

#[test]
fn test_reads_stay_bounded_under_a_busy_writer() {
	let store = Arc::new(SpanStore::with_timeouts(ReadTimeouts {
		line_lock: Duration::from_micros(50),
		spans_lock: Duration::from_micros(200),
	}));
	for line in 0..8 {
		store.modify().set_spans_on_line(line, pattern(1));
	}

	let done = Arc::new(AtomicBool::new(false));
	let writer = {
		let store = Arc::clone(&store);
		let done = Arc::clone(&done);
		thread::spawn(move || {
			let mut round = 0u32;
			while !done.load(Ordering::Relaxed) {
				let modifier = store.modify();
				let style = if round % 2 == 0 { 3 } else { 1 };
				for line in 0..8 {
					modifier.set_spans_on_line(line, pattern(style));
				}
				modifier.add_line_at(8, pattern(style));
				modifier.delete_line_at(8);
				round = round.wrapping_add(1);
			}
		})
	};

	let allowed = [pattern(1), pattern(3), DEFAULT_LINE.to_vec()];
	let mut slowest = Duration::ZERO;
	for _ in 0..2_000 {
		let mut reader = store.read();
		for line in 0..8 {
			let started = Instant::now();
			let moved = reader.move_to_line(line);
			let spans = reader.current_spans().to_vec();
			let copied = reader.spans_on_line((line + 1) % 8);
			slowest = slowest.max(started.elapsed());

			assert!(allowed.contains(&spans), "torn line {line}: {spans:?}");
			assert!(allowed.contains(&copied), "torn copy of line {line}: {copied:?}");
			if !moved {
				assert_eq!(spans, DEFAULT_LINE);
			}
		}
	}
	done.store(true, Ordering::Relaxed);
	writer.join().expect("writer thread");

	assert!(slowest < Duration::from_millis(250), "read took {slowest:?}");
	assert_eq!(store.line_count(), 8);
}
