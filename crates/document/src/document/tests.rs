use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use sluice_primitives::TextRange;

use super::Document;
use crate::{DocumentEvent, EditError};

fn record(doc: &Document) -> Arc<Mutex<Vec<DocumentEvent>>> {
	let events = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&events);
	doc.add_listener(move |event| sink.lock().push(event.clone()));
	events
}

#[test]
fn replace_emits_event_with_fragments() {
	let doc = Document::new("Hello, World!");
	let events = record(&doc);

	doc.replace_string(7, 12, "Earth").unwrap();

	assert_eq!(doc.text(), "Hello, Earth!");
	assert_eq!(
		*events.lock(),
		vec![DocumentEvent {
			offset: 7,
			old_len: 5,
			old_fragment: "World".into(),
			new_fragment: "Earth".into(),
			stamp: 1,
		}]
	);
}

#[test]
fn noop_edits_are_silent() {
	let doc = Document::new("abc");
	let events = record(&doc);

	doc.insert_string(1, "").unwrap();
	doc.replace_string(0, 3, "abc").unwrap();

	assert!(events.lock().is_empty());
	assert_eq!(doc.modification_stamp(), 0);
}

#[test]
fn read_only_rejects_edits() {
	let doc = Document::new("abc");
	doc.set_read_only(true);
	assert!(!doc.is_writable());
	assert_eq!(doc.insert_string(0, "x"), Err(EditError::ReadOnly));

	doc.set_read_only(false);
	doc.insert_string(0, "x").unwrap();
	assert_eq!(doc.text(), "xabc");
}

#[test]
fn bad_ranges_are_rejected() {
	let doc = Document::new("abc");
	assert_eq!(doc.delete_string(2, 1), Err(EditError::InvalidRange { start: 2, end: 1 }));
	assert_eq!(doc.delete_string(1, 9), Err(EditError::OutOfBounds { start: 1, end: 9, len: 3 }));
	assert!(doc.create_range_marker(TextRange::new(0, 4)).is_err());
	assert!(doc.slice(TextRange::new(2, 5)).is_err());
}

#[test]
fn line_queries() {
	let doc = Document::new("one\ntwo\nthree");
	assert_eq!(doc.line_count(), 3);
	assert_eq!(doc.line_start_offset(1), 4);
	assert_eq!(doc.line_end_offset(1), 7);
	assert_eq!(doc.line_number(9), 2);
	assert_eq!(doc.text_len(), 13);
}

#[test]
fn chars_are_not_bytes() {
	let doc = Document::new("héllo wörld");
	doc.replace_string(6, 11, "welt").unwrap();
	assert_eq!(doc.text(), "héllo welt");
	assert_eq!(doc.text_len(), 10);
}

#[test]
fn markers_update_before_listeners_run() {
	let doc = Document::new("Hello, World!");
	let marker = doc.create_range_marker(TextRange::new(7, 12)).unwrap();
	let seen = Arc::new(Mutex::new(None));
	let (sink, watched) = (Arc::clone(&seen), marker.clone());
	doc.add_listener(move |_| *sink.lock() = watched.range());

	doc.insert_string(0, "Oh ").unwrap();
	assert_eq!(*seen.lock(), Some(TextRange::new(10, 15)));
}

#[test]
fn listener_may_edit_the_notifying_document() {
	let doc = Document::new("a");
	let handle = doc.clone();
	doc.add_listener(move |event| {
		if event.new_fragment == "b" {
			handle.insert_string(handle.text_len(), "c").unwrap();
		}
	});

	doc.insert_string(1, "b").unwrap();
	assert_eq!(doc.text(), "abc");
}

#[test]
fn remove_listener_stops_notifications() {
	let doc = Document::new("");
	let events = Arc::new(Mutex::new(0usize));
	let sink = Arc::clone(&events);
	let id = doc.add_listener(move |_| *sink.lock() += 1);

	doc.insert_string(0, "x").unwrap();
	assert!(doc.remove_listener(id));
	assert!(!doc.remove_listener(id));
	doc.insert_string(0, "y").unwrap();

	assert_eq!(*events.lock(), 1);
	assert_eq!(doc.listener_count(), 0);
}
