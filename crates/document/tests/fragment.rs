//! Fragment views over a source document, driven through viewer assignment.

use sluice_document::{Document, FragmentContent, INVALID_SELECTION_TEXT};
use sluice_primitives::TextRange;

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn round_trip_through_fragment() {
	init_tracing();
	let source = Document::new("Hello, World!");
	let fragment = FragmentContent::new(&source, TextRange::new(7, 12)).unwrap();
	assert_eq!(fragment.document().text(), "World");

	fragment.on_assigned(true);
	fragment.document().set_text("Earth").unwrap();
	assert_eq!(source.text(), "Hello, Earth!");

	source.delete_string(6, 13).unwrap();
	assert_eq!(fragment.document().text(), INVALID_SELECTION_TEXT);
	assert!(!fragment.document().is_writable());
	assert!(fragment.document().insert_string(0, "x").is_err());
	assert_eq!(source.text(), "Hello,");
}

#[test]
fn listening_follows_first_and_last_assignment() {
	init_tracing();
	let source = Document::new("fn main() {}\n");
	let fragment = FragmentContent::new(&source, TextRange::new(3, 9)).unwrap();
	assert_eq!(fragment.document().text(), "main()");

	fragment.on_assigned(true);
	fragment.on_assigned(true);
	assert_eq!(fragment.assignments(), 2);
	assert!(fragment.synchronizer().is_listening());
	assert_eq!(source.listener_count(), 1);

	fragment.on_assigned(false);
	assert!(fragment.synchronizer().is_listening());

	fragment.on_assigned(false);
	assert_eq!(fragment.assignments(), 0);
	assert!(!fragment.synchronizer().is_listening());
	assert_eq!(source.listener_count(), 0);

	// Unbalanced release is ignored.
	fragment.on_assigned(false);
	assert_eq!(fragment.assignments(), 0);
}

#[test]
fn edits_while_unassigned_are_picked_up_on_assignment() {
	init_tracing();
	let source = Document::new("let x = 1;");
	let fragment = FragmentContent::new(&source, TextRange::new(8, 9)).unwrap();

	source.replace_string(8, 9, "42").unwrap();
	assert_eq!(fragment.document().text(), "1");

	fragment.on_assigned(true);
	assert_eq!(fragment.document().text(), "42");
}

#[test]
fn read_only_source_yields_read_only_fragment() {
	init_tracing();
	let source = Document::new("const A: u8 = 0;");
	source.set_read_only(true);
	let fragment = FragmentContent::new(&source, TextRange::new(6, 7)).unwrap();
	assert!(!fragment.document().is_writable());

	fragment.on_assigned(true);
	assert!(!fragment.document().is_writable());
	assert_eq!(fragment.original_document().text(), "const A: u8 = 0;");
}
