//! The invoker driving a real event loop thread.

use std::sync::mpsc;
use std::time::Duration;

use sluice_flush::{Completion, Expiry, FlushConfig, LaterInvoker, ModalEntity};

const WAIT: Duration = Duration::from_secs(5);

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn callbacks_run_in_order_on_the_loop_thread() {
	init_tracing();
	let invoker = LaterInvoker::spawn(FlushConfig::default()).unwrap();
	let (tx, rx) = mpsc::channel();

	for i in 0..100 {
		let tx = tx.clone();
		invoker.invoke_later(move || {
			let name = std::thread::current().name().map(str::to_owned);
			tx.send((i, name)).unwrap();
		});
	}

	for expected in 0..100 {
		let (i, name) = rx.recv_timeout(WAIT).unwrap();
		assert_eq!(i, expected);
		assert_eq!(name.as_deref(), Some("sluice-ui"));
	}
}

#[test]
fn dialog_holds_back_earlier_work() {
	init_tracing();
	let invoker = LaterInvoker::spawn(FlushConfig::default()).unwrap();
	let (tx, rx) = mpsc::channel();

	let dialog = ModalEntity::next();
	invoker.enter_modal(dialog);
	let background = tx.clone();
	invoker.invoke_later_with(
		move || {
			background.send("background").unwrap();
			Ok(())
		},
		sluice_flush::Modality::non_modal(),
		Expiry::never(),
	);
	let modal = tx.clone();
	invoker.invoke_later(move || modal.send("dialog").unwrap());

	assert_eq!(rx.recv_timeout(WAIT).unwrap(), "dialog");
	assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

	invoker.leave_modal(dialog);
	assert_eq!(rx.recv_timeout(WAIT).unwrap(), "background");
}

#[test]
fn dropping_the_invoker_finishes_queued_work() {
	init_tracing();
	let (tx, rx) = mpsc::channel();
	{
		let invoker = LaterInvoker::spawn(FlushConfig::default()).unwrap();
		for i in 0..10 {
			let tx = tx.clone();
			invoker.invoke_later(move || tx.send(i).unwrap());
		}
	}
	drop(tx);
	assert_eq!(rx.iter().collect::<Vec<_>>(), (0..10).collect::<Vec<_>>());
}

#[test]
fn dropping_the_invoker_finishes_work_spanning_several_budgets() {
	init_tracing();
	let (tx, rx) = mpsc::channel();
	let mut completions = Vec::new();
	{
		let invoker = LaterInvoker::spawn(FlushConfig::default()).unwrap();
		for i in 0..10 {
			let tx = tx.clone();
			completions.push(invoker.invoke_with_completion(
				move || {
					std::thread::sleep(Duration::from_millis(2));
					tx.send(i).unwrap();
				},
				Expiry::never(),
			));
		}
	}
	drop(tx);

	assert_eq!(rx.iter().collect::<Vec<_>>(), (0..10).collect::<Vec<_>>());
	for mut done in completions {
		assert_eq!(done.try_recv(), Ok(Completion::Ran));
	}
}

#[tokio::test]
async fn completion_can_be_awaited() {
	init_tracing();
	let config = FlushConfig {
		thread_name: "sluice-async-test".into(),
		..FlushConfig::default()
	};
	let invoker = LaterInvoker::spawn(config).unwrap();

	let done = invoker.invoke_with_completion(|| {}, Expiry::never());
	assert_eq!(done.await, Ok(Completion::Ran));
}
