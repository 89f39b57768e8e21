// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	sync::{
		Arc, OnceLock, Weak,
		atomic::{AtomicUsize, Ordering},
		mpsc,
	},
	thread,
	time::{Duration, Instant},
};

use vncmgr_runtime::{Event, EventHandler, EventLoop, LoopConfig, LoopContext, LoopState, PostError, Timer, UNSET};

const PING: i32 = 1;
const INCREMENT: i32 = 2;
const GET: i32 = 3;
const SLEEP: i32 = 4;
const RECORD: i32 = 5;
const RECURSE: i32 = 6;
const POST_SELF: i32 = 7;

/// Counts how many times handlers touched it.
#[derive(Debug, Clone, Default)]
struct Sentinel(Option<Arc<AtomicUsize>>);

impl Sentinel {
	fn touch(&self) {
		if let Some(counter) = &self.0 {
			counter.fetch_add(1, Ordering::SeqCst);
		}
	}
}

#[derive(Default)]
struct TestActor {
	counter: i32,
	in_flight: usize,
	max_in_flight: usize,
	recorded: Vec<i32>,
}

impl EventHandler for TestActor {
	type Payload = Sentinel;

	fn on_event(&mut self, event: &mut Event<Sentinel>, ctx: &LoopContext<Sentinel>) {
		self.in_flight += 1;
		self.max_in_flight = self.max_in_flight.max(self.in_flight);

		match event.what {
			PING => event.arg1 = 0,
			INCREMENT => {
				let current = self.counter;
				thread::yield_now();
				self.counter = current + 1;
			}
			GET => {
				event.arg1 = self.counter;
				event.arg2 = self.max_in_flight as i32;
			}
			SLEEP => {
				thread::sleep(Duration::from_millis(event.arg1 as u64));
				event.payload.touch();
				event.arg2 = 1;
			}
			RECORD => self.recorded.push(event.arg1),
			RECURSE => {
				event.arg1 = match ctx.sender().post(Event::new(INCREMENT)) {
					Ok(()) => 0,
					Err(_) => 1,
				};
			}
			POST_SELF => {
				for i in 0..3 {
					let _ = ctx.post(Event::with_arg(RECORD, i));
				}
				event.arg1 = self.recorded.len() as i32;
			}
			_ => event.arg1 = -2,
		}

		self.in_flight -= 1;
	}
}

fn started() -> Arc<EventLoop<TestActor>> {
	let event_loop = Arc::new(EventLoop::with_config(TestActor::default(), LoopConfig::new().name("test-actor")));
	event_loop.start().unwrap();
	event_loop
}

fn counter_of(event_loop: &EventLoop<TestActor>) -> (i32, i32) {
	let mut event = Event::new(GET);
	event_loop.post_event_sync(&mut event).unwrap();
	(event.arg1, event.arg2)
}

#[test]
fn test_sync_ping_writes_result() {
	let event_loop = started();

	let mut event = Event::new(PING);
	assert_eq!(event.arg1, UNSET);
	event_loop.post_event_timeout(&mut event, Duration::from_secs(1)).unwrap();
	assert_eq!(event.arg1, 0);
	assert_eq!(event.what, PING);
}

#[test]
fn test_concurrent_sync_increments_are_serialized() {
	let event_loop = started();

	let workers: Vec<_> = (0..2)
		.map(|_| {
			let event_loop = event_loop.clone();
			thread::spawn(move || {
				for _ in 0..1000 {
					let mut event = Event::new(INCREMENT);
					event_loop.post_event_sync(&mut event).unwrap();
				}
			})
		})
		.collect();
	for worker in workers {
		worker.join().unwrap();
	}

	let (count, max_in_flight) = counter_of(&event_loop);
	assert_eq!(count, 2000);
	assert_eq!(max_in_flight, 1);
}

#[test]
fn test_sync_timeout_discards_late_completion() {
	let event_loop = started();
	let touched = Arc::new(AtomicUsize::new(0));

	let mut event = Event::with_payload(SLEEP, Sentinel(Some(touched.clone()))).args(2000, UNSET);
	let started_at = Instant::now();
	let err = event_loop.post_event_timeout(&mut event, Duration::from_millis(200)).unwrap_err();
	let elapsed = started_at.elapsed();

	assert!(matches!(err, PostError::Timeout(_)));
	assert!(elapsed >= Duration::from_millis(200), "returned after {:?}", elapsed);
	assert!(elapsed < Duration::from_millis(1500), "returned after {:?}", elapsed);

	// The handler had already taken the event, so the caller is left with
	// the default one.
	assert_eq!(event.what, UNSET);
	assert!(event.payload.0.is_none());

	let snapshot = event.clone();
	thread::sleep(Duration::from_millis(2300));

	// The handler ran exactly once and its writes never reached the caller.
	assert_eq!(touched.load(Ordering::SeqCst), 1);
	assert_eq!(event.arg2, snapshot.arg2);
	assert_ne!(event.arg2, 1);
	event.payload.touch();
	assert_eq!(touched.load(Ordering::SeqCst), 1);
}

#[test]
fn test_sync_timeout_before_handling_restores_event() {
	let event_loop = started();

	// Occupy the loop so the second call never gets picked up in time.
	let blocker = event_loop.clone();
	let busy = thread::spawn(move || {
		let mut event = Event::new(SLEEP).args(500, UNSET);
		blocker.post_event_sync(&mut event).unwrap();
	});
	thread::sleep(Duration::from_millis(50));

	let mut event = Event::with_arg(RECORD, 77);
	let err = event_loop.post_event_timeout(&mut event, Duration::from_millis(50)).unwrap_err();
	assert!(matches!(err, PostError::Timeout(_)));
	assert_eq!(event.what, RECORD);
	assert_eq!(event.arg1, 77);

	busy.join().unwrap();
}

#[test]
fn test_quit_releases_pending_sync_call() {
	let event_loop = started();

	let blocker = event_loop.clone();
	let busy = thread::spawn(move || {
		let mut event = Event::new(SLEEP).args(300, UNSET);
		blocker.post_event_sync(&mut event)
	});
	thread::sleep(Duration::from_millis(50));

	let pending = event_loop.clone();
	let waiter = thread::spawn(move || {
		let started_at = Instant::now();
		let mut event = Event::new(PING);
		let result = pending.post_event_sync(&mut event);
		(result, started_at.elapsed())
	});
	thread::sleep(Duration::from_millis(50));

	event_loop.quit();
	assert_eq!(event_loop.state(), LoopState::Stopped);

	let (result, elapsed) = waiter.join().unwrap();
	assert!(elapsed < Duration::from_secs(5), "pending call took {:?}", elapsed);
	assert!(matches!(result, Ok(()) | Err(PostError::Dispatch)));
	busy.join().unwrap().unwrap();
}

#[test]
fn test_post_after_quit_fails() {
	let event_loop = started();
	event_loop.quit();

	assert!(matches!(event_loop.post_event(Event::new(PING)), Err(PostError::NotRunning)));
	let mut event = Event::new(PING);
	assert!(matches!(event_loop.post_event_sync(&mut event), Err(PostError::NotRunning)));
	assert_eq!(event.arg1, UNSET);
}

#[test]
fn test_async_posts_keep_order() {
	let event_loop = started();
	for i in 0..500 {
		event_loop.post_event(Event::with_arg(RECORD, i)).unwrap();
	}

	let mut event = Event::new(POST_SELF);
	event_loop.post_event_sync(&mut event).unwrap();
	// Everything posted before the sync call was handled before it.
	assert_eq!(event.arg1, 500);

	let mut event = Event::new(POST_SELF);
	event_loop.post_event_sync(&mut event).unwrap();
	assert_eq!(event.arg1, 503);
}

#[test]
fn test_post_to_self_is_deferred() {
	let event_loop = started();

	let mut event = Event::new(RECURSE);
	event_loop.post_event_sync(&mut event).unwrap();
	assert_eq!(event.arg1, 0);

	// The increment posted from inside the handler ran after it returned.
	let (count, max_in_flight) = counter_of(&event_loop);
	assert_eq!(count, 1);
	assert_eq!(max_in_flight, 1);
}

struct Reentrant {
	event_loop: Arc<OnceLock<Weak<EventLoop<Reentrant>>>>,
	timer: Option<Timer>,
	results: mpsc::Sender<Result<i32, PostError>>,
}

impl Reentrant {
	const NESTED: i32 = 1;
	const ANSWER: i32 = 2;
	const ARM: i32 = 3;

	fn event_loop(&self) -> Option<Arc<EventLoop<Reentrant>>> {
		self.event_loop.get().and_then(Weak::upgrade)
	}
}

impl EventHandler for Reentrant {
	type Payload = ();

	fn on_event(&mut self, event: &mut Event, ctx: &LoopContext<()>) {
		match event.what {
			Self::NESTED => {
				if let Some(event_loop) = self.event_loop() {
					let mut nested = Event::new(Self::ANSWER);
					let result = event_loop.post_event_sync(&mut nested).map(|()| nested.arg1);
					let _ = self.results.send(result);
				}
			}
			Self::ANSWER => event.arg1 = 42,
			Self::ARM => {
				let timer = Timer::new(ctx.io_context());
				let slot = self.event_loop.clone();
				let results = self.results.clone();
				timer.async_wait(Duration::from_millis(10), move || {
					let Some(event_loop) = slot.get().and_then(Weak::upgrade) else {
						return;
					};
					let mut answer = Event::new(Self::ANSWER);
					let result = event_loop.post_event_sync(&mut answer).map(|()| answer.arg1);
					let _ = results.send(result);
				});
				self.timer = Some(timer);
			}
			_ => {}
		}
	}
}

fn started_reentrant() -> (Arc<EventLoop<Reentrant>>, mpsc::Receiver<Result<i32, PostError>>) {
	let slot = Arc::new(OnceLock::new());
	let (tx, rx) = mpsc::channel();
	let event_loop = Arc::new(EventLoop::new(Reentrant {
		event_loop: slot.clone(),
		timer: None,
		results: tx,
	}));
	slot.set(Arc::downgrade(&event_loop)).unwrap();
	event_loop.start().unwrap();
	(event_loop, rx)
}

#[test]
fn test_sync_post_from_handler_is_rejected() {
	let (event_loop, results) = started_reentrant();

	event_loop.post_event(Event::new(Reentrant::NESTED)).unwrap();
	let result = results.recv_timeout(Duration::from_secs(5)).unwrap();
	assert!(matches!(result, Err(PostError::Reentrant)));
}

#[test]
fn test_sync_post_from_timer_runs_inline() {
	let (event_loop, results) = started_reentrant();

	event_loop.post_event(Event::new(Reentrant::ARM)).unwrap();
	let result = results.recv_timeout(Duration::from_secs(5)).unwrap();
	assert_eq!(result.unwrap(), 42);
}

#[test]
fn test_sender_outlives_loop() {
	let event_loop = started();
	let sender = event_loop.sender();
	sender.post(Event::new(INCREMENT)).unwrap();

	let event_loop = Arc::try_unwrap(event_loop).unwrap();
	drop(event_loop);
	assert!(matches!(sender.post(Event::new(INCREMENT)), Err(PostError::NotRunning)));
}
