// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Single-threaded run loop.
//!
//! An [`IoContext`] executes queued callbacks and expired timers serially on
//! whichever thread calls [`IoContext::run`]. Any thread may hand it work:
//! - [`IoContext::dispatch`] runs the callback inline when called from the
//!   loop thread itself, otherwise it enqueues it
//! - [`IoContext::post`] always enqueues, even from the loop thread
//!
//! Work handed over after [`IoContext::stop`] is dropped without running.
//! Callbacks own their captures, so dropping one releases whatever it holds
//! (a blocked synchronous caller, for instance).

pub(crate) mod timers;

use std::{
	cell::Cell,
	fmt,
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicU64, Ordering},
	},
	time::Instant,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use parking_lot::Mutex;
use tracing::{debug, trace};

use self::timers::{TimerEntry, TimerQueue};

pub(crate) type Task = Box<dyn FnOnce() + Send>;

enum Command {
	Run(Task),
	Schedule(TimerEntry),
	Wake,
}

/// Counter for generating unique context IDs.
static CONTEXT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

thread_local! {
	/// ID of the context whose `run` is active on this thread.
	static CURRENT: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Marks the current thread as the loop thread of a context until dropped.
struct CurrentGuard {
	previous: Option<u64>,
}

impl CurrentGuard {
	fn enter(id: u64) -> Self {
		Self {
			previous: CURRENT.with(|current| current.replace(Some(id))),
		}
	}
}

impl Drop for CurrentGuard {
	fn drop(&mut self) {
		CURRENT.with(|current| current.set(self.previous));
	}
}

struct Inner {
	id: u64,
	tx: Sender<Command>,
	/// Taken by `run`; dropped when `run` returns so late senders fail fast.
	rx: Mutex<Option<Receiver<Command>>>,
	stopped: AtomicBool,
}

/// Handle to a run loop. Cloning yields another handle to the same loop.
#[derive(Clone)]
pub struct IoContext {
	inner: Arc<Inner>,
}

impl IoContext {
	pub fn new() -> Self {
		let (tx, rx) = unbounded();
		Self {
			inner: Arc::new(Inner {
				id: CONTEXT_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
				tx,
				rx: Mutex::new(Some(rx)),
				stopped: AtomicBool::new(false),
			}),
		}
	}

	/// Unique ID of this context.
	pub fn id(&self) -> u64 {
		self.inner.id
	}

	/// Whether the calling thread is currently inside this context's `run`.
	pub fn running_in_this_thread(&self) -> bool {
		CURRENT.with(|current| current.get() == Some(self.inner.id))
	}

	/// Run `callback` inline if called from the loop thread, otherwise
	/// enqueue it.
	///
	/// Returns `false` if the context is stopped and the callback was dropped.
	pub fn dispatch<F>(&self, callback: F) -> bool
	where
		F: FnOnce() + Send + 'static,
	{
		if self.running_in_this_thread() {
			if self.stopped() {
				debug!(context = self.inner.id, "dispatch after stop, dropping callback");
				return false;
			}
			callback();
			return true;
		}
		self.post(callback)
	}

	/// Enqueue `callback` to run on a later loop iteration. Never runs inline.
	///
	/// Returns `false` if the context is stopped and the callback was dropped.
	pub fn post<F>(&self, callback: F) -> bool
	where
		F: FnOnce() + Send + 'static,
	{
		self.send(Command::Run(Box::new(callback)))
	}

	pub(crate) fn schedule(&self, entry: TimerEntry) -> bool {
		self.send(Command::Schedule(entry))
	}

	fn send(&self, command: Command) -> bool {
		if self.stopped() {
			debug!(context = self.inner.id, "context stopped, dropping work");
			return false;
		}
		// Fails once `run` has returned and dropped the receiver.
		if self.inner.tx.send(command).is_err() {
			debug!(context = self.inner.id, "context finished, dropping work");
			return false;
		}
		true
	}

	/// Process callbacks and timers on the calling thread until stopped.
	///
	/// Returns immediately if the context was already stopped or another
	/// thread has run it. Work still queued when the loop exits is dropped.
	pub fn run(&self) {
		let Some(rx) = self.inner.rx.lock().take() else {
			debug!(context = self.inner.id, "context already ran, ignoring run");
			return;
		};
		if self.stopped() {
			return;
		}

		let _current = CurrentGuard::enter(self.inner.id);
		let mut timers = TimerQueue::default();

		while !self.stopped() {
			if let Some(entry) = timers.pop_due(Instant::now()) {
				entry.fire();
				continue;
			}

			let command = match timers.next_deadline() {
				Some(deadline) => match rx.recv_deadline(deadline) {
					Ok(command) => command,
					Err(RecvTimeoutError::Timeout) => continue,
					Err(RecvTimeoutError::Disconnected) => break,
				},
				None => match rx.recv() {
					Ok(command) => command,
					Err(_) => break,
				},
			};

			match command {
				Command::Run(task) => task(),
				Command::Schedule(entry) => timers.push(entry),
				Command::Wake => {}
			}
		}

		self.inner.stopped.store(true, Ordering::SeqCst);
		let dropped = rx.try_iter().filter(|command| !matches!(command, Command::Wake)).count();
		trace!(context = self.inner.id, dropped, pending_timers = timers.len(), "context run finished");
	}

	/// Ask `run` to return once the in-flight callback, if any, completes.
	///
	/// Idempotent and callable from any thread.
	pub fn stop(&self) {
		if !self.inner.stopped.swap(true, Ordering::SeqCst) {
			let _ = self.inner.tx.send(Command::Wake);
		}
	}

	pub fn stopped(&self) -> bool {
		self.inner.stopped.load(Ordering::SeqCst)
	}
}

impl Default for IoContext {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for IoContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("IoContext").field("id", &self.inner.id).field("stopped", &self.stopped()).finish()
	}
}
