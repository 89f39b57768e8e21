// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! One-shot timers bound to an [`IoContext`].

use std::{
	fmt,
	sync::Arc,
	thread,
	time::{Duration, Instant},
};

use parking_lot::Mutex;
use tracing::warn;

use crate::reactor::{IoContext, timers::TimerEntry};

pub(crate) type Callback = Box<dyn FnOnce() + Send>;

/// Arming state shared between a [`Timer`] and its scheduled entries.
///
/// The slot owns the callback of the pending wait, so superseding or
/// cancelling a wait releases the callback and its captures right away.
/// Entries in the reactor's heap only refer back to the slot.
#[derive(Default)]
pub(crate) struct TimerSlot {
	/// Bumped on every arm and cancel; entries from older generations are stale.
	generation: u64,
	callback: Option<Callback>,
	expiry: Option<Instant>,
}

impl TimerSlot {
	/// Arm a new wait, superseding any previous one. Returns its generation
	/// and the superseded callback, to be dropped outside the lock.
	pub(crate) fn arm(&mut self, expiry: Instant, callback: Callback) -> (u64, Option<Callback>) {
		self.generation += 1;
		self.expiry = Some(expiry);
		(self.generation, self.callback.replace(callback))
	}

	/// Take the callback of `generation`, unless it was cancelled or
	/// superseded.
	pub(crate) fn claim(&mut self, generation: u64) -> Option<Callback> {
		if self.generation != generation {
			return None;
		}
		self.callback.take()
	}

	fn cancel(&mut self) -> Option<Callback> {
		let callback = self.callback.take()?;
		self.generation += 1;
		Some(callback)
	}

	fn is_pending(&self) -> bool {
		self.callback.is_some()
	}
}

impl fmt::Debug for TimerSlot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TimerSlot")
			.field("generation", &self.generation)
			.field("pending", &self.is_pending())
			.field("expiry", &self.expiry)
			.finish()
	}
}

/// A one-shot timer whose callbacks run on the thread driving its
/// [`IoContext`].
///
/// At most one wait is pending at a time. Arming a new wait cancels the
/// previous one, and a cancelled callback is never invoked. Dropping the
/// timer cancels its pending wait.
#[derive(Debug)]
pub struct Timer {
	ctx: IoContext,
	slot: Arc<Mutex<TimerSlot>>,
}

impl Timer {
	pub fn new(ctx: &IoContext) -> Self {
		Self {
			ctx: ctx.clone(),
			slot: Arc::new(Mutex::new(TimerSlot::default())),
		}
	}

	/// Run `callback` on the context's loop thread once `duration` elapsed.
	///
	/// The callback takes no arguments: a cancelled or superseded wait is
	/// never called back at all, so there is no error to hand over. It never
	/// runs inline, even for a zero duration.
	pub fn async_wait<F>(&self, duration: Duration, callback: F)
	where
		F: FnOnce() + Send + 'static,
	{
		let now = Instant::now();
		let deadline = now.checked_add(duration).unwrap_or(now + Duration::from_secs(86400 * 365));
		let (generation, superseded) = self.slot.lock().arm(deadline, Box::new(callback));
		drop(superseded);

		let entry = TimerEntry::new(deadline, generation, self.slot.clone());
		if !self.ctx.schedule(entry) {
			let rejected = self.slot.lock().claim(generation);
			drop(rejected);
		}
	}

	/// Cancel the pending wait, releasing its callback. Returns the number of
	/// waits cancelled, 0 or 1.
	pub fn cancel(&self) -> usize {
		let cancelled = self.slot.lock().cancel();
		usize::from(cancelled.is_some())
	}

	/// Block the calling thread for `duration`.
	///
	/// Independent of any pending asynchronous wait.
	pub fn wait(&self, duration: Duration) {
		if self.ctx.running_in_this_thread() {
			warn!(context = self.ctx.id(), "blocking timer wait on the loop thread stalls every queued callback");
		}
		thread::sleep(duration);
	}

	pub fn is_pending(&self) -> bool {
		self.slot.lock().is_pending()
	}

	/// Deadline of the most recent wait, if one was ever armed.
	pub fn expiry(&self) -> Option<Instant> {
		self.slot.lock().expiry
	}

	pub fn context(&self) -> &IoContext {
		&self.ctx
	}
}

impl Drop for Timer {
	fn drop(&mut self) {
		self.cancel();
	}
}
