// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Rendezvous between a synchronous poster and the loop thread.
//!
//! The caller moves its event into a [`SyncToken`] and blocks. The loop
//! thread takes the event out, runs the handler on it and puts it back. If
//! the caller gives up first, the token is invalidated and whatever the loop
//! thread produces afterwards is discarded.

use std::{
	sync::Arc,
	time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

use crate::{error::PostError, event::Event};

struct SyncSlot<P> {
	/// Cleared by whichever side finishes the rendezvous first.
	valid: bool,
	/// Present while the event is not in the hands of the loop thread.
	event: Option<Event<P>>,
	handled: bool,
}

pub(crate) struct SyncToken<P> {
	slot: Mutex<SyncSlot<P>>,
	done: Condvar,
}

impl<P> SyncToken<P> {
	pub(crate) fn new(event: Event<P>) -> Arc<Self> {
		Arc::new(Self {
			slot: Mutex::new(SyncSlot {
				valid: true,
				event: Some(event),
				handled: false,
			}),
			done: Condvar::new(),
		})
	}

	/// Take the event for handling, unless the caller already gave up.
	pub(crate) fn begin(&self) -> Option<Event<P>> {
		let mut slot = self.slot.lock();
		if !slot.valid {
			return None;
		}
		slot.event.take()
	}

	/// Hand the handled event back and wake the caller.
	pub(crate) fn complete(&self, event: Event<P>) {
		let mut slot = self.slot.lock();
		if slot.valid {
			slot.event = Some(event);
			slot.handled = true;
			slot.valid = false;
		}
		drop(slot);
		self.done.notify_one();
	}

	/// Release the caller without handling the event.
	pub(crate) fn abandon(&self) {
		self.slot.lock().valid = false;
		self.done.notify_one();
	}

	/// Block until the loop thread completes or abandons the event, or until
	/// `timeout` elapses.
	///
	/// Whatever is left of the event is moved back into `out`. After a
	/// timeout that struck while the handler was running, `out` keeps the
	/// default event.
	pub(crate) fn wait(&self, out: &mut Event<P>, timeout: Duration) -> Result<(), PostError> {
		let deadline = Instant::now().checked_add(timeout);
		let mut slot = self.slot.lock();

		while slot.valid {
			let Some(deadline) = deadline else {
				self.done.wait(&mut slot);
				continue;
			};
			if self.done.wait_until(&mut slot, deadline).timed_out() && slot.valid {
				slot.valid = false;
				if let Some(event) = slot.event.take() {
					*out = event;
				}
				return Err(PostError::Timeout(timeout));
			}
		}

		if let Some(event) = slot.event.take() {
			*out = event;
		}
		if slot.handled {
			Ok(())
		} else {
			Err(PostError::Dispatch)
		}
	}
}
