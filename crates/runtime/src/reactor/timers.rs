// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	cmp::Ordering as CmpOrdering,
	collections::BinaryHeap,
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
	time::Instant,
};

use parking_lot::Mutex;

use crate::timer::TimerSlot;

/// Counter for ordering timers that share a deadline.
static TIMER_SEQ_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_timer_seq() -> u64 {
	TIMER_SEQ_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A pending wait registered by a [`Timer`](crate::Timer).
pub(crate) struct TimerEntry {
	/// When the timer should fire.
	deadline: Instant,
	/// Tie breaker, keeps FIFO order among equal deadlines.
	seq: u64,
	/// Generation of the owning timer this entry was armed for.
	generation: u64,
	/// Holds the callback while the wait is pending.
	slot: Arc<Mutex<TimerSlot>>,
}

impl TimerEntry {
	pub(crate) fn new(deadline: Instant, generation: u64, slot: Arc<Mutex<TimerSlot>>) -> Self {
		Self {
			deadline,
			seq: next_timer_seq(),
			generation,
			slot,
		}
	}

	/// Run the callback unless the wait was cancelled or superseded.
	///
	/// Returns whether the callback ran.
	pub(crate) fn fire(self) -> bool {
		let Some(callback) = self.slot.lock().claim(self.generation) else {
			return false;
		};
		callback();
		true
	}
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
	fn eq(&self, other: &Self) -> bool {
		self.deadline == other.deadline && self.seq == other.seq
	}
}

impl Ord for TimerEntry {
	// BinaryHeap is a max-heap, reverse to pop the earliest deadline first.
	fn cmp(&self, other: &Self) -> CmpOrdering {
		other.deadline.cmp(&self.deadline).then_with(|| other.seq.cmp(&self.seq))
	}
}

impl PartialOrd for TimerEntry {
	fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
		Some(self.cmp(other))
	}
}

/// Timer entries owned by the thread running the reactor.
#[derive(Default)]
pub(crate) struct TimerQueue {
	heap: BinaryHeap<TimerEntry>,
}

impl TimerQueue {
	pub(crate) fn push(&mut self, entry: TimerEntry) {
		self.heap.push(entry);
	}

	/// Pop the earliest entry if it is due at `now`.
	pub(crate) fn pop_due(&mut self, now: Instant) -> Option<TimerEntry> {
		if self.heap.peek()?.deadline > now {
			return None;
		}
		self.heap.pop()
	}

	pub(crate) fn next_deadline(&self) -> Option<Instant> {
		self.heap.peek().map(|entry| entry.deadline)
	}

	pub(crate) fn len(&self) -> usize {
		self.heap.len()
	}
}
