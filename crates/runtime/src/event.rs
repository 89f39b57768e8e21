// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! The message exchanged with an [`EventLoop`](crate::EventLoop).
//!
//! An event is a small tagged record: an opcode (`what`), two cheap integer
//! arguments and a typed payload. Each actor picks its own payload type, so
//! the producer of an event and the handler that consumes it agree on the
//! payload shape at compile time.

/// Value of `what`, `arg1` and `arg2` when nothing was set.
pub const UNSET: i32 = -1;

/// A message posted to an event loop.
///
/// Asynchronous posts move the event into the loop. Synchronous posts hand
/// the event to the loop for the duration of the call and move it back, so
/// the handler can write results into `arg1`, `arg2` and `payload` in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<P = ()> {
	/// Opcode identifying what this event is about.
	pub what: i32,
	/// Low-cost integer argument, also used as the result code of sync calls.
	pub arg1: i32,
	/// Second low-cost integer argument.
	pub arg2: i32,
	/// Typed payload for anything bigger than two integers.
	pub payload: P,
}

impl<P: Default> Event<P> {
	pub fn new(what: i32) -> Self {
		Self::with_args(what, UNSET, UNSET)
	}

	pub fn with_arg(what: i32, arg1: i32) -> Self {
		Self::with_args(what, arg1, UNSET)
	}

	pub fn with_args(what: i32, arg1: i32, arg2: i32) -> Self {
		Self {
			what,
			arg1,
			arg2,
			payload: P::default(),
		}
	}
}

impl<P> Event<P> {
	pub fn with_payload(what: i32, payload: P) -> Self {
		Self {
			what,
			arg1: UNSET,
			arg2: UNSET,
			payload,
		}
	}

	/// Replace the integer arguments, keeping opcode and payload.
	pub fn args(mut self, arg1: i32, arg2: i32) -> Self {
		self.arg1 = arg1;
		self.arg2 = arg2;
		self
	}
}

impl<P: Default> Default for Event<P> {
	fn default() -> Self {
		Self::with_args(UNSET, UNSET, UNSET)
	}
}
