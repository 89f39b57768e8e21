// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Event loop execution context.
//!
//! The context gives a handler access to:
//! - The [`IoContext`] driving its loop, for timers and deferred work
//! - An [`EventSender`] to post events back to its own loop

use std::{fmt, sync::Arc};

use crate::{error::PostError, event::Event, reactor::IoContext};

type PostFn<P> = dyn Fn(Event<P>) -> Result<(), PostError> + Send + Sync;

/// Posts events asynchronously into a loop without keeping it alive.
///
/// Once the loop is gone every post fails with [`PostError::NotRunning`].
pub struct EventSender<P> {
	post: Arc<PostFn<P>>,
}

impl<P> EventSender<P> {
	pub(crate) fn new(post: impl Fn(Event<P>) -> Result<(), PostError> + Send + Sync + 'static) -> Self {
		Self {
			post: Arc::new(post),
		}
	}

	/// Post `event` to the loop. Returns as soon as the event is queued.
	pub fn post(&self, event: Event<P>) -> Result<(), PostError> {
		(self.post)(event)
	}
}

impl<P> Clone for EventSender<P> {
	fn clone(&self) -> Self {
		Self {
			post: self.post.clone(),
		}
	}
}

impl<P> fmt::Debug for EventSender<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventSender").finish_non_exhaustive()
	}
}

/// Context handed to an [`EventHandler`](crate::EventHandler).
pub struct LoopContext<P> {
	name: String,
	io: IoContext,
	sender: EventSender<P>,
}

impl<P> LoopContext<P> {
	pub(crate) fn new(name: String, io: IoContext, sender: EventSender<P>) -> Self {
		Self {
			name,
			io,
			sender,
		}
	}

	/// Name of the loop.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The reactor driving this loop.
	pub fn io_context(&self) -> &IoContext {
		&self.io
	}

	/// A sender posting events to this loop.
	pub fn sender(&self) -> EventSender<P> {
		self.sender.clone()
	}

	/// Post `event` to this loop. Handled after the current event returns.
	pub fn post(&self, event: Event<P>) -> Result<(), PostError> {
		self.sender.post(event)
	}
}
