// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Event handler trait and loop configuration.
//!
//! This module defines the abstractions an event loop is built from:
//! - [`EventHandler`]: The trait every actor implements
//! - [`LoopConfig`]: Name and synchronous post timeout of a loop

use std::time::Duration;

use crate::{DEFAULT_SYNC_TIMEOUT, actor::context::LoopContext, event::Event};

/// Configuration for an event loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
	/// Name of the worker thread, also attached to log lines.
	///
	/// Default: "event-loop"
	pub name: String,

	/// Timeout applied by [`EventLoop::post_event_sync`](crate::EventLoop::post_event_sync).
	///
	/// Default: 300 seconds
	pub sync_timeout: Duration,
}

impl Default for LoopConfig {
	fn default() -> Self {
		Self {
			name: "event-loop".to_string(),
			sync_timeout: DEFAULT_SYNC_TIMEOUT,
		}
	}
}

impl LoopConfig {
	/// Create a new config with default values.
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the worker thread name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	/// Set the default synchronous post timeout.
	pub fn sync_timeout(mut self, timeout: Duration) -> Self {
		self.sync_timeout = timeout;
		self
	}
}

/// The behaviour of an event loop.
///
/// A handler is owned by its loop and only ever touched by the loop's worker
/// thread, one event at a time. Every piece of state the handler keeps is
/// therefore confined to that thread without any locking of its own.
///
/// # Lifecycle
///
/// 1. `on_start()` - Called on the worker thread before any event
/// 2. Loop: `on_event()` for every posted event, in post order
/// 3. `on_stop()` - Called on the worker thread after the loop drained
///
/// # Example
///
/// ```ignore
/// struct Counter {
///     count: i32,
/// }
///
/// impl EventHandler for Counter {
///     type Payload = ();
///
///     fn on_event(&mut self, event: &mut Event, _ctx: &LoopContext<()>) {
///         match event.what {
///             INCREMENT => self.count += 1,
///             GET => event.arg1 = self.count,
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + 'static {
	/// Payload carried by events of this loop.
	type Payload: Default + Send + 'static;

	/// Handle a single event.
	///
	/// For synchronous posts, whatever the handler writes into `event` is
	/// handed back to the caller.
	fn on_event(&mut self, event: &mut Event<Self::Payload>, ctx: &LoopContext<Self::Payload>);

	/// Called once on the worker thread before event processing begins.
	#[allow(unused_variables)]
	fn on_start(&mut self, ctx: &LoopContext<Self::Payload>) {}

	/// Called once on the worker thread after the loop stopped.
	fn on_stop(&mut self) {}
}
