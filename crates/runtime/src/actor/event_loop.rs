// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Actor built on a private reactor and a dedicated worker thread.
//!
//! Every event posted to an [`EventLoop`] is handled by its [`EventHandler`]
//! on the loop's own thread, in the order the posts were accepted. Posting
//! comes in two flavours:
//! - asynchronous: the event is queued and the poster continues at once
//! - synchronous: the poster blocks until the handler has processed the
//!   event and sees the handler's writes in its own event
//!
//! A synchronous post issued from the loop thread outside of the handler
//! runs inline. Issued from inside the handler it fails with
//! [`PostError::Reentrant`] instead of waiting on itself.

use std::{
	fmt, mem,
	sync::{
		Arc, Weak,
		atomic::{AtomicU8, Ordering},
	},
	thread::{self, JoinHandle},
	time::Duration,
};

use crossbeam_channel::bounded;
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::{
	actor::{
		context::{EventSender, LoopContext},
		sync::SyncToken,
		thread::spawn_loop_thread,
		traits::{EventHandler, LoopConfig},
	},
	error::{PostError, StartError},
	event::Event,
	reactor::IoContext,
};

/// Lifecycle of an event loop. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LoopState {
	Created = 0,
	Running = 1,
	Stopping = 2,
	Stopped = 3,
}

impl LoopState {
	fn from_u8(value: u8) -> Self {
		match value {
			0 => LoopState::Created,
			1 => LoopState::Running,
			2 => LoopState::Stopping,
			_ => LoopState::Stopped,
		}
	}
}

/// State shared by the loop handle, its worker thread and queued work.
pub(crate) struct Shared<H: EventHandler> {
	config: LoopConfig,
	io: IoContext,
	state: AtomicU8,
	handler: Mutex<H>,
	context: LoopContext<H::Payload>,
}

impl<H: EventHandler> Shared<H> {
	fn new(handler: H, config: LoopConfig) -> Arc<Self> {
		let io = IoContext::new();
		Arc::new_cyclic(|weak: &Weak<Self>| {
			let weak = weak.clone();
			let sender = EventSender::new(move |event| match weak.upgrade() {
				Some(shared) => shared.post_async(event),
				None => Err(PostError::NotRunning),
			});
			Self {
				context: LoopContext::new(config.name.clone(), io.clone(), sender),
				config,
				io,
				state: AtomicU8::new(LoopState::Created as u8),
				handler: Mutex::new(handler),
			}
		})
	}

	pub(crate) fn name(&self) -> &str {
		&self.config.name
	}

	pub(crate) fn io(&self) -> &IoContext {
		&self.io
	}

	pub(crate) fn handler(&self) -> &Mutex<H> {
		&self.handler
	}

	pub(crate) fn state(&self) -> LoopState {
		LoopState::from_u8(self.state.load(Ordering::SeqCst))
	}

	pub(crate) fn set_state(&self, state: LoopState) {
		self.state.store(state as u8, Ordering::SeqCst);
	}

	fn transition(&self, from: LoopState, to: LoopState) -> bool {
		self.state.compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst).is_ok()
	}

	/// Whether the caller is the handler of this loop, mid-event.
	fn in_handler(&self) -> bool {
		self.io.running_in_this_thread() && self.handler.is_locked()
	}

	/// Run the handler on `event`. Only ever called on the loop thread.
	fn deliver(&self, event: &mut Event<H::Payload>) {
		let mut handler = self.handler.lock();
		handler.on_event(event, &self.context);
	}

	fn post_async(self: &Arc<Self>, mut event: Event<H::Payload>) -> Result<(), PostError> {
		if self.state() != LoopState::Running {
			return Err(PostError::NotRunning);
		}

		let shared = self.clone();
		let task = move || shared.deliver(&mut event);
		// From inside the handler the event must wait its turn.
		let accepted = if self.in_handler() {
			self.io.post(task)
		} else {
			self.io.dispatch(task)
		};

		if accepted {
			Ok(())
		} else {
			Err(PostError::Dispatch)
		}
	}

	fn post_sync(self: &Arc<Self>, event: &mut Event<H::Payload>, timeout: Duration) -> Result<(), PostError> {
		if self.state() != LoopState::Running {
			return Err(PostError::NotRunning);
		}
		if self.in_handler() {
			return Err(PostError::Reentrant);
		}

		let token = SyncToken::new(mem::take(event));
		let call = SyncCall {
			token: token.clone(),
			shared: self.clone(),
			armed: true,
		};
		// A rejected call is dropped right here, which releases the wait below.
		self.io.dispatch(move || call.run());
		token.wait(event, timeout)
	}
}

/// Work item of a synchronous post.
///
/// Dropping it without running, e.g. because the loop stopped with the item
/// still queued, releases the waiting caller.
struct SyncCall<H: EventHandler> {
	token: Arc<SyncToken<H::Payload>>,
	shared: Arc<Shared<H>>,
	armed: bool,
}

impl<H: EventHandler> SyncCall<H> {
	fn run(mut self) {
		if let Some(mut event) = self.token.begin() {
			self.shared.deliver(&mut event);
			self.token.complete(event);
		}
		self.armed = false;
	}
}

impl<H: EventHandler> Drop for SyncCall<H> {
	fn drop(&mut self) {
		if self.armed {
			self.token.abandon();
		}
	}
}

/// An actor: a handler, a reactor and the worker thread running both.
///
/// Dropping the loop quits it.
pub struct EventLoop<H: EventHandler> {
	shared: Arc<Shared<H>>,
	thread: Mutex<Option<JoinHandle<()>>>,
}

impl<H: EventHandler> EventLoop<H> {
	pub fn new(handler: H) -> Self {
		Self::with_config(handler, LoopConfig::default())
	}

	pub fn with_config(handler: H, config: LoopConfig) -> Self {
		Self {
			shared: Shared::new(handler, config),
			thread: Mutex::new(None),
		}
	}

	pub fn name(&self) -> &str {
		self.shared.name()
	}

	pub fn state(&self) -> LoopState {
		self.shared.state()
	}

	pub fn is_running(&self) -> bool {
		self.state() == LoopState::Running
	}

	/// The reactor driving this loop.
	pub fn io_context(&self) -> &IoContext {
		&self.shared.io
	}

	/// A sender posting asynchronous events to this loop.
	pub fn sender(&self) -> EventSender<H::Payload> {
		self.shared.context.sender()
	}

	/// Spawn the worker thread and wait until it runs the handler's
	/// `on_start`.
	pub fn start(&self) -> Result<(), StartError> {
		let mut thread = self.thread.lock();
		if self.shared.state() != LoopState::Created {
			return Err(StartError::AlreadyStarted);
		}

		let (ready_tx, ready_rx) = bounded(1);
		let shared = self.shared.clone();
		self.shared.io.post(move || {
			shared.handler.lock().on_start(&shared.context);
			let _ = ready_tx.send(());
		});
		self.shared.set_state(LoopState::Running);

		match spawn_loop_thread(self.shared.clone()) {
			Ok(handle) => *thread = Some(handle),
			Err(err) => {
				error!(event_loop = %self.name(), error = %err, "failed to spawn event loop thread");
				self.shared.set_state(LoopState::Stopped);
				self.shared.io.stop();
				// Discards the queued start callback.
				self.shared.io.run();
				return Err(err.into());
			}
		}
		drop(thread);

		ready_rx.recv().map_err(|_| StartError::Handshake)?;
		debug!(event_loop = %self.name(), "event loop started");
		Ok(())
	}

	/// Queue `event` for the handler and return immediately.
	///
	/// Posted from the loop thread outside of the handler, e.g. from a timer
	/// callback, the event is handled before this returns.
	pub fn post_event(&self, event: Event<H::Payload>) -> Result<(), PostError> {
		self.shared.post_async(event)
	}

	/// Hand `event` to the handler and block until it was processed, using
	/// the configured timeout.
	pub fn post_event_sync(&self, event: &mut Event<H::Payload>) -> Result<(), PostError> {
		self.post_event_timeout(event, self.shared.config.sync_timeout)
	}

	/// Hand `event` to the handler and block until it was processed or
	/// `timeout` elapsed.
	///
	/// On success `event` holds whatever the handler wrote into it. On
	/// timeout the handler's writes, if any arrive later, are discarded. If
	/// the timeout strikes before the handler took the event, `event` is
	/// handed back unchanged; if the handler was already working on it,
	/// `event` is left as `Event::default()` and its original payload is
	/// lost with the late result.
	pub fn post_event_timeout(&self, event: &mut Event<H::Payload>, timeout: Duration) -> Result<(), PostError> {
		self.shared.post_sync(event, timeout)
	}

	/// Stop the loop and wait for the worker thread to exit.
	///
	/// The event being handled, if any, completes first. Events still queued
	/// are dropped and their synchronous posters released. Idempotent.
	pub fn quit(&self) {
		let mut thread = self.thread.lock();

		if self.shared.transition(LoopState::Created, LoopState::Stopped) {
			self.shared.io.stop();
			return;
		}
		self.shared.transition(LoopState::Running, LoopState::Stopping);
		self.shared.io.stop();

		let Some(handle) = thread.take() else {
			return;
		};
		if handle.thread().id() == thread::current().id() {
			warn!(event_loop = %self.name(), "quit called on the loop thread, not joining");
			*thread = Some(handle);
			return;
		}
		if handle.join().is_err() {
			error!(event_loop = %self.name(), "event loop thread panicked");
		}
		self.shared.set_state(LoopState::Stopped);
		debug!(event_loop = %self.name(), "event loop quit");
	}
}

impl<H: EventHandler> Drop for EventLoop<H> {
	fn drop(&mut self) {
		self.quit();
	}
}

impl<H: EventHandler> fmt::Debug for EventLoop<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventLoop").field("name", &self.name()).field("state", &self.state()).finish()
	}
}
