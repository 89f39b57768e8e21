// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Dedicated worker thread of an event loop.

use std::{io, sync::Arc, thread};

use tracing::debug;

use crate::actor::{
	event_loop::{LoopState, Shared},
	traits::EventHandler,
};

/// Spawn the thread that drives the loop's reactor until it is stopped.
pub(crate) fn spawn_loop_thread<H: EventHandler>(shared: Arc<Shared<H>>) -> io::Result<thread::JoinHandle<()>> {
	let thread_name = shared.name().to_string();

	thread::Builder::new().name(thread_name.clone()).spawn(move || {
		debug!(event_loop = %thread_name, "event loop thread starting");
		run_loop(&shared);
		debug!(event_loop = %thread_name, "event loop thread stopped");
	})
}

/// Run the reactor on the current thread, then shut the handler down.
fn run_loop<H: EventHandler>(shared: &Shared<H>) {
	shared.io().run();
	shared.handler().lock().on_stop();
	shared.set_state(LoopState::Stopped);
}
