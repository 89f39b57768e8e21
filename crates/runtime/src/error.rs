// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{io, time::Duration};

/// Error returned when an event could not be delivered or answered.
#[derive(Debug, thiserror::Error)]
pub enum PostError {
	/// The event loop was never started or has already stopped.
	#[error("event loop is not running")]
	NotRunning,

	/// A synchronous post did not complete before its deadline.
	#[error("synchronous post timed out after {}ms", .0.as_millis())]
	Timeout(Duration),

	/// The loop dropped the work before running it, e.g. during shutdown.
	#[error("event loop dropped the event before handling it")]
	Dispatch,

	/// A synchronous post was issued from inside the handler of the same loop.
	#[error("synchronous post from inside the event handler of the same loop")]
	Reentrant,
}

/// Error returned when an event loop fails to start.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
	#[error("event loop was already started")]
	AlreadyStarted,

	#[error("failed to spawn event loop thread: {0}")]
	Spawn(#[from] io::Error),

	#[error("event loop thread exited before it began processing")]
	Handshake,
}
