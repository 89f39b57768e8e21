// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Single-threaded actor runtime.
//!
//! - [`IoContext`]: a run loop executing callbacks and timers on one thread
//! - [`Timer`]: one-shot timers bound to an `IoContext`
//! - [`EventLoop`]: an actor, an [`EventHandler`] driven by its own worker
//!   thread and fed with [`Event`]s, synchronously or asynchronously

use std::time::Duration;

pub mod actor;
pub mod error;
pub mod event;
pub mod reactor;
pub mod timer;

pub use actor::{
	context::{EventSender, LoopContext},
	event_loop::{EventLoop, LoopState},
	traits::{EventHandler, LoopConfig},
};
pub use error::{PostError, StartError};
pub use event::{Event, UNSET};
pub use reactor::IoContext;
pub use timer::Timer;

/// Timeout of synchronous posts unless configured otherwise.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(300);
