// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Event loop actors.
//!
//! An actor owns its state on a single worker thread and is only reachable
//! by posting events to it.

pub mod context;
pub mod event_loop;
mod sync;
mod thread;
pub mod traits;
