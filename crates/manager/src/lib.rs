// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! The VNC manager actor.
//!
//! A [`VncManager`] keeps track of the local VNC server: its port, its two
//! passwords, the host's addresses and whether the server is up. A heartbeat
//! refreshes that state every few seconds and reports it to the remote
//! platform. Callers query the state and change the passwords through
//! synchronous requests answered on the manager loop.

mod config;
mod error;
mod event;
mod handler;
mod manager;
pub mod network;
pub mod platform;
pub mod probe;

pub use config::MgrConfig;
pub use error::{MgrError, PlatformError};
pub use event::{InternalStatus, MgrPayload, Opcode, PasswordChange, StatusReport};
pub use manager::{Collaborators, VncManager};
