// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! HTTP control server of the VNC manager.
//!
//! An Axum server exposing the manager to the remote platform and to local
//! tooling. Every manager call blocks on the manager loop, so handlers run
//! them on the blocking pool.
//!
//! # Endpoints
//!
//! - `GET /` - Greeting
//! - `GET /api/v1/QueryStatus` - Status with the encrypted password pair
//! - `GET|POST /api/v1/ChangePP` - Change passwords, `uuid` and `p`
//! - `GET /internal/Query` - Status with plaintext passwords
//! - `GET|POST /internal/ChangePWD` - Change passwords, `p0`, `p1` and `p2`
//! - `GET|POST /internal/stop` - Graceful shutdown

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use config::{DEFAULT_HTTP_PORT, HttpConfig};
pub use error::{AppError, ErrorResponse, ServerError};
pub use handlers::{ApiResponse, AppState};
pub use routes::router;
pub use server::HttpServer;
