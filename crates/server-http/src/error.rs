// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! HTTP error handling and response formatting.
//!
//! Failures are reported in the body, not in the status line: every API
//! response is `200 OK` with a JSON `code`, and a `message` when the code is
//! not zero.

use std::{io, net::SocketAddr};

use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde::Serialize;
use vncmgr_manager::MgrError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub code: i32,
	pub message: String,
}

impl ErrorResponse {
	pub fn new(code: i32, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
		}
	}
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error(transparent)]
	Manager(#[from] MgrError),

	#[error("uuid is empty or not matched")]
	UuidMismatch,

	/// The blocking task running the manager call failed.
	#[error("internal system error")]
	Task(String),
}

impl AppError {
	pub fn code(&self) -> i32 {
		match self {
			AppError::Manager(err) => err.code(),
			AppError::UuidMismatch | AppError::Task(_) => -1,
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		if let AppError::Task(reason) = &self {
			tracing::error!("manager task failed: {}", reason);
		}
		let body = Json(ErrorResponse::new(self.code(), self.to_string()));
		(StatusCode::OK, body).into_response()
	}
}

/// Error running the HTTP server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("failed to bind {addr}: {source}")]
	Bind {
		addr: SocketAddr,
		#[source]
		source: io::Error,
	},

	#[error("failed to build the server runtime: {0}")]
	Runtime(#[source] io::Error),

	#[error("http server failed: {0}")]
	Serve(#[source] io::Error),

	#[error("http server already running")]
	AlreadyRunning,
}
