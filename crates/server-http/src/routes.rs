// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use axum::{Router, routing::get};

use crate::handlers::{
	AppState, handle_change_password, handle_change_password_internal, handle_query_status,
	handle_query_status_internal, handle_root, handle_stop,
};

pub const QUERY_STATUS_PATH: &str = "/api/v1/QueryStatus";
pub const CHANGE_PASSWD_PATH: &str = "/api/v1/ChangePP";
pub const INTERNAL_QUERY_STATUS_PATH: &str = "/internal/Query";
pub const INTERNAL_CHANGE_PASSWD_PATH: &str = "/internal/ChangePWD";
pub const INTERNAL_STOP_PATH: &str = "/internal/stop";

/// Build the control server router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(handle_root))
		.route(QUERY_STATUS_PATH, get(handle_query_status))
		.route(CHANGE_PASSWD_PATH, get(handle_change_password).post(handle_change_password))
		.route(INTERNAL_QUERY_STATUS_PATH, get(handle_query_status_internal))
		.route(
			INTERNAL_CHANGE_PASSWD_PATH,
			get(handle_change_password_internal).post(handle_change_password_internal),
		)
		.route(INTERNAL_STOP_PATH, get(handle_stop).post(handle_stop))
		.with_state(state)
}
