// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! HTTP endpoint handlers.
//!
//! - `/` - Greeting
//! - `/api/v1/QueryStatus` - Status for the platform, passwords encrypted
//! - `/api/v1/ChangePP` - Change passwords from an encrypted triple
//! - `/internal/Query` - Status for local tooling
//! - `/internal/ChangePWD` - Change passwords from plaintext parameters
//! - `/internal/stop` - Shut the server down

use std::{collections::HashMap, sync::Arc};

use axum::{
	Json,
	extract::{Form, Query, State, rejection::FormRejection},
};
use serde::Serialize;
use tokio::{sync::Notify, task};
use tracing::info;
use vncmgr_manager::{InternalStatus, StatusReport, VncManager};

use crate::error::AppError;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
	pub manager: Arc<VncManager>,
	/// Installation uuid `ChangePP` requests must carry.
	pub uuid: String,
	pub shutdown: Arc<Notify>,
}

/// Successful API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
	pub code: i32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
}

impl<T> ApiResponse<T> {
	pub fn data(data: T) -> Self {
		Self {
			code: 0,
			data: Some(data),
		}
	}
}

impl ApiResponse<()> {
	pub fn ok() -> Self {
		Self {
			code: 0,
			data: None,
		}
	}
}

/// Request parameters from the query string, overridden by an urlencoded
/// body.
struct Params(HashMap<String, String>);

impl Params {
	fn merge(query: HashMap<String, String>, form: Result<Form<HashMap<String, String>>, FormRejection>) -> Self {
		let mut params = query;
		if let Ok(Form(form)) = form {
			params.extend(form);
		}
		Self(params)
	}

	fn get(&self, name: &str) -> &str {
		self.0.get(name).map(String::as_str).unwrap_or("")
	}
}

/// Run a blocking manager call off the async workers.
async fn blocking<T, F>(manager: &Arc<VncManager>, call: F) -> Result<T, AppError>
where
	T: Send + 'static,
	F: FnOnce(&VncManager) -> Result<T, vncmgr_manager::MgrError> + Send + 'static,
{
	let manager = manager.clone();
	let result = task::spawn_blocking(move || call(&manager)).await.map_err(|e| AppError::Task(e.to_string()))?;
	Ok(result?)
}

fn log_failure(action: &str, err: &AppError) {
	info!("request#{} failed: {} ({})", action, err.code(), err);
}

pub async fn handle_root() -> &'static str {
	"Welcome!"
}

pub async fn handle_query_status(State(state): State<AppState>) -> Result<Json<ApiResponse<StatusReport>>, AppError> {
	let status = blocking(&state.manager, |manager| manager.query_status()).await?;
	Ok(Json(ApiResponse::data(status)))
}

pub async fn handle_query_status_internal(
	State(state): State<AppState>,
) -> Result<Json<ApiResponse<InternalStatus>>, AppError> {
	let status = blocking(&state.manager, |manager| manager.query_status_internal()).await?;
	Ok(Json(ApiResponse::data(status)))
}

/// Change passwords. Parameters: `uuid`, `p`.
pub async fn handle_change_password(
	State(state): State<AppState>,
	Query(query): Query<HashMap<String, String>>,
	form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Json<ApiResponse<()>>, AppError> {
	let params = Params::merge(query, form);
	if params.get("uuid") != state.uuid {
		let err = AppError::UuidMismatch;
		log_failure("changePassword", &err);
		return Err(err);
	}

	let encoded = params.get("p").to_string();
	blocking(&state.manager, move |manager| manager.change_password(&encoded))
		.await
		.inspect_err(|err| log_failure("changePassword", err))?;
	Ok(Json(ApiResponse::ok()))
}

/// Change passwords. Parameters: `p0` (current), `p1`, `p2`.
pub async fn handle_change_password_internal(
	State(state): State<AppState>,
	Query(query): Query<HashMap<String, String>>,
	form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Json<ApiResponse<()>>, AppError> {
	let params = Params::merge(query, form);
	let (old, new, new2) = (params.get("p0").to_string(), params.get("p1").to_string(), params.get("p2").to_string());

	blocking(&state.manager, move |manager| manager.change_password_internal(&old, &new, &new2))
		.await
		.inspect_err(|err| log_failure("changePassword", err))?;
	Ok(Json(ApiResponse::ok()))
}

pub async fn handle_stop(State(state): State<AppState>) -> &'static str {
	info!("http server stop requested");
	state.shutdown.notify_one();
	"OK"
}
