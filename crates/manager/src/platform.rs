// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Outgoing HTTP requests of the manager.

use std::time::Duration;

use reqwest::{Url, blocking::Client};

use crate::PlatformError;

/// Path of the control server endpoint that shuts it down.
pub const STOP_PATH: &str = "/internal/stop";

pub trait PlatformClient: Send {
	/// Send `status` as query parameters of `GET <addr><path>`.
	fn update_status(&self, addr: &str, path: &str, status: &[(&str, String)]) -> Result<(), PlatformError>;

	/// Ask the control server listening on local `port` to shut down.
	fn send_stop(&self, port: u16) -> Result<(), PlatformError>;
}

/// [`PlatformClient`] over blocking `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpPlatform {
	timeout: Duration,
}

impl HttpPlatform {
	pub fn new(timeout: Duration) -> Self {
		Self {
			timeout,
		}
	}

	fn client(&self) -> Result<Client, PlatformError> {
		Ok(Client::builder().connect_timeout(self.timeout).timeout(self.timeout).build()?)
	}
}

impl PlatformClient for HttpPlatform {
	fn update_status(&self, addr: &str, path: &str, status: &[(&str, String)]) -> Result<(), PlatformError> {
		let url = status_url(addr, path, status)?;
		self.client()?.get(url).send()?.error_for_status()?;
		Ok(())
	}

	fn send_stop(&self, port: u16) -> Result<(), PlatformError> {
		self.client()?.get(format!("http://127.0.0.1:{port}{STOP_PATH}")).send()?.error_for_status()?;
		Ok(())
	}
}

fn status_url(addr: &str, path: &str, status: &[(&str, String)]) -> Result<Url, PlatformError> {
	let url = format!("{addr}{path}");
	Url::parse_with_params(&url, status.iter().map(|(key, value)| (*key, value.as_str()))).map_err(|err| {
		PlatformError::Url {
			url,
			reason: err.to_string(),
		}
	})
}
