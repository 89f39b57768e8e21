// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::Duration;

use vncmgr_runtime::DEFAULT_SYNC_TIMEOUT;

/// Configuration for the VNC manager.
#[derive(Debug, Clone)]
pub struct MgrConfig {
	/// Interval between two status refreshes.
	///
	/// Default: 3 seconds
	pub heartbeat_interval: Duration,

	/// Connect and read timeout of outgoing HTTP requests.
	///
	/// Default: 300 milliseconds
	pub request_timeout: Duration,

	/// File name of the platform public key inside the application directory.
	///
	/// Default: "plt_rsa_pub_pkcs8.pem"
	pub public_key_file: String,

	/// Number of address lookups served from cache before resolving again.
	///
	/// Default: 10
	pub address_refresh: usize,

	/// How long callers wait for a synchronous request.
	///
	/// Default: 300 seconds
	pub sync_timeout: Duration,
}

impl Default for MgrConfig {
	fn default() -> Self {
		Self {
			heartbeat_interval: Duration::from_secs(3),
			request_timeout: Duration::from_millis(300),
			public_key_file: "plt_rsa_pub_pkcs8.pem".to_string(),
			address_refresh: 10,
			sync_timeout: DEFAULT_SYNC_TIMEOUT,
		}
	}
}

impl MgrConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
		self.heartbeat_interval = interval;
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn public_key_file(mut self, file: impl Into<String>) -> Self {
		self.public_key_file = file.into();
		self
	}

	pub fn address_refresh(mut self, lookups: usize) -> Self {
		self.address_refresh = lookups;
		self
	}

	pub fn sync_timeout(mut self, timeout: Duration) -> Self {
		self.sync_timeout = timeout;
		self
	}
}
