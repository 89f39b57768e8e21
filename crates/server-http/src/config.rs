// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default port of the control server.
pub const DEFAULT_HTTP_PORT: u16 = 18480;

/// Configuration for the HTTP control server.
#[derive(Debug, Clone)]
pub struct HttpConfig {
	/// Address to bind to.
	///
	/// Default: 0.0.0.0
	pub host: IpAddr,

	/// Port to listen on, 0 picks a free one.
	///
	/// Default: 18480
	pub port: u16,

	/// Worker threads of the server runtime.
	///
	/// Default: 2
	pub worker_threads: usize,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
			port: DEFAULT_HTTP_PORT,
			worker_threads: 2,
		}
	}
}

impl HttpConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn host(mut self, host: IpAddr) -> Self {
		self.host = host;
		self
	}

	pub fn port(mut self, port: u16) -> Self {
		self.port = port;
		self
	}

	pub fn worker_threads(mut self, threads: usize) -> Self {
		self.worker_threads = threads.max(1);
		self
	}

	pub fn bind_addr(&self) -> SocketAddr {
		SocketAddr::new(self.host, self.port)
	}
}
