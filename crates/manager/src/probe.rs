// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	net::{Ipv4Addr, SocketAddr, TcpStream},
	time::Duration,
};

/// Tells whether the VNC server is serving.
pub trait ServiceProbe: Send {
	fn is_running(&mut self, port: u16) -> bool;
}

/// Considers the server running when its port accepts local connections.
#[derive(Debug, Clone)]
pub struct TcpProbe {
	timeout: Duration,
}

impl TcpProbe {
	pub fn new(timeout: Duration) -> Self {
		Self {
			timeout,
		}
	}
}

impl ServiceProbe for TcpProbe {
	fn is_running(&mut self, port: u16) -> bool {
		let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
		TcpStream::connect_timeout(&addr, self.timeout).is_ok()
	}
}
