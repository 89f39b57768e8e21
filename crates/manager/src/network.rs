// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Addresses this host is reachable at.

use std::{io, net::ToSocketAddrs};

use tracing::warn;

/// Source of the addresses reported to the platform.
pub trait NetAddresses: Send {
	/// IPv4 addresses followed by the host name. Empty when unresolvable.
	fn addresses(&mut self) -> Vec<String>;
}

/// Resolves the local host name, reusing the result for a number of lookups.
#[derive(Debug)]
pub struct HostAddresses {
	cached: Vec<String>,
	hits: usize,
	refresh_after: usize,
}

impl HostAddresses {
	pub fn new(refresh_after: usize) -> Self {
		Self {
			cached: Vec::new(),
			hits: 0,
			refresh_after,
		}
	}

	fn resolve() -> io::Result<Vec<String>> {
		let host = hostname()?;
		let mut addresses: Vec<String> = Vec::new();
		for addr in (host.as_str(), 0).to_socket_addrs()? {
			if !addr.is_ipv4() {
				continue;
			}
			let ip = addr.ip().to_string();
			if !addresses.contains(&ip) {
				addresses.push(ip);
			}
		}
		addresses.push(host);
		Ok(addresses)
	}
}

impl NetAddresses for HostAddresses {
	fn addresses(&mut self) -> Vec<String> {
		if !self.cached.is_empty() && self.hits < self.refresh_after {
			self.hits += 1;
			return self.cached.clone();
		}

		self.hits = 0;
		self.cached = match Self::resolve() {
			Ok(addresses) => addresses,
			Err(err) => {
				warn!(error = %err, "local addresses unavailable");
				Vec::new()
			}
		};
		self.cached.clone()
	}
}

#[cfg(unix)]
fn hostname() -> io::Result<String> {
	let mut buf = [0u8; 256];
	// SAFETY: `buf` is valid for writes of `buf.len()` bytes.
	let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
	if rc != 0 {
		return Err(io::Error::last_os_error());
	}
	let len = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
	Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
}

#[cfg(not(unix))]
fn hostname() -> io::Result<String> {
	std::env::var("COMPUTERNAME").map_err(io::Error::other)
}
