// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Opcodes and payloads of the manager loop.

use serde::Serialize;

use crate::MgrError;

/// Opcodes understood by the manager loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Opcode {
	QueryStatus = 0,
	QueryStatusInternal = 1,
	ChangePassword = 2,
	ChangePasswordInternal = 3,
	StopServer = 4,
	Heartbeat = 5,
}

impl Opcode {
	pub fn from_what(what: i32) -> Option<Self> {
		match what {
			0 => Some(Self::QueryStatus),
			1 => Some(Self::QueryStatusInternal),
			2 => Some(Self::ChangePassword),
			3 => Some(Self::ChangePasswordInternal),
			4 => Some(Self::StopServer),
			5 => Some(Self::Heartbeat),
			_ => None,
		}
	}
}

impl From<Opcode> for i32 {
	fn from(opcode: Opcode) -> Self {
		opcode as i32
	}
}

/// Status handed to the remote platform. The password pair only ever leaves
/// the host encrypted, in `p`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
	pub port: u16,
	pub uuid: String,
	pub p: String,
	pub addresses: Vec<String>,
	pub available: bool,
}

/// Status for local tooling, with plaintext passwords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InternalStatus {
	pub port: u16,
	pub uuid: String,
	pub p1: String,
	pub p2: String,
	pub addresses: Vec<String>,
	pub available: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordChange {
	pub old: String,
	pub new: String,
	pub new2: String,
}

/// Payload of manager events.
#[derive(Debug, Default)]
pub enum MgrPayload {
	#[default]
	None,
	Status(StatusReport),
	StatusInternal(InternalStatus),
	/// Base64 AES ciphertext of `"<old> <new> <new2>"`.
	Encoded(String),
	Passwords(PasswordChange),
	/// Written back by the handler when a request fails.
	Failed(MgrError),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_opcode_round_trip() {
		for opcode in [
			Opcode::QueryStatus,
			Opcode::QueryStatusInternal,
			Opcode::ChangePassword,
			Opcode::ChangePasswordInternal,
			Opcode::StopServer,
			Opcode::Heartbeat,
		] {
			assert_eq!(Opcode::from_what(opcode.into()), Some(opcode));
		}
		assert_eq!(Opcode::from_what(-1), None);
	}

	#[test]
	fn test_status_report_json() {
		let report = StatusReport {
			port: 5900,
			uuid: "abc".to_string(),
			p: "cipher".to_string(),
			addresses: vec!["10.0.0.2".to_string(), "host".to_string()],
			available: true,
		};
		let json = serde_json::to_value(&report).unwrap();
		assert_eq!(
			json,
			serde_json::json!({
				"port": 5900,
				"uuid": "abc",
				"p": "cipher",
				"addresses": ["10.0.0.2", "host"],
				"available": true,
			})
		);
	}
}
