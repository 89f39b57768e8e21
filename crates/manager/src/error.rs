// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use vncmgr_crypto::CryptoError;
use vncmgr_runtime::StartError;
use vncmgr_settings::SettingsError;

/// Error reported by the VNC manager to its callers.
///
/// Every variant maps to result code `-1`; the display text is the message
/// handed back to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum MgrError {
	#[error("system is down")]
	SystemDown,

	#[error("internal system error")]
	Internal,

	#[error("manager was already started")]
	AlreadyStarted,

	#[error("failed to start manager loop: {0}")]
	Start(#[from] StartError),

	#[error("Invalid params: The encoded_password cannot be empty")]
	EmptyEncodedPassword,

	#[error("Invalid params: The encoded_password cannot be decoded: {0}")]
	Decode(#[source] CryptoError),

	#[error("Internal error: can not find current password")]
	MissingCurrentPassword,

	#[error("Invalid params: The password_pair cannot contain any space")]
	PasswordFieldCount,

	#[error("Invalid params: The password cannot be empty")]
	EmptyPassword,

	#[error("Invalid params: The password must contain a maximum of 8 characters")]
	PasswordTooLong,

	#[error("Invalid params: The password must not contain space character")]
	PasswordContainsSpace,

	#[error("Unauthorized: the current password is not correct")]
	Unauthorized,

	#[error("Internal error: can not store the new password: {0}")]
	Store(#[source] SettingsError),

	#[error("Internal error: can not encrypt the password pair: {0}")]
	Encrypt(#[source] CryptoError),
}

impl MgrError {
	/// Result code reported alongside the message.
	pub fn code(&self) -> i32 {
		-1
	}
}

/// Error talking to the remote platform or the local control server.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
	#[error("invalid url {url}: {reason}")]
	Url {
		url: String,
		reason: String,
	},

	#[error(transparent)]
	Http(#[from] reqwest::Error),
}
