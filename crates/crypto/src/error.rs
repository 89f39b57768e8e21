// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
	#[error("invalid base64: {0}")]
	Base64(#[from] base64::DecodeError),

	#[error("decrypted data is not valid UTF-8")]
	Utf8,

	#[error("invalid obfuscated password {0:?}")]
	InvalidStoredPassword(String),

	#[error("obfuscated password checksum mismatch")]
	Checksum,

	#[error("failed to run openssl: {0}")]
	Io(#[from] io::Error),

	#[error("openssl exited with {status}: {stderr}")]
	Openssl {
		status: String,
		stderr: String,
	},
}
