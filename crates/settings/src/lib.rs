// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Key/value persistence for the VNC manager.
//!
//! Values are grouped in sections and addressed by `(section, key)`. The
//! production store is an INI file shared with the VNC server itself, see
//! [`IniFile`].

mod error;
mod ini;
pub mod keys;

pub use error::SettingsError;
pub use ini::IniFile;

/// A sectioned key/value store.
pub trait Settings: Send + Sync {
	/// Read a value. Missing sections and keys yield `None`.
	fn get(&self, section: &str, key: &str) -> Option<String>;

	/// Write a value, creating the section and key when missing.
	fn set(&self, section: &str, key: &str, value: &str) -> Result<(), SettingsError>;

	/// Read a value as an integer. Unparsable values yield `None`.
	fn get_int(&self, section: &str, key: &str) -> Option<i64> {
		self.get(section, key)?.trim().parse().ok()
	}

	/// Read an integer, falling back to `default` when missing or invalid.
	fn get_int_or(&self, section: &str, key: &str, default: i64) -> i64 {
		self.get_int(section, key).unwrap_or(default)
	}

	fn set_int(&self, section: &str, key: &str, value: i64) -> Result<(), SettingsError> {
		self.set(section, key, &value.to_string())
	}
}
