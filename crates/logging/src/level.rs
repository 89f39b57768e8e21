// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{fmt, str::FromStr};

use crate::LogError;

/// Verbosity configured in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
	Debug,
	Info,
	Warning,
}

impl LogLevel {
	/// `Debug` for debug builds, `Info` otherwise.
	pub fn build_default() -> Self {
		if cfg!(debug_assertions) {
			LogLevel::Debug
		} else {
			LogLevel::Info
		}
	}

	/// `EnvFilter` directive of this level.
	pub fn directive(&self) -> &'static str {
		match self {
			LogLevel::Debug => "debug",
			LogLevel::Info => "info",
			LogLevel::Warning => "warn",
		}
	}
}

impl FromStr for LogLevel {
	type Err = LogError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_uppercase().as_str() {
			"DEBUG" => Ok(LogLevel::Debug),
			"INFO" => Ok(LogLevel::Info),
			"WARNING" | "WARN" => Ok(LogLevel::Warning),
			_ => Err(LogError::InvalidLevel(s.to_string())),
		}
	}
}

impl fmt::Display for LogLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			LogLevel::Debug => "DEBUG",
			LogLevel::Info => "INFO",
			LogLevel::Warning => "WARNING",
		})
	}
}
