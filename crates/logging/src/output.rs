// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	path::{Path, PathBuf},
	str::FromStr,
	time::Duration,
};

use crate::LogError;

/// Rotation policy of a rotating log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
	/// Base path; every file gets a timestamp suffix appended.
	pub path: PathBuf,
	/// Start a new file before one reaches this many bytes.
	pub max_size: Option<u64>,
	/// Start a new file once the current one is this old.
	pub max_duration: Option<Duration>,
	/// Keep at most this many files around.
	pub max_files: Option<usize>,
}

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
	Stderr,
	Stdout,
	/// `file://<path>`
	File(PathBuf),
	/// `rot://<path>:<max_size>:<max_duration_secs>:<max_files>`; values of
	/// zero or below disable the respective limit.
	Rotating(Rotation),
}

impl LogOutput {
	/// Resolve a relative file path against `dir`.
	pub fn relative_to(self, dir: &Path) -> Self {
		match self {
			LogOutput::File(path) if path.is_relative() => LogOutput::File(dir.join(path)),
			LogOutput::Rotating(mut rotation) if rotation.path.is_relative() => {
				rotation.path = dir.join(&rotation.path);
				LogOutput::Rotating(rotation)
			}
			other => other,
		}
	}
}

fn positive(value: i64) -> Option<u64> {
	u64::try_from(value).ok().filter(|v| *v > 0)
}

impl FromStr for LogOutput {
	type Err = LogError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || LogError::InvalidOutput(s.to_string());

		match s {
			"" | "stderr" => return Ok(LogOutput::Stderr),
			"stdout" => return Ok(LogOutput::Stdout),
			_ => {}
		}

		if let Some(path) = s.strip_prefix("file://") {
			if path.is_empty() {
				return Err(invalid());
			}
			return Ok(LogOutput::File(PathBuf::from(path)));
		}

		if let Some(spec) = s.strip_prefix("rot://") {
			// The path may itself contain colons, the numbers never do.
			let mut parts = spec.rsplitn(4, ':');
			let max_files = parts.next().and_then(|v| v.parse::<i64>().ok()).ok_or_else(invalid)?;
			let max_duration = parts.next().and_then(|v| v.parse::<i64>().ok()).ok_or_else(invalid)?;
			let max_size = parts.next().and_then(|v| v.parse::<i64>().ok()).ok_or_else(invalid)?;
			let path = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;

			return Ok(LogOutput::Rotating(Rotation {
				path: PathBuf::from(path),
				max_size: positive(max_size),
				max_duration: positive(max_duration).map(Duration::from_secs),
				max_files: positive(max_files).and_then(|v| usize::try_from(v).ok()),
			}));
		}

		Err(invalid())
	}
}
