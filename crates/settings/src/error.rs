// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{io, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("failed to read settings file {}: {source}", path.display())]
	Read {
		path: PathBuf,
		source: io::Error,
	},

	#[error("failed to write settings file {}: {source}", path.display())]
	Write {
		path: PathBuf,
		source: io::Error,
	},

	#[error("invalid settings key: {0:?}")]
	InvalidKey(String),
}
