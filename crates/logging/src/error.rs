// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{io, path::PathBuf};

use vncmgr_runtime::StartError;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
	#[error("invalid log output {0:?}")]
	InvalidOutput(String),

	#[error("invalid log level {0:?}")]
	InvalidLevel(String),

	#[error("failed to open log file {}: {source}", path.display())]
	Open {
		path: PathBuf,
		source: io::Error,
	},

	#[error("failed to install log subscriber: {0}")]
	Init(String),

	#[error("failed to start log recycler: {0}")]
	Recycler(#[from] StartError),
}
