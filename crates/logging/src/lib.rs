// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Logging setup for the VNC manager.
//!
//! Installs a `tracing` subscriber writing to one of the destinations
//! described by [`LogOutput`]. Rotating file output keeps its directory
//! tidy through a [`LogRecycler`] actor.

mod error;
mod level;
mod output;
mod recycler;
mod rotating;

use std::sync::Mutex;

use tracing_subscriber::{
	EnvFilter, Registry, fmt, fmt::writer::BoxMakeWriter, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

pub use error::LogError;
pub use level::LogLevel;
pub use output::{LogOutput, Rotation};
pub use recycler::{LogRecycler, RECYCLE_INTERVAL, sweep};
pub use rotating::{RotatingFile, RotatingMakeWriter};

/// Log output used by the service unless told otherwise.
pub const DEFAULT_OUTPUT: &str = "rot://logs/vncmgr.log:100000000:86400:-1";

/// Build the writer for `output`.
pub fn make_writer(output: &LogOutput) -> Result<BoxMakeWriter, LogError> {
	Ok(match output {
		LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
		LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
		LogOutput::File(path) => {
			let file = std::fs::OpenOptions::new().create(true).append(true).open(path).map_err(|source| {
				LogError::Open {
					path: path.clone(),
					source,
				}
			})?;
			BoxMakeWriter::new(Mutex::new(file))
		}
		LogOutput::Rotating(rotation) => BoxMakeWriter::new(RotatingFile::open(rotation.clone())?.make_writer()),
	})
}

/// Adjusts the verbosity of the installed subscriber.
#[derive(Debug, Clone)]
pub struct LogHandle {
	filter: reload::Handle<EnvFilter, Registry>,
	/// `RUST_LOG` was set and wins over configured levels.
	env_override: bool,
}

impl LogHandle {
	/// Switch to `level`. Ignored while `RUST_LOG` is in effect.
	pub fn set_level(&self, level: LogLevel) -> Result<(), LogError> {
		if self.env_override {
			return Ok(());
		}
		self.filter.reload(EnvFilter::new(level.directive())).map_err(|err| LogError::Init(err.to_string()))
	}
}

/// Install the global subscriber.
///
/// `RUST_LOG`, when set, takes precedence over `level`.
pub fn init(output: &LogOutput, level: LogLevel) -> Result<LogHandle, LogError> {
	let writer = make_writer(output)?;
	let (filter, env_override) = match EnvFilter::try_from_default_env() {
		Ok(filter) => (filter, true),
		Err(_) => (EnvFilter::new(level.directive()), false),
	};
	let (filter, handle) = reload::Layer::new(filter);
	let ansi = matches!(output, LogOutput::Stderr | LogOutput::Stdout);

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_writer(writer).with_ansi(ansi).with_thread_ids(true).with_target(false))
		.try_init()
		.map_err(|err| LogError::Init(err.to_string()))?;

	Ok(LogHandle {
		filter: handle,
		env_override,
	})
}
