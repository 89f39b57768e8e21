// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Size and age bounded log files.
//!
//! Every file is named after the base path plus the local time it was
//! opened, formatted with [`SUFFIX_FORMAT`]. A new file is started when none
//! is open, when the next record would reach the size limit or when the
//! current file exceeded its maximum age.

use std::{
	fs::{self, File, OpenOptions},
	io::{self, Write},
	path::PathBuf,
	sync::Arc,
	time::Instant,
};

use chrono::Local;
use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;

use crate::{LogError, LogRecycler, RECYCLE_INTERVAL, Rotation};

/// Timestamp suffix of rotated files.
pub const SUFFIX_FORMAT: &str = "-%Y%m%d_%H%M%S";

struct Current {
	file: File,
	size: u64,
	opened_at: Instant,
}

struct State {
	current: Option<Current>,
	/// Set once a file could not be opened; records go to stderr from then on.
	fallback: bool,
}

/// A rotating log file. Cheap to share; see [`RotatingFile::make_writer`].
pub struct RotatingFile {
	rotation: Rotation,
	state: Mutex<State>,
	/// Quits when the file is dropped.
	recycler: Option<LogRecycler>,
}

impl RotatingFile {
	/// Prepare the rotating file. The first file is created on the first
	/// record. Starts a [`LogRecycler`] when the number of files is bounded.
	pub fn open(rotation: Rotation) -> Result<Arc<Self>, LogError> {
		if let Some(dir) = rotation.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
			fs::create_dir_all(dir).map_err(|source| LogError::Open {
				path: dir.to_path_buf(),
				source,
			})?;
		}

		let recycler = match rotation.max_files {
			Some(max_files) => Some(LogRecycler::start(&rotation.path, max_files, RECYCLE_INTERVAL)?),
			None => None,
		};

		Ok(Arc::new(Self {
			rotation,
			state: Mutex::new(State {
				current: None,
				fallback: false,
			}),
			recycler,
		}))
	}

	pub fn rotation(&self) -> &Rotation {
		&self.rotation
	}

	pub fn recycler(&self) -> Option<&LogRecycler> {
		self.recycler.as_ref()
	}

	/// A `MakeWriter` for `tracing-subscriber`.
	pub fn make_writer(self: &Arc<Self>) -> RotatingMakeWriter {
		RotatingMakeWriter {
			file: self.clone(),
		}
	}

	/// Path of the file opened at the current local time.
	fn next_path(&self) -> PathBuf {
		let mut name = self.rotation.path.clone().into_os_string();
		name.push(Local::now().format(SUFFIX_FORMAT).to_string());
		PathBuf::from(name)
	}

	fn needs_rotation(&self, current: &Current, len: u64) -> bool {
		if self.rotation.max_size.is_some_and(|max| current.size + len >= max) {
			return true;
		}
		self.rotation.max_duration.is_some_and(|max| current.opened_at.elapsed() >= max)
	}

	/// Write one complete record.
	pub fn write_record(&self, record: &[u8]) -> io::Result<()> {
		let mut state = self.state.lock();
		if state.fallback {
			return io::stderr().write_all(record);
		}

		let len = record.len() as u64;
		if state.current.as_ref().is_some_and(|current| self.needs_rotation(current, len)) {
			state.current = None;
		}

		if state.current.is_none() {
			let path = self.next_path();
			match OpenOptions::new().create(true).append(true).open(&path) {
				Ok(file) => {
					state.current = Some(Current {
						file,
						size: 0,
						opened_at: Instant::now(),
					});
				}
				Err(err) => {
					eprintln!("Open log output file '{}' failed: {err}", path.display());
					state.fallback = true;
					return io::stderr().write_all(record);
				}
			}
		}

		let Some(current) = state.current.as_mut() else {
			return Ok(());
		};
		current.file.write_all(record)?;
		current.size += len;
		Ok(())
	}

	pub fn flush(&self) -> io::Result<()> {
		match self.state.lock().current.as_mut() {
			Some(current) => current.file.flush(),
			None => Ok(()),
		}
	}
}

/// [`MakeWriter`] handing out one buffering writer per event.
#[derive(Clone)]
pub struct RotatingMakeWriter {
	file: Arc<RotatingFile>,
}

impl<'a> MakeWriter<'a> for RotatingMakeWriter {
	type Writer = RecordWriter;

	fn make_writer(&'a self) -> Self::Writer {
		RecordWriter {
			file: self.file.clone(),
			buf: Vec::with_capacity(256),
		}
	}
}

/// Buffers the bytes of one event and writes them as a single record on
/// drop, so a record never straddles two files.
pub struct RecordWriter {
	file: Arc<RotatingFile>,
	buf: Vec<u8>,
}

impl Write for RecordWriter {
	fn write(&mut self, data: &[u8]) -> io::Result<usize> {
		self.buf.extend_from_slice(data);
		Ok(data.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl Drop for RecordWriter {
	fn drop(&mut self) {
		if self.buf.is_empty() {
			return;
		}
		if let Err(err) = self.file.write_record(&self.buf) {
			eprintln!("Writing log record failed: {err}");
		}
	}
}
