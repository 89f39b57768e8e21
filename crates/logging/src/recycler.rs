// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Removal of old rotated log files.

use std::{
	fs, io,
	path::{Path, PathBuf},
	time::Duration,
};

use chrono::NaiveDateTime;
use tracing::debug;
use vncmgr_runtime::{Event, EventHandler, EventLoop, LoopConfig, LoopContext, PostError, StartError, Timer};

use crate::rotating::SUFFIX_FORMAT;

/// Period between two sweeps.
pub const RECYCLE_INTERVAL: Duration = Duration::from_secs(60);

/// Timer driven sweep, re-arms the timer.
const TICK: i32 = 1;
/// On demand sweep, leaves the timer alone. `arg1` receives the number of
/// removed files.
const SWEEP: i32 = 2;

/// Delete the oldest rotated files of `base` until at most `max_files` are
/// left. Returns the number of files removed.
///
/// Rotated files are the files next to `base` whose name is the base name
/// followed by a timestamp suffix. Anything else in the directory is left
/// alone.
pub fn sweep(base: &Path, max_files: usize) -> io::Result<usize> {
	let dir = match base.parent() {
		Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
		_ => PathBuf::from("."),
	};
	let Some(base_name) = base.file_name().and_then(|name| name.to_str()) else {
		return Ok(0);
	};

	let mut rotated: Vec<(NaiveDateTime, PathBuf)> = Vec::new();
	for entry in fs::read_dir(&dir)? {
		let entry = entry?;
		if !entry.file_type()?.is_file() {
			continue;
		}
		let name = entry.file_name();
		let Some(suffix) = name.to_str().and_then(|name| name.strip_prefix(base_name)) else {
			continue;
		};
		if let Ok(stamp) = NaiveDateTime::parse_from_str(suffix, SUFFIX_FORMAT) {
			rotated.push((stamp, entry.path()));
		}
	}

	if rotated.len() <= max_files {
		return Ok(0);
	}
	rotated.sort();

	let excess = rotated.len() - max_files;
	let mut removed = 0;
	for (_, path) in rotated.into_iter().take(excess) {
		match fs::remove_file(&path) {
			Ok(()) => removed += 1,
			Err(err) => eprintln!("Deleting log file '{}' failed: {err}", path.display()),
		}
	}
	Ok(removed)
}

struct Recycler {
	base: PathBuf,
	max_files: usize,
	interval: Duration,
	timer: Option<Timer>,
}

impl Recycler {
	fn sweep(&self) -> usize {
		match sweep(&self.base, self.max_files) {
			Ok(removed) => removed,
			Err(err) => {
				eprintln!("Recycling log files of '{}' failed: {err}", self.base.display());
				0
			}
		}
	}

	fn arm(&self, delay: Duration, ctx: &LoopContext<()>) {
		let Some(timer) = &self.timer else {
			return;
		};
		let sender = ctx.sender();
		timer.async_wait(delay, move || {
			let _ = sender.post(Event::new(TICK));
		});
	}
}

impl EventHandler for Recycler {
	type Payload = ();

	fn on_start(&mut self, ctx: &LoopContext<()>) {
		self.timer = Some(Timer::new(ctx.io_context()));
		self.arm(Duration::ZERO, ctx);
	}

	fn on_event(&mut self, event: &mut Event, ctx: &LoopContext<()>) {
		match event.what {
			TICK => {
				let removed = self.sweep();
				if removed > 0 {
					debug!(base = %self.base.display(), removed, "recycled log files");
				}
				self.arm(self.interval, ctx);
			}
			SWEEP => event.arg1 = self.sweep() as i32,
			_ => {}
		}
	}

	fn on_stop(&mut self) {
		if let Some(timer) = self.timer.take() {
			timer.cancel();
		}
	}
}

/// Actor sweeping rotated log files right away and then every interval.
///
/// Failures are reported on stderr and never stop the actor.
pub struct LogRecycler {
	event_loop: EventLoop<Recycler>,
}

impl LogRecycler {
	pub fn start(base: &Path, max_files: usize, interval: Duration) -> Result<Self, StartError> {
		let event_loop = EventLoop::with_config(
			Recycler {
				base: base.to_path_buf(),
				max_files,
				interval,
				timer: None,
			},
			LoopConfig::new().name("log-recycler"),
		);
		event_loop.start()?;
		Ok(Self {
			event_loop,
		})
	}

	/// Sweep now and return the number of removed files.
	pub fn sweep_now(&self) -> Result<usize, PostError> {
		let mut event = Event::new(SWEEP);
		self.event_loop.post_event_sync(&mut event)?;
		Ok(event.arg1.max(0) as usize)
	}

	pub fn quit(&self) {
		self.event_loop.quit();
	}
}

#[cfg(test)]
mod tests {
	use std::env;

	use super::*;

	fn temp_dir() -> PathBuf {
		let dir = env::temp_dir().join(format!("vncmgr-recycle-{}", uuid::Uuid::new_v4()));
		fs::create_dir_all(&dir).unwrap();
		dir
	}

	fn touch(dir: &Path, name: &str) {
		fs::write(dir.join(name), b"x").unwrap();
	}

	fn names(dir: &Path) -> Vec<String> {
		let mut names: Vec<_> =
			fs::read_dir(dir).unwrap().map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned()).collect();
		names.sort();
		names
	}

	#[test]
	fn test_sweep_keeps_newest() {
		let dir = temp_dir();
		touch(&dir, "mgr.log-20250103_000000");
		touch(&dir, "mgr.log-20250101_120000");
		touch(&dir, "mgr.log-20250102_000000");
		touch(&dir, "mgr.log-20241231_235959");
		touch(&dir, "mgr.log");
		touch(&dir, "mgr.log-notatime");
		touch(&dir, "other.log-20200101_000000");

		let removed = sweep(&dir.join("mgr.log"), 2).unwrap();
		assert_eq!(removed, 2);
		assert_eq!(
			names(&dir),
			vec![
				"mgr.log",
				"mgr.log-20250102_000000",
				"mgr.log-20250103_000000",
				"mgr.log-notatime",
				"other.log-20200101_000000",
			]
		);

		fs::remove_dir_all(&dir).unwrap();
	}

	#[test]
	fn test_sweep_under_limit_is_noop() {
		let dir = temp_dir();
		touch(&dir, "mgr.log-20250101_000000");
		assert_eq!(sweep(&dir.join("mgr.log"), 5).unwrap(), 0);
		assert_eq!(names(&dir).len(), 1);
		fs::remove_dir_all(&dir).unwrap();
	}

	#[test]
	fn test_sweep_missing_dir_fails() {
		assert!(sweep(Path::new("/nonexistent/vncmgr/mgr.log"), 1).is_err());
	}

	#[test]
	fn test_recycler_sweeps_on_start_and_on_demand() {
		let dir = temp_dir();
		for day in 1..=5 {
			touch(&dir, &format!("mgr.log-2025010{day}_000000"));
		}

		let recycler = LogRecycler::start(&dir.join("mgr.log"), 3, Duration::from_secs(3600)).unwrap();
		// The start sweep ran before this call was handled.
		assert_eq!(recycler.sweep_now().unwrap(), 0);
		assert_eq!(names(&dir).len(), 3);

		touch(&dir, "mgr.log-20250106_000000");
		assert_eq!(recycler.sweep_now().unwrap(), 1);
		assert_eq!(names(&dir)[0], "mgr.log-20250104_000000");

		recycler.quit();
		assert!(recycler.sweep_now().is_err());
		fs::remove_dir_all(&dir).unwrap();
	}
}
