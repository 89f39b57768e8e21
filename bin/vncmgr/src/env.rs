// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Installation checks and settings defaults applied at startup.

use std::{
	path::{Path, PathBuf},
	thread,
	time::Duration,
};

use tracing::{error, warn};
use vncmgr_logging::LogLevel;
use vncmgr_settings::{Settings, keys};

use crate::RunError;

/// How long to wait for a missing settings file before giving up.
pub const INI_RETRY: Duration = Duration::from_secs(5);

/// Directory of the installation: `explicit`, or the directory holding the
/// executable.
pub fn app_path(explicit: Option<PathBuf>) -> Result<PathBuf, RunError> {
	let path = match explicit {
		Some(path) => path,
		None => {
			let exe = std::env::current_exe().map_err(RunError::AppPath)?;
			exe.parent().map(Path::to_path_buf).ok_or_else(|| RunError::AppPathMissing(exe.clone()))?
		}
	};
	if !path.is_dir() {
		return Err(RunError::AppPathMissing(path));
	}
	Ok(path)
}

/// Wait once for the settings file to show up, the VNC server may still be
/// writing it.
pub fn wait_for_ini(path: &Path, retry: Duration) -> Result<(), RunError> {
	if path.is_file() {
		return Ok(());
	}
	warn!("ini file({}) not found, check later", path.display());
	thread::sleep(retry);

	if path.is_file() {
		return Ok(());
	}
	error!("there is no ini file still, exit");
	Err(RunError::IniMissing(path.to_path_buf()))
}

/// Configured log level. Anything unknown is replaced by the build default
/// and written back.
pub fn log_level(settings: &dyn Settings) -> Result<LogLevel, RunError> {
	if let Some(level) = settings.get(keys::SECTION_MANAGER, keys::LOG_LEVEL).and_then(|v| v.parse().ok()) {
		return Ok(level);
	}
	let level = LogLevel::build_default();
	settings.set(keys::SECTION_MANAGER, keys::LOG_LEVEL, &level.to_string())?;
	Ok(level)
}

/// Port of the control server. Unset or invalid ports are replaced by the
/// default and written back.
pub fn http_port(settings: &dyn Settings) -> Result<u16, RunError> {
	let configured = settings.get_int_or(keys::SECTION_MANAGER, keys::MGR_HTTP_PORT, 0);
	match u16::try_from(configured) {
		Ok(port) if port != 0 => Ok(port),
		_ => {
			settings.set_int(keys::SECTION_MANAGER, keys::MGR_HTTP_PORT, keys::DEFAULT_HTTP_PORT)?;
			Ok(keys::DEFAULT_HTTP_PORT as u16)
		}
	}
}

/// Uuid identifying this installation towards the platform, generated and
/// persisted on first start.
pub fn platform_uuid(settings: &dyn Settings) -> Result<String, RunError> {
	if let Some(uuid) = settings.get(keys::SECTION_MANAGER, keys::PLT_UUID).filter(|v| !v.trim().is_empty()) {
		return Ok(uuid.trim().to_string());
	}
	let uuid = uuid::Uuid::new_v4().to_string();
	settings.set(keys::SECTION_MANAGER, keys::PLT_UUID, &uuid).inspect_err(|err| {
		error!("restore uuid to ini failed: {}", err);
	})?;
	Ok(uuid)
}

#[cfg(test)]
mod tests {
	use std::{env, fs};

	use vncmgr_settings::IniFile;

	use super::*;

	#[test]
	fn test_log_level_default_written_back() {
		let settings = IniFile::in_memory("[VNCManager]\nLogLevel=verbose\n");
		assert_eq!(log_level(&settings).unwrap(), LogLevel::build_default());
		assert_eq!(
			settings.get(keys::SECTION_MANAGER, keys::LOG_LEVEL),
			Some(LogLevel::build_default().to_string())
		);

		let settings = IniFile::in_memory("[VNCManager]\nLogLevel=warning\n");
		assert_eq!(log_level(&settings).unwrap(), LogLevel::Warning);
	}

	#[test]
	fn test_http_port() {
		let settings = IniFile::in_memory("");
		assert_eq!(http_port(&settings).unwrap(), 18480);
		assert_eq!(settings.get_int(keys::SECTION_MANAGER, keys::MGR_HTTP_PORT), Some(18480));

		let settings = IniFile::in_memory("[VNCManager]\nMgrHttpPort=19000\n");
		assert_eq!(http_port(&settings).unwrap(), 19000);

		let settings = IniFile::in_memory("[VNCManager]\nMgrHttpPort=70000\n");
		assert_eq!(http_port(&settings).unwrap(), 18480);
	}

	#[test]
	fn test_platform_uuid_generated_once() {
		let settings = IniFile::in_memory("[VNCManager]\nPltUuid=\n");
		let uuid = platform_uuid(&settings).unwrap();
		assert!(uuid::Uuid::parse_str(&uuid).is_ok());
		assert_eq!(platform_uuid(&settings).unwrap(), uuid);
	}

	#[test]
	fn test_wait_for_ini() {
		let path = env::temp_dir().join(format!("vncmgr-env-{}.ini", uuid::Uuid::new_v4()));
		assert!(matches!(wait_for_ini(&path, Duration::from_millis(10)), Err(RunError::IniMissing(_))));

		fs::write(&path, "[admin]\n").unwrap();
		wait_for_ini(&path, Duration::from_millis(10)).unwrap();
		fs::remove_file(&path).unwrap();
	}

	#[test]
	fn test_app_path_must_exist() {
		let missing = env::temp_dir().join(format!("vncmgr-missing-{}", uuid::Uuid::new_v4()));
		assert!(matches!(app_path(Some(missing)), Err(RunError::AppPathMissing(_))));
		assert_eq!(app_path(Some(env::temp_dir())).unwrap(), env::temp_dir());
	}
}
