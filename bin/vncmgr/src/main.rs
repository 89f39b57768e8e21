// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! `vncmgr` - management service of a local VNC server.
//!
//! Watches the VNC server's settings, reports its status to the remote
//! platform and serves the HTTP control API.

mod env;

use std::{io, path::PathBuf, process::ExitCode, sync::Arc, thread, time::Duration};

use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use vncmgr_logging::{DEFAULT_OUTPUT, LogError, LogLevel, LogOutput};
use vncmgr_manager::{MgrConfig, MgrError, VncManager};
use vncmgr_server_http::{HttpConfig, HttpServer, ServerError};
use vncmgr_settings::{IniFile, SettingsError, keys::INI_FILE_NAME};

/// Time the server gets to stop through its own endpoint on Ctrl-C.
const STOP_GRACE: Duration = Duration::from_secs(2);

/// VNC manager service
#[derive(Parser, Debug)]
#[command(name = "vncmgr")]
#[command(version, about, long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the manager in the foreground until stopped
	Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
	/// Installation directory (defaults to the executable's directory)
	#[arg(long, value_name = "DIR")]
	app_path: Option<PathBuf>,

	/// Settings file (defaults to vnc.ini in the installation directory)
	#[arg(long, value_name = "FILE")]
	ini: Option<PathBuf>,

	/// Log output: stderr, stdout, file://PATH or rot://PATH:SIZE:SECS:FILES
	#[arg(long, value_name = "OUTPUT")]
	log: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
	#[error("can not get current app path: {0}")]
	AppPath(#[source] io::Error),

	#[error("app path({}) not found", .0.display())]
	AppPathMissing(PathBuf),

	#[error("ini file({}) not found", .0.display())]
	IniMissing(PathBuf),

	#[error(transparent)]
	Settings(#[from] SettingsError),

	#[error(transparent)]
	Log(#[from] LogError),

	#[error(transparent)]
	Manager(#[from] MgrError),

	#[error(transparent)]
	Server(#[from] ServerError),
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	let result = match cli.command {
		Command::Run(args) => run(args),
	};

	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("{}", err);
			eprintln!("vncmgr: {err}");
			ExitCode::FAILURE
		}
	}
}

fn run(args: RunArgs) -> Result<(), RunError> {
	let app_path = env::app_path(args.app_path)?;
	let output = args.log.as_deref().unwrap_or(DEFAULT_OUTPUT).parse::<LogOutput>()?.relative_to(&app_path);
	let log = vncmgr_logging::init(&output, LogLevel::build_default())?;
	warn!("App version: {}", env!("CARGO_PKG_VERSION"));

	let ini_path = args.ini.unwrap_or_else(|| app_path.join(INI_FILE_NAME));
	env::wait_for_ini(&ini_path, env::INI_RETRY)?;
	info!("app_path: {}", app_path.display());
	info!("ini_path: {}", ini_path.display());

	let ini = Arc::new(IniFile::open(&ini_path)?);
	log.set_level(env::log_level(&*ini)?)?;
	let http_port = env::http_port(&*ini)?;
	let uuid = env::platform_uuid(&*ini)?;

	let manager = Arc::new(VncManager::new(ini, MgrConfig::default()));
	manager.start(&uuid, app_path.clone())?;

	let server = Arc::new(HttpServer::new(HttpConfig::default().port(http_port), manager.clone()));
	stop_on_ctrl_c(server.clone());
	let served = server.run_blocked(&uuid);
	info!("http server exit...");

	manager.quit();
	info!("mgr loop exit...");
	Ok(served?)
}

/// Stop `server` on Ctrl-C, through its stop endpoint first and directly if
/// that did not work out in time.
fn stop_on_ctrl_c(server: Arc<HttpServer>) {
	let spawned = thread::Builder::new().name("vncmgr-signal".to_string()).spawn(move || {
		let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
			Ok(runtime) => runtime,
			Err(err) => {
				warn!("Ctrl-C handling unavailable: {}", err);
				return;
			}
		};
		if let Err(err) = runtime.block_on(tokio::signal::ctrl_c()) {
			warn!("Ctrl-C handling unavailable: {}", err);
			return;
		}

		info!("interrupted, stopping");
		server.stop_safely();
		thread::sleep(STOP_GRACE);
		if server.is_running() {
			server.shutdown();
		}
	});
	if let Err(err) = spawned {
		warn!("Ctrl-C handling unavailable: {}", err);
	}
}
