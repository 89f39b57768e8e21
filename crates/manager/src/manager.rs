// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt,
	path::{Path, PathBuf},
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};
use vncmgr_crypto::{OpensslCli, PublicKeyEncryptor};
use vncmgr_runtime::{Event, EventLoop, LoopConfig};
use vncmgr_settings::Settings;

use crate::{
	InternalStatus, MgrConfig, MgrError, MgrPayload, Opcode, PasswordChange, StatusReport,
	handler::Manager,
	network::{HostAddresses, NetAddresses},
	platform::{HttpPlatform, PlatformClient},
	probe::{ServiceProbe, TcpProbe},
};

/// The external systems the manager talks to.
pub struct Collaborators {
	pub addresses: Box<dyn NetAddresses>,
	pub probe: Box<dyn ServiceProbe>,
	pub platform: Box<dyn PlatformClient>,
	pub encryptor: Box<dyn PublicKeyEncryptor>,
}

impl Collaborators {
	/// Production collaborators for an installation in `app_path`.
	pub fn system(app_path: &Path, config: &MgrConfig) -> Self {
		Self {
			addresses: Box::new(HostAddresses::new(config.address_refresh)),
			probe: Box::new(TcpProbe::new(config.request_timeout)),
			platform: Box::new(HttpPlatform::new(config.request_timeout)),
			encryptor: Box::new(OpensslCli::locate(app_path)),
		}
	}
}

struct Running {
	uuid: String,
	event_loop: Arc<EventLoop<Manager>>,
}

/// Thread safe handle to the manager actor.
///
/// Every request is forwarded to the manager loop and answered there, one at
/// a time. Requests made before [`start`](Self::start) or after
/// [`quit`](Self::quit) fail with [`MgrError::SystemDown`].
pub struct VncManager {
	settings: Arc<dyn Settings>,
	config: MgrConfig,
	collaborators: Mutex<Option<Collaborators>>,
	started: AtomicBool,
	running: RwLock<Option<Running>>,
}

impl VncManager {
	/// A manager using the production collaborators.
	pub fn new(settings: Arc<dyn Settings>, config: MgrConfig) -> Self {
		Self {
			settings,
			config,
			collaborators: Mutex::new(None),
			started: AtomicBool::new(false),
			running: RwLock::new(None),
		}
	}

	pub fn with_collaborators(settings: Arc<dyn Settings>, config: MgrConfig, collaborators: Collaborators) -> Self {
		Self {
			settings,
			config,
			collaborators: Mutex::new(Some(collaborators)),
			started: AtomicBool::new(false),
			running: RwLock::new(None),
		}
	}

	/// Start the manager loop for the installation identified by `uuid`.
	///
	/// The first heartbeat runs before this returns. A manager starts once.
	pub fn start(&self, uuid: &str, app_path: impl Into<PathBuf>) -> Result<(), MgrError> {
		let mut running = self.running.write();
		if self.started.swap(true, Ordering::SeqCst) {
			return Err(MgrError::AlreadyStarted);
		}

		let app_path = app_path.into();
		let collaborators = match self.collaborators.lock().take() {
			Some(collaborators) => collaborators,
			None => Collaborators::system(&app_path, &self.config),
		};
		let manager = Manager::new(uuid.to_string(), app_path, self.config.clone(), self.settings.clone(), collaborators);
		let config = LoopConfig::new().name("vnc-manager").sync_timeout(self.config.sync_timeout);
		let event_loop = Arc::new(EventLoop::with_config(manager, config));
		event_loop.start()?;

		*running = Some(Running {
			uuid: uuid.to_string(),
			event_loop,
		});
		Ok(())
	}

	/// Installation uuid, once started.
	pub fn uuid(&self) -> Option<String> {
		self.running.read().as_ref().map(|running| running.uuid.clone())
	}

	pub fn is_running(&self) -> bool {
		self.running.read().as_ref().is_some_and(|running| running.event_loop.is_running())
	}

	/// Status for the platform, passwords RSA encrypted.
	pub fn query_status(&self) -> Result<StatusReport, MgrError> {
		match self.call(Event::new(Opcode::QueryStatus.into()))? {
			MgrPayload::Status(status) => Ok(status),
			_ => Err(MgrError::Internal),
		}
	}

	/// Status for local tooling, passwords in plaintext.
	pub fn query_status_internal(&self) -> Result<InternalStatus, MgrError> {
		match self.call(Event::new(Opcode::QueryStatusInternal.into()))? {
			MgrPayload::StatusInternal(status) => Ok(status),
			_ => Err(MgrError::Internal),
		}
	}

	/// Change both passwords from an encrypted `"<old> <new> <new2>"` triple,
	/// keyed by the current password.
	pub fn change_password(&self, encoded: &str) -> Result<(), MgrError> {
		self.call(Event::with_payload(Opcode::ChangePassword.into(), MgrPayload::Encoded(encoded.to_string())))?;
		Ok(())
	}

	pub fn change_password_internal(&self, old: &str, new: &str, new2: &str) -> Result<(), MgrError> {
		let change = PasswordChange {
			old: old.to_string(),
			new: new.to_string(),
			new2: new2.to_string(),
		};
		self.call(Event::with_payload(Opcode::ChangePasswordInternal.into(), MgrPayload::Passwords(change)))?;
		Ok(())
	}

	/// Ask the control server on local `port` to shut down. Fire and forget.
	pub fn stop_http_server(&self, port: u16) {
		let Some(event_loop) = self.event_loop() else {
			return;
		};
		if let Err(err) = event_loop.post_event(Event::with_arg(Opcode::StopServer.into(), i32::from(port))) {
			debug!(error = %err, "stop request not queued");
		}
	}

	/// Stop the manager loop. Idempotent.
	pub fn quit(&self) {
		let running = self.running.write().take();
		if let Some(running) = running {
			running.event_loop.quit();
		}
	}

	fn event_loop(&self) -> Option<Arc<EventLoop<Manager>>> {
		self.running.read().as_ref().map(|running| running.event_loop.clone())
	}

	fn call(&self, mut event: Event<MgrPayload>) -> Result<MgrPayload, MgrError> {
		let event_loop = self.event_loop().ok_or(MgrError::SystemDown)?;
		if let Err(err) = event_loop.post_event_sync(&mut event) {
			warn!(error = %err, "sync post to manager failed");
			return Err(MgrError::Internal);
		}
		match event.payload {
			MgrPayload::Failed(err) => Err(err),
			_ if event.arg1 != 0 => Err(MgrError::Internal),
			payload => Ok(payload),
		}
	}
}

impl Drop for VncManager {
	fn drop(&mut self) {
		self.quit();
	}
}

impl fmt::Debug for VncManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("VncManager").field("uuid", &self.uuid()).field("running", &self.is_running()).finish()
	}
}
