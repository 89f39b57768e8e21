// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! The manager actor.
//!
//! Owns the cached VNC state and every collaborator. Requests and heartbeats
//! are handled one at a time on the manager loop thread, so none of this
//! state is shared.

use std::{path::PathBuf, sync::Arc};

use tracing::{debug, info, warn};
use vncmgr_crypto::{PublicKeyEncryptor, aes_ecb, vnc};
use vncmgr_runtime::{Event, EventHandler, LoopContext, Timer};
use vncmgr_settings::{Settings, keys};

use crate::{
	Collaborators, InternalStatus, MgrConfig, MgrError, MgrPayload, Opcode, PasswordChange, StatusReport,
	network::NetAddresses, platform::PlatformClient, probe::ServiceProbe,
};

/// Last observed state of the VNC server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct VncState {
	port: u16,
	passwd: String,
	passwd2: String,
	addresses: Vec<String>,
	available: bool,
}

pub(crate) struct Manager {
	uuid: String,
	app_path: PathBuf,
	config: MgrConfig,
	settings: Arc<dyn Settings>,
	addresses: Box<dyn NetAddresses>,
	probe: Box<dyn ServiceProbe>,
	platform: Box<dyn PlatformClient>,
	encryptor: Box<dyn PublicKeyEncryptor>,
	heartbeat: Option<Timer>,
	state: VncState,
	plt_addr: Option<String>,
	update_path: Option<String>,
}

impl Manager {
	pub(crate) fn new(
		uuid: String,
		app_path: PathBuf,
		config: MgrConfig,
		settings: Arc<dyn Settings>,
		collaborators: Collaborators,
	) -> Self {
		Self {
			uuid,
			app_path,
			config,
			settings,
			addresses: collaborators.addresses,
			probe: collaborators.probe,
			platform: collaborators.platform,
			encryptor: collaborators.encryptor,
			heartbeat: None,
			state: VncState::default(),
			plt_addr: None,
			update_path: None,
		}
	}

	fn query_status(&self) -> Result<StatusReport, MgrError> {
		let pair = format!("{} {}", self.state.passwd, self.state.passwd2);
		let key = self.app_path.join(&self.config.public_key_file);
		let p = self.encryptor.encrypt_base64(&key, &pair).map_err(MgrError::Encrypt)?;

		Ok(StatusReport {
			port: self.state.port,
			uuid: self.uuid.clone(),
			p,
			addresses: self.state.addresses.clone(),
			available: self.state.available,
		})
	}

	fn query_status_internal(&self) -> InternalStatus {
		InternalStatus {
			port: self.state.port,
			uuid: self.uuid.clone(),
			p1: self.state.passwd.clone(),
			p2: self.state.passwd2.clone(),
			addresses: self.state.addresses.clone(),
			available: self.state.available,
		}
	}

	fn current_password(&self) -> Result<String, MgrError> {
		let stored = self
			.settings
			.get(keys::SECTION_ULTRAVNC, keys::PASSWD)
			.filter(|stored| !stored.trim().is_empty())
			.ok_or(MgrError::MissingCurrentPassword)?;
		vnc::decode_stored_password(&stored).map_err(|err| {
			warn!(error = %err, "stored password is unreadable");
			MgrError::MissingCurrentPassword
		})
	}

	fn change_password(&self, encoded: &str) -> Result<(), MgrError> {
		if encoded.is_empty() {
			return Err(MgrError::EmptyEncodedPassword);
		}

		let current = self.current_password()?;
		let key = aes_ecb::key_from_password(&current);
		let pair = aes_ecb::decrypt_base64_string(&key, encoded).map_err(MgrError::Decode)?;

		let fields: Vec<&str> = pair.split(' ').collect();
		let [old, new, new2] = fields.as_slice() else {
			return Err(MgrError::PasswordFieldCount);
		};
		self.change_password_internal(&PasswordChange {
			old: old.to_string(),
			new: new.to_string(),
			new2: new2.to_string(),
		})
	}

	fn change_password_internal(&self, change: &PasswordChange) -> Result<(), MgrError> {
		let new = [change.new.as_str(), change.new2.as_str()];
		if new.iter().any(|password| password.is_empty()) {
			return Err(MgrError::EmptyPassword);
		}
		if new.iter().any(|password| password.len() > vnc::MAX_PASSWORD_LEN) {
			return Err(MgrError::PasswordTooLong);
		}
		if new.iter().any(|password| password.contains(' ')) {
			return Err(MgrError::PasswordContainsSpace);
		}

		if self.current_password()? != change.old {
			return Err(MgrError::Unauthorized);
		}

		warn!(uuid = %self.uuid, "changing VNC passwords");
		self.settings
			.set(keys::SECTION_ULTRAVNC, keys::PASSWD, &vnc::encode_stored_password(&change.new))
			.map_err(MgrError::Store)?;
		self.settings
			.set(keys::SECTION_ULTRAVNC, keys::PASSWD2, &vnc::encode_stored_password(&change.new2))
			.map_err(MgrError::Store)?;
		Ok(())
	}

	fn stored_password(&self, key: &str) -> String {
		match self.settings.get(keys::SECTION_ULTRAVNC, key) {
			Some(stored) if !stored.trim().is_empty() => {
				vnc::decode_stored_password(&stored).unwrap_or_else(|err| {
					warn!(key, error = %err, "ignoring unreadable stored password");
					String::new()
				})
			}
			_ => String::new(),
		}
	}

	fn vnc_port(&self) -> u16 {
		let port = self.settings.get_int_or(keys::SECTION_ADMIN, keys::PORT_NUMBER, keys::DEFAULT_VNC_PORT);
		u16::try_from(port).unwrap_or_else(|_| {
			warn!(port, "invalid VNC port, using the default");
			keys::DEFAULT_VNC_PORT as u16
		})
	}

	fn observe(&mut self) -> VncState {
		let addresses = self.addresses.addresses();
		let port = self.vnc_port();
		let passwd = self.stored_password(keys::PASSWD);
		let passwd2 = self.stored_password(keys::PASSWD2);

		let available = if addresses.is_empty() || passwd.is_empty() || passwd2.is_empty() {
			false
		} else {
			self.probe.is_running(port)
		};

		VncState {
			port,
			passwd,
			passwd2,
			addresses,
			available,
		}
	}

	/// Refresh the cached state and report it to the platform.
	fn heartbeat(&mut self) {
		let observed = self.observe();
		if observed != self.state {
			info!(
				uuid = %self.uuid,
				port = observed.port,
				passwd = %mask(&observed.passwd),
				passwd2 = %mask(&observed.passwd2),
				available = observed.available,
				addresses = ?observed.addresses,
				"VNC info is changed"
			);
			self.state = observed;
		}

		let plt_addr = lazy_setting(&*self.settings, &mut self.plt_addr, keys::PLT_ADDR);
		let update_path = lazy_setting(&*self.settings, &mut self.update_path, keys::UPDATE_PATH);
		if let (Some(addr), Some(path)) = (plt_addr, update_path) {
			if let Err(err) = self.platform.update_status(&addr, &path, &self.status_params()) {
				debug!(error = %err, "status update to platform failed");
			}
		}
	}

	fn status_params(&self) -> Vec<(&'static str, String)> {
		let addresses: String = self.state.addresses.iter().map(|address| format!("{address},")).collect();
		vec![
			("uuid", self.uuid.clone()),
			("port", self.state.port.to_string()),
			("passwd", self.state.passwd.clone()),
			("passwd2", self.state.passwd2.clone()),
			(
				"available",
				if self.state.available {
					"1"
				} else {
					"0"
				}
				.to_string(),
			),
			("addresses", addresses),
		]
	}

	fn arm_heartbeat(&self, ctx: &LoopContext<MgrPayload>) {
		let Some(timer) = &self.heartbeat else {
			return;
		};
		let sender = ctx.sender();
		timer.async_wait(self.config.heartbeat_interval, move || {
			if let Err(err) = sender.post(Event::new(Opcode::Heartbeat.into())) {
				debug!(error = %err, "heartbeat not delivered");
			}
		});
	}
}

impl EventHandler for Manager {
	type Payload = MgrPayload;

	fn on_event(&mut self, event: &mut Event<MgrPayload>, ctx: &LoopContext<MgrPayload>) {
		let Some(opcode) = Opcode::from_what(event.what) else {
			debug!(what = event.what, "ignoring unknown manager event");
			return;
		};

		let result = match opcode {
			Opcode::QueryStatus => self.query_status().map(MgrPayload::Status),
			Opcode::QueryStatusInternal => Ok(MgrPayload::StatusInternal(self.query_status_internal())),
			Opcode::ChangePassword => match &event.payload {
				MgrPayload::Encoded(encoded) => self.change_password(encoded).map(|_| MgrPayload::None),
				_ => Err(MgrError::EmptyEncodedPassword),
			},
			Opcode::ChangePasswordInternal => match &event.payload {
				MgrPayload::Passwords(change) => self.change_password_internal(change).map(|_| MgrPayload::None),
				_ => Err(MgrError::EmptyPassword),
			},
			Opcode::StopServer => {
				match u16::try_from(event.arg1) {
					Ok(port) => {
						if let Err(err) = self.platform.send_stop(port) {
							debug!(port, error = %err, "stop request failed");
						}
					}
					Err(_) => warn!(port = event.arg1, "invalid control server port"),
				}
				return;
			}
			Opcode::Heartbeat => {
				self.heartbeat();
				self.arm_heartbeat(ctx);
				return;
			}
		};

		match result {
			Ok(payload) => {
				event.arg1 = 0;
				event.payload = payload;
			}
			Err(err) => {
				event.arg1 = err.code();
				event.payload = MgrPayload::Failed(err);
			}
		}
	}

	fn on_start(&mut self, ctx: &LoopContext<MgrPayload>) {
		info!(uuid = %self.uuid, app_path = %self.app_path.display(), "manager started");
		self.heartbeat = Some(Timer::new(ctx.io_context()));
		self.heartbeat();
		self.arm_heartbeat(ctx);
	}

	fn on_stop(&mut self) {
		if let Some(timer) = self.heartbeat.take() {
			timer.cancel();
		}
		info!(uuid = %self.uuid, "manager stopped");
	}
}

fn mask(password: &str) -> String {
	"*".repeat(password.len())
}

/// Read a platform setting once it is configured. A missing key is written
/// back empty so operators find it in the file.
fn lazy_setting(settings: &dyn Settings, cache: &mut Option<String>, key: &str) -> Option<String> {
	if cache.is_none() {
		match settings.get(keys::SECTION_MANAGER, key) {
			Some(value) if !value.is_empty() => *cache = Some(value),
			Some(_) => {}
			None => {
				if let Err(err) = settings.set(keys::SECTION_MANAGER, key, "") {
					warn!(key, error = %err, "failed to add empty platform setting");
				}
			}
		}
	}
	cache.clone()
}
