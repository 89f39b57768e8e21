// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	net::{IpAddr, Ipv4Addr},
	path::Path,
	sync::Arc,
	thread,
	time::{Duration, Instant},
};

use serde_json::{Value, json};
use vncmgr_crypto::{CryptoError, PublicKeyEncryptor, aes_ecb, vnc};
use vncmgr_manager::{
	Collaborators, MgrConfig, VncManager, network::NetAddresses, platform::HttpPlatform, probe::ServiceProbe,
};
use vncmgr_server_http::{HttpConfig, HttpServer};
use vncmgr_settings::{IniFile, Settings, keys};

const UUID: &str = "0f6c2b1e-93d4-4a57-8e21-5c7d9b3a1f08";

struct FixedAddresses;

impl NetAddresses for FixedAddresses {
	fn addresses(&mut self) -> Vec<String> {
		vec!["10.0.0.2".to_string(), "vnc-host".to_string()]
	}
}

struct AlwaysUp;

impl ServiceProbe for AlwaysUp {
	fn is_running(&mut self, _port: u16) -> bool {
		true
	}
}

struct Reversing;

impl PublicKeyEncryptor for Reversing {
	fn encrypt_base64(&self, _public_key: &Path, plaintext: &str) -> Result<String, CryptoError> {
		Ok(plaintext.chars().rev().collect())
	}
}

struct TestServer {
	server: Arc<HttpServer>,
	manager: Arc<VncManager>,
	settings: Arc<IniFile>,
	handle: Option<thread::JoinHandle<()>>,
	base: String,
}

impl TestServer {
	fn start() -> Self {
		let text = format!(
			"[admin]\nPortNumber=5900\n[ultravnc]\npasswd={}\npasswd2={}\n",
			vnc::encode_stored_password("secret"),
			vnc::encode_stored_password("viewer")
		);
		let settings = Arc::new(IniFile::in_memory(&text));
		let collaborators = Collaborators {
			addresses: Box::new(FixedAddresses),
			probe: Box::new(AlwaysUp),
			platform: Box::new(HttpPlatform::new(Duration::from_millis(300))),
			encryptor: Box::new(Reversing),
		};
		let manager = Arc::new(VncManager::with_collaborators(settings.clone(), MgrConfig::default(), collaborators));
		manager.start(UUID, "/opt/vnc").unwrap();

		let config = HttpConfig::new().host(IpAddr::V4(Ipv4Addr::LOCALHOST)).port(0);
		let server = Arc::new(HttpServer::new(config, manager.clone()));
		let runner = server.clone();
		let handle = thread::spawn(move || runner.run_blocked(UUID).unwrap());

		let deadline = Instant::now() + Duration::from_secs(5);
		let port = loop {
			if let Some(port) = server.port() {
				break port;
			}
			assert!(Instant::now() < deadline, "server did not bind");
			thread::sleep(Duration::from_millis(10));
		};

		Self {
			server,
			manager,
			settings,
			handle: Some(handle),
			base: format!("http://127.0.0.1:{port}"),
		}
	}

	fn get(&self, path: &str) -> String {
		reqwest::blocking::get(format!("{}{}", self.base, path)).unwrap().text().unwrap()
	}

	fn get_json(&self, path: &str) -> Value {
		serde_json::from_str(&self.get(path)).unwrap()
	}

	fn post_form(&self, path: &str, body: &str) -> Value {
		let text = reqwest::blocking::Client::new()
			.post(format!("{}{}", self.base, path))
			.header("content-type", "application/x-www-form-urlencoded")
			.body(body.to_string())
			.send()
			.unwrap()
			.text()
			.unwrap();
		serde_json::from_str(&text).unwrap()
	}

	fn stored_password(&self, key: &str) -> String {
		let stored = self.settings.get(keys::SECTION_ULTRAVNC, key).unwrap();
		vnc::decode_stored_password(&stored).unwrap()
	}

	fn join(&mut self) -> bool {
		let Some(handle) = self.handle.take() else {
			return true;
		};
		let deadline = Instant::now() + Duration::from_secs(5);
		while !handle.is_finished() {
			if Instant::now() > deadline {
				self.handle = Some(handle);
				return false;
			}
			thread::sleep(Duration::from_millis(10));
		}
		handle.join().unwrap();
		true
	}
}

impl Drop for TestServer {
	fn drop(&mut self) {
		self.server.shutdown();
		self.join();
		self.manager.quit();
	}
}

fn encode(value: &str) -> String {
	value.replace('+', "%2B").replace('/', "%2F").replace('=', "%3D")
}

#[test]
fn test_root() {
	let server = TestServer::start();
	assert_eq!(server.get("/"), "Welcome!");
}

#[test]
fn test_query_status() {
	let server = TestServer::start();
	let body = server.get_json("/api/v1/QueryStatus");
	assert_eq!(
		body,
		json!({
			"code": 0,
			"data": {
				"port": 5900,
				"uuid": UUID,
				"p": "reweiv terces",
				"addresses": ["10.0.0.2", "vnc-host"],
				"available": true,
			}
		})
	);
}

#[test]
fn test_query_status_internal() {
	let server = TestServer::start();
	let body = server.get_json("/internal/Query");
	assert_eq!(body["code"], 0);
	assert_eq!(body["data"]["p1"], "secret");
	assert_eq!(body["data"]["p2"], "viewer");
}

#[test]
fn test_change_password_requires_uuid() {
	let server = TestServer::start();
	assert_eq!(
		server.get_json("/api/v1/ChangePP?p=abc"),
		json!({"code": -1, "message": "uuid is empty or not matched"})
	);
	assert_eq!(
		server.get_json("/api/v1/ChangePP?uuid=other&p=abc"),
		json!({"code": -1, "message": "uuid is empty or not matched"})
	);
}

#[test]
fn test_change_password_encoded() {
	let server = TestServer::start();
	let encoded = aes_ecb::encrypt_base64(&aes_ecb::key_from_password("secret"), b"secret next next2");

	let body = server.post_form("/api/v1/ChangePP", &format!("uuid={UUID}&p={}", encode(&encoded)));
	assert_eq!(body, json!({"code": 0}));

	let body = server.get_json("/internal/ChangePWD?p0=secret&p1=a&p2=b");
	assert_eq!(body, json!({"code": -1, "message": "Unauthorized: the current password is not correct"}));
	assert_eq!(server.stored_password(keys::PASSWD2), "next2");
}

#[test]
fn test_change_password_internal() {
	let server = TestServer::start();

	let body = server.post_form("/internal/ChangePWD", "p0=secret&p1=123456789&p2=x");
	assert_eq!(
		body,
		json!({"code": -1, "message": "Invalid params: The password must contain a maximum of 8 characters"})
	);

	let body = server.post_form("/internal/ChangePWD", "p0=secret&p1=next&p2=next2");
	assert_eq!(body, json!({"code": 0}));
	assert_eq!(server.stored_password(keys::PASSWD), "next");
}

#[test]
fn test_system_down_after_quit() {
	let server = TestServer::start();
	server.manager.quit();
	assert_eq!(server.get_json("/internal/Query"), json!({"code": -1, "message": "system is down"}));
}

#[test]
fn test_internal_stop() {
	let mut server = TestServer::start();
	assert_eq!(server.get("/internal/stop"), "OK");
	assert!(server.join());
	assert!(!server.server.is_running());
}

#[test]
fn test_stop_safely_goes_through_manager() {
	let mut server = TestServer::start();
	server.server.stop_safely();
	assert!(server.join());
}
