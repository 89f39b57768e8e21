// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! RSA PKCS#1 v1.5 through the `openssl` command line tool.

use std::{
	io::{self, Write},
	path::{Path, PathBuf},
	process::{Command, Stdio},
};

use base64::{Engine, engine::general_purpose};
use tracing::debug;

use crate::CryptoError;

/// Encrypts short secrets for a holder of the matching private key.
pub trait PublicKeyEncryptor: Send + Sync {
	/// Encrypt `plaintext` with the PEM public key at `public_key` and return
	/// the ciphertext as base64.
	fn encrypt_base64(&self, public_key: &Path, plaintext: &str) -> Result<String, CryptoError>;
}

/// Runs an `openssl` executable.
#[derive(Debug, Clone)]
pub struct OpensslCli {
	program: PathBuf,
}

impl OpensslCli {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
		}
	}

	/// Prefer an `openssl` shipped in `app_path`, fall back to the one on
	/// `PATH`.
	pub fn locate(app_path: &Path) -> Self {
		let bundled = app_path.join(if cfg!(windows) {
			"openssl.exe"
		} else {
			"openssl"
		});
		if bundled.is_file() {
			Self::new(bundled)
		} else {
			Self::new("openssl")
		}
	}

	pub fn program(&self) -> &Path {
		&self.program
	}

	/// Decrypt base64 `ciphertext` with the PEM private key at `private_key`.
	pub fn decrypt_base64(
		&self,
		private_key: &Path,
		ciphertext: &str,
		passphrase: Option<&str>,
	) -> Result<String, CryptoError> {
		let cipher = general_purpose::STANDARD.decode(ciphertext.trim())?;

		let mut args = vec![
			"pkeyutl".to_string(),
			"-decrypt".to_string(),
			"-inkey".to_string(),
			private_key.display().to_string(),
			"-pkeyopt".to_string(),
			"rsa_padding_mode:pkcs1".to_string(),
		];
		if let Some(passphrase) = passphrase {
			args.push("-passin".to_string());
			args.push(format!("pass:{passphrase}"));
		}

		let plain = self.run(&args, &cipher)?;
		let text = String::from_utf8(plain).map_err(|_| CryptoError::Utf8)?;
		Ok(text.trim_end_matches(['\r', '\n']).to_string())
	}

	fn run(&self, args: &[String], stdin: &[u8]) -> Result<Vec<u8>, CryptoError> {
		debug!(program = %self.program.display(), command = %args[0], "running openssl");

		let mut child = Command::new(&self.program)
			.args(args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()?;

		if let Some(mut input) = child.stdin.take() {
			// A process that failed early closes its stdin; its exit status
			// tells why.
			if let Err(err) = input.write_all(stdin)
				&& err.kind() != io::ErrorKind::BrokenPipe
			{
				return Err(err.into());
			}
		}
		let output = child.wait_with_output()?;

		if !output.status.success() {
			return Err(CryptoError::Openssl {
				status: output.status.to_string(),
				stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
			});
		}
		Ok(output.stdout)
	}
}

impl PublicKeyEncryptor for OpensslCli {
	fn encrypt_base64(&self, public_key: &Path, plaintext: &str) -> Result<String, CryptoError> {
		let args = [
			"pkeyutl".to_string(),
			"-encrypt".to_string(),
			"-pubin".to_string(),
			"-inkey".to_string(),
			public_key.display().to_string(),
			"-pkeyopt".to_string(),
			"rsa_padding_mode:pkcs1".to_string(),
		];
		// The platform expects the line terminated plaintext.
		let cipher = self.run(&args, format!("{plaintext}\n").as_bytes())?;
		Ok(general_purpose::STANDARD.encode(cipher))
	}
}

#[cfg(test)]
mod tests {
	use std::{env, fs};

	use super::*;

	fn openssl_available() -> bool {
		Command::new("openssl").arg("version").output().is_ok_and(|output| output.status.success())
	}

	#[test]
	fn test_round_trip_with_generated_key() {
		if !openssl_available() {
			return;
		}

		let dir = env::temp_dir().join(format!("vncmgr-rsa-{}", uuid::Uuid::new_v4()));
		fs::create_dir_all(&dir).unwrap();
		let private_key = dir.join("key.pem");
		let public_key = dir.join("pub.pem");

		let status = Command::new("openssl")
			.args(["genpkey", "-algorithm", "RSA", "-pkeyopt", "rsa_keygen_bits:2048", "-out"])
			.arg(&private_key)
			.stderr(Stdio::null())
			.status()
			.unwrap();
		assert!(status.success());
		let status = Command::new("openssl")
			.args(["pkey", "-pubout", "-in"])
			.arg(&private_key)
			.arg("-out")
			.arg(&public_key)
			.status()
			.unwrap();
		assert!(status.success());

		let cli = OpensslCli::new("openssl");
		let encoded = cli.encrypt_base64(&public_key, "pass1 pass2").unwrap();
		assert_eq!(general_purpose::STANDARD.decode(&encoded).unwrap().len(), 256);
		assert_eq!(cli.decrypt_base64(&private_key, &encoded, None).unwrap(), "pass1 pass2");

		fs::remove_dir_all(&dir).unwrap();
	}

	#[test]
	fn test_missing_key_fails() {
		if !openssl_available() {
			return;
		}
		let cli = OpensslCli::new("openssl");
		let err = cli.encrypt_base64(Path::new("/nonexistent/key.pem"), "x").unwrap_err();
		assert!(matches!(err, CryptoError::Openssl { .. }));
	}

	#[test]
	fn test_missing_program_fails() {
		let cli = OpensslCli::new("/nonexistent/openssl");
		let err = cli.encrypt_base64(Path::new("key.pem"), "x").unwrap_err();
		assert!(matches!(err, CryptoError::Io(_)));
	}

	#[test]
	fn test_locate_falls_back_to_path() {
		let cli = OpensslCli::locate(Path::new("/nonexistent"));
		assert_eq!(cli.program(), Path::new("openssl"));
	}
}
