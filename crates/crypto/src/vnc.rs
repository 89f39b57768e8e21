// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! VNC password obfuscation.
//!
//! VNC servers keep passwords as one DES block under a well-known fixed key.
//! This is obfuscation, not protection. In the settings file the block is
//! stored the way Windows profile structs are: the bytes as hex followed by
//! a one byte additive checksum.

use des::{
	Des,
	cipher::{BlockDecrypt, BlockEncrypt, KeyInit, generic_array::GenericArray},
};

use crate::CryptoError;

/// Longest password a VNC server accepts.
pub const MAX_PASSWORD_LEN: usize = 8;

/// The fixed key `17 52 6b 06 23 4e 58 07`, bit-mirrored per byte as the VNC
/// DES variant consumes key bits least significant first.
const FIXED_KEY: [u8; 8] = [0xe8, 0x4a, 0xd6, 0x60, 0xc4, 0x72, 0x1a, 0xe0];

/// Obfuscate `password`, truncated or zero padded to 8 bytes.
pub fn encrypt_password(password: &str) -> [u8; MAX_PASSWORD_LEN] {
	let mut block = [0u8; MAX_PASSWORD_LEN];
	let bytes = password.as_bytes();
	let len = bytes.len().min(MAX_PASSWORD_LEN);
	block[..len].copy_from_slice(&bytes[..len]);

	let cipher = Des::new(GenericArray::from_slice(&FIXED_KEY));
	cipher.encrypt_block(GenericArray::from_mut_slice(&mut block));
	block
}

/// Recover the password from its obfuscated block. Stops at the first zero.
pub fn decrypt_password(encrypted: &[u8; MAX_PASSWORD_LEN]) -> String {
	let mut block = *encrypted;
	let cipher = Des::new(GenericArray::from_slice(&FIXED_KEY));
	cipher.decrypt_block(GenericArray::from_mut_slice(&mut block));

	let end = block.iter().position(|b| *b == 0).unwrap_or(MAX_PASSWORD_LEN);
	String::from_utf8_lossy(&block[..end]).into_owned()
}

/// Obfuscate `password` into its settings file representation.
pub fn encode_stored_password(password: &str) -> String {
	let block = encrypt_password(password);
	let checksum = block.iter().fold(0u8, |sum, b| sum.wrapping_add(*b));

	let mut out = String::with_capacity(2 * (MAX_PASSWORD_LEN + 1));
	for byte in block.iter().chain(std::iter::once(&checksum)) {
		out.push_str(&format!("{:02X}", byte));
	}
	out
}

/// Parse and de-obfuscate a settings file password.
///
/// Accepts the bare 16 hex digits as well as the checksummed 18 digit form.
pub fn decode_stored_password(stored: &str) -> Result<String, CryptoError> {
	let stored = stored.trim();
	let bytes = parse_hex(stored).ok_or_else(|| CryptoError::InvalidStoredPassword(stored.to_string()))?;

	let block: [u8; MAX_PASSWORD_LEN] = match bytes.len() {
		MAX_PASSWORD_LEN => bytes.try_into().map_err(|_| CryptoError::InvalidStoredPassword(stored.to_string()))?,
		9 => {
			let checksum = bytes[..MAX_PASSWORD_LEN].iter().fold(0u8, |sum, b| sum.wrapping_add(*b));
			if checksum != bytes[MAX_PASSWORD_LEN] {
				return Err(CryptoError::Checksum);
			}
			bytes[..MAX_PASSWORD_LEN]
				.try_into()
				.map_err(|_| CryptoError::InvalidStoredPassword(stored.to_string()))?
		}
		_ => return Err(CryptoError::InvalidStoredPassword(stored.to_string())),
	};
	Ok(decrypt_password(&block))
}

fn parse_hex(text: &str) -> Option<Vec<u8>> {
	if text.len() % 2 != 0 || !text.is_ascii() {
		return None;
	}
	(0..text.len()).step_by(2).map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_round_trip_truncates_to_eight() {
		assert_eq!(decrypt_password(&encrypt_password("secret")), "secret");
		assert_eq!(decrypt_password(&encrypt_password("0123456789")), "01234567");
		assert_eq!(decrypt_password(&encrypt_password("")), "");
	}

	#[test]
	fn test_different_passwords_differ() {
		assert_ne!(encrypt_password("aaaa"), encrypt_password("aaab"));
	}

	#[test]
	fn test_stored_form_has_checksum() {
		let stored = encode_stored_password("vnc");
		assert_eq!(stored.len(), 18);
		assert!(stored.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
		assert_eq!(decode_stored_password(&stored).unwrap(), "vnc");

		// The bare block decodes as well.
		assert_eq!(decode_stored_password(&stored[..16]).unwrap(), "vnc");
		assert_eq!(decode_stored_password(&stored.to_lowercase()).unwrap(), "vnc");
	}

	#[test]
	fn test_stored_form_rejects_garbage() {
		let mut stored = encode_stored_password("vnc");
		let last = if stored.ends_with('0') { '1' } else { '0' };
		stored.pop();
		stored.push(last);
		assert!(matches!(decode_stored_password(&stored), Err(CryptoError::Checksum)));

		assert!(matches!(decode_stored_password("xyz"), Err(CryptoError::InvalidStoredPassword(_))));
		assert!(matches!(decode_stored_password("00112233"), Err(CryptoError::InvalidStoredPassword(_))));
		assert!(matches!(decode_stored_password(""), Err(CryptoError::InvalidStoredPassword(_))));
	}
}
