// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! AES-128-ECB with zero padding, base64 wrapped.

use aes::{
	Aes128,
	cipher::{BlockDecrypt, BlockEncrypt, KeyInit, generic_array::GenericArray},
};
use base64::{Engine, engine::general_purpose};

use crate::CryptoError;

const BLOCK: usize = 16;

/// Derive a key from a password: its bytes, truncated or zero padded to 16.
pub fn key_from_password(password: &str) -> [u8; BLOCK] {
	let mut key = [0u8; BLOCK];
	let bytes = password.as_bytes();
	let len = bytes.len().min(BLOCK);
	key[..len].copy_from_slice(&bytes[..len]);
	key
}

/// Zero pad `data` to whole blocks, encrypt each block and base64 the result.
pub fn encrypt_base64(key: &[u8; BLOCK], data: &[u8]) -> String {
	let mut buf = data.to_vec();
	buf.resize(data.len().div_ceil(BLOCK) * BLOCK, 0);

	let cipher = Aes128::new(GenericArray::from_slice(key));
	for block in buf.chunks_mut(BLOCK) {
		cipher.encrypt_block(GenericArray::from_mut_slice(block));
	}
	general_purpose::STANDARD.encode(buf)
}

/// Reverse of [`encrypt_base64`].
///
/// A ciphertext that is not a whole number of blocks is zero padded first.
/// The zero padding of the plaintext is kept; see [`strip_zero_padding`].
pub fn decrypt_base64(key: &[u8; BLOCK], encoded: &str) -> Result<Vec<u8>, CryptoError> {
	let mut buf = general_purpose::STANDARD.decode(encoded.trim())?;
	buf.resize(buf.len().div_ceil(BLOCK) * BLOCK, 0);

	let cipher = Aes128::new(GenericArray::from_slice(key));
	for block in buf.chunks_mut(BLOCK) {
		cipher.decrypt_block(GenericArray::from_mut_slice(block));
	}
	Ok(buf)
}

/// Drop trailing zero bytes.
pub fn strip_zero_padding(data: &[u8]) -> &[u8] {
	let end = data.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
	&data[..end]
}

/// Decrypt to text, without the zero padding.
pub fn decrypt_base64_string(key: &[u8; BLOCK], encoded: &str) -> Result<String, CryptoError> {
	let plain = decrypt_base64(key, encoded)?;
	String::from_utf8(strip_zero_padding(&plain).to_vec()).map_err(|_| CryptoError::Utf8)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_key_from_password() {
		let key = key_from_password("secret");
		assert_eq!(&key[..6], b"secret");
		assert!(key[6..].iter().all(|b| *b == 0));

		let key = key_from_password("0123456789abcdefXYZ");
		assert_eq!(&key, b"0123456789abcdef");
	}

	#[test]
	fn test_fips197_vector() {
		// FIPS-197 appendix C.1 with a single block, no padding needed.
		let key: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
		let plain: Vec<u8> = (0..16u8).map(|i| i * 0x11).collect();
		let encoded = encrypt_base64(&key, &plain);
		let cipher = general_purpose::STANDARD.decode(&encoded).unwrap();
		assert_eq!(
			cipher,
			[0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70, 0xb4, 0xc5, 0x5a]
		);
	}

	#[test]
	fn test_zero_padding() {
		let key = key_from_password("pass");
		let encoded = encrypt_base64(&key, b"pass newpass newpass2");
		assert_eq!(general_purpose::STANDARD.decode(&encoded).unwrap().len(), 32);

		let plain = decrypt_base64(&key, &encoded).unwrap();
		assert_eq!(plain.len(), 32);
		assert_eq!(decrypt_base64_string(&key, &encoded).unwrap(), "pass newpass newpass2");
	}

	#[test]
	fn test_wrong_key_does_not_yield_plaintext() {
		let encoded = encrypt_base64(&key_from_password("right"), b"a b c");
		let plain = decrypt_base64(&key_from_password("wrong"), &encoded).unwrap();
		assert_ne!(strip_zero_padding(&plain), b"a b c");
	}

	#[test]
	fn test_invalid_base64() {
		assert!(matches!(decrypt_base64(&[0; 16], "not base64!"), Err(CryptoError::Base64(_))));
	}
}
