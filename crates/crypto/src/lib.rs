// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Credential encoding used by the VNC manager.
//!
//! - [`aes_ecb`]: AES-128-ECB with zero padding, wrapped in base64, used for
//!   password change requests keyed by the current password
//! - [`vnc`]: the fixed-key DES obfuscation VNC servers store passwords with
//! - [`rsa`]: RSA PKCS#1 v1.5 through the `openssl` command line tool, used to
//!   hand the password pair to the remote platform

pub mod aes_ecb;
mod error;
pub mod rsa;
pub mod vnc;

pub use error::CryptoError;
pub use rsa::{OpensslCli, PublicKeyEncryptor};
