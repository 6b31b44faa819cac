// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password digests.
//!
//! Digests are PBKDF2-HMAC-SHA256 with a random 16-byte salt, encoded as
//!
//! ```text
//! pbkdf2-sha256$<iterations>$<base64 salt>$<base64 hash>
//! ```
//!
//! so the iteration count can be raised later without breaking existing
//! digests.

use std::num::NonZeroU32;

use base64ct::{Base64, Encoding};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const GENERATED_PASSWORD_BYTES: usize = 24;

#[cfg(not(test))]
const ITERATIONS: u32 = 210_000;
#[cfg(test)]
const ITERATIONS: u32 = 1_000;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("system random number generator failed")]
    Random,
    #[error("malformed password digest")]
    MalformedDigest,
}

fn iterations() -> Result<NonZeroU32, CredentialError> {
    NonZeroU32::new(ITERATIONS).ok_or(CredentialError::MalformedDigest)
}

/// Hash a secret with a fresh salt.
pub fn hash_secret(secret: &str) -> Result<String, CredentialError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| CredentialError::Random)?;

    let iterations = iterations()?;
    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(ALGORITHM, iterations, &salt, secret.as_bytes(), &mut hash);

    Ok(format!(
        "{SCHEME}${}${}${}",
        iterations,
        Base64::encode_string(&salt),
        Base64::encode_string(&hash)
    ))
}

/// Check a secret against a digest produced by [`hash_secret`].
///
/// Malformed digests never verify.
pub fn verify_secret(secret: &str, digest: &str) -> bool {
    match parse_digest(digest) {
        Ok((iterations, salt, hash)) => {
            pbkdf2::verify(ALGORITHM, iterations, &salt, secret.as_bytes(), &hash).is_ok()
        }
        Err(_) => false,
    }
}

fn parse_digest(digest: &str) -> Result<(NonZeroU32, Vec<u8>, Vec<u8>), CredentialError> {
    let mut parts = digest.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CredentialError::MalformedDigest);
    };

    let iterations = iterations
        .parse::<u32>()
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or(CredentialError::MalformedDigest)?;
    let salt = Base64::decode_vec(salt).map_err(|_| CredentialError::MalformedDigest)?;
    let hash = Base64::decode_vec(hash).map_err(|_| CredentialError::MalformedDigest)?;
    if hash.len() != HASH_LEN {
        return Err(CredentialError::MalformedDigest);
    }
    Ok((iterations, salt, hash))
}

/// Random password for accounts that sign in through SSO and never use one.
pub fn random_password() -> Result<String, CredentialError> {
    let mut bytes = [0u8; GENERATED_PASSWORD_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| CredentialError::Random)?;
    Ok(Base64::encode_string(&bytes))
}
