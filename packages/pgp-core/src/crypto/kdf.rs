//! Password-based key derivation (Argon2id).
//!
//! The derived key protects a stored private key, so the function is
//! deliberately slow. Parameters travel with every wrapped key so they can be
//! raised later without breaking old records.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Salt length in bytes
pub const SALT_SIZE: usize = 16;

/// Derived key length in bytes (AES-256)
pub const DERIVED_KEY_SIZE: usize = 32;

/// Largest memory cost evaluated for any key (256 MiB)
pub const MAX_MEMORY_KIB: u32 = 256 * 1024;

/// Largest number of passes evaluated for any key
pub const MAX_ITERATIONS: u32 = 12;

/// Largest lane count evaluated for any key
pub const MAX_PARALLELISM: u32 = 8;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Lanes
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// 64 MiB, 3 passes, 1 lane
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    fn to_argon2(self) -> Result<Params> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(DERIVED_KEY_SIZE),
        )
        .map_err(|e| Error::KeyDerivationFailed(e.to_string()))
    }

    /// Check that Argon2 accepts these parameters and that they stay within
    /// the cost ceilings
    pub fn validate(&self) -> Result<()> {
        self.check_bounds()?;
        self.to_argon2().map(|_| ())
    }

    /// Reject costs above [`MAX_MEMORY_KIB`], [`MAX_ITERATIONS`] or
    /// [`MAX_PARALLELISM`]
    ///
    /// Parameters read from key files and ring rows are attacker-controlled;
    /// they must pass this before any derivation runs.
    pub fn check_bounds(&self) -> Result<()> {
        if self.memory_kib > MAX_MEMORY_KIB {
            return Err(Error::KeyDerivationFailed(format!(
                "memory cost {} KiB exceeds {} KiB",
                self.memory_kib, MAX_MEMORY_KIB
            )));
        }
        if self.iterations > MAX_ITERATIONS {
            return Err(Error::KeyDerivationFailed(format!(
                "{} passes exceeds {}",
                self.iterations, MAX_ITERATIONS
            )));
        }
        if self.parallelism > MAX_PARALLELISM {
            return Err(Error::KeyDerivationFailed(format!(
                "{} lanes exceeds {}",
                self.parallelism, MAX_PARALLELISM
            )));
        }
        Ok(())
    }
}

/// Generate a random salt
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 32-byte key from `password` and `salt`
///
/// Deterministic for identical inputs.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; DERIVED_KEY_SIZE]>> {
    params.check_bounds()?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);

    let mut output = Zeroizing::new([0u8; DERIVED_KEY_SIZE]);
    argon2
        .hash_password_into(password, salt, &mut output[..])
        .map_err(|e| Error::KeyDerivationFailed(e.to_string()))?;

    Ok(output)
}
