//! Key derivation: Argon2id password → master secret → HKDF per-algorithm key

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{CryptError, CryptResult};

/// Size of the Argon2id master secret (256-bit)
pub const MASTER_SIZE: usize = 32;

/// Size of the per-message salt (128-bit)
pub const SALT_SIZE: usize = 16;

/// Largest accepted memory cost: 256 MiB, four times the default.
///
/// Envelopes carry their own params, so these ceilings bound the work a
/// forged envelope can demand from `decrypt`.
pub const MAX_MEM_COST_KIB: u32 = 256 * 1024;

/// Largest accepted time cost and parallelism
pub const MAX_TIME_COST: u32 = 8;
pub const MAX_PARALLELISM: u32 = 16;

/// Symmetric key material for exactly one encrypt/decrypt call.
///
/// Zeroized on drop to prevent secrets lingering in memory.
pub struct DerivedKey {
    bytes: Vec<u8>,
}

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Argon2id parameters for KDF
///
/// Written into every envelope, so changing the configured values never
/// breaks decryption of older data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Check the params against the bounds accepted on decode.
    pub fn validate(&self) -> CryptResult<()> {
        if self.parallelism == 0 || self.parallelism > MAX_PARALLELISM {
            return Err(CryptError::InvalidParameters(format!(
                "argon2 parallelism {} not in 1..={MAX_PARALLELISM}",
                self.parallelism
            )));
        }
        if self.time_cost == 0 || self.time_cost > MAX_TIME_COST {
            return Err(CryptError::InvalidParameters(format!(
                "argon2 time cost {} not in 1..={MAX_TIME_COST}",
                self.time_cost
            )));
        }
        let min_mem = 8 * self.parallelism;
        if self.mem_cost_kib < min_mem || self.mem_cost_kib > MAX_MEM_COST_KIB {
            return Err(CryptError::InvalidParameters(format!(
                "argon2 memory cost {} KiB not in {min_mem}..={MAX_MEM_COST_KIB}",
                self.mem_cost_kib
            )));
        }
        Ok(())
    }
}

/// Derive an `output_len`-byte key for `algorithm` from a password and salt.
///
/// Argon2id stretches the password into a 256-bit master secret; HKDF-SHA256
/// then expands it with the algorithm name as domain, yielding the cipher's
/// key (and subkeys, for suites that need a double-length key).
pub fn derive_key(
    password: &SecretString,
    salt: &[u8],
    params: &KdfParams,
    algorithm: &str,
    output_len: usize,
) -> CryptResult<DerivedKey> {
    params.validate()?;

    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(MASTER_SIZE),
    )
    .map_err(|e| CryptError::InvalidParameters(format!("argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut master = Zeroizing::new([0u8; MASTER_SIZE]);
    argon2
        .hash_password_into(
            password.expose_secret().as_bytes(),
            salt,
            master.as_mut_slice(),
        )
        .map_err(|e| CryptError::DerivationFailure(format!("argon2id: {e}")))?;

    let info = format!("crypt-key:{algorithm}");
    let hkdf = Hkdf::<Sha256>::new(None, master.as_slice());
    let mut okm = vec![0u8; output_len];
    hkdf.expand(info.as_bytes(), &mut okm)
        .map_err(|e| CryptError::InvalidParameters(format!("HKDF expand: {e}")))?;

    Ok(DerivedKey { bytes: okm })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> KdfParams {
        KdfParams {
            mem_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_kdf_deterministic() {
        let password = SecretString::from("test-password-123");
        let salt = [1u8; SALT_SIZE];

        let key1 = derive_key(&password, &salt, &fast_params(), "alg", 32).unwrap();
        let key2 = derive_key(&password, &salt, &fast_params(), "alg", 32).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes(), "KDF must be deterministic");
    }

    #[test]
    fn test_kdf_different_passwords() {
        let salt = [1u8; SALT_SIZE];
        let key1 = derive_key(&SecretString::from("password-a"), &salt, &fast_params(), "alg", 32)
            .unwrap();
        let key2 = derive_key(&SecretString::from("password-b"), &salt, &fast_params(), "alg", 32)
            .unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_kdf_different_salts() {
        let password = SecretString::from("same-password");
        let key1 = derive_key(&password, &[1u8; SALT_SIZE], &fast_params(), "alg", 32).unwrap();
        let key2 = derive_key(&password, &[2u8; SALT_SIZE], &fast_params(), "alg", 32).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_kdf_algorithm_domain_separation() {
        let password = SecretString::from("same-password");
        let salt = [9u8; SALT_SIZE];
        let gcm = derive_key(&password, &salt, &fast_params(), "crypt-aes-256-gcm", 32).unwrap();
        let siv = derive_key(&password, &salt, &fast_params(), "crypt-aes-256-gcm-siv", 32).unwrap();

        assert_ne!(gcm.as_bytes(), siv.as_bytes());
    }

    #[test]
    fn test_kdf_output_length() {
        let password = SecretString::from("pw");
        let key = derive_key(&password, &[0u8; SALT_SIZE], &fast_params(), "alg", 64).unwrap();
        assert_eq!(key.len(), 64);
    }

    #[test]
    fn test_kdf_empty_password_accepted() {
        let key = derive_key(&SecretString::from(""), &[0u8; SALT_SIZE], &fast_params(), "alg", 32);
        assert!(key.is_ok());
    }

    #[test]
    fn test_params_bounds() {
        assert!(KdfParams::default().validate().is_ok());
        assert!(fast_params().validate().is_ok());

        let zero_time = KdfParams { time_cost: 0, ..fast_params() };
        assert!(matches!(zero_time.validate(), Err(CryptError::InvalidParameters(_))));

        let huge_mem = KdfParams { mem_cost_kib: MAX_MEM_COST_KIB + 1, ..fast_params() };
        assert!(huge_mem.validate().is_err());

        let ceiling = KdfParams {
            mem_cost_kib: MAX_MEM_COST_KIB,
            time_cost: MAX_TIME_COST,
            parallelism: MAX_PARALLELISM,
        };
        assert!(ceiling.validate().is_ok());

        let one_gib = KdfParams { mem_cost_kib: 1024 * 1024, time_cost: 16, parallelism: 1 };
        assert!(one_gib.validate().is_err());

        let starved = KdfParams { mem_cost_kib: 8, time_cost: 1, parallelism: 4 };
        assert!(starved.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = derive_key(&SecretString::from("pw"), &[0u8; SALT_SIZE], &fast_params(), "alg", 32)
            .unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
    }
}
