//! Algorithm registry: stable names and indices for every cipher suite.
//!
//! The names are part of the wire format (they appear in envelope headers and
//! in the key-derivation domain) and must never change once released.

use aes_gcm::Aes256Gcm;
use aes_gcm_siv::Aes256GcmSiv;
use aes_siv::Aes256SivAead;
use chacha20poly1305::XChaCha20Poly1305;
use serde::Serialize;

use crate::cipher::{AeadSuite, Cipher};
use crate::error::{CryptError, CryptResult};

pub const AES_256_GCM: &str = "crypt-aes-256-gcm";
pub const AES_256_GCM_SIV: &str = "crypt-aes-256-gcm-siv";
pub const XCHACHA20_POLY1305: &str = "crypt-xchacha20-poly1305";
pub const AES_256_SIV: &str = "crypt-aes-256-siv";

static AES_256_GCM_SUITE: AeadSuite<Aes256Gcm> = AeadSuite::new(AES_256_GCM);
static AES_256_GCM_SIV_SUITE: AeadSuite<Aes256GcmSiv> = AeadSuite::new(AES_256_GCM_SIV);
static XCHACHA20_POLY1305_SUITE: AeadSuite<XChaCha20Poly1305> =
    AeadSuite::new(XCHACHA20_POLY1305);
static AES_256_SIV_SUITE: AeadSuite<Aes256SivAead> = AeadSuite::new(AES_256_SIV);

/// Index order is stable; append only.
static REGISTRY: [&dyn Cipher; 4] = [
    &AES_256_GCM_SUITE,
    &AES_256_GCM_SIV_SUITE,
    &XCHACHA20_POLY1305_SUITE,
    &AES_256_SIV_SUITE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlgorithmDescriptor {
    pub index: usize,
    pub name: &'static str,
}

/// Number of registered algorithms (always at least one).
pub fn count() -> usize {
    REGISTRY.len()
}

pub fn name_at(index: usize) -> CryptResult<&'static str> {
    REGISTRY
        .get(index)
        .map(|cipher| cipher.name())
        .ok_or(CryptError::IndexOutOfRange {
            index,
            count: count(),
        })
}

/// Resolve a cipher by exact, case-sensitive name.
pub fn resolve(name: &str) -> CryptResult<&'static dyn Cipher> {
    REGISTRY
        .iter()
        .copied()
        .find(|cipher| cipher.name() == name)
        .ok_or_else(|| CryptError::UnknownAlgorithm(name.to_string()))
}

pub fn is_valid(name: &str) -> bool {
    resolve(name).is_ok()
}

pub fn descriptors() -> impl Iterator<Item = AlgorithmDescriptor> {
    REGISTRY
        .iter()
        .enumerate()
        .map(|(index, cipher)| AlgorithmDescriptor {
            index,
            name: cipher.name(),
        })
}

/// The algorithm used when the caller does not pick one.
pub fn default_algorithm() -> &'static str {
    REGISTRY[0].name()
}
