//! crypt-core: password-based envelope encryption for the personal-data vault
//!
//! Architecture: Argon2id → HKDF → AEAD, wrapped in a self-describing text envelope
//!
//! Pipeline: password + fresh salt → Argon2id master secret → HKDF(algorithm) key
//!           → AEAD seal with fresh nonce (AAD = algorithm || params) → base64 envelope
//!
//! Suites (stable names, see [`registry`]):
//! ```text
//! 0  crypt-aes-256-gcm          AES-256-GCM          key 32  nonce 12  tag 16
//! 1  crypt-aes-256-gcm-siv      AES-256-GCM-SIV      key 32  nonce 12  tag 16
//! 2  crypt-xchacha20-poly1305   XChaCha20-Poly1305   key 32  nonce 24  tag 16
//! 3  crypt-aes-256-siv          AES-256-SIV (AEAD)   key 64  nonce 16  tag 16
//! ```
//!
//! Two surfaces: [`Cryptor`] returns typed [`CryptResult`]s; the [`facade`]
//! functions are the string-in/string-out boundary used by the web UI.

pub mod cipher;
pub mod config;
pub mod cryptor;
pub mod envelope;
pub mod error;
pub mod facade;
pub mod kdf;
mod legacy;
pub mod registry;

pub use cipher::{AeadSuite, Cipher, Sealed};
pub use config::{CryptConfig, CryptoConfig, LogConfig};
pub use cryptor::Cryptor;
pub use envelope::{header_prefix, header_suffix, looks_encrypted, Envelope};
pub use error::{CryptError, CryptResult};
pub use kdf::{derive_key, DerivedKey, KdfParams};
pub use registry::AlgorithmDescriptor;
