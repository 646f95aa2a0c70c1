//! Read-only support for envelopes written by the first web release.
//!
//! Those envelopes share the current prefix and suffix lines but carry a bare
//! `ciphertext || tag` payload: no version byte, no salt, no KDF params. The
//! key is the password padded to 32 bytes and the nonce is the first 12 key
//! bytes. Only AES-256-GCM and AES-256-GCM-SIV were ever written that way.
//!
//! Nothing here encrypts; new envelopes always use the versioned layout.

use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::cipher::Cipher;
use crate::error::{CryptError, CryptResult};
use crate::registry;

const KEY_SIZE: usize = 32;

/// Whether envelopes of this suite may predate the versioned layout.
pub(crate) fn supports(cipher: &dyn Cipher) -> bool {
    matches!(
        cipher.name(),
        registry::AES_256_GCM | registry::AES_256_GCM_SIV
    )
}

/// Open a legacy payload with the password-as-key scheme.
pub(crate) fn open(
    cipher: &dyn Cipher,
    password: &SecretString,
    payload: &[u8],
) -> CryptResult<Vec<u8>> {
    if !supports(cipher) {
        return Err(CryptError::UnknownAlgorithm(cipher.name().to_string()));
    }
    let tag_len = cipher.tag_len();
    if payload.len() < tag_len {
        return Err(CryptError::malformed(format!(
            "legacy payload too short for {}: {} bytes",
            cipher.name(),
            payload.len()
        )));
    }

    let key = Zeroizing::new(padded_key(password.expose_secret().as_bytes()));
    let nonce = &key[..cipher.nonce_len()];
    let (ciphertext, tag) = payload.split_at(payload.len() - tag_len);
    cipher.open(key.as_slice(), nonce, &[], ciphertext, tag)
}

/// PKCS#7-style padding of the password to a 32-byte key.
///
/// Short passwords are padded with their own length. Passwords of 32 bytes or
/// more keep their first 31 bytes and are padded with zero.
fn padded_key(password: &[u8]) -> [u8; KEY_SIZE] {
    let (take, fill) = if password.len() < KEY_SIZE {
        (password.len(), password.len() as u8)
    } else {
        (KEY_SIZE - 1, 0)
    };
    let mut key = [fill; KEY_SIZE];
    key[..take].copy_from_slice(&password[..take]);
    key
}
