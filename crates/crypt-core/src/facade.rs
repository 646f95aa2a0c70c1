//! Text-only boundary for the web UI.
//!
//! Every function takes and returns plain strings. Failures come back as a
//! sentinel string `error:<operation>:<kind>: <description>`; check with
//! [`is_error`]. On `wasm32` these are exported through `wasm_bindgen`.
//!
//! ```js
//! import init, { encrypt, decrypt, get_num_algorithms } from './crypt.js';
//! await init();
//! const text = encrypt("crypt-aes-256-gcm", password, JSON.stringify(vault));
//! ```

use secrecy::SecretString;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use crate::cryptor::Cryptor;
use crate::envelope;
use crate::error::CryptError;
use crate::registry;

/// Every boundary failure starts with this marker.
pub const ERROR_MARKER: &str = "error:";

/// Module name.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn get_name() -> String {
    "crypt".to_string()
}

/// Number of algorithms available.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn get_num_algorithms() -> usize {
    registry::count()
}

/// The n-th algorithm name, zero based.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn get_algorithm(i: usize) -> String {
    match registry::name_at(i) {
        Ok(name) => name.to_string(),
        Err(_) => format!("{ERROR_MARKER}algorithms:invalid-index:{i}"),
    }
}

/// The envelope prefix line for `algorithm`.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn header_prefix(algorithm: &str) -> String {
    envelope::header_prefix(algorithm)
        .unwrap_or_else(|_| format!("{ERROR_MARKER}header:invalid-algorithm"))
}

/// The envelope suffix line for `algorithm`.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn header_suffix(algorithm: &str) -> String {
    envelope::header_suffix(algorithm)
        .unwrap_or_else(|_| format!("{ERROR_MARKER}header:invalid-algorithm"))
}

/// Whether `text` already carries an envelope prefix and suffix.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn is_encrypted(text: &str) -> bool {
    envelope::looks_encrypted(text)
}

/// Encrypt `plaintext` with `algorithm` under `password`.
///
/// Returns the envelope text, or an `error:encrypt:` sentinel.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn encrypt(algorithm: &str, password: &str, plaintext: &str) -> String {
    let password = SecretString::from(password);
    Cryptor::default()
        .encrypt(algorithm, &password, plaintext)
        .unwrap_or_else(|e| sentinel("encrypt", &e))
}

/// Decrypt envelope text produced by [`encrypt`].
///
/// `algorithm` is a hint only; the envelope names the algorithm actually
/// used. Returns the plaintext, or an `error:decrypt:` sentinel.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn decrypt(algorithm: &str, password: &str, ciphertext: &str) -> String {
    let password = SecretString::from(password);
    Cryptor::default()
        .decrypt_with_hint(algorithm, &password, ciphertext)
        .unwrap_or_else(|e| sentinel("decrypt", &e))
}

/// Whether a boundary result is an error sentinel.
///
/// A plaintext that itself begins with `error:` is indistinguishable here;
/// callers needing certainty should use [`Cryptor`] directly.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn is_error(result: &str) -> bool {
    result.starts_with(ERROR_MARKER)
}

fn sentinel(operation: &str, error: &CryptError) -> String {
    format!("{ERROR_MARKER}{operation}:{}: {error}", error.kind())
}
