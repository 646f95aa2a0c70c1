//! Typed encrypt/decrypt pipeline.
//!
//! ```text
//! encrypt: resolve suite → fresh salt + nonce (OsRng) → Argon2id/HKDF key
//!          → AEAD seal (AAD = name || params) → envelope text
//! decrypt: envelope text → suite named by the envelope → re-derive key from
//!          embedded salt + params → AEAD open → UTF-8 plaintext
//!          (GCM / GCM-SIV only: on failure, retry as a first-release envelope)
//! ```
//!
//! No state survives a call; a `Cryptor` only carries cost parameters and the
//! empty-password policy, so one instance can be shared across threads.

use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::config::CryptoConfig;
use crate::envelope::{self, Envelope};
use crate::error::{CryptError, CryptResult};
use crate::kdf::{derive_key, KdfParams, SALT_SIZE};
use crate::legacy;
use crate::registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cryptor {
    params: KdfParams,
    allow_empty_password: bool,
}

impl Default for Cryptor {
    fn default() -> Self {
        Self::new(KdfParams::default())
    }
}

impl From<&CryptoConfig> for Cryptor {
    fn from(config: &CryptoConfig) -> Self {
        Self::new(config.kdf_params()).allow_empty_password(config.allow_empty_password)
    }
}

impl Cryptor {
    pub fn new(params: KdfParams) -> Self {
        Self {
            params,
            allow_empty_password: true,
        }
    }

    /// Reject empty passwords on `encrypt` when `allow` is false.
    pub fn allow_empty_password(mut self, allow: bool) -> Self {
        self.allow_empty_password = allow;
        self
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Encrypt `plaintext` with the named algorithm and return envelope text.
    pub fn encrypt(
        &self,
        algorithm: &str,
        password: &SecretString,
        plaintext: &str,
    ) -> CryptResult<String> {
        self.seal(algorithm, password, plaintext)
            .map(|envelope| envelope.encode())
    }

    /// Encrypt into an [`Envelope`] without serializing it.
    pub fn seal(
        &self,
        algorithm: &str,
        password: &SecretString,
        plaintext: &str,
    ) -> CryptResult<Envelope> {
        if !self.allow_empty_password && password.expose_secret().is_empty() {
            return Err(CryptError::EmptyPassword);
        }
        let cipher = registry::resolve(algorithm)?;

        let mut salt = vec![0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        let mut nonce = vec![0u8; cipher.nonce_len()];
        OsRng.fill_bytes(&mut nonce);

        let key = derive_key(password, &salt, &self.params, cipher.name(), cipher.key_len())?;
        let aad = envelope::associated_data(cipher.name(), &self.params);
        let sealed = cipher.seal(key.as_bytes(), &nonce, &aad, plaintext.as_bytes())?;

        debug!(
            algorithm = cipher.name(),
            plaintext_len = plaintext.len(),
            mem_cost_kib = self.params.mem_cost_kib,
            time_cost = self.params.time_cost,
            parallelism = self.params.parallelism,
            "sealed envelope"
        );

        Envelope::new(cipher, self.params, salt, nonce, sealed)
    }

    /// Decrypt envelope text. The algorithm comes from the envelope itself.
    ///
    /// AES-256-GCM and AES-256-GCM-SIV envelopes that fail to open under the
    /// versioned layout are retried as first-release envelopes.
    pub fn decrypt(&self, password: &SecretString, text: &str) -> CryptResult<String> {
        self.decrypt_text(None, password, text)
    }

    /// Like [`Cryptor::decrypt`]; `hint` is what the caller believes was
    /// used and is only reported when it disagrees with the envelope.
    pub fn decrypt_with_hint(
        &self,
        hint: &str,
        password: &SecretString,
        text: &str,
    ) -> CryptResult<String> {
        self.decrypt_text(Some(hint), password, text)
    }

    /// Authenticate and decrypt a parsed [`Envelope`].
    pub fn open(&self, password: &SecretString, envelope: &Envelope) -> CryptResult<String> {
        into_text(self.open_bytes(password, envelope)?)
    }

    fn decrypt_text(
        &self,
        hint: Option<&str>,
        password: &SecretString,
        text: &str,
    ) -> CryptResult<String> {
        let result = envelope::decode_armor(text).and_then(|(cipher, payload)| {
            if let Some(hint) = hint.filter(|hint| *hint != cipher.name()) {
                debug!(
                    hint,
                    embedded = cipher.name(),
                    "algorithm hint ignored, using envelope tag"
                );
            }

            let opened = Envelope::from_payload(cipher, &payload)
                .and_then(|envelope| self.open_bytes(password, &envelope));
            match opened {
                Err(e) if legacy::supports(cipher) => {
                    debug!(algorithm = cipher.name(), kind = e.kind(), "trying legacy layout");
                    let plaintext = legacy::open(cipher, password, &payload)?;
                    info!(algorithm = cipher.name(), "opened legacy envelope");
                    Ok(plaintext)
                }
                other => other,
            }
        });

        match result.and_then(into_text) {
            Ok(plaintext) => Ok(plaintext),
            Err(e) => {
                warn!(kind = e.kind(), "decrypt failed");
                Err(e)
            }
        }
    }

    fn open_bytes(&self, password: &SecretString, envelope: &Envelope) -> CryptResult<Vec<u8>> {
        let cipher = envelope.cipher();
        let key = derive_key(
            password,
            envelope.salt(),
            envelope.kdf(),
            cipher.name(),
            cipher.key_len(),
        )?;

        let plaintext = cipher.open(
            key.as_bytes(),
            envelope.nonce(),
            &envelope.associated_data(),
            envelope.ciphertext(),
            envelope.tag(),
        )?;

        debug!(
            algorithm = cipher.name(),
            plaintext_len = plaintext.len(),
            "opened envelope"
        );
        Ok(plaintext)
    }
}

fn into_text(plaintext: Vec<u8>) -> CryptResult<String> {
    String::from_utf8(plaintext).map_err(|e| {
        e.into_bytes().zeroize();
        CryptError::malformed("decrypted payload is not UTF-8")
    })
}
