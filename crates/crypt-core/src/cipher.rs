//! Authenticated symmetric ciphers behind one object-safe trait.
//!
//! Every suite is a RustCrypto AEAD driven in detached mode, so the
//! authentication tag travels separately from the ciphertext inside the
//! envelope. Key, nonce and tag sizes are fixed per suite and checked on
//! every call.

use std::marker::PhantomData;

use aes_gcm::aead::{
    generic_array::{typenum::Unsigned, GenericArray},
    AeadInPlace, KeyInit,
};
use zeroize::Zeroize;

use crate::error::{CryptError, CryptResult};

/// Output of [`Cipher::seal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

/// An authenticated symmetric cipher.
pub trait Cipher: Send + Sync {
    /// Stable registry name, e.g. `crypt-aes-256-gcm`.
    fn name(&self) -> &'static str;
    fn key_len(&self) -> usize;
    fn nonce_len(&self) -> usize;
    fn tag_len(&self) -> usize;

    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> CryptResult<Sealed>;

    /// Verify and decrypt. Any verification failure is reported as
    /// [`CryptError::AuthenticationFailure`] with no further detail.
    fn open(
        &self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> CryptResult<Vec<u8>>;
}

/// Generic [`Cipher`] over any RustCrypto AEAD.
pub struct AeadSuite<A> {
    name: &'static str,
    _aead: PhantomData<fn() -> A>,
}

impl<A> AeadSuite<A> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _aead: PhantomData,
        }
    }
}

impl<A> AeadSuite<A>
where
    A: KeyInit + AeadInPlace,
{
    fn check_sizes(&self, key: &[u8], nonce: &[u8], tag: Option<&[u8]>) -> CryptResult<()> {
        if key.len() != self.key_len() {
            return Err(CryptError::InvalidParameters(format!(
                "{}: key is {} bytes (expected {})",
                self.name,
                key.len(),
                self.key_len()
            )));
        }
        if nonce.len() != self.nonce_len() {
            return Err(CryptError::InvalidParameters(format!(
                "{}: nonce is {} bytes (expected {})",
                self.name,
                nonce.len(),
                self.nonce_len()
            )));
        }
        if let Some(tag) = tag {
            if tag.len() != self.tag_len() {
                return Err(CryptError::InvalidParameters(format!(
                    "{}: tag is {} bytes (expected {})",
                    self.name,
                    tag.len(),
                    self.tag_len()
                )));
            }
        }
        Ok(())
    }

    fn init(&self, key: &[u8]) -> CryptResult<A> {
        A::new_from_slice(key)
            .map_err(|_| CryptError::InvalidParameters(format!("{}: bad key length", self.name)))
    }
}

impl<A> Cipher for AeadSuite<A>
where
    A: KeyInit + AeadInPlace,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn key_len(&self) -> usize {
        A::KeySize::USIZE
    }

    fn nonce_len(&self) -> usize {
        A::NonceSize::USIZE
    }

    fn tag_len(&self) -> usize {
        A::TagSize::USIZE
    }

    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> CryptResult<Sealed> {
        self.check_sizes(key, nonce, None)?;
        let cipher = self.init(key)?;

        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(GenericArray::from_slice(nonce), aad, &mut buffer)
            .map_err(|_| {
                CryptError::InvalidParameters(format!("{}: plaintext too long", self.name))
            })?;

        Ok(Sealed {
            ciphertext: buffer,
            tag: tag.to_vec(),
        })
    }

    fn open(
        &self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> CryptResult<Vec<u8>> {
        self.check_sizes(key, nonce, Some(tag))?;
        let cipher = self.init(key)?;

        let mut buffer = ciphertext.to_vec();
        let verified = cipher.decrypt_in_place_detached(
            GenericArray::from_slice(nonce),
            aad,
            &mut buffer,
            GenericArray::from_slice(tag),
        );
        if verified.is_err() {
            // some suites decrypt before comparing tags
            buffer.zeroize();
            return Err(CryptError::AuthenticationFailure);
        }
        Ok(buffer)
    }
}
