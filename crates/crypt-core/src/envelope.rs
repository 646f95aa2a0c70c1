//! Self-describing text envelope
//!
//! Format (ASCII only, 72-column lines):
//! ```text
//! ----------------------- crypt-aes-256-gcm prefix -----------------------
//! <base64 payload, wrapped at 72 columns>
//! ----------------------- crypt-aes-256-gcm suffix -----------------------
//! ```
//!
//! Binary payload (base64 STANDARD, padded):
//! ```text
//! [1 byte: version = 1]
//! [4 bytes BE: argon2 mem cost KiB][4 bytes BE: time cost][4 bytes BE: parallelism]
//! [16 bytes: salt][N bytes: nonce][M bytes: ciphertext][T bytes: tag]
//! ```
//! AAD = algorithm name || 0x00 || version/params header
//!
//! The prefix and suffix name the algorithm, so decoding never depends on
//! what the caller believes was used. The AAD binds that name (and the KDF
//! params) into authentication: relabelling a payload fails to open, and a
//! damaged version or params header reads as an authentication failure.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::cipher::{Cipher, Sealed};
use crate::error::{CryptError, CryptResult};
use crate::kdf::{KdfParams, SALT_SIZE};
use crate::registry;

/// Width of header lines and body lines.
pub const LINE_WIDTH: usize = 72;

/// Current payload layout version.
pub const ENVELOPE_VERSION: u8 = 1;

/// version + three u32 KDF params
const HEADER_LEN: usize = 1 + 4 * 3;

const PREFIX: &str = "prefix";
const SUFFIX: &str = "suffix";

/// A parsed or freshly sealed envelope. Never mutated in place.
pub struct Envelope {
    cipher: &'static dyn Cipher,
    kdf: KdfParams,
    salt: Vec<u8>,
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: Vec<u8>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("algorithm", &self.cipher.name())
            .field("kdf", &self.kdf)
            .field("salt_len", &self.salt.len())
            .field("nonce_len", &self.nonce.len())
            .field("ciphertext_len", &self.ciphertext.len())
            .field("tag_len", &self.tag.len())
            .finish()
    }
}

impl Envelope {
    /// Assemble an envelope from sealed output.
    pub fn new(
        cipher: &'static dyn Cipher,
        kdf: KdfParams,
        salt: Vec<u8>,
        nonce: Vec<u8>,
        sealed: Sealed,
    ) -> CryptResult<Self> {
        if salt.len() != SALT_SIZE
            || nonce.len() != cipher.nonce_len()
            || sealed.tag.len() != cipher.tag_len()
        {
            return Err(CryptError::InvalidParameters(format!(
                "{}: envelope part sizes (salt {}, nonce {}, tag {}) do not match the suite",
                cipher.name(),
                salt.len(),
                nonce.len(),
                sealed.tag.len()
            )));
        }
        Ok(Self {
            cipher,
            kdf,
            salt,
            nonce,
            ciphertext: sealed.ciphertext,
            tag: sealed.tag,
        })
    }

    pub fn cipher(&self) -> &'static dyn Cipher {
        self.cipher
    }

    pub fn algorithm(&self) -> &'static str {
        self.cipher.name()
    }

    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    /// Associated data bound into the AEAD tag.
    pub fn associated_data(&self) -> Vec<u8> {
        associated_data(self.cipher.name(), &self.kdf)
    }

    /// Serialize to the transportable text form.
    pub fn encode(&self) -> String {
        let mut payload = Vec::with_capacity(
            HEADER_LEN + self.salt.len() + self.nonce.len() + self.ciphertext.len() + self.tag.len(),
        );
        payload.extend_from_slice(&params_header(&self.kdf));
        payload.extend_from_slice(&self.salt);
        payload.extend_from_slice(&self.nonce);
        payload.extend_from_slice(&self.ciphertext);
        payload.extend_from_slice(&self.tag);

        let body = STANDARD.encode(&payload);
        let name = self.cipher.name();

        let mut out = String::with_capacity(body.len() + body.len() / LINE_WIDTH + 3 * LINE_WIDTH);
        out.push_str(&header_subject(name, PREFIX));
        out.push('\n');
        for (i, ch) in body.chars().enumerate() {
            if i > 0 && i % LINE_WIDTH == 0 {
                out.push('\n');
            }
            out.push(ch);
        }
        out.push('\n');
        out.push_str(&header_subject(name, SUFFIX));
        out.push('\n');
        out
    }

    /// Parse the text form. Surrounding whitespace is ignored.
    pub fn decode(text: &str) -> CryptResult<Self> {
        let (cipher, payload) = decode_armor(text)?;
        Self::from_payload(cipher, &payload)
    }

    /// Parse a binary payload already taken out of its armor.
    ///
    /// The version and KDF params are covered by the AAD, so once the length
    /// checks out a rejected header is reported as an authentication failure.
    pub(crate) fn from_payload(cipher: &'static dyn Cipher, payload: &[u8]) -> CryptResult<Self> {
        let nonce_len = cipher.nonce_len();
        let tag_len = cipher.tag_len();
        let min_len = HEADER_LEN + SALT_SIZE + nonce_len + tag_len;
        if payload.len() < min_len {
            return Err(CryptError::malformed(format!(
                "payload too short for {}: {} bytes (minimum {min_len})",
                cipher.name(),
                payload.len()
            )));
        }

        let (header, rest) = payload.split_at(HEADER_LEN);
        if header[0] != ENVELOPE_VERSION {
            debug!(version = header[0], "unsupported envelope version");
            return Err(CryptError::AuthenticationFailure);
        }
        let kdf = KdfParams {
            mem_cost_kib: read_u32(&header[1..5]),
            time_cost: read_u32(&header[5..9]),
            parallelism: read_u32(&header[9..13]),
        };
        if let Err(e) = kdf.validate() {
            debug!(error = %e, "embedded KDF params rejected");
            return Err(CryptError::AuthenticationFailure);
        }

        let (salt, rest) = rest.split_at(SALT_SIZE);
        let (nonce, rest) = rest.split_at(nonce_len);
        let (ciphertext, tag) = rest.split_at(rest.len() - tag_len);

        Ok(Self {
            cipher,
            kdf,
            salt: salt.to_vec(),
            nonce: nonce.to_vec(),
            ciphertext: ciphertext.to_vec(),
            tag: tag.to_vec(),
        })
    }
}

/// Strip prefix and suffix and decode the base64 body.
///
/// Returns the suite named by the header and the raw payload bytes, before
/// any version or layout check.
pub(crate) fn decode_armor(text: &str) -> CryptResult<(&'static dyn Cipher, Vec<u8>)> {
    let (cipher, body) = split_armor(text)?;
    let encoded: String = body.concat();
    let payload = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| CryptError::malformed(format!("invalid base64 payload: {e}")))?;
    Ok((cipher, payload))
}

/// Cheap "is this text already encrypted?" check: registered prefix and
/// matching suffix present. Does not validate the payload.
pub fn looks_encrypted(text: &str) -> bool {
    split_armor(text).is_ok()
}

/// The literal prefix line for a registered algorithm.
pub fn header_prefix(algorithm: &str) -> CryptResult<String> {
    let cipher = registry::resolve(algorithm)?;
    Ok(header_subject(cipher.name(), PREFIX))
}

/// The literal suffix line for a registered algorithm.
pub fn header_suffix(algorithm: &str) -> CryptResult<String> {
    let cipher = registry::resolve(algorithm)?;
    Ok(header_subject(cipher.name(), SUFFIX))
}

pub(crate) fn associated_data(algorithm: &str, kdf: &KdfParams) -> Vec<u8> {
    let mut aad = Vec::with_capacity(algorithm.len() + 1 + HEADER_LEN);
    aad.extend_from_slice(algorithm.as_bytes());
    aad.push(0);
    aad.extend_from_slice(&params_header(kdf));
    aad
}

fn params_header(kdf: &KdfParams) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0] = ENVELOPE_VERSION;
    header[1..5].copy_from_slice(&kdf.mem_cost_kib.to_be_bytes());
    header[5..9].copy_from_slice(&kdf.time_cost.to_be_bytes());
    header[9..13].copy_from_slice(&kdf.parallelism.to_be_bytes());
    header
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

/// `"<name> <kind>"` centred in a line of dashes, one space either side.
fn header_subject(algorithm: &str, kind: &str) -> String {
    let title = format!("{algorithm} {kind}");
    let len = title.len();
    let right = LINE_WIDTH.saturating_sub(len + 2) / 2;
    let left = if len % 2 == 1 { right + 1 } else { right };
    format!("{} {} {}", "-".repeat(left), title, "-".repeat(right))
}

/// Pull the algorithm name out of a header line, without consulting the
/// registry. `None` if the line is not shaped like a header of `kind`.
fn header_name<'a>(line: &'a str, kind: &str) -> Option<&'a str> {
    if !line.starts_with('-') || !line.ends_with('-') {
        return None;
    }
    let title = line.trim_matches('-').trim();
    let name = title.strip_suffix(kind)?.trim_end();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some(name)
}

/// Validate prefix and suffix lines; return the suite and the body lines.
fn split_armor(text: &str) -> CryptResult<(&'static dyn Cipher, Vec<&str>)> {
    let mut lines = text
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());

    let first = lines
        .next()
        .ok_or_else(|| CryptError::malformed("empty input"))?;
    let name = header_name(first, PREFIX)
        .ok_or_else(|| CryptError::malformed("missing envelope prefix"))?;
    let cipher = registry::resolve(name)?;
    if first != header_subject(cipher.name(), PREFIX) {
        return Err(CryptError::malformed(format!("invalid prefix \"{first}\"")));
    }

    let mut body: Vec<&str> = lines.collect();
    let last = body
        .pop()
        .ok_or_else(|| CryptError::malformed("missing envelope suffix"))?;
    if last != header_subject(cipher.name(), SUFFIX) {
        return Err(CryptError::malformed(format!("invalid suffix \"{last}\"")));
    }
    if body.is_empty() {
        return Err(CryptError::malformed("missing envelope payload"));
    }
    Ok((cipher, body))
}
