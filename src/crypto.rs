//! Web push message encryption (RFC 8291 over the RFC 8188 `aes128gcm`
//! content encoding).
//!
//! Turns a plaintext and a browser subscription into a single self-describing
//! encrypted record. A fresh ephemeral P-256 key and salt are drawn per
//! message; keys are derived with a two-stage HKDF ladder and the padded
//! plaintext is sealed with AES-128-GCM.
//!
//! # Wire Format
//!
//! ```text
//! +-----------+--------+------------+-------------------+----------------------+
//! | salt (16) | rs (4) | idlen (1)  | keyid (65)        | ciphertext + tag     |
//! |           | u32 BE | = 65       | ephemeral pubkey  | (padded plaintext)   |
//! +-----------+--------+------------+-------------------+----------------------+
//! ```
//!
//! Only one record is ever produced, so the padding delimiter is always
//! `0x02` (last record).

// Rust guideline compliant 2026-10

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Nonce,
};
use hkdf::Hkdf;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::constants::{
    AUTH_SECRET_LEN, CEK_INFO, CEK_LEN, HEADER_LEN, IKM_LEN, MAX_PLAINTEXT_LEN, NONCE_INFO,
    NONCE_LEN, PADDING_DELIMITER, PUBLIC_KEY_LEN, RECORD_SIZE, SALT_LEN, TAG_LEN, WEBPUSH_INFO,
};
use crate::error::{Error, Result};
use crate::notifications::subscription::Subscription;
use crate::rng::{self, EntropySource};

/// How much zero padding follows the delimiter.
///
/// The wire format only mandates the `0x02` delimiter; the amount of padding
/// is a sender choice. `Full` hides the plaintext length from the push
/// service at the cost of always sending a 4096-byte body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Padding {
    /// Delimiter only: padded length is `plaintext.len() + 1`.
    #[default]
    Minimal,
    /// Pad every message to the maximum single-record size.
    Full,
}

impl Padding {
    fn padded_len(self, plaintext_len: usize) -> usize {
        match self {
            Self::Minimal => plaintext_len + 1,
            Self::Full => MAX_PLAINTEXT_LEN + 1,
        }
    }
}

/// Content-encryption key and nonce for one record.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ContentKeys {
    /// AES-128-GCM key.
    pub cek: [u8; CEK_LEN],
    /// AES-GCM nonce (single record, so no sequence XOR is applied).
    pub nonce: [u8; NONCE_LEN],
}

impl std::fmt::Debug for ContentKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ContentKeys { .. }")
    }
}

/// Derive the record key and nonce from the ECDH result.
///
/// ```text
/// IKM'  = HKDF(salt = auth, ikm = ecdh_secret,
///              info = "WebPush: info" || 0x00 || ua_public || as_public, L = 32)
/// PRK   = HKDF-Extract(salt, IKM')
/// CEK   = HKDF-Expand(PRK, "Content-Encoding: aes128gcm" || 0x00, 16)
/// NONCE = HKDF-Expand(PRK, "Content-Encoding: nonce" || 0x00, 12)
/// ```
pub fn derive_content_keys(
    ecdh_secret: &[u8],
    auth_secret: &[u8; AUTH_SECRET_LEN],
    salt: &[u8; SALT_LEN],
    ua_public: &[u8; PUBLIC_KEY_LEN],
    as_public: &[u8; PUBLIC_KEY_LEN],
) -> Result<ContentKeys> {
    let mut key_info = Vec::with_capacity(WEBPUSH_INFO.len() + 2 * PUBLIC_KEY_LEN);
    key_info.extend_from_slice(WEBPUSH_INFO);
    key_info.extend_from_slice(ua_public);
    key_info.extend_from_slice(as_public);

    let mut ikm = Zeroizing::new([0u8; IKM_LEN]);
    Hkdf::<Sha256>::new(Some(auth_secret.as_slice()), ecdh_secret)
        .expand(&key_info, ikm.as_mut_slice())
        .map_err(|_| Error::Encryption)?;

    let prk = Hkdf::<Sha256>::new(Some(salt.as_slice()), ikm.as_slice());
    let mut keys = ContentKeys {
        cek: [0u8; CEK_LEN],
        nonce: [0u8; NONCE_LEN],
    };
    prk.expand(CEK_INFO, &mut keys.cek)
        .map_err(|_| Error::Encryption)?;
    prk.expand(NONCE_INFO, &mut keys.nonce)
        .map_err(|_| Error::Encryption)?;
    Ok(keys)
}

/// Encrypt `plaintext` for `subscription`, drawing the ephemeral key and
/// salt from `rng`.
///
/// Returns the complete request body. Fails with
/// [`Error::PayloadTooLarge`] before consuming any randomness when the
/// plaintext cannot fit in one record, and with
/// [`Error::InvalidSubscriptionKey`] when the browser key is not on P-256.
pub fn encrypt(
    plaintext: &[u8],
    subscription: &Subscription,
    padding: Padding,
    rng: &dyn EntropySource,
) -> Result<Vec<u8>> {
    if plaintext.len() > MAX_PLAINTEXT_LEN {
        return Err(Error::PayloadTooLarge {
            len: plaintext.len(),
            max: MAX_PLAINTEXT_LEN,
        });
    }

    let ua_public = PublicKey::from_sec1_bytes(subscription.public_key())
        .map_err(|_| Error::InvalidSubscriptionKey)?;

    let as_secret = rng::random_secret_key(rng)?;
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)?;

    seal(
        plaintext,
        &ua_public,
        subscription.auth(),
        &as_secret,
        &salt,
        padding,
    )
}

/// Deterministic core of [`encrypt`]: every random input is a parameter.
fn seal(
    plaintext: &[u8],
    ua_public: &PublicKey,
    auth_secret: &[u8; AUTH_SECRET_LEN],
    as_secret: &SecretKey,
    salt: &[u8; SALT_LEN],
    padding: Padding,
) -> Result<Vec<u8>> {
    let shared = p256::ecdh::diffie_hellman(as_secret.to_nonzero_scalar(), ua_public.as_affine());

    let as_public = encoded_point(&as_secret.public_key())?;
    let ua_public = encoded_point(ua_public)?;
    let keys = derive_content_keys(
        shared.raw_secret_bytes().as_slice(),
        auth_secret,
        salt,
        &ua_public,
        &as_public,
    )?;

    let mut padded = Zeroizing::new(Vec::with_capacity(padding.padded_len(plaintext.len())));
    padded.extend_from_slice(plaintext);
    padded.push(PADDING_DELIMITER);
    padded.resize(padding.padded_len(plaintext.len()), 0);

    let cipher = Aes128Gcm::new_from_slice(&keys.cek).map_err(|_| Error::Encryption)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&keys.nonce), padded.as_slice())
        .map_err(|_| Error::Encryption)?;

    let mut body = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    body.extend_from_slice(salt);
    body.extend_from_slice(&RECORD_SIZE.to_be_bytes());
    body.push(PUBLIC_KEY_LEN as u8);
    body.extend_from_slice(&as_public);
    body.extend_from_slice(&ciphertext);

    log::trace!(
        "[WebPush] Sealed {} plaintext bytes into {}-byte record",
        plaintext.len(),
        body.len()
    );
    Ok(body)
}

fn encoded_point(key: &PublicKey) -> Result<[u8; PUBLIC_KEY_LEN]> {
    key.to_encoded_point(false)
        .as_bytes()
        .try_into()
        .map_err(|_| Error::Encryption)
}

/// Parsed `aes128gcm` header of an encoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    /// Per-message salt.
    pub salt: [u8; SALT_LEN],
    /// Record size field.
    pub record_size: u32,
    /// Key id (the sender's ephemeral public key).
    pub key_id: Vec<u8>,
}

impl RecordHeader {
    /// Parse the header at the start of `body`, returning it with the
    /// remaining ciphertext.
    pub fn parse(body: &[u8]) -> Option<(Self, &[u8])> {
        let salt: [u8; SALT_LEN] = body.get(..SALT_LEN)?.try_into().ok()?;
        let rs_bytes: [u8; 4] = body.get(SALT_LEN..SALT_LEN + 4)?.try_into().ok()?;
        let id_len = usize::from(*body.get(SALT_LEN + 4)?);
        let key_start = SALT_LEN + 5;
        let key_id = body.get(key_start..key_start + id_len)?.to_vec();
        let rest = &body[key_start + id_len..];
        Some((
            Self {
                salt,
                record_size: u32::from_be_bytes(rs_bytes),
                key_id,
            },
            rest,
        ))
    }
}

/// Smallest body [`encrypt`] can produce for an empty plaintext.
pub const MIN_BODY_LEN: usize = HEADER_LEN + 1 + TAG_LEN;
