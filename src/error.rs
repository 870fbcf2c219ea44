//! Error taxonomy for the web push core.
//!
//! Every fallible operation in the library returns [`Result`]. Nothing is
//! retried internally: each variant is surfaced unchanged so the caller can
//! decide between fixing input, deleting a subscription, or backing off.
//!
//! Non-2xx push service responses are *not* errors; they are classified into
//! [`DeliveryOutcome`](crate::notifications::push::DeliveryOutcome) and
//! returned alongside the raw response.

// Rust guideline compliant 2026-10

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All failures the web push core can report.
#[derive(Debug, Error)]
pub enum Error {
    // Key store
    /// Raw private scalar was not exactly 32 bytes.
    #[error("invalid VAPID private key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// Key material decoded but is not a usable P-256 key (bad base64,
    /// scalar out of range, or a public key that does not match the scalar).
    #[error("invalid VAPID key encoding: {0}")]
    InvalidKeyEncoding(String),

    /// PKCS#8 container holds something other than an EC key on P-256.
    #[error("unsupported private key type: {0}")]
    UnsupportedKeyType(String),

    /// Input is not a PEM `PRIVATE KEY` block.
    #[error("malformed PEM: {0}")]
    MalformedPem(String),

    /// PEM decoded but the DER body is not valid PKCS#8.
    #[error("malformed DER: {0}")]
    MalformedDer(String),

    /// VAPID key JSON could not be parsed.
    #[error("malformed VAPID key JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    // Authorization
    /// Push endpoint is not an absolute URL with a host.
    #[error("invalid push endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// The endpoint as supplied by the caller.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// ECDSA signing of the VAPID token failed.
    #[error("failed to sign VAPID token: {0}")]
    SigningFailure(String),

    /// JWT header or claims could not be encoded.
    #[error("failed to encode VAPID claims: {0}")]
    Serialization(#[source] serde_json::Error),

    // Subscription
    /// Client-supplied subscription JSON is unusable.
    #[error("invalid push subscription: {0}")]
    InvalidSubscription(String),

    // Encryption
    /// Subscription public key is not a point on P-256.
    #[error("subscription public key is not a valid P-256 point")]
    InvalidSubscriptionKey,

    /// Plaintext does not fit into a single aes128gcm record.
    #[error("payload of {len} bytes exceeds the {max}-byte single-record limit")]
    PayloadTooLarge {
        /// Plaintext length supplied.
        len: usize,
        /// Largest plaintext that fits.
        max: usize,
    },

    /// AEAD sealing failed.
    #[error("content encryption failed")]
    Encryption,

    /// The secure random source failed. Fatal, never retried.
    #[error("entropy source failure: {0}")]
    Entropy(String),

    // Validation
    /// TTL must be zero or positive.
    #[error("invalid TTL {0}: must be >= 0")]
    InvalidTtl(i64),

    /// Topic must be 1 to 32 characters of the URL-safe base64 alphabet.
    #[error("invalid topic {0:?}: expected 1-32 characters from [A-Za-z0-9_-]")]
    InvalidTopic(String),

    // Transport
    /// The HTTP call itself failed (network error, timeout, cancellation).
    #[error("push transport failure: {0}")]
    Transport(String),
}

impl Error {
    /// Whether the caller may reasonably retry the same request later.
    ///
    /// Only transport failures qualify; every other variant needs the input
    /// fixed first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
