//! VAPID `Authorization` header construction (RFC 8292).
//!
//! The header proves the sender's identity to the push service with a
//! self-signed ES256 JWT scoped to the push service origin:
//!
//! ```text
//! vapid t=<header>.<claims>.<signature>, k=<base64url public key>
//! ```

// Rust guideline compliant 2026-10

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::constants::VAPID_DEFAULT_LIFETIME_SECS;
use crate::encoding;
use crate::error::{Error, Result};
use crate::notifications::vapid::VapidKeys;

#[derive(Serialize)]
struct JwtHeader {
    typ: &'static str,
    alg: &'static str,
}

const ES256_HEADER: JwtHeader = JwtHeader {
    typ: "JWT",
    alg: "ES256",
};

#[derive(Serialize)]
struct VapidClaims<'a> {
    aud: &'a str,
    exp: i64,
    sub: &'a str,
}

/// Push service origin (`scheme://host[:port]`) used as the JWT audience.
///
/// Path and query identify the subscription, not the service, so they are
/// dropped. Explicit non-default ports are kept because they are part of the
/// origin.
pub fn audience(endpoint: &str) -> Result<String> {
    let invalid = |reason: String| Error::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("endpoint has no host".to_string()))?;

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Normalize a subscriber contact to a `mailto:` or `https:` URI.
///
/// Anything that is not already one of those is treated as a bare e-mail
/// address.
pub fn normalize_subscriber(subscriber: &str) -> String {
    if subscriber.starts_with("https:") || subscriber.starts_with("mailto:") {
        subscriber.to_string()
    } else {
        format!("mailto:{subscriber}")
    }
}

/// Build the `Authorization` header value for a push to `endpoint`.
///
/// `expiration` defaults to now + 12 hours. It is not clamped here; push
/// services reject tokens valid for more than 24 hours, and
/// [`PushSender`](crate::notifications::push::PushSender) bounds it before
/// calling this.
pub fn authorization_header(
    endpoint: &str,
    subscriber: &str,
    expiration: Option<DateTime<Utc>>,
    keys: &VapidKeys,
) -> Result<String> {
    let token = sign_token(endpoint, subscriber, expiration, keys)?;
    Ok(format!(
        "vapid t={}, k={}",
        token,
        keys.public_key_base64url()
    ))
}

/// Sign the compact JWS for `endpoint`.
pub fn sign_token(
    endpoint: &str,
    subscriber: &str,
    expiration: Option<DateTime<Utc>>,
    keys: &VapidKeys,
) -> Result<String> {
    let aud = audience(endpoint)?;
    let sub = normalize_subscriber(subscriber);
    let exp = expiration
        .unwrap_or_else(|| {
            Utc::now() + chrono::Duration::seconds(VAPID_DEFAULT_LIFETIME_SECS)
        })
        .timestamp();

    let header = serde_json::to_vec(&ES256_HEADER).map_err(Error::Serialization)?;
    let claims = serde_json::to_vec(&VapidClaims {
        aud: &aud,
        exp,
        sub: &sub,
    })
    .map_err(Error::Serialization)?;

    let signing_input = format!("{}.{}", encoding::encode(header), encoding::encode(claims));
    let signature = keys.sign(signing_input.as_bytes())?;

    log::debug!("[WebPush] Signed VAPID token for {aud} (exp {exp})");
    Ok(format!("{}.{}", signing_input, encoding::encode(signature)))
}
