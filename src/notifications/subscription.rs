//! Browser push subscriptions.
//!
//! A subscription is what `PushManager.subscribe()` hands the page: the push
//! service endpoint plus the browser's P-256 ECDH public key (`p256dh`) and
//! 16-byte auth secret (`auth`). It is produced by the browser and only read
//! here.

// Rust guideline compliant 2026-10

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{AUTH_SECRET_LEN, PUBLIC_KEY_LEN};
use crate::encoding;
use crate::error::{Error, Result};
use crate::notifications::vapid::is_uncompressed_point;

/// Key material of a subscription as the browser serializes it (base64url).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// Browser's P-256 ECDH public key, uncompressed point (base64url).
    pub p256dh: String,
    /// Shared auth secret (base64url).
    pub auth: String,
}

/// Subscription JSON exactly as `PushSubscription.toJSON()` produces it.
///
/// Extra fields such as `expirationTime` are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Browser key material.
    pub keys: SubscriptionKeys,
}

/// Either a bare subscription or one wrapped as `{"subscription": {...}}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SubscriptionEnvelope {
    Wrapped { subscription: SubscriptionInfo },
    Bare(SubscriptionInfo),
}

/// A validated push subscription.
///
/// The endpoint is an absolute URL, the public key is a 65-byte uncompressed
/// point and the auth secret is 16 bytes. Whether the point is actually on
/// P-256 is checked at encryption time.
#[derive(Clone)]
pub struct Subscription {
    endpoint: Url,
    public_key: [u8; PUBLIC_KEY_LEN],
    auth: [u8; AUTH_SECRET_LEN],
}

impl Subscription {
    /// Build from already-decoded parts.
    pub fn from_parts(endpoint: &str, public_key: &[u8], auth: &[u8]) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::InvalidSubscription(format!("invalid endpoint: {e}")))?;
        if endpoint.host_str().is_none() {
            return Err(Error::InvalidSubscription(
                "endpoint must be an absolute URL with a host".to_string(),
            ));
        }

        if !is_uncompressed_point(public_key) {
            return Err(Error::InvalidSubscription(format!(
                "p256dh must be a {PUBLIC_KEY_LEN}-byte uncompressed point, got {} bytes",
                public_key.len()
            )));
        }
        let auth: [u8; AUTH_SECRET_LEN] = auth.try_into().map_err(|_| {
            Error::InvalidSubscription(format!(
                "auth secret must be {AUTH_SECRET_LEN} bytes, got {}",
                auth.len()
            ))
        })?;

        let mut key = [0u8; PUBLIC_KEY_LEN];
        key.copy_from_slice(public_key);

        Ok(Self {
            endpoint,
            public_key: key,
            auth,
        })
    }

    /// Build from the endpoint and base64url-encoded keys.
    pub fn new(endpoint: &str, p256dh: &str, auth: &str) -> Result<Self> {
        let public_key = encoding::decode(p256dh)
            .map_err(|e| Error::InvalidSubscription(format!("invalid base64url for p256dh: {e}")))?;
        let auth = encoding::decode(auth)
            .map_err(|e| Error::InvalidSubscription(format!("invalid base64url for auth: {e}")))?;
        Self::from_parts(endpoint, &public_key, &auth)
    }

    /// Parse subscription JSON, bare or wrapped in `{"subscription": ...}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let envelope: SubscriptionEnvelope = serde_json::from_str(json).map_err(|e| {
            Error::InvalidSubscription(format!("unrecognized subscription JSON: {e}"))
        })?;
        let info = match envelope {
            SubscriptionEnvelope::Wrapped { subscription } => subscription,
            SubscriptionEnvelope::Bare(info) => info,
        };
        Self::try_from(&info)
    }

    /// Push service endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Browser's uncompressed P-256 public key.
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    /// Browser's auth secret.
    pub fn auth(&self) -> &[u8; AUTH_SECRET_LEN] {
        &self.auth
    }

    /// Serializable form, re-encoding the keys as base64url.
    pub fn to_info(&self) -> SubscriptionInfo {
        SubscriptionInfo {
            endpoint: self.endpoint.to_string(),
            keys: SubscriptionKeys {
                p256dh: encoding::encode(self.public_key),
                auth: encoding::encode(self.auth),
            },
        }
    }
}

impl TryFrom<&SubscriptionInfo> for Subscription {
    type Error = Error;

    fn try_from(info: &SubscriptionInfo) -> Result<Self> {
        Self::new(&info.endpoint, &info.keys.p256dh, &info.keys.auth)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Endpoint paths are bearer capabilities; only show the push service.
        f.debug_struct("Subscription")
            .field("push_service", &self.endpoint.host_str())
            .finish_non_exhaustive()
    }
}
