//! Web push message delivery (RFC 8030).
//!
//! [`PushSender`] turns a plaintext and a [`Subscription`] into one POST to
//! the push service: encrypted body (RFC 8291), VAPID `Authorization`
//! (RFC 8292) and the `TTL` / `Urgency` / `Topic` delivery headers. The
//! response is classified into a [`DeliveryOutcome`] and handed back as-is;
//! nothing is retried here.

// Rust guideline compliant 2026-10

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::constants::{
    CONTENT_ENCODING, CONTENT_TYPE, DEFAULT_TTL, HTTP_REQUEST_TIMEOUT, MAX_TOPIC_LEN,
    VAPID_DEFAULT_LIFETIME_SECS, VAPID_MAX_LIFETIME_SECS,
};
use crate::crypto::{self, Padding};
use crate::error::{Error, Result};
use crate::notifications::authorization;
use crate::notifications::subscription::Subscription;
use crate::notifications::transport::{PushRequest, PushResponse, PushTransport, ReqwestTransport};
use crate::notifications::vapid::VapidKeys;
use crate::rng::{EntropySource, OsEntropy};

/// Delivery priority hint for the push service (RFC 8030 §5.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    /// Deliver only on power and Wi-Fi.
    VeryLow,
    /// Deliver on power or Wi-Fi.
    Low,
    /// Deliver unless the device is in low-power mode.
    Normal,
    /// Deliver immediately.
    High,
}

impl Urgency {
    /// Header value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very-low",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "very-low" => Ok(Self::VeryLow),
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            other => Err(format!(
                "unknown urgency '{other}' (expected very-low, low, normal or high)"
            )),
        }
    }
}

/// Per-message delivery parameters.
#[derive(Debug, Clone)]
pub struct DeliveryOptions {
    /// Contact for the push service operator (`mailto:` added if missing).
    pub subscriber: String,
    /// Seconds the push service should hold an undelivered message.
    pub ttl: i64,
    /// Optional `Urgency` header.
    pub urgency: Option<Urgency>,
    /// Optional `Topic` header; a newer message with the same topic replaces
    /// a pending one.
    pub topic: Option<String>,
    /// VAPID token expiration. Defaults to now + 12 hours and is never
    /// allowed past now + 24 hours.
    pub expiration: Option<DateTime<Utc>>,
    /// Padding policy for the encrypted record.
    pub padding: Padding,
}

impl DeliveryOptions {
    /// Options with the given subscriber and defaults for everything else.
    pub fn new(subscriber: impl Into<String>) -> Self {
        Self {
            subscriber: subscriber.into(),
            ttl: DEFAULT_TTL,
            urgency: None,
            topic: None,
            expiration: None,
            padding: Padding::default(),
        }
    }

    /// Set the TTL in seconds.
    #[must_use]
    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the `Urgency` header.
    #[must_use]
    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    /// Set the `Topic` header.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the VAPID token expiration.
    #[must_use]
    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Set the padding policy.
    #[must_use]
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }
}

/// What the push service's answer means for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 2xx: the push service took the message.
    Accepted,
    /// 404 or 410: the subscription is gone and should be dropped.
    SubscriptionExpired,
    /// 413: the push service refused the body size.
    PayloadTooLarge,
    /// 429: slow down, optionally for `retry_after`.
    RateLimited {
        /// Parsed `Retry-After`, when present and understood.
        retry_after: Option<Duration>,
    },
    /// Any other 4xx.
    ClientError,
    /// 5xx or an unexpected status.
    ServerError,
}

impl DeliveryOutcome {
    /// Classify a push service response.
    pub fn classify(response: &PushResponse) -> Self {
        match response.status {
            200..=299 => Self::Accepted,
            404 | 410 => Self::SubscriptionExpired,
            413 => Self::PayloadTooLarge,
            429 => Self::RateLimited {
                retry_after: response.header("Retry-After").and_then(parse_retry_after),
            },
            400..=499 => Self::ClientError,
            _ => Self::ServerError,
        }
    }

    /// Whether the message was accepted.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Whether the caller should delete the subscription.
    pub fn should_remove_subscription(self) -> bool {
        matches!(self, Self::SubscriptionExpired)
    }

    /// Whether sending the same message later may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::ServerError)
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => f.write_str("accepted"),
            Self::SubscriptionExpired => f.write_str("subscription expired"),
            Self::PayloadTooLarge => f.write_str("payload too large"),
            Self::RateLimited {
                retry_after: Some(after),
            } => write!(f, "rate limited (retry after {}s)", after.as_secs()),
            Self::RateLimited { retry_after: None } => f.write_str("rate limited"),
            Self::ClientError => f.write_str("rejected by push service"),
            Self::ServerError => f.write_str("push service error"),
        }
    }
}

/// `Retry-After` as delta-seconds or an HTTP date.
fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?;
    Some(
        (at.with_timezone(&Utc) - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO),
    )
}

/// `Topic` must fit RFC 8030: up to 32 URL-safe base64 characters.
fn validate_topic(topic: &str) -> Result<()> {
    let valid = !topic.is_empty()
        && topic.len() <= MAX_TOPIC_LEN
        && topic
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidTopic(topic.to_string()))
    }
}

/// Result of one send: the classification plus the raw response.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Classified status.
    pub outcome: DeliveryOutcome,
    /// Response exactly as the push service returned it.
    pub response: PushResponse,
}

/// Sends web push messages with one VAPID identity.
///
/// Cheap to share: keys are read-only and every send draws its own ephemeral
/// key and salt, so concurrent sends need no locking.
pub struct PushSender<T = ReqwestTransport> {
    keys: VapidKeys,
    transport: T,
    rng: Arc<dyn EntropySource>,
    timeout: Option<Duration>,
}

impl PushSender<ReqwestTransport> {
    /// Sender over a default reqwest transport with a 10 second deadline.
    ///
    /// [`with_timeout`](Self::with_timeout) replaces the deadline.
    pub fn with_reqwest(keys: VapidKeys) -> Result<Self> {
        Ok(Self::new(keys, ReqwestTransport::new()?).with_timeout(HTTP_REQUEST_TIMEOUT))
    }
}

impl<T: PushTransport> PushSender<T> {
    /// Sender over `transport` using OS entropy and no extra deadline.
    pub fn new(keys: VapidKeys, transport: T) -> Self {
        Self {
            keys,
            transport,
            rng: Arc::new(OsEntropy),
            timeout: None,
        }
    }

    /// Replace the entropy source.
    #[must_use]
    pub fn with_entropy(mut self, rng: Arc<dyn EntropySource>) -> Self {
        self.rng = rng;
        self
    }

    /// Abort the transport call after `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// VAPID identity used for every send.
    pub fn keys(&self) -> &VapidKeys {
        &self.keys
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Assemble the request for `plaintext` without sending it.
    pub fn build_request(
        &self,
        plaintext: &[u8],
        subscription: &Subscription,
        options: &DeliveryOptions,
    ) -> Result<PushRequest> {
        if options.ttl < 0 {
            return Err(Error::InvalidTtl(options.ttl));
        }
        if let Some(topic) = &options.topic {
            validate_topic(topic)?;
        }

        let mut headers = Vec::with_capacity(6);

        // An empty plaintext is sent bodiless as a wake-up signal.
        let body = if plaintext.is_empty() {
            None
        } else {
            let body =
                crypto::encrypt(plaintext, subscription, options.padding, self.rng.as_ref())?;
            headers.push(("Content-Encoding", CONTENT_ENCODING.to_string()));
            headers.push(("Content-Type", CONTENT_TYPE.to_string()));
            Some(body)
        };

        let now = Utc::now();
        let latest = now + chrono::Duration::seconds(VAPID_MAX_LIFETIME_SECS);
        let expiration = options
            .expiration
            .unwrap_or_else(|| now + chrono::Duration::seconds(VAPID_DEFAULT_LIFETIME_SECS))
            .min(latest);
        let authorization = authorization::authorization_header(
            subscription.endpoint().as_str(),
            &options.subscriber,
            Some(expiration),
            &self.keys,
        )?;
        headers.push(("Authorization", authorization));

        headers.push(("TTL", options.ttl.to_string()));
        if let Some(urgency) = options.urgency {
            headers.push(("Urgency", urgency.as_str().to_string()));
        }
        if let Some(topic) = &options.topic {
            headers.push(("Topic", topic.clone()));
        }

        Ok(PushRequest {
            endpoint: subscription.endpoint().clone(),
            headers,
            body,
        })
    }

    /// Encrypt and deliver `plaintext` to `subscription`.
    ///
    /// Validation, encryption and signing happen before any I/O. The
    /// transport call is the only suspension point and is abandoned when
    /// `cancel` fires or the sender's timeout elapses, both reported as
    /// [`Error::Transport`]. Any HTTP response, whatever its status, is a
    /// successful [`Delivery`].
    pub async fn send(
        &self,
        plaintext: &[u8],
        subscription: &Subscription,
        options: &DeliveryOptions,
        cancel: &CancellationToken,
    ) -> Result<Delivery> {
        let request = self.build_request(plaintext, subscription, options)?;
        let host = subscription.endpoint().host_str().unwrap_or_default().to_string();
        log::debug!(
            "[WebPush] Sending {} byte body to {host}",
            request.body.as_ref().map_or(0, Vec::len)
        );

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                log::debug!("[WebPush] Send to {host} cancelled");
                return Err(Error::Transport("send cancelled".to_string()));
            }
            result = self.deliver(request) => result?,
        };

        let outcome = DeliveryOutcome::classify(&response);
        match outcome {
            DeliveryOutcome::Accepted => {
                log::debug!("[WebPush] Accepted by {host} ({})", response.status);
            }
            DeliveryOutcome::SubscriptionExpired => {
                log::info!("[WebPush] Subscription expired ({} from {host})", response.status);
            }
            DeliveryOutcome::RateLimited { .. } => {
                log::warn!("[WebPush] Rate limited by {host} (429)");
            }
            _ => {
                log::warn!(
                    "[WebPush] Push to {host} failed (HTTP {}): {}",
                    response.status,
                    response.body_text()
                );
            }
        }

        Ok(Delivery { outcome, response })
    }

    async fn deliver(&self, request: PushRequest) -> Result<PushResponse> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.send(request))
                .await
                .map_err(|_elapsed| {
                    Error::Transport(format!("push request timed out after {limit:?}"))
                })?,
            None => self.transport.send(request).await,
        }
    }
}

impl<T> fmt::Debug for PushSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushSender")
            .field("keys", &self.keys)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
