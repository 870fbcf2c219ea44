//! webpush - end-to-end encrypted Web Push for application servers.
//!
//! This crate sends push messages to browsers through their push service
//! (RFC 8030), encrypting payloads with the `aes128gcm` content coding
//! (RFC 8291) and authenticating with a VAPID identity (RFC 8292).
//!
//! # Architecture
//!
//! - **Key Store** - VAPID keypair import/export (JSON, PKCS#8 PEM/DER)
//! - **Authorization** - ES256 JWT and `Authorization: vapid ...` header
//! - **Encryptor** - ECDH + HKDF key ladder + AES-128-GCM single record
//! - **Sender** - assembles and delivers the request, classifies the reply
//!
//! # Modules
//!
//! - [`notifications`] - keys, subscriptions, authorization and delivery
//! - [`crypto`] - message encryption
//! - [`config`] - configuration loading/saving
//! - [`persistence`] - key files
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> webpush::Result<()> {
//! use tokio_util::sync::CancellationToken;
//! use webpush::{DeliveryOptions, PushSender, Subscription, VapidKeys};
//!
//! let keys = VapidKeys::generate()?;
//! let subscription = Subscription::from_json(r#"{"endpoint":"...","keys":{"p256dh":"...","auth":"..."}}"#)?;
//! let sender = PushSender::with_reqwest(keys)?;
//! let delivery = sender
//!     .send(b"hello", &subscription, &DeliveryOptions::new("ops@example.com"), &CancellationToken::new())
//!     .await?;
//! if delivery.outcome.should_remove_subscription() {
//!     // forget the subscription
//! }
//! # Ok(())
//! # }
//! ```

// Library modules
pub mod config;
pub mod constants;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod notifications;
pub mod persistence;
pub mod rng;

// Re-export commonly used types
pub use config::PushConfig;
pub use crypto::Padding;
pub use error::{Error, Result};
pub use notifications::push::{Delivery, DeliveryOptions, DeliveryOutcome, PushSender, Urgency};
pub use notifications::subscription::{Subscription, SubscriptionInfo};
pub use notifications::transport::{PushRequest, PushResponse, PushTransport, ReqwestTransport};
pub use notifications::vapid::VapidKeys;
pub use rng::{EntropySource, OsEntropy};
