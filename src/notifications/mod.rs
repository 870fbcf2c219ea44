//! Web push notification delivery.
//!
//! Sends end-to-end encrypted messages to browsers through their push
//! service, authenticated with a VAPID identity.
//!
//! # Architecture
//!
//! ```text
//! Application plaintext
//!     ↓
//! crypto::encrypt (RFC 8291, aes128gcm)  ← subscription keys
//!     ↓
//! authorization::authorization_header   ← VAPID keys (RFC 8292)
//!     ↓
//! PushTransport POST to push service (RFC 8030)
//!     ↓
//! DeliveryOutcome (accepted / expired / rate limited / ...)
//! ```
//!
//! # VAPID Keys
//!
//! The application server owns one P-256 keypair. The public half is handed
//! to browsers as `applicationServerKey` when they subscribe; the private
//! half signs a short-lived JWT on every push. See [`vapid`].
//!
//! # Push Subscriptions
//!
//! Browsers hand back an endpoint URL plus an ECDH public key and auth
//! secret. Those are opaque inputs here; storing them is up to the caller,
//! who should drop a subscription once a send reports
//! [`DeliveryOutcome::SubscriptionExpired`](push::DeliveryOutcome::SubscriptionExpired).

pub mod authorization;
pub mod push;
pub mod subscription;
pub mod transport;
pub mod vapid;
