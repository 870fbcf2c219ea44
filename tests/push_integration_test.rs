//! Integration tests for push delivery against a stand-in push service.
//!
//! A wiremock server plays the push service; requests go out through the
//! real reqwest transport. The browser side is played by the RFC 8291
//! example user agent key, so bodies can be decrypted and checked.

use std::time::Duration;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Nonce};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use p256::{PublicKey, SecretKey};
use regex::Regex;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use webpush::crypto::{derive_content_keys, RecordHeader};
use webpush::{
    encoding, DeliveryOptions, DeliveryOutcome, Error, PushSender, Subscription, Urgency,
    VapidKeys,
};

const UA_PRIVATE: &str = "q1dXpw3UpT5VOmu_cf_v6ih07Aems3njxI-JWgLcM94";
const UA_PUBLIC: &str =
    "BCVxsr7N_eNgVRqvHtD0zTZsEc6-VV-JvLexhqUzORcxaOzi6-AYWXvTBHm4bjyPjs7Vd8pZGH6SRpkNtoIAiw4";
const AUTH: &str = "BTBZMqHH6r4Tts7J_aSIgg";
const PUSH_PATH: &str = "/wpush/v2/gAAAAABtest";

fn subscription_for(server: &MockServer) -> Subscription {
    Subscription::new(&format!("{}{PUSH_PATH}", server.uri()), UA_PUBLIC, AUTH)
        .expect("subscription")
}

fn sender() -> PushSender {
    PushSender::with_reqwest(VapidKeys::generate().expect("keys")).expect("sender")
}

fn options() -> DeliveryOptions {
    DeliveryOptions::new("ops@example.com")
}

async fn only_request(server: &MockServer) -> Request {
    let mut requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1, "expected exactly one request");
    requests.remove(0)
}

fn header_value<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Decrypt a body the way a browser would.
fn browser_decrypt(body: &[u8]) -> Vec<u8> {
    let ua_secret =
        SecretKey::from_slice(&encoding::decode(UA_PRIVATE).expect("b64")).expect("ua key");
    let auth: [u8; 16] = encoding::decode(AUTH)
        .expect("b64")
        .try_into()
        .expect("16 bytes");
    let ua_public: [u8; 65] = encoding::decode(UA_PUBLIC)
        .expect("b64")
        .try_into()
        .expect("65 bytes");

    let (record, ciphertext) = RecordHeader::parse(body).expect("record header");
    let as_public = PublicKey::from_sec1_bytes(&record.key_id).expect("key id");
    let shared = p256::ecdh::diffie_hellman(ua_secret.to_nonzero_scalar(), as_public.as_affine());
    let keys = derive_content_keys(
        shared.raw_secret_bytes().as_slice(),
        &auth,
        &record.salt,
        &ua_public,
        &record.key_id.as_slice().try_into().expect("65 bytes"),
    )
    .expect("derive");

    let mut padded = Aes128Gcm::new_from_slice(&keys.cek)
        .expect("cek")
        .decrypt(Nonce::from_slice(&keys.nonce), ciphertext)
        .expect("authentic ciphertext");
    let delimiter = padded.iter().rposition(|&b| b != 0).expect("delimiter");
    assert_eq!(padded[delimiter], 0x02);
    padded.truncate(delimiter);
    padded
}

mod delivery_tests {
    use super::*;

    #[tokio::test]
    async fn test_encrypted_push_is_accepted_and_decryptable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PUSH_PATH))
            .and(header("Content-Encoding", "aes128gcm"))
            .and(header("Content-Type", "application/octet-stream"))
            .and(header("TTL", "30"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let delivery = sender()
            .send(
                b"When I grow up, I want to be a watermelon",
                &subscription_for(&server),
                &options(),
                &CancellationToken::new(),
            )
            .await
            .expect("send");

        assert_eq!(delivery.outcome, DeliveryOutcome::Accepted);
        assert_eq!(delivery.response.status, 201);

        let request = only_request(&server).await;
        assert_eq!(
            browser_decrypt(&request.body),
            b"When I grow up, I want to be a watermelon"
        );
    }

    #[tokio::test]
    async fn test_empty_payload_sends_no_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PUSH_PATH))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        sender()
            .send(
                b"",
                &subscription_for(&server),
                &options().with_ttl(0),
                &CancellationToken::new(),
            )
            .await
            .expect("send");

        let request = only_request(&server).await;
        assert!(request.body.is_empty());
        assert_eq!(header_value(&request, "Content-Encoding"), None);
        assert_eq!(header_value(&request, "TTL"), Some("0"));
    }

    #[tokio::test]
    async fn test_urgency_and_topic_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Urgency", "very-low"))
            .and(header("Topic", "nightly"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let delivery = sender()
            .send(
                b"build finished",
                &subscription_for(&server),
                &options().with_urgency(Urgency::VeryLow).with_topic("nightly"),
                &CancellationToken::new(),
            )
            .await
            .expect("send");
        assert!(delivery.outcome.is_success());
    }

    #[tokio::test]
    async fn test_negative_ttl_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let err = sender()
            .send(
                b"hello",
                &subscription_for(&server),
                &options().with_ttl(-1),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTtl(-1)));
    }

    #[tokio::test]
    async fn test_cancellation_reports_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(30)))
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = sender()
            .send(b"hello", &subscription_for(&server), &options(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_slow_push_service_within_sender_timeout_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(12)))
            .expect(1)
            .mount(&server)
            .await;

        let delivery = sender()
            .with_timeout(Duration::from_secs(30))
            .send(
                b"hello",
                &subscription_for(&server),
                &options(),
                &CancellationToken::new(),
            )
            .await
            .expect("send");
        assert_eq!(delivery.outcome, DeliveryOutcome::Accepted);
    }

    #[tokio::test]
    async fn test_invalid_topic_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let err = sender()
            .send(
                b"hello",
                &subscription_for(&server),
                &options().with_topic("a\nb"),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTopic(_)), "got {err:?}");
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_push_service_is_transport_error() {
        // Bind and release a port so nothing is listening on it.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .expect("free port")
            .port();
        let subscription = Subscription::new(
            &format!("http://127.0.0.1:{port}{PUSH_PATH}"),
            UA_PUBLIC,
            AUTH,
        )
        .expect("subscription");

        let err = sender()
            .send(b"hello", &subscription, &options(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}

mod classification_tests {
    use super::*;

    async fn outcome_for(response: ResponseTemplate) -> DeliveryOutcome {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(response)
            .mount(&server)
            .await;

        sender()
            .send(
                b"hello",
                &subscription_for(&server),
                &options(),
                &CancellationToken::new(),
            )
            .await
            .expect("send")
            .outcome
    }

    #[tokio::test]
    async fn test_gone_means_subscription_expired() {
        let outcome = outcome_for(ResponseTemplate::new(410)).await;
        assert_eq!(outcome, DeliveryOutcome::SubscriptionExpired);
        assert!(outcome.should_remove_subscription());
    }

    #[tokio::test]
    async fn test_not_found_means_subscription_expired() {
        assert_eq!(
            outcome_for(ResponseTemplate::new(404)).await,
            DeliveryOutcome::SubscriptionExpired
        );
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let outcome =
            outcome_for(ResponseTemplate::new(429).insert_header("Retry-After", "60")).await;
        assert_eq!(
            outcome,
            DeliveryOutcome::RateLimited {
                retry_after: Some(Duration::from_secs(60))
            }
        );
        assert!(outcome.is_retryable());
    }

    #[tokio::test]
    async fn test_payload_too_large() {
        assert_eq!(
            outcome_for(ResponseTemplate::new(413)).await,
            DeliveryOutcome::PayloadTooLarge
        );
    }

    #[tokio::test]
    async fn test_server_error_body_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
            .mount(&server)
            .await;

        let delivery = sender()
            .send(
                b"hello",
                &subscription_for(&server),
                &options(),
                &CancellationToken::new(),
            )
            .await
            .expect("send");
        assert_eq!(delivery.outcome, DeliveryOutcome::ServerError);
        assert_eq!(delivery.response.body_text(), "try later");
    }
}

mod authorization_tests {
    use super::*;

    #[tokio::test]
    async fn test_authorization_header_verifies_with_independent_jwt_library() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let keys = VapidKeys::generate().expect("keys");
        let public = keys.public_key_bytes().to_vec();
        let sender = PushSender::with_reqwest(keys).expect("sender");
        sender
            .send(
                b"",
                &subscription_for(&server),
                &options(),
                &CancellationToken::new(),
            )
            .await
            .expect("send");

        let request = only_request(&server).await;
        let authorization = header_value(&request, "Authorization").expect("authorization");

        let shape = Regex::new(
            r"^vapid t=[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+, k=[A-Za-z0-9_-]{86,87}$",
        )
        .expect("regex");
        assert!(shape.is_match(authorization), "{authorization}");

        let token = authorization
            .strip_prefix("vapid t=")
            .and_then(|rest| rest.split(", k=").next())
            .expect("token");
        let key = DecodingKey::from_ec_components(
            &encoding::encode(&public[1..33]),
            &encoding::encode(&public[33..65]),
        )
        .expect("decoding key");
        let mut validation = Validation::new(Algorithm::ES256);
        validation.set_audience(&[server.uri()]);

        let claims = jsonwebtoken::decode::<serde_json::Value>(token, &key, &validation)
            .expect("valid ES256 token")
            .claims;
        assert_eq!(claims["sub"], "mailto:ops@example.com");
    }
}
