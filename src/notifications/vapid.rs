//! VAPID key store for Web Push (RFC 8292).
//!
//! Owns a P-256 ECDSA signing key and the cached uncompressed public point
//! that browsers receive as `applicationServerKey`. Keys can be generated,
//! imported from the raw 32-byte scalar (web-push style JSON) or from a
//! PKCS#8 container (DER or PEM), and exported back to both forms.
//!
//! # JSON form
//!
//! ```json
//! {"publicKey": "<base64url, 65 bytes>", "privateKey": "<base64url, 32 bytes>"}
//! ```
//!
//! `publicKey` is optional on import. When present it must match the point
//! recomputed from `privateKey`.

// Rust guideline compliant 2026-10

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::elliptic_curve::subtle::ConstantTimeEq;
use p256::pkcs8::{AssociatedOid, EncodePrivateKey, LineEnding, PrivateKeyInfo, SecretDocument};
use p256::{EncodedPoint, NistP256, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::constants::{PRIVATE_KEY_LEN, PUBLIC_KEY_LEN, UNCOMPRESSED_POINT_TAG};
use crate::encoding;
use crate::error::{Error, Result};
use crate::rng::{self, EntropySource, OsEntropy};

/// PEM label of a PKCS#8 `PrivateKeyInfo`.
const PKCS8_PEM_LABEL: &str = "PRIVATE KEY";

/// VAPID keypair for web push authentication.
///
/// Immutable once constructed. The public key encoding is computed once at
/// construction because every authorization header and export reads it.
#[derive(Clone)]
pub struct VapidKeys {
    signing_key: SigningKey,
    /// Uncompressed SEC1 public point (65 bytes: 0x04 || x || y).
    public_point: EncodedPoint,
    /// `public_point` as unpadded base64url.
    public_key_b64: String,
}

/// Serialized web-push style JSON form.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VapidKeysJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_key: Option<String>,
    private_key: String,
}

impl VapidKeys {
    /// Generate a fresh VAPID keypair from the OS CSPRNG.
    pub fn generate() -> Result<Self> {
        Self::generate_with(&OsEntropy)
    }

    /// Generate a fresh VAPID keypair from the given entropy source.
    pub fn generate_with(rng: &dyn EntropySource) -> Result<Self> {
        let secret = rng::random_secret_key(rng)?;
        Ok(Self::from_secret_key(secret))
    }

    fn from_secret_key(secret: SecretKey) -> Self {
        let signing_key = SigningKey::from(secret);
        let public_point = signing_key.verifying_key().to_encoded_point(false);
        let public_key_b64 = encoding::encode(public_point.as_bytes());
        Self {
            signing_key,
            public_point,
            public_key_b64,
        }
    }

    /// Import from the raw 32-byte big-endian private scalar.
    pub fn from_private_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(Error::InvalidKeyLength(bytes.len()));
        }
        let secret = SecretKey::from_slice(bytes).map_err(|e| {
            Error::InvalidKeyEncoding(format!("private key is not a valid P-256 scalar: {e}"))
        })?;
        Ok(Self::from_secret_key(secret))
    }

    /// Import from base64url strings, cross-checking the public key if given.
    pub fn from_base64url(public_key_b64: Option<&str>, private_key_b64: &str) -> Result<Self> {
        let private_bytes = Zeroizing::new(encoding::decode(private_key_b64).map_err(|e| {
            Error::InvalidKeyEncoding(format!("invalid base64url for private key: {e}"))
        })?);
        let keys = Self::from_private_bytes(&private_bytes)?;

        if let Some(claimed) = public_key_b64.filter(|s| !s.is_empty()) {
            let claimed = encoding::decode(claimed).map_err(|e| {
                Error::InvalidKeyEncoding(format!("invalid base64url for public key: {e}"))
            })?;
            if claimed.as_slice() != keys.public_key_bytes() {
                return Err(Error::InvalidKeyEncoding(
                    "publicKey does not match privateKey".to_string(),
                ));
            }
        }

        Ok(keys)
    }

    /// Import from web-push style JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: VapidKeysJson = serde_json::from_str(json).map_err(Error::MalformedJson)?;
        Self::try_from(parsed)
    }

    /// Export as web-push style JSON. Deterministic for a given key.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.to_json_form()).map_err(Error::Serialization)
    }

    fn to_json_form(&self) -> VapidKeysJson {
        VapidKeysJson {
            public_key: Some(self.public_key_b64.clone()),
            private_key: self.private_key_base64url().to_string(),
        }
    }

    /// Import from PKCS#8 DER.
    ///
    /// Only id-ecPublicKey keys on the P-256 named curve are accepted.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = PrivateKeyInfo::try_from(der).map_err(|e| Error::MalformedDer(e.to_string()))?;

        if info.algorithm.oid != p256::elliptic_curve::ALGORITHM_OID {
            return Err(Error::UnsupportedKeyType(format!(
                "algorithm {} is not an elliptic-curve key",
                info.algorithm.oid
            )));
        }
        let curve = info
            .algorithm
            .parameters_oid()
            .map_err(|e| Error::UnsupportedKeyType(format!("missing named curve: {e}")))?;
        if curve != NistP256::OID {
            return Err(Error::UnsupportedKeyType(format!(
                "curve {curve} is not P-256"
            )));
        }

        let secret = SecretKey::try_from(info).map_err(|e| Error::MalformedDer(e.to_string()))?;
        Ok(Self::from_secret_key(secret))
    }

    /// Import from a PEM `PRIVATE KEY` block (PKCS#8).
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self> {
        let (label, document) =
            SecretDocument::from_pem(pem).map_err(|e| Error::MalformedPem(e.to_string()))?;
        if label != PKCS8_PEM_LABEL {
            return Err(Error::MalformedPem(format!(
                "expected \"{PKCS8_PEM_LABEL}\" block, found \"{label}\""
            )));
        }
        Self::from_pkcs8_der(document.as_bytes())
    }

    /// Export the PKCS#8 DER encoding of the private key.
    pub fn to_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let document = self
            .secret_key()
            .to_pkcs8_der()
            .map_err(|e| Error::MalformedDer(e.to_string()))?;
        Ok(Zeroizing::new(document.as_bytes().to_vec()))
    }

    /// Export as a PEM `PRIVATE KEY` block wrapping the PKCS#8 DER.
    pub fn to_pkcs8_pem(&self) -> Result<Zeroizing<String>> {
        self.secret_key()
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| Error::MalformedPem(e.to_string()))
    }

    fn secret_key(&self) -> SecretKey {
        SecretKey::from(self.signing_key.clone())
    }

    /// Base64url-encoded uncompressed public key (65 bytes decoded).
    ///
    /// This is the `applicationServerKey` browsers subscribe with and the
    /// `k=` parameter of the authorization header.
    pub fn public_key_base64url(&self) -> &str {
        &self.public_key_b64
    }

    /// Uncompressed public key bytes (65 bytes).
    pub fn public_key_bytes(&self) -> &[u8] {
        self.public_point.as_bytes()
    }

    /// Base64url-encoded raw 32-byte private scalar.
    pub fn private_key_base64url(&self) -> Zeroizing<String> {
        Zeroizing::new(encoding::encode(self.signing_key.to_bytes()))
    }

    /// ES256 signature over `message`, as the 64-byte `r || s` encoding JWS uses.
    pub(crate) fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signature: Signature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| Error::SigningFailure(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }
}

impl TryFrom<VapidKeysJson> for VapidKeys {
    type Error = Error;

    fn try_from(json: VapidKeysJson) -> Result<Self> {
        let private = Zeroizing::new(json.private_key);
        Self::from_base64url(json.public_key.as_deref(), &private)
    }
}

impl PartialEq for VapidKeys {
    fn eq(&self, other: &Self) -> bool {
        self.signing_key
            .to_bytes()
            .as_slice()
            .ct_eq(other.signing_key.to_bytes().as_slice())
            .into()
    }
}

impl Eq for VapidKeys {}

impl std::fmt::Debug for VapidKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidKeys")
            .field("public_key", &self.public_key_b64)
            .finish_non_exhaustive()
    }
}

impl Serialize for VapidKeys {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        self.to_json_form().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VapidKeys {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let json = VapidKeysJson::deserialize(deserializer)?;
        Self::try_from(json).map_err(serde::de::Error::custom)
    }
}

/// Validate that `bytes` is shaped like an uncompressed P-256 point.
///
/// Only checks length and tag; curve membership is checked where the point
/// is actually used.
pub(crate) fn is_uncompressed_point(bytes: &[u8]) -> bool {
    bytes.len() == PUBLIC_KEY_LEN && bytes[0] == UNCOMPRESSED_POINT_TAG
}
