//! Base64url helpers shared by key import and subscription parsing.

// Rust guideline compliant 2026-10

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};

/// Encode bytes as unpadded base64url.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    BASE64URL.encode(bytes)
}

/// Decode base64url, accepting input with or without trailing `=` padding.
///
/// Browsers disagree on whether `PushSubscription.toJSON()` pads its keys.
pub fn decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64URL.decode(input.trim().trim_end_matches('='))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_accepts_padded_and_unpadded() {
        assert_eq!(decode("AQI").expect("unpadded"), vec![1, 2]);
        assert_eq!(decode("AQI=").expect("padded"), vec![1, 2]);
    }

    #[test]
    fn test_decode_rejects_standard_alphabet() {
        assert!(decode("+/+/").is_err());
    }
}
