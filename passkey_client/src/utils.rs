use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;

/// Errors from the base64url codec.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UtilError {
    /// Input is not valid unpadded base64url
    #[error("Invalid format: {0}")]
    Format(String),
}

/// Decodes unpadded base64url text into raw bytes.
///
/// The URL-safe alphabet is required: `+`, `/` and `=` are rejected, as is
/// any input whose length cannot come from an unpadded encoding.
pub fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|e| UtilError::Format(format!("Failed to decode base64url: {e}")))
}

/// Encodes raw bytes as unpadded base64url text.
///
/// Total over all byte sequences, including the empty one. The output never
/// contains padding characters.
pub fn base64url_encode(input: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Test decoding of a known base64url vector
    ///
    /// "AAEC" is the unpadded base64url encoding of the bytes [0, 1, 2];
    /// the decoder must produce exactly those bytes.
    #[test]
    fn test_decode_known_vector() {
        assert_eq!(base64url_decode("AAEC").unwrap(), vec![0u8, 1, 2]);
    }

    /// Test encoding of the empty byte sequence
    ///
    /// Encoding is total; the empty input maps to the empty string and
    /// decodes back to the empty byte sequence.
    #[test]
    fn test_encode_empty() {
        assert_eq!(base64url_encode([]), "");
        assert_eq!(base64url_decode("").unwrap(), Vec::<u8>::new());
    }

    /// Test that the standard-alphabet characters are rejected
    ///
    /// `+` and `/` belong to the standard base64 alphabet and `=` is
    /// padding; all three must fail with a Format error rather than being
    /// silently accepted.
    #[test]
    fn test_decode_rejects_standard_alphabet() {
        for input in ["a+b", "a/b", "ab==", "AAEC="] {
            match base64url_decode(input) {
                Err(UtilError::Format(_)) => {}
                other => panic!("Expected Format error for {input:?}, got {other:?}"),
            }
        }
    }

    /// Test that an impossible length is rejected
    ///
    /// A single base64 character can never be produced by encoding whole
    /// bytes, so it must fail to decode.
    #[test]
    fn test_decode_rejects_invalid_length() {
        assert!(base64url_decode("A").is_err());
    }

    /// Test that encoded output never contains padding
    #[test]
    fn test_encode_omits_padding() {
        // Lengths 1 and 2 would require padding in plain base64
        assert_eq!(base64url_encode([0u8]), "AA");
        assert_eq!(base64url_encode([0u8, 1]), "AAE");
        assert!(!base64url_encode([0u8, 1, 2, 3]).contains('='));
    }

    proptest! {
        /// Round trip bytes -> text -> bytes for arbitrary sequences,
        /// including lengths that are not a multiple of 3.
        #[test]
        fn prop_decode_encode_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let encoded = base64url_encode(&bytes);
            prop_assert!(!encoded.contains('='));
            prop_assert_eq!(base64url_decode(&encoded).unwrap(), bytes);
        }

        /// Round trip text -> bytes -> text for valid unpadded base64url
        /// strings (generated by encoding arbitrary bytes).
        #[test]
        fn prop_encode_decode_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let text = base64url_encode(&bytes);
            let decoded = base64url_decode(&text).unwrap();
            prop_assert_eq!(base64url_encode(decoded), text);
        }
    }
}
