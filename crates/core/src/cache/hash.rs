//! Cache keys and body digests.

use sha2::{Digest, Sha256};

/// Compute the hex SHA-256 digest of a response body.
pub fn body_digest(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Normalize a request URL into the key it is stored under.
///
/// The fragment never reaches the network, so it is not part of the key.
/// The query string is kept as-is.
pub fn entry_key(url: &str) -> &str {
    match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_stability() {
        assert_eq!(body_digest(b"body { color: red }"), body_digest(b"body { color: red }"));
    }

    #[test]
    fn test_digest_differs_by_content() {
        assert_ne!(body_digest(b"a"), body_digest(b"b"));
    }

    #[test]
    fn test_digest_format() {
        let digest = body_digest(b"");
        assert_eq!(digest, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_entry_key_strips_fragment() {
        assert_eq!(entry_key("https://example.com/rooms/#suite"), "https://example.com/rooms/");
        assert_eq!(entry_key("https://example.com/?lang=uk"), "https://example.com/?lang=uk");
    }
}
