use md5::{Digest, Md5};

/// Digest of uploaded file content, used as the storage name when the client
/// did not supply a filename. Always 32 lowercase hex characters, so identical
/// nameless uploads land on the same file.
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_digest() {
        let digest = content_digest(b"hello world");
        // MD5 for "hello world"
        assert_eq!(digest, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_content_digest_empty() {
        let digest = content_digest(b"");
        // MD5 for the empty input
        assert_eq!(digest, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_content_digest_is_stable_and_32_hex() {
        let a = content_digest(b"same bytes");
        let b = content_digest(b"same bytes");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
