//! Content fingerprints for duplicate detection

/// Stable digest of `subject ++ body`
///
/// BLAKE3 over the UTF-8 bytes, hex encoded and truncated to 32 characters.
/// Attachments never contribute, so resubmissions with different attachments
/// still collide.
pub fn fingerprint(subject: &str, body: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(subject.as_bytes());
    hasher.update(body.as_bytes());
    let hash = hasher.finalize();
    hash.to_hex().as_str()[..32].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint("Payment confirmation needed", "Please confirm.");
        let b = fingerprint("Payment confirmation needed", "Please confirm.");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_matches_concatenation() {
        // Same bytes split differently hash the same, like the plain concatenation
        assert_eq!(fingerprint("ab", "c"), fingerprint("a", "bc"));
        let direct = blake3::hash(b"abc").to_hex();
        assert_eq!(fingerprint("abc", ""), &direct.as_str()[..32]);
    }

    #[test]
    fn test_fingerprint_differs_on_content() {
        assert_ne!(fingerprint("Subject", "Body one"), fingerprint("Subject", "Body two"));
    }
}
