//! Alert fingerprinting

use sha2::{Digest, Sha256};

/// Hex digest bytes kept in a fingerprint
const FINGERPRINT_BYTES: usize = 16;

/// Deterministic short hash of an alert's type and message prefix
///
/// Only the first `prefix_chars` characters of the message take part, so
/// trailing detail (timestamps, counters) does not defeat deduplication.
pub fn fingerprint(alert_type: &str, message: &str, prefix_chars: usize) -> String {
    let prefix: String = message.chars().take(prefix_chars).collect();
    let digest = Sha256::digest(format!("{}:{}", alert_type, prefix).as_bytes());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_deterministic() {
        let a = fingerprint("server_down", "Server example.com is down", 100);
        let b = fingerprint("server_down", "Server example.com is down", 100);
        assert_eq!(a, b);
        assert_eq!(a.len(), FINGERPRINT_BYTES * 2);
    }

    #[test]
    fn test_type_is_part_of_fingerprint() {
        assert_ne!(
            fingerprint("cpu", "High usage", 100),
            fingerprint("memory", "High usage", 100)
        );
    }

    #[test]
    fn test_prefix_counts_characters() {
        // Multi-byte characters must not split
        let a = format!("{}{}", "é".repeat(100), "first");
        let b = format!("{}{}", "é".repeat(100), "second");
        assert_eq!(fingerprint("t", &a, 100), fingerprint("t", &b, 100));
    }

    proptest! {
        #[test]
        fn prop_suffix_beyond_prefix_is_ignored(prefix in "[a-z ]{100}", x in ".*", y in ".*") {
            let a = format!("{}{}", prefix, x);
            let b = format!("{}{}", prefix, y);
            prop_assert_eq!(fingerprint("cpu", &a, 100), fingerprint("cpu", &b, 100));
        }
    }
}
