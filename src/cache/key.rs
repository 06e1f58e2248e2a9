//! Cache key generation
//!
//! Keys have the shape `endpoint|scope|digest`, where the digest is a SHA-256
//! hash of the sorted query parameters. Keeping the endpoint and scope readable
//! lets mutations invalidate every parameter variant with one prefix.

use sha2::{Digest, Sha256};

/// Generate a deterministic cache key from endpoint, scope and parameters.
///
/// Parameter order does not affect the key.
pub fn cache_key(endpoint: &str, scope: &str, params: &[(&str, &str)]) -> String {
    let mut hasher = Sha256::new();

    // Sort and include params for deterministic key
    let mut sorted_params: Vec<_> = params.iter().collect();
    sorted_params.sort_by_key(|(k, _)| *k);

    for (k, v) in sorted_params {
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
        hasher.update(b"&");
    }

    format!("{}{:x}", key_prefix(endpoint, Some(scope)), hasher.finalize())
}

/// Prefix shared by every key of an endpoint, optionally narrowed to one scope.
pub fn key_prefix(endpoint: &str, scope: Option<&str>) -> String {
    match scope {
        Some(scope) => format!("{}|{}|", endpoint, scope),
        None => format!("{}|", endpoint),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_deterministic() {
        let key1 = cache_key(
            "crop_stages",
            "farm:3",
            &[("history", "true"), ("analytics", "true")],
        );
        let key2 = cache_key(
            "crop_stages",
            "farm:3",
            &[("analytics", "true"), ("history", "true")],
        );

        // Same inputs in different order should produce same key
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_cache_key_different_endpoints() {
        let key1 = cache_key("crop_stages", "all", &[]);
        let key2 = cache_key("analytics", "all", &[]);

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_cache_key_different_scopes() {
        let key1 = cache_key("crop_stages", "farm:3", &[]);
        let key2 = cache_key("crop_stages", "farm:4", &[]);

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_cache_key_starts_with_prefix() {
        let key = cache_key("crop_stages", "farm:3", &[("history", "true")]);

        assert!(key.starts_with(&key_prefix("crop_stages", Some("farm:3"))));
        assert!(key.starts_with(&key_prefix("crop_stages", None)));
        assert!(!key.starts_with(&key_prefix("analytics", None)));
    }
}
