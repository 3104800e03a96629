use sha2::{Digest, Sha256};

/// Computes SHA-256 of `bytes` and returns the hex-encoded digest.
///
/// Used for the integrity comparison against the declared bundle hash and
/// for deterministic deployment naming.
pub fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digests() {
        assert_eq!(
            compute_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            compute_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn deterministic() {
        let data = b"publish me";
        assert_eq!(compute_hash(data), compute_hash(data));
    }

    #[test]
    fn content_sensitive() {
        assert_ne!(compute_hash(b"publish me"), compute_hash(b"publish mf"));
        assert_ne!(compute_hash(b""), compute_hash(b"\0"));
    }
}
