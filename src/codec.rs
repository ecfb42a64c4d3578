//! Reversible path addressing.
//!
//! Logical paths are exchanged with clients as opaque hex identifiers. The
//! transform is a keyed XOR stream cipher: the keystream is derived per
//! 8-byte block from xxh3 of the block counter, seeded by the process-wide
//! secret. There is no server-side id table; `decode(encode(p)) == p` holds
//! for every legal path, and the same path always yields the same id so
//! clients can bookmark them.
//!
//! This is obfuscation, not integrity protection: the ciphertext is
//! unauthenticated and must never be treated as an access-control token.
//! Access control lives with the caller.

use xxhash_rust::xxh3::{xxh3_64, xxh3_64_with_seed};

use crate::error::{AppError, AppResult};

/// Keyed codec between logical paths and opaque identifiers.
///
/// Constructed once at startup from the secret key and shared read-only
/// across requests.
#[derive(Clone)]
pub struct PathCodec {
    seed: u64,
}

impl PathCodec {
    pub fn new(key: &[u8]) -> Self {
        PathCodec { seed: xxh3_64(key) }
    }

    /// Encode a logical path into a hex identifier.
    ///
    /// Rejects empty paths and paths containing a NUL byte; every other
    /// relative path round-trips exactly.
    pub fn encode(&self, path: &str) -> AppResult<String> {
        if path.is_empty() {
            return Err(AppError::user("empty_path", "cannot encode an empty path"));
        }
        if path.as_bytes().contains(&0) {
            return Err(AppError::user("nul_in_path", "path contains a NUL byte"));
        }
        Ok(hex::encode(self.apply_keystream(path.as_bytes())))
    }

    /// Decode an identifier back into the logical path it encodes.
    ///
    /// Any malformed input (non-hex, odd length, invalid UTF-8 after
    /// decryption, embedded NUL, empty) fails with a Decode error. Callers
    /// must treat Decode as "not found", never as an internal fault.
    pub fn decode(&self, id: &str) -> AppResult<String> {
        let cipher = hex::decode(id)
            .map_err(|_| AppError::decode("bad_id", "identifier is not valid hex"))?;
        if cipher.is_empty() {
            return Err(AppError::decode("bad_id", "identifier is empty"));
        }
        let plain = self.apply_keystream(&cipher);
        if plain.contains(&0) {
            return Err(AppError::decode("bad_id", "identifier does not decode to a path"));
        }
        String::from_utf8(plain)
            .map_err(|_| AppError::decode("bad_id", "identifier does not decode to a path"))
    }

    // Symmetric: encryption and decryption are the same XOR pass.
    fn apply_keystream(&self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        for (block, chunk) in data.chunks(8).enumerate() {
            let ks = xxh3_64_with_seed(&(block as u64).to_le_bytes(), self.seed).to_le_bytes();
            for (i, b) in chunk.iter().enumerate() {
                out.push(b ^ ks[i]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> PathCodec {
        PathCodec::new(b"unit-test-secret")
    }

    #[test]
    fn round_trips_legal_paths() {
        let c = codec();
        for p in [
            "a.txt",
            "deep/nested/dir/data.csv",
            "with space/and-dash_underscore.png",
            "unicode/ﬁlé-名前.csv",
            "x",
            "trailing.dir/",
        ] {
            let id = c.encode(p).unwrap();
            assert_eq!(c.decode(&id).unwrap(), p, "path {:?} did not round-trip", p);
            // hex, lowercase, two chars per byte
            assert_eq!(id.len(), p.len() * 2);
            assert!(id.chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_uppercase()));
        }
    }

    #[test]
    fn deterministic_per_key() {
        let c = codec();
        assert_eq!(c.encode("a/b.csv").unwrap(), c.encode("a/b.csv").unwrap());
        let other = PathCodec::new(b"another-secret");
        assert_ne!(c.encode("a/b.csv").unwrap(), other.encode("a/b.csv").unwrap());
    }

    #[test]
    fn malformed_ids_fail_with_decode() {
        let c = codec();
        for bad in ["zz", "abc", "", "0102g4", "____"] {
            match c.decode(bad) {
                Err(crate::error::AppError::Decode { .. }) => {}
                other => panic!("expected Decode error for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn corrupted_id_never_panics() {
        let c = codec();
        let mut id = c.encode("some/file.csv").unwrap();
        // Flip a nibble; result must be a clean error or a different path,
        // never an unhandled fault.
        let last = id.pop().unwrap();
        id.push(if last == '0' { '1' } else { '0' });
        let _ = c.decode(&id);
    }

    #[test]
    fn rejects_empty_and_nul() {
        let c = codec();
        assert!(c.encode("").is_err());
        assert!(c.encode("a\0b").is_err());
    }
}
