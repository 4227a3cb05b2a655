//! Known-answer vectors for the password digest.
//!
//! Any implementation reading the same users slot must produce these exact
//! digests, or existing accounts stop authenticating.

use nevpn_account_core::digest;

/// A digest test vector.
#[derive(Debug, Clone)]
pub struct DigestVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Plaintext input.
    pub input: &'static str,
    /// Expected digest (lowercase hex).
    pub expected: &'static str,
}

/// Get all digest vectors.
pub fn all_vectors() -> Vec<DigestVector> {
    vec![
        DigestVector {
            name: "empty password",
            input: "",
            expected: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        DigestVector {
            name: "single char a",
            input: "a",
            expected: "ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb",
        },
        DigestVector {
            name: "single char b",
            input: "b",
            expected: "3e23e8160039594a33894f6564e1b1348bbd7a0088d42c4acb73eeaed59c009d",
        },
        DigestVector {
            name: "abc",
            input: "abc",
            expected: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        },
        DigestVector {
            name: "448-bit message",
            input: "abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq",
            expected: "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1",
        },
    ]
}

/// Check every vector. Returns the names of vectors that did not match.
pub fn verify_all_vectors() -> Vec<&'static str> {
    all_vectors()
        .into_iter()
        .filter(|v| digest(v.input) != v.expected)
        .map(|v| v.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        assert_eq!(verify_all_vectors(), Vec::<&str>::new());
    }

    #[test]
    fn test_vectors_are_well_formed() {
        for v in all_vectors() {
            assert_eq!(v.expected.len(), 64, "{}", v.name);
            assert_eq!(hex::decode(v.expected).unwrap().len(), 32, "{}", v.name);
        }
    }
}
