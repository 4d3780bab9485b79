//! IdentifierHash: maps a human-readable name to a filesystem-safe token.
//!
//! Client names are used verbatim as directories, but cache names and object
//! keys may contain anything (slashes, spaces, unicode), so they are hashed into
//! a single path segment. BLAKE3 truncated to 128 bits gives 32 lowercase hex
//! characters. This is not a security boundary, only an addressing scheme.

use std::fmt;

/// Length of a rendered token in hex characters.
pub const TOKEN_LEN: usize = 32;

/// A hashed identifier - 128 bits (16 bytes, 32 hex chars) of BLAKE3.
///
/// Only ever built by hashing, so every value is a well-formed token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentifierHash(String);

impl IdentifierHash {
    /// Hash an identifier.
    pub fn of(identifier: &str) -> Self {
        let digest = blake3::hash(identifier.as_bytes());
        Self(hex::encode(&digest.as_bytes()[..TOKEN_LEN / 2]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Hash an identifier straight to its token string.
pub fn hash_identifier(identifier: &str) -> String {
    IdentifierHash::of(identifier).into_inner()
}

impl fmt::Display for IdentifierHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IdentifierHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for IdentifierHash {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}
