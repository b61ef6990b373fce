use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Multihash code for BLAKE3-256 digests.
const BLAKE3_MULTIHASH_CODE: u8 = 0x1e;
/// Digest length carried in the multihash header.
const BLAKE3_DIGEST_LEN: u8 = 0x20;

/// Content-addressed identifier of a merkledag node.
///
/// A `ContentHash` is the base58 text form of a multihash, e.g.
/// `QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn`. The text is validated on
/// construction but otherwise treated as opaque: equality, ordering and
/// hashing all compare the text.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Parse and validate a base58 hash string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() {
            return Err(TypeError::InvalidHash(s.to_string()));
        }
        bs58::decode(s)
            .into_vec()
            .map_err(|_| TypeError::InvalidHash(s.to_string()))?;
        Ok(Self(s.to_string()))
    }

    /// Wrap raw multihash bytes (the binary form carried on the wire).
    pub fn from_digest_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.is_empty() {
            return Err(TypeError::InvalidHash(String::new()));
        }
        Ok(Self(bs58::encode(bytes).into_string()))
    }

    /// The raw multihash bytes behind the base58 text.
    pub fn to_digest_bytes(&self) -> Vec<u8> {
        // Validated at construction.
        bs58::decode(&self.0).into_vec().unwrap_or_default()
    }

    /// Compute the BLAKE3 multihash of `data`.
    pub fn compute(data: &[u8]) -> Self {
        let digest = blake3::hash(data);
        let mut multihash = Vec::with_capacity(2 + digest.as_bytes().len());
        multihash.push(BLAKE3_MULTIHASH_CODE);
        multihash.push(BLAKE3_DIGEST_LEN);
        multihash.extend_from_slice(digest.as_bytes());
        Self(bs58::encode(multihash).into_string())
    }

    /// The base58 text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 8 characters) for logs.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        &self.0[..end]
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ContentHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
