use std::fmt;

use crate::error::TypeError;
use crate::hash::ContentHash;

/// Namespace of a path reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Immutable content paths (`/ipfs/<hash>/…`).
    Ipfs,
    /// Mutable name paths (`/ipns/<name>/…`).
    Ipns,
}

impl Namespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ipfs => "/ipfs/",
            Self::Ipns => "/ipns/",
        }
    }
}

/// A way of naming a node: a bare content hash or a namespaced path.
///
/// Paths need name resolution by the transport before a hash is known,
/// except for `/ipfs/<hash>` with no further segments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reference {
    Hash(ContentHash),
    Path {
        namespace: Namespace,
        /// Everything after the namespace prefix, without a trailing slash.
        path: String,
    },
}

impl Reference {
    /// Parse a reference string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        for namespace in [Namespace::Ipfs, Namespace::Ipns] {
            if let Some(rest) = s.strip_prefix(namespace.prefix()) {
                let path = rest.trim_end_matches('/');
                if path.is_empty() {
                    return Err(TypeError::InvalidReference(s.to_string()));
                }
                return Ok(Self::Path {
                    namespace,
                    path: path.to_string(),
                });
            }
        }
        if s.starts_with('/') {
            return Err(TypeError::InvalidReference(s.to_string()));
        }
        ContentHash::parse(s)
            .map(Self::Hash)
            .map_err(|_| TypeError::InvalidReference(s.to_string()))
    }

    /// The hash this reference names without a resolution round trip, if any.
    pub fn direct_hash(&self) -> Option<ContentHash> {
        match self {
            Self::Hash(hash) => Some(hash.clone()),
            Self::Path {
                namespace: Namespace::Ipfs,
                path,
            } if !path.contains('/') => ContentHash::parse(path).ok(),
            Self::Path { .. } => None,
        }
    }

    /// Returns `true` if the transport must resolve this reference.
    pub fn needs_resolution(&self) -> bool {
        self.direct_hash().is_none()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash(hash) => write!(f, "{hash}"),
            Self::Path { namespace, path } => write!(f, "{}{}", namespace.prefix(), path),
        }
    }
}

impl From<ContentHash> for Reference {
    fn from(hash: ContentHash) -> Self {
        Self::Hash(hash)
    }
}

impl std::str::FromStr for Reference {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
