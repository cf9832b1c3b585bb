//! Fixed-length binary digests and the Hamming metric over them.
//!
//! A [`Digest`] is the opaque output of one perceptual hashing algorithm for
//! one image. Two digests of the same [`HashType`] always have the same
//! length; comparing digests of different lengths is rejected instead of
//! being padded or truncated.

use std::collections::BTreeMap;
use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{QuipError, Result};
use crate::hash_type::HashType;

/// Digests of one image, keyed by the algorithm that produced them.
pub type DigestSet = BTreeMap<HashType, Digest>;

/// One perceptual hash output.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Digest(Vec<u8>);

impl Digest {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of bits in the digest.
    pub fn bit_len(&self) -> u32 {
        (self.0.len() * 8) as u32
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        hex::decode(hex_str.trim())
            .map(Self)
            .map_err(|e| QuipError::validation(format!("Invalid hex digest: {}", e)))
    }

    pub fn from_base64(b64: &str) -> Result<Self> {
        BASE64
            .decode(b64.trim())
            .map(Self)
            .map_err(|e| QuipError::validation(format!("Invalid base64 digest: {}", e)))
    }

    /// Parse a transport-encoded digest.
    ///
    /// A `hex:` or `b64:` prefix selects the encoding explicitly. Without a
    /// prefix the string is read as hex when it is valid hex and as standard
    /// base64 otherwise, so base64 that happens to contain only hex
    /// characters (e.g. a 9-byte digest) must carry the `b64:` prefix.
    pub fn parse(encoded: &str) -> Result<Self> {
        let trimmed = encoded.trim();
        let (prefix, body) = match trimmed.split_once(':') {
            Some((prefix @ ("hex" | "b64"), body)) => (Some(prefix), body),
            _ => (None, trimmed),
        };
        if body.is_empty() {
            return Err(QuipError::validation("Digest must not be empty"));
        }

        match prefix {
            Some("hex") => Self::from_hex(body),
            Some(_) => Self::from_base64(body),
            None if body.len() % 2 == 0 && body.bytes().all(|b| b.is_ascii_hexdigit()) => {
                Self::from_hex(body)
            }
            None => Self::from_base64(body),
        }
    }

    /// Hamming distance to another digest of the same length.
    pub fn hamming_distance(&self, other: &Self) -> Result<u32> {
        hamming_distance(&self.0, &other.0).ok_or_else(|| {
            QuipError::validation(format!(
                "Cannot compare digests of {} and {} bytes",
                self.len(),
                other.len()
            ))
        })
    }
}

impl From<Vec<u8>> for Digest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Digest {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Digest::parse(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Count the differing bits between two equal-length byte strings.
///
/// Returns `None` if either input is empty or the lengths differ.
pub fn hamming_distance(a: &[u8], b: &[u8]) -> Option<u32> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }

    Some(a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum())
}

/// Parse a map of hash type names to transport-encoded digests.
pub fn parse_digest_set<'a, I>(entries: I) -> Result<DigestSet>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut digests = DigestSet::new();
    for (name, encoded) in entries {
        let hash_type: HashType = name.parse()?;
        digests.insert(hash_type, Digest::parse(encoded)?);
    }
    Ok(digests)
}
