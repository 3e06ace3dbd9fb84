//! Core type definitions used throughout the codebase
//!
//! Every id is a string newtype. Ordering is plain byte-wise comparison of
//! the underlying string, which is the one canonical ordering used for all
//! tie-breaks and all serialized output.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::{FrontError, Result};

/// Delimiter between the two endpoints of an encoded edge id
pub const EDGE_ID_DELIMITER: &str = "__";

/// Turn counter (simulation time unit)
pub type Turn = u32;

/// Canonical ordering for every string key in the crate.
///
/// Byte-wise, never locale-aware.
#[inline]
pub fn canonical_cmp(a: &str, b: &str) -> Ordering {
    a.as_bytes().cmp(b.as_bytes())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Settlement (graph node) identifier
    SettlementId
);

string_id!(
    /// Faction (political side) identifier
    FactionId
);

string_id!(
    /// Formation identifier (brigades and corps share the namespace)
    FormationId
);

string_id!(
    /// Municipality identifier, used only for front-walk ordering
    MunicipalityId
);

impl SettlementId {
    /// Reject ids that cannot be encoded into an edge id
    pub fn validate(id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(FrontError::InvalidSettlementId {
                id: id.to_string(),
                reason: "empty id",
            });
        }
        if id.contains(EDGE_ID_DELIMITER) {
            return Err(FrontError::InvalidSettlementId {
                id: id.to_string(),
                reason: "contains the edge id delimiter",
            });
        }
        // "S1_" + "__" + "S2" would split at the wrong position on parse
        if id.ends_with('_') {
            return Err(FrontError::InvalidSettlementId {
                id: id.to_string(),
                reason: "ends with an underscore",
            });
        }
        Ok(())
    }
}

/// Canonical undirected edge id, encoded as `"{a}__{b}"` with `a < b`.
///
/// Ordering, equality and hashing all go through the encoded string, so a
/// sorted list of edge ids matches a sorted list of their encodings.
#[derive(Debug, Clone)]
pub struct EdgeId {
    key: String,
    split: usize,
}

impl EdgeId {
    /// Build the canonical id for the unordered pair `{x, y}`
    pub fn canonical(x: &str, y: &str) -> Result<Self> {
        SettlementId::validate(x)?;
        SettlementId::validate(y)?;
        let (a, b) = match canonical_cmp(x, y) {
            Ordering::Less => (x, y),
            Ordering::Greater => (y, x),
            Ordering::Equal => {
                return Err(FrontError::MalformedEdgeId {
                    id: format!("{x}{EDGE_ID_DELIMITER}{y}"),
                    reason: "self-loop",
                })
            }
        };
        Ok(Self {
            key: format!("{a}{EDGE_ID_DELIMITER}{b}"),
            split: a.len(),
        })
    }

    /// Parse an encoded edge id. The encoding must already be canonical.
    pub fn parse(encoded: &str) -> Result<Self> {
        let malformed = |reason| FrontError::MalformedEdgeId {
            id: encoded.to_string(),
            reason,
        };

        let split = encoded
            .find(EDGE_ID_DELIMITER)
            .ok_or_else(|| malformed("missing delimiter"))?;
        let a = &encoded[..split];
        let b = &encoded[split + EDGE_ID_DELIMITER.len()..];
        if a.is_empty() || b.is_empty() {
            return Err(malformed("empty endpoint"));
        }
        if b.contains(EDGE_ID_DELIMITER) {
            return Err(malformed("more than one delimiter"));
        }
        if b.ends_with('_') {
            return Err(malformed("endpoint ends with an underscore"));
        }
        if canonical_cmp(a, b) != Ordering::Less {
            return Err(FrontError::NonCanonicalEdgeId {
                id: encoded.to_string(),
            });
        }
        Ok(Self {
            key: encoded.to_string(),
            split,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Lexicographically smaller endpoint
    pub fn a(&self) -> &str {
        &self.key[..self.split]
    }

    /// Lexicographically larger endpoint
    pub fn b(&self) -> &str {
        &self.key[self.split + EDGE_ID_DELIMITER.len()..]
    }

    pub fn endpoints(&self) -> (&str, &str) {
        (self.a(), self.b())
    }

    pub fn touches(&self, settlement: &str) -> bool {
        self.a() == settlement || self.b() == settlement
    }

    /// The endpoint opposite `settlement`, if `settlement` is an endpoint
    pub fn other(&self, settlement: &str) -> Option<&str> {
        if self.a() == settlement {
            Some(self.b())
        } else if self.b() == settlement {
            Some(self.a())
        } else {
            None
        }
    }
}

impl PartialEq for EdgeId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for EdgeId {}

// Must agree with `str`'s hash for `Borrow<str>` lookups
impl Hash for EdgeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl Ord for EdgeId {
    fn cmp(&self, other: &Self) -> Ordering {
        canonical_cmp(&self.key, &other.key)
    }
}

impl PartialOrd for EdgeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Borrow<str> for EdgeId {
    fn borrow(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl FromStr for EdgeId {
    type Err = FrontError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for EdgeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key)
    }
}

impl<'de> Deserialize<'de> for EdgeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EdgeId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_orders_endpoints() {
        let e = EdgeId::canonical("S2", "S1").unwrap();
        assert_eq!(e.as_str(), "S1__S2");
        assert_eq!(e.endpoints(), ("S1", "S2"));
        assert_eq!(e.other("S1"), Some("S2"));
        assert_eq!(e.other("S3"), None);
    }

    #[test]
    fn test_canonical_rejects_self_loop() {
        assert!(matches!(
            EdgeId::canonical("S1", "S1"),
            Err(FrontError::MalformedEdgeId { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            EdgeId::parse("S1S2"),
            Err(FrontError::MalformedEdgeId { .. })
        ));
        assert!(matches!(
            EdgeId::parse("__S2"),
            Err(FrontError::MalformedEdgeId { .. })
        ));
        assert!(matches!(
            EdgeId::parse("S1__"),
            Err(FrontError::MalformedEdgeId { .. })
        ));
        assert!(matches!(
            EdgeId::parse("S1__S2__S3"),
            Err(FrontError::MalformedEdgeId { .. })
        ));
        assert!(matches!(
            EdgeId::parse("S2__S1"),
            Err(FrontError::NonCanonicalEdgeId { .. })
        ));
    }

    #[test]
    fn test_edge_order_follows_encoding() {
        // Tuple order would put S1__S2 first; encoded order compares '_' with 'X'
        let plain = EdgeId::parse("S1__S2").unwrap();
        let underscored = EdgeId::parse("S1_X__S3").unwrap();
        assert!(underscored < plain);
        assert_eq!(
            canonical_cmp(underscored.as_str(), plain.as_str()),
            Ordering::Less
        );
    }

    #[test]
    fn test_canonical_cmp_is_bytewise() {
        // Uppercase sorts before lowercase byte-wise
        assert_eq!(canonical_cmp("Z", "a"), Ordering::Less);
        assert_eq!(canonical_cmp("S10", "S9"), Ordering::Less);
    }

    #[test]
    fn test_edge_id_serde_round_trip_and_rejection() {
        let e = EdgeId::canonical("b", "a").unwrap();
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, "\"a__b\"");
        let back: EdgeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
        assert!(serde_json::from_str::<EdgeId>("\"b__a\"").is_err());
    }

    #[test]
    fn test_settlement_id_validation() {
        assert!(SettlementId::validate("S1").is_ok());
        assert!(SettlementId::validate("").is_err());
        assert!(SettlementId::validate("S__1").is_err());
        assert!(SettlementId::validate("S1_").is_err());
        assert!(SettlementId::validate("_S1").is_ok());
    }
}
