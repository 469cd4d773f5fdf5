//! Entity identifiers.
//!
//! World files store entity ids as 64-bit integers (`value-Id64`), written
//! in decimal in attribute text and in JSON interchange.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Unique identifier for an entity in a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EntityId(u64);

impl EntityId {
    /// Largest id the game accepts. Ids live in the signed 64-bit range even
    /// though they are packed as unsigned on disk.
    pub const MAX_VALID: u64 = i64::MAX as u64;

    /// Wraps a raw id value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns true if the id fits the signed 64-bit range.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.0 <= Self::MAX_VALID
    }

    /// Parses an id from its decimal form, tolerating surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, Error> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| Error::InvalidId(s.to_string()))
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EntityIdVisitor)
    }
}

/// Accepts both `"123"` and `123`; older clipboard payloads used numbers.
struct EntityIdVisitor;

impl Visitor<'_> for EntityIdVisitor {
    type Value = EntityId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an entity id as a decimal string or unsigned integer")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(EntityId(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(EntityId)
            .map_err(|_| E::custom(format!("negative entity id: {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        EntityId::parse(v).map_err(E::custom)
    }
}
