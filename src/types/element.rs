//! Element types for the registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for an element in the registry.
///
/// Ids are assigned monotonically by the store and never reused, so
/// ordering by `ElementId` is the same as ordering by insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(u64);

impl ElementId {
    /// Create an id from its raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The id that follows this one.
    pub(crate) fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ElementId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl FromStr for ElementId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

/// An element as held by the store.
///
/// Closability is not part of the record: it belongs to the external
/// predicate and is evaluated whenever the element is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRecord {
    /// Unique element identifier.
    pub id: ElementId,
    /// When the element was opened.
    pub opened_at: DateTime<Utc>,
}

impl ElementRecord {
    /// Create a record opened now.
    pub fn open(id: ElementId) -> Self {
        Self {
            id,
            opened_at: Utc::now(),
        }
    }
}

/// Read view of an element, carrying the predicate result at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Unique element identifier.
    pub id: ElementId,
    /// When the element was opened.
    pub opened_at: DateTime<Utc>,
    /// Whether the closure predicate currently reports this element closable.
    pub is_closable: bool,
}

impl Element {
    /// Build the read view of a record.
    pub fn from_record(record: &ElementRecord, is_closable: bool) -> Self {
        Self {
            id: record.id,
            opened_at: record.opened_at,
            is_closable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_id_ordering() {
        let a = ElementId::new(3);
        let b = ElementId::new(10);
        assert!(a < b);
        assert_eq!(a.next(), ElementId::new(4));
    }

    #[test]
    fn test_element_id_parse() {
        assert_eq!("42".parse::<ElementId>().unwrap(), ElementId::new(42));
        assert!("forty-two".parse::<ElementId>().is_err());
    }

    #[test]
    fn test_element_id_serializes_as_integer() {
        let json = serde_json::to_string(&ElementId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
