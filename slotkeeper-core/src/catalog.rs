//! Resource buckets and their capacity ceilings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{BucketKey, FieldValue, Record};
use crate::ports::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One reservable resource line.
pub struct Bucket {
    /// Identifier used by callers.
    pub key: BucketKey,
    /// Maximum number of simultaneous bookings.
    pub capacity: u32,
    /// Catalog-supplied fields copied onto every booking, e.g. a route price.
    pub attributes: Record,
}

impl Bucket {
    /// Bucket without attributes.
    #[must_use]
    pub fn new<K: Into<BucketKey>>(key: K, capacity: u32) -> Self {
        Self {
            key: key.into(),
            capacity,
            attributes: Record::new(),
        }
    }

    /// Attach a catalog attribute.
    #[must_use]
    pub fn with_attribute<V: Into<FieldValue>>(mut self, name: &str, value: V) -> Self {
        self.attributes.set(name, value);
        self
    }
}

/// Fixed set of buckets a ledger books against, in declaration order.
#[derive(Debug, Clone)]
pub struct Catalog {
    buckets: Vec<Bucket>,
    positions: HashMap<BucketKey, usize>,
}

impl Catalog {
    /// Build a catalog.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidCatalog`] for a zero capacity or a repeated key.
    pub fn new(buckets: Vec<Bucket>) -> Result<Self, LedgerError> {
        let mut positions = HashMap::with_capacity(buckets.len());
        for (slot, bucket) in buckets.iter().enumerate() {
            if bucket.capacity == 0 {
                return Err(LedgerError::InvalidCatalog(format!(
                    "{} must have a positive capacity",
                    bucket.key
                )));
            }
            if positions.insert(bucket.key.clone(), slot).is_some() {
                return Err(LedgerError::InvalidCatalog(format!(
                    "{} is listed twice",
                    bucket.key
                )));
            }
        }
        Ok(Self { buckets, positions })
    }

    /// Build a catalog from bare `(key, capacity)` pairs.
    ///
    /// # Errors
    ///
    /// Same as [`Catalog::new`].
    pub fn from_capacities<K, I>(entries: I) -> Result<Self, LedgerError>
    where
        K: Into<BucketKey>,
        I: IntoIterator<Item = (K, u32)>,
    {
        Self::new(
            entries
                .into_iter()
                .map(|(key, capacity)| Bucket::new(key, capacity))
                .collect(),
        )
    }

    /// Look up a bucket by key.
    #[must_use]
    pub fn get(&self, key: &BucketKey) -> Option<&Bucket> {
        self.index_of(key).and_then(|slot| self.buckets.get(slot))
    }

    /// Whether the key is part of the catalog.
    #[must_use]
    pub fn contains(&self, key: &BucketKey) -> bool {
        self.positions.contains_key(key)
    }

    /// All buckets in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether the catalog has no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub(crate) fn index_of(&self, key: &BucketKey) -> Option<usize> {
        self.positions.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_declaration_order() {
        let catalog = Catalog::from_capacities([("10am", 3), ("11am", 3), ("12pm", 3)])
            .expect("catalog is valid");
        let keys: Vec<_> = catalog.iter().map(|bucket| bucket.key.0.as_str()).collect();
        assert_eq!(keys, ["10am", "11am", "12pm"]);
        assert!(catalog.contains(&BucketKey::from("11am")));
        assert!(catalog.get(&BucketKey::from("4pm")).is_none());
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = Catalog::from_capacities([("closed", 0)]).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCatalog(_)));
    }

    #[test]
    fn rejects_repeated_keys() {
        let err = Catalog::from_capacities([("10am", 3), ("10am", 2)]).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCatalog(_)));
    }

    #[test]
    fn attributes_travel_with_the_bucket() {
        let catalog = Catalog::new(vec![
            Bucket::new("Mumbai to Pune", 40).with_attribute("price", 500_i64),
        ])
        .expect("catalog is valid");
        let route = catalog.get(&BucketKey::from("Mumbai to Pune")).expect("route exists");
        assert_eq!(route.attributes.integer("price"), Some(500));
    }
}
