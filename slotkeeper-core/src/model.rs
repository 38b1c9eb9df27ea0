//! Domain data structures for buckets, records, and bookings.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// Identifier for a reservable resource line, e.g. a doctor's slot or a bus route.
pub struct BucketKey(pub String);

impl BucketKey {
    /// Build a key from two parts, such as a doctor and one of their slots.
    #[must_use]
    pub fn compound(outer: &str, inner: &str) -> Self {
        Self(format!("{outer} @ {inner}"))
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for BucketKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// Ledger-issued identifier of a single booking.
pub struct BookingId(pub String);

impl fmt::Display for BookingId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for BookingId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// External, domain-supplied key used for direct retrieval (mobile number, ticket id, ...).
pub struct LookupKey(pub String);

impl fmt::Display for LookupKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for LookupKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Addresses an existing booking either through the lookup index or by its id.
pub enum Locator {
    /// Resolve through the schema's lookup key.
    Key(LookupKey),
    /// Resolve through the booking id index.
    Id(BookingId),
}

impl From<LookupKey> for Locator {
    fn from(key: LookupKey) -> Self {
        Locator::Key(key)
    }
}

impl From<BookingId> for Locator {
    fn from(id: BookingId) -> Self {
        Locator::Id(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
/// Value stored in a record field.
pub enum FieldValue {
    /// Free-form text such as a name or a phone number.
    Text(String),
    /// Whole number such as an age or a price.
    Integer(i64),
}

impl FieldValue {
    /// Text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Integer(_) => None,
        }
    }

    /// Numeric content, if this is an integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(number) => Some(*number),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => formatter.write_str(text),
            FieldValue::Integer(number) => write!(formatter, "{number}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        FieldValue::Text(text)
    }
}

impl From<i64> for FieldValue {
    fn from(number: i64) -> Self {
        FieldValue::Integer(number)
    }
}

impl From<u32> for FieldValue {
    fn from(number: u32) -> Self {
        FieldValue::Integer(i64::from(number))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
/// Named fields attached to a booking.
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with<V: Into<FieldValue>>(mut self, field: &str, value: V) -> Self {
        self.set(field, value);
        self
    }

    /// Insert or replace a field, returning the previous value.
    pub fn set<V: Into<FieldValue>>(&mut self, field: &str, value: V) -> Option<FieldValue> {
        self.fields.insert(field.to_owned(), value.into())
    }

    /// Raw field access.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Text field access; `None` when absent or not text.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    /// Integer field access; `None` when absent or not an integer.
    #[must_use]
    pub fn integer(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_integer)
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn merge_missing(&mut self, other: &Record) {
        for (name, value) in &other.fields {
            self.fields
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One reservation consuming a unit of a bucket's capacity.
pub struct Booking {
    /// Unique id issued by the ledger.
    pub id: BookingId,
    /// Bucket this booking occupies.
    pub bucket: BucketKey,
    /// Validated fields plus any bucket attributes.
    pub record: Record,
    /// Ledger-wide creation order, starting at 1.
    pub sequence: u64,
    /// Position inside the bucket at booking time (seat number), starting at 1.
    pub position: u32,
    /// When the booking was created.
    pub booked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Current fill level of a bucket.
pub struct Occupancy {
    /// Live bookings.
    pub booked: u32,
    /// Capacity ceiling.
    pub capacity: u32,
}

impl Occupancy {
    /// Remaining free units.
    #[must_use]
    pub fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.booked)
    }

    /// Whether no unit is left.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.booked >= self.capacity
    }
}
