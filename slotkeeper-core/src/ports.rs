//! Error type and the extension traits desks plug into the ledger.

use crate::model::{BookingId, BucketKey, FieldValue, LookupKey};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors that can occur while operating a ledger.
pub enum LedgerError {
    /// Bucket key is not part of the catalog.
    #[error("Unknown resource: {0}")]
    UnknownResource(BucketKey),
    /// A record or amended value was rejected by the schema.
    #[error("Invalid value for {field}: {reason}")]
    Validation {
        /// Offending field.
        field: String,
        /// Human readable rule message.
        reason: String,
    },
    /// The bucket already holds as many bookings as its ceiling allows.
    #[error("{bucket} is full ({capacity} of {capacity} booked)")]
    CapacityExceeded {
        /// Full bucket.
        bucket: BucketKey,
        /// Its ceiling.
        capacity: u32,
    },
    /// Another live booking already owns this lookup key and the schema rejects duplicates.
    #[error("Lookup key already booked: {0}")]
    DuplicateLookupKey(LookupKey),
    /// The id strategy kept returning ids that were already issued.
    #[error("Id strategy produced an already issued id: {0}")]
    IdCollision(BookingId),
    /// Catalog definition is unusable.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
    /// Schema definition is unusable.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// No desk is registered under the requested id.
    #[error("Unsupported desk: {0}")]
    UnsupportedDesk(String),
    /// The desk's ledger lock was poisoned by a panicking writer.
    #[error("Desk unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Source of fresh booking ids.
///
/// The ledger only relies on the strategy for candidates; uniqueness over the ledger's
/// lifetime is enforced by the ledger itself.
pub trait IdStrategy: Send {
    /// Produce the next candidate id.
    fn next_id(&mut self) -> BookingId;
}

/// Predicate applied to a single field value.
pub trait FieldRule: Send + Sync {
    /// Accept the value or explain why it is rejected.
    ///
    /// # Errors
    ///
    /// Returns the rejection message shown to the caller.
    fn check(&self, value: &FieldValue) -> Result<(), String>;
}

impl<F> FieldRule for F
where
    F: Fn(&FieldValue) -> Result<(), String> + Send + Sync,
{
    fn check(&self, value: &FieldValue) -> Result<(), String> {
        self(value)
    }
}
