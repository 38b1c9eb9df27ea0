//! The reservation ledger: validates records, enforces bucket capacity, and keeps the bucket
//! sequences and lookup indexes consistent.
//!
//! Bookings live in a single arena keyed by [`BookingId`]. Bucket lanes and the lookup index
//! only hold ids, so cancelling a booking is three removals and nothing can point at a booking
//! that is gone.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::Utc;
use tracing::{debug, warn};

use crate::catalog::{Bucket, Catalog};
use crate::model::{
    Booking, BookingId, BucketKey, FieldValue, Locator, LookupKey, Occupancy, Record,
};
use crate::ports::{IdStrategy, LedgerError};
use crate::schema::{DuplicateKeyPolicy, LookupBy, Schema};

/// How many times the id strategy is asked for a fresh id before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// Capacity-constrained reservation engine for one catalog and schema.
pub struct Ledger {
    catalog: Catalog,
    schema: Schema,
    ids: Box<dyn IdStrategy>,
    bookings: HashMap<BookingId, Booking>,
    // One lane per catalog bucket, same order as the catalog, ids in arrival order.
    lanes: Vec<Vec<BookingId>>,
    // Last entry is the booking the key currently resolves to.
    by_key: HashMap<LookupKey, Vec<BookingId>>,
    issued: HashSet<BookingId>,
    last_sequence: u64,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new<S: IdStrategy + 'static>(catalog: Catalog, schema: Schema, ids: S) -> Self {
        Self::with_boxed_ids(catalog, schema, Box::new(ids))
    }

    /// Create an empty ledger from an already boxed id strategy.
    #[must_use]
    pub fn with_boxed_ids(catalog: Catalog, schema: Schema, ids: Box<dyn IdStrategy>) -> Self {
        let lanes = vec![Vec::new(); catalog.len()];
        Self {
            catalog,
            schema,
            ids,
            bookings: HashMap::new(),
            lanes,
            by_key: HashMap::new(),
            issued: HashSet::new(),
            last_sequence: 0,
        }
    }

    /// Reserve one unit of `bucket` for `record`.
    ///
    /// Nothing is mutated unless every check passes.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UnknownResource`] when the bucket is not in the catalog.
    /// - [`LedgerError::Validation`] when the schema rejects the record.
    /// - [`LedgerError::DuplicateLookupKey`] when the schema rejects duplicate keys and the key
    ///   is live.
    /// - [`LedgerError::CapacityExceeded`] when the bucket is full.
    /// - [`LedgerError::IdCollision`] when no unused id could be drawn.
    pub fn book(
        &mut self,
        bucket: &BucketKey,
        mut record: Record,
    ) -> Result<BookingId, LedgerError> {
        let slot = self
            .catalog
            .index_of(bucket)
            .ok_or_else(|| LedgerError::UnknownResource(bucket.clone()))?;
        let (capacity, attributes) = self
            .catalog
            .get(bucket)
            .map(|entry| (entry.capacity, entry.attributes.clone()))
            .ok_or_else(|| LedgerError::UnknownResource(bucket.clone()))?;

        if let Err(err) = self.schema.validate(&record) {
            debug!(bucket = %bucket, error = %err, "booking rejected by schema");
            return Err(err);
        }

        if let LookupBy::Field(field) = self.schema.lookup() {
            if self.schema.duplicate_policy() == DuplicateKeyPolicy::Reject {
                let key = LookupKey(record.get(field).map(ToString::to_string).unwrap_or_default());
                if self.by_key.contains_key(&key) {
                    debug!(bucket = %bucket, key = %key, "duplicate lookup key refused");
                    return Err(LedgerError::DuplicateLookupKey(key));
                }
            }
        }

        let booked = self.lanes.get(slot).map_or(0, Vec::len);
        let capacity_usize = usize::try_from(capacity).unwrap_or(usize::MAX);
        if booked >= capacity_usize {
            warn!(bucket = %bucket, capacity, "bucket full, booking refused");
            return Err(LedgerError::CapacityExceeded {
                bucket: bucket.clone(),
                capacity,
            });
        }

        let id = self.fresh_id()?;
        // `booked < capacity`, so this always fits.
        let position = u32::try_from(booked).map_or(capacity, |count| count.saturating_add(1));
        record.merge_missing(&attributes);
        let key = self.schema.lookup_key(&id, &record);

        self.last_sequence = self.last_sequence.saturating_add(1);
        let booking = Booking {
            id: id.clone(),
            bucket: bucket.clone(),
            record,
            sequence: self.last_sequence,
            position,
            booked_at: Utc::now(),
        };

        if let Some(lane) = self.lanes.get_mut(slot) {
            lane.push(id.clone());
        }
        if matches!(self.schema.lookup(), LookupBy::Field(_)) {
            let holders = self.by_key.entry(key).or_default();
            if let Some(previous) = holders.last() {
                debug!(
                    booking_id = %id,
                    shadowed = %previous,
                    "lookup key reassigned to newer booking"
                );
            }
            holders.push(id.clone());
        }
        self.issued.insert(id.clone());
        self.bookings.insert(id.clone(), booking);

        debug!(booking_id = %id, bucket = %bucket, position, "booking created");
        Ok(id)
    }

    /// Fetch a booking by lookup key or id.
    #[must_use]
    pub fn view(&self, locator: &Locator) -> Option<&Booking> {
        let id = self.resolve(locator)?;
        self.bookings.get(&id)
    }

    /// Remove a booking and release its unit of capacity.
    ///
    /// Returns `false` when nothing matches. Positions of the remaining bookings are left as
    /// they were issued.
    pub fn cancel(&mut self, locator: &Locator) -> bool {
        let Some(id) = self.resolve(locator) else {
            return false;
        };
        let Some(booking) = self.bookings.remove(&id) else {
            return false;
        };

        if let Some(lane) = self
            .catalog
            .index_of(&booking.bucket)
            .and_then(|slot| self.lanes.get_mut(slot))
        {
            lane.retain(|other| other != &id);
        }

        if matches!(self.schema.lookup(), LookupBy::Field(_)) {
            let key = self.schema.lookup_key(&id, &booking.record);
            if let Some(holders) = self.by_key.get_mut(&key) {
                holders.retain(|other| other != &id);
                if holders.is_empty() {
                    self.by_key.remove(&key);
                }
            }
        }

        debug!(booking_id = %id, bucket = %booking.bucket, "booking cancelled");
        true
    }

    /// Replace an amendable field of an existing booking.
    ///
    /// The value is checked before the booking is looked up, so bad input fails even when the
    /// target does not exist. Returns `Ok(false)` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] for undeclared or non-amendable fields and for values
    /// the field's rules reject.
    pub fn amend(
        &mut self,
        locator: &Locator,
        field: &str,
        value: FieldValue,
    ) -> Result<bool, LedgerError> {
        self.schema.validate_amend(field, &value)?;

        let Some(id) = self.resolve(locator) else {
            return Ok(false);
        };
        let Some(booking) = self.bookings.get_mut(&id) else {
            return Ok(false);
        };
        booking.record.set(field, value);

        debug!(booking_id = %id, field, "booking amended");
        Ok(true)
    }

    /// Fill level of a bucket.
    #[must_use]
    pub fn occupancy(&self, bucket: &BucketKey) -> Option<Occupancy> {
        let slot = self.catalog.index_of(bucket)?;
        let capacity = self.catalog.get(bucket)?.capacity;
        let booked = self.lanes.get(slot).map_or(0, Vec::len);
        Some(Occupancy {
            booked: u32::try_from(booked).unwrap_or(capacity),
            capacity,
        })
    }

    /// Every bucket with its fill level, in catalog order.
    #[must_use]
    pub fn occupancy_report(&self) -> Vec<(&Bucket, Occupancy)> {
        self.catalog
            .iter()
            .zip(&self.lanes)
            .map(|(bucket, lane)| {
                let occupancy = Occupancy {
                    booked: u32::try_from(lane.len()).unwrap_or(bucket.capacity),
                    capacity: bucket.capacity,
                };
                (bucket, occupancy)
            })
            .collect()
    }

    /// Live bookings of a bucket in arrival order; `None` for an unknown bucket.
    #[must_use]
    pub fn bookings_in(&self, bucket: &BucketKey) -> Option<Vec<&Booking>> {
        let lane = self
            .catalog
            .index_of(bucket)
            .and_then(|slot| self.lanes.get(slot))?;
        Some(lane.iter().filter_map(|id| self.bookings.get(id)).collect())
    }

    /// Buckets with their capacity and attributes, in catalog order.
    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.catalog.iter()
    }

    /// Catalog this ledger books against.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Schema records are checked against.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of live bookings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    /// Whether the ledger holds no live bookings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    fn resolve(&self, locator: &Locator) -> Option<BookingId> {
        match (locator, self.schema.lookup()) {
            (Locator::Id(id), _) => self.bookings.contains_key(id).then(|| id.clone()),
            (Locator::Key(key), LookupBy::BookingId) => {
                let id = BookingId(key.0.clone());
                self.bookings.contains_key(&id).then_some(id)
            }
            (Locator::Key(key), LookupBy::Field(_)) => {
                self.by_key.get(key).and_then(|holders| holders.last()).cloned()
            }
        }
    }

    fn fresh_id(&mut self) -> Result<BookingId, LedgerError> {
        let mut candidate = self.ids.next_id();
        let mut attempts = 1;
        while self.issued.contains(&candidate) {
            if attempts == MAX_ID_ATTEMPTS {
                warn!(id = %candidate, attempts, "id strategy keeps repeating issued ids");
                return Err(LedgerError::IdCollision(candidate));
            }
            candidate = self.ids.next_id();
            attempts += 1;
        }
        Ok(candidate)
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Ledger")
            .field("buckets", &self.catalog.len())
            .field("bookings", &self.bookings.len())
            .field("issued", &self.issued.len())
            .finish_non_exhaustive()
    }
}
