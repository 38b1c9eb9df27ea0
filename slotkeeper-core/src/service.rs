//! High-level service facade combining all desks.
//!
//! Each desk's ledger sits behind its own mutex, so the capacity check and the append of a
//! `book` call happen under one lock even when callers share the service across threads.

use std::sync::{Mutex, MutexGuard};

use tracing::info;

use crate::catalog::Bucket;
use crate::ledger::Ledger;
use crate::model::{Booking, BookingId, BucketKey, FieldValue, Locator, Occupancy, Record};
use crate::plugin::{DeskId, DeskMeta, DeskRegistry};
use crate::ports::LedgerError;
use crate::schema::FieldSpec;

/// Public entry point for booking against any registered desk.
pub struct ReservationService {
    desks: Vec<(DeskMeta, Mutex<Ledger>)>,
}

impl ReservationService {
    /// Create a service with one empty ledger per registered desk.
    #[must_use]
    pub fn new(registry: DeskRegistry) -> Self {
        let desks = registry
            .into_profiles()
            .into_iter()
            .map(|profile| {
                let (meta, ledger) = profile.into_ledger();
                info!(desk = %meta.id, buckets = ledger.catalog().len(), "desk opened");
                (meta, Mutex::new(ledger))
            })
            .collect();
        Self { desks }
    }

    /// List all desks in registration order.
    #[must_use]
    pub fn desks(&self) -> Vec<DeskMeta> {
        self.desks.iter().map(|(meta, _)| meta.clone()).collect()
    }

    /// Book a unit of `bucket` at `desk`.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the desk is unsupported or the ledger refuses the booking.
    pub fn book(
        &self,
        desk: &DeskId,
        bucket: &BucketKey,
        record: Record,
    ) -> Result<BookingId, LedgerError> {
        self.lock(desk)?.book(bucket, record)
    }

    /// Fetch a copy of a booking.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the desk is unsupported or unavailable.
    pub fn view(&self, desk: &DeskId, locator: &Locator) -> Result<Option<Booking>, LedgerError> {
        Ok(self.lock(desk)?.view(locator).cloned())
    }

    /// Cancel a booking.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the desk is unsupported or unavailable.
    pub fn cancel(&self, desk: &DeskId, locator: &Locator) -> Result<bool, LedgerError> {
        Ok(self.lock(desk)?.cancel(locator))
    }

    /// Amend a field of a booking.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the desk is unsupported or the value is rejected.
    pub fn amend(
        &self,
        desk: &DeskId,
        locator: &Locator,
        field: &str,
        value: FieldValue,
    ) -> Result<bool, LedgerError> {
        self.lock(desk)?.amend(locator, field, value)
    }

    /// Buckets of a desk with their current fill level.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the desk is unsupported or unavailable.
    pub fn occupancy(&self, desk: &DeskId) -> Result<Vec<(Bucket, Occupancy)>, LedgerError> {
        Ok(self
            .lock(desk)?
            .occupancy_report()
            .into_iter()
            .map(|(bucket, occupancy)| (bucket.clone(), occupancy))
            .collect())
    }

    /// Field declarations a booking form for `desk` has to collect.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the desk is unsupported or unavailable.
    pub fn form(&self, desk: &DeskId) -> Result<Vec<FieldSpec>, LedgerError> {
        Ok(self.lock(desk)?.schema().fields().to_vec())
    }

    fn lock(&self, desk: &DeskId) -> Result<MutexGuard<'_, Ledger>, LedgerError> {
        let (_, ledger) = self
            .desks
            .iter()
            .find(|(meta, _)| &meta.id == desk)
            .ok_or_else(|| LedgerError::UnsupportedDesk(desk.0.clone()))?;
        ledger
            .lock()
            .map_err(|_err| LedgerError::Unavailable(desk.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;

    use super::*;
    use crate::catalog::Catalog;
    use crate::ids::{Sequential, ShortUuid};
    use crate::model::LookupKey;
    use crate::plugin::DeskProfile;
    use crate::schema::{Digits, LookupBy, Schema};

    fn desk_id() -> DeskId {
        DeskId("front".to_owned())
    }

    fn service(capacity: u32) -> ReservationService {
        let profile = DeskProfile {
            meta: DeskMeta {
                id: desk_id(),
                name: "Front desk".to_owned(),
                lookup_label: "mobile".to_owned(),
            },
            catalog: Catalog::from_capacities([("10am", capacity)]).expect("catalog is valid"),
            schema: Schema::new(
                LookupBy::Field("mobile".to_owned()),
                vec![FieldSpec::text("mobile").rule(Digits::exact(10))],
            )
            .expect("schema is valid"),
            ids: Box::new(ShortUuid),
        };
        ReservationService::new(DeskRegistry::new(vec![profile]).expect("single desk"))
    }

    #[test]
    fn last_slot_goes_to_exactly_one_caller() {
        let service = service(1);
        let bucket = BucketKey::from("10am");

        let outcomes: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|caller| {
                    let service = &service;
                    let bucket = &bucket;
                    scope.spawn(move || {
                        let record = Record::new().with("mobile", format!("900000000{caller}"));
                        service.book(&desk_id(), bucket, record)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("booking thread panicked"))
                .collect()
        });

        assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
        assert!(outcomes.iter().all(|outcome| matches!(
            outcome,
            Ok(_) | Err(LedgerError::CapacityExceeded { .. })
        )));
    }

    #[test]
    fn operations_route_to_the_named_desk() {
        let service = service(2);
        let bucket = BucketKey::from("10am");
        let id = service
            .book(&desk_id(), &bucket, Record::new().with("mobile", "9123456789"))
            .expect("room left");

        let locator = Locator::Key(LookupKey::from("9123456789"));
        let booking = service.view(&desk_id(), &locator).expect("desk exists");
        assert_eq!(booking.map(|booking| booking.id), Some(id));

        let occupancy = service.occupancy(&desk_id()).expect("desk exists");
        assert_eq!(occupancy.first().map(|(_, occ)| occ.booked), Some(1));
        assert_eq!(service.form(&desk_id()).map(|form| form.len()), Ok(1));

        assert_eq!(service.cancel(&desk_id(), &locator), Ok(true));
        assert_eq!(service.cancel(&desk_id(), &locator), Ok(false));
    }

    #[test]
    fn unknown_desk_is_an_error() {
        let service = service(1);
        let other = DeskId("nowhere".to_owned());
        assert_eq!(
            service.cancel(&other, &Locator::Id(BookingId::from("1"))),
            Err(LedgerError::UnsupportedDesk("nowhere".to_owned()))
        );
    }

    #[test]
    fn panicking_writer_leaves_desk_unavailable() {
        let explosive = |value: &FieldValue| -> Result<(), String> {
            assert_ne!(value.as_text(), Some("boom"), "rule blew up");
            Ok(())
        };
        let profile = DeskProfile {
            meta: DeskMeta {
                id: desk_id(),
                name: "Front desk".to_owned(),
                lookup_label: "id".to_owned(),
            },
            catalog: Catalog::from_capacities([("10am", 5)]).expect("catalog is valid"),
            schema: Schema::new(
                LookupBy::BookingId,
                vec![FieldSpec::text("name").rule(explosive)],
            )
            .expect("schema is valid"),
            ids: Box::new(Sequential::default()),
        };
        let registry = DeskRegistry::new(vec![profile]).expect("single desk");
        let service = ReservationService::new(registry);
        let bucket = BucketKey::from("10am");

        let id = service
            .book(&desk_id(), &bucket, Record::new().with("name", "Asha"))
            .expect("room left");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            service.book(&desk_id(), &bucket, Record::new().with("name", "boom"))
        }));
        assert!(outcome.is_err(), "the rule panics while the ledger is locked");

        let unavailable = LedgerError::Unavailable("front".to_owned());
        assert_eq!(
            service.book(&desk_id(), &bucket, Record::new().with("name", "Ravi")),
            Err(unavailable.clone())
        );
        assert_eq!(service.view(&desk_id(), &Locator::Id(id)), Err(unavailable));
    }

    #[test]
    fn duplicate_desk_ids_are_refused() {
        let profile = || DeskProfile {
            meta: DeskMeta {
                id: desk_id(),
                name: "Front desk".to_owned(),
                lookup_label: "id".to_owned(),
            },
            catalog: Catalog::from_capacities([("pool", 5)]).expect("catalog is valid"),
            schema: Schema::new(LookupBy::BookingId, Vec::new()).expect("schema is valid"),
            ids: Box::new(Sequential::default()),
        };
        assert!(matches!(
            DeskRegistry::new(vec![profile(), profile()]),
            Err(LedgerError::InvalidCatalog(_))
        ));

        let registry = DeskRegistry::new(vec![profile()]).expect("single desk");
        assert_eq!(registry.desks().len(), 1);
        assert!(registry.profile(&desk_id()).is_ok());
        assert!(registry.profile(&DeskId("nowhere".to_owned())).is_err());
    }
}
