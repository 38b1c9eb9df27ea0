//! Desk implementation for a clinic: every doctor offers a fixed set of daily slots, each slot
//! takes a handful of patients, and appointments are found again by the patient's mobile number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use slotkeeper_core::{
    catalog::{Bucket, Catalog},
    ids::ShortUuid,
    ledger::Ledger,
    model::{Booking, BookingId, BucketKey, Locator, LookupKey, Occupancy, Record},
    plugin::{DeskId, DeskMeta, DeskProfile},
    ports::LedgerError,
    schema::{Digits, FieldSpec, LookupBy, NonBlank, Schema},
};

const DESK_ID: &str = "clinic";

/// Slots offered by every doctor unless configured otherwise.
pub const DEFAULT_SLOTS: [&str; 5] = ["10am", "11am", "12pm", "2pm", "3pm"];

/// Clinic layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    /// Doctors taking appointments.
    pub doctors: Vec<String>,
    /// Daily slots, identical for every doctor.
    pub slots: Vec<String>,
    /// Patients per doctor and slot.
    pub max_per_slot: u32,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            doctors: vec!["Dr. Shah".to_owned(), "Dr. Patel".to_owned()],
            slots: DEFAULT_SLOTS.iter().map(|slot| (*slot).to_owned()).collect(),
            max_per_slot: 3,
        }
    }
}

/// Build the desk profile for the clinic.
///
/// One bucket per doctor and slot; appointment ids are short random ids.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidCatalog`] when the configuration repeats a doctor or slot or
/// sets a zero capacity.
pub fn desk(config: &ClinicConfig) -> Result<DeskProfile, LedgerError> {
    Ok(DeskProfile {
        meta: desk_meta(),
        catalog: catalog(config)?,
        schema: schema()?,
        ids: Box::new(ShortUuid),
    })
}

fn desk_meta() -> DeskMeta {
    DeskMeta {
        id: DeskId(String::from(DESK_ID)),
        name: String::from("Clinic appointments"),
        lookup_label: String::from("mobile"),
    }
}

fn catalog(config: &ClinicConfig) -> Result<Catalog, LedgerError> {
    let buckets = config
        .doctors
        .iter()
        .flat_map(|doctor| {
            config.slots.iter().map(move |slot| {
                Bucket::new(BucketKey::compound(doctor, slot), config.max_per_slot)
                    .with_attribute("doctor", doctor.as_str())
                    .with_attribute("slot", slot.as_str())
            })
        })
        .collect();
    Catalog::new(buckets)
}

fn schema() -> Result<Schema, LedgerError> {
    Schema::new(
        LookupBy::Field("mobile".to_owned()),
        vec![
            FieldSpec::text("name").rule(NonBlank),
            FieldSpec::integer("age"),
            FieldSpec::text("mobile").rule(Digits::exact(10)),
        ],
    )
}

/// A booked appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
    /// Appointment id.
    pub appt_id: BookingId,
    /// Patient name.
    pub name: String,
    /// Patient age.
    pub age: i64,
    /// Patient mobile number, also the lookup key.
    pub mobile: String,
    /// Doctor seen.
    pub doctor: String,
    /// Slot booked.
    pub slot: String,
    /// When the appointment was made.
    pub booked_at: DateTime<Utc>,
}

impl Appointment {
    fn from_booking(booking: &Booking) -> Option<Self> {
        let record = &booking.record;
        Some(Self {
            appt_id: booking.id.clone(),
            name: record.text("name")?.to_owned(),
            age: record.integer("age")?,
            mobile: record.text("mobile")?.to_owned(),
            doctor: record.text("doctor")?.to_owned(),
            slot: record.text("slot")?.to_owned(),
            booked_at: booking.booked_at,
        })
    }
}

/// Appointment book for a single clinic.
#[derive(Debug)]
pub struct ClinicAppointment {
    ledger: Ledger,
}

impl ClinicAppointment {
    /// Open an empty appointment book.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] when the configuration is unusable.
    pub fn new(config: &ClinicConfig) -> Result<Self, LedgerError> {
        let (_, ledger) = desk(config)?.into_ledger();
        Ok(Self { ledger })
    }

    /// Book `doctor` at `slot` for a patient.
    ///
    /// Booking again with the same mobile number points the number at the newer appointment.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UnknownResource`] for an unknown doctor or slot.
    /// - [`LedgerError::Validation`] when the mobile number is not 10 digits.
    /// - [`LedgerError::CapacityExceeded`] when the slot is full.
    pub fn book(
        &mut self,
        name: &str,
        age: i64,
        mobile: &str,
        doctor: &str,
        slot: &str,
    ) -> Result<BookingId, LedgerError> {
        let record = Record::new()
            .with("name", name)
            .with("age", age)
            .with("mobile", mobile);
        self.ledger.book(&BucketKey::compound(doctor, slot), record)
    }

    /// Appointment currently registered for `mobile`.
    #[must_use]
    pub fn view(&self, mobile: &str) -> Option<Appointment> {
        self.ledger
            .view(&locate(mobile))
            .and_then(Appointment::from_booking)
    }

    /// Cancel the appointment registered for `mobile`.
    pub fn cancel(&mut self, mobile: &str) -> bool {
        self.ledger.cancel(&locate(mobile))
    }

    /// Fill level of one doctor's slot.
    #[must_use]
    pub fn occupancy(&self, doctor: &str, slot: &str) -> Option<Occupancy> {
        self.ledger.occupancy(&BucketKey::compound(doctor, slot))
    }
}

fn locate(mobile: &str) -> Locator {
    Locator::Key(LookupKey::from(mobile))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clinic() -> ClinicAppointment {
        ClinicAppointment::new(&ClinicConfig::default()).expect("default clinic is valid")
    }

    #[test]
    fn books_and_finds_by_mobile() {
        let mut clinic = clinic();
        let id = clinic
            .book("Aarav", 27, "9876543210", "Dr. Shah", "10am")
            .expect("slot is free");

        let appointment = clinic.view("9876543210").expect("appointment is indexed");
        assert_eq!(appointment.appt_id, id);
        assert_eq!(appointment.name, "Aarav");
        assert_eq!(appointment.age, 27);
        assert_eq!(appointment.doctor, "Dr. Shah");
        assert_eq!(appointment.slot, "10am");
        assert_eq!(id.0.len(), 8);
    }

    #[test]
    fn slot_takes_three_patients() {
        let mut clinic = clinic();
        for mobile in ["9000000001", "9000000002", "9000000003"] {
            clinic
                .book("P", 40, mobile, "Dr. Patel", "2pm")
                .expect("slot has room");
        }
        let err = clinic
            .book("P", 40, "9000000004", "Dr. Patel", "2pm")
            .unwrap_err();
        assert!(matches!(err, LedgerError::CapacityExceeded { capacity: 3, .. }));

        // The same slot with the other doctor is a separate bucket.
        assert!(clinic.book("P", 40, "9000000004", "Dr. Shah", "2pm").is_ok());
    }

    #[test]
    fn unknown_doctor_or_slot_is_refused() {
        let mut clinic = clinic();
        assert!(matches!(
            clinic.book("P", 40, "9000000001", "Dr. Who", "10am"),
            Err(LedgerError::UnknownResource(_))
        ));
        assert!(matches!(
            clinic.book("P", 40, "9000000001", "Dr. Shah", "9pm"),
            Err(LedgerError::UnknownResource(_))
        ));
    }

    #[test]
    fn short_mobile_books_nothing() {
        let mut clinic = clinic();
        let err = clinic.book("X", 30, "123", "Dr. Shah", "10am").unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field, .. } if field == "mobile"));
        assert_eq!(
            clinic.occupancy("Dr. Shah", "10am").map(|occ| occ.booked),
            Some(0)
        );
    }

    #[test]
    fn cancel_frees_the_slot() {
        let mut clinic = clinic();
        clinic
            .book("Aarav", 27, "9876543210", "Dr. Shah", "10am")
            .expect("slot is free");

        assert!(clinic.cancel("9876543210"));
        assert!(!clinic.cancel("9876543210"));
        assert!(clinic.view("9876543210").is_none());
        assert_eq!(
            clinic.occupancy("Dr. Shah", "10am").map(|occ| occ.booked),
            Some(0)
        );
    }

    #[test]
    fn rebooking_same_mobile_points_at_latest() {
        let mut clinic = clinic();
        clinic
            .book("Aarav", 27, "9876543210", "Dr. Shah", "10am")
            .expect("slot is free");
        clinic
            .book("Aarav", 27, "9876543210", "Dr. Shah", "10am")
            .expect("slot has room");

        let latest = clinic.view("9876543210").expect("indexed");
        assert_eq!(
            clinic.occupancy("Dr. Shah", "10am").map(|occ| occ.booked),
            Some(2)
        );
        assert!(clinic.cancel("9876543210"));
        let earlier = clinic.view("9876543210").expect("older appointment remains");
        assert_ne!(earlier.appt_id, latest.appt_id);
    }
}
