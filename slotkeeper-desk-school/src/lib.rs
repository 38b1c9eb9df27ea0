//! Desk implementation for school admissions.
//!
//! All students share one admissions pool. Student ids are handed out sequentially, which makes
//! them the lookup key; guardian contact and class can be updated after admission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use slotkeeper_core::{
    catalog::{Bucket, Catalog},
    ids::Sequential,
    ledger::Ledger,
    model::{Booking, BookingId, BucketKey, FieldValue, Locator, Record},
    plugin::{DeskId, DeskMeta, DeskProfile},
    ports::LedgerError,
    schema::{Digits, FieldSpec, LookupBy, NonBlank, Schema, Within},
};

const DESK_ID: &str = "school";
const POOL: &str = "admissions";

/// School layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchoolConfig {
    /// Students the school can hold.
    pub seats: u32,
    /// Id given to the first admitted student.
    pub first_student_id: u64,
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            seats: 500,
            first_student_id: 1001,
        }
    }
}

/// Build the desk profile for the school.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidCatalog`] when `seats` is zero.
pub fn desk(config: &SchoolConfig) -> Result<DeskProfile, LedgerError> {
    Ok(DeskProfile {
        meta: desk_meta(),
        catalog: Catalog::new(vec![Bucket::new(POOL, config.seats)])?,
        schema: schema()?,
        ids: Box::new(Sequential::starting_at(config.first_student_id)),
    })
}

fn desk_meta() -> DeskMeta {
    DeskMeta {
        id: DeskId(String::from(DESK_ID)),
        name: String::from("School admissions"),
        lookup_label: String::from("student id"),
    }
}

fn schema() -> Result<Schema, LedgerError> {
    Schema::new(
        LookupBy::BookingId,
        vec![
            FieldSpec::text("name").rule(NonBlank),
            FieldSpec::integer("age").rule(Within::range(5, 18)),
            FieldSpec::integer("std_class")
                .rule(Within::range(1, 12))
                .amendable(),
            FieldSpec::text("guardian_mobile")
                .rule(Digits::exact(10))
                .amendable(),
        ],
    )
}

/// An admitted student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    /// Sequential student id.
    pub student_id: BookingId,
    /// Student name.
    pub name: String,
    /// Age at admission, 5 to 18.
    pub age: i64,
    /// Current class, 1 to 12.
    pub std_class: i64,
    /// Guardian's mobile number.
    pub guardian_mobile: String,
    /// Admission time.
    pub admitted_at: DateTime<Utc>,
}

impl Student {
    fn from_booking(booking: &Booking) -> Option<Self> {
        let record = &booking.record;
        Some(Self {
            student_id: booking.id.clone(),
            name: record.text("name")?.to_owned(),
            age: record.integer("age")?,
            std_class: record.integer("std_class")?,
            guardian_mobile: record.text("guardian_mobile")?.to_owned(),
            admitted_at: booking.booked_at,
        })
    }
}

/// Student register of a single school.
#[derive(Debug)]
pub struct SchoolManagement {
    ledger: Ledger,
}

impl SchoolManagement {
    /// Open an empty register.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] when the configuration is unusable.
    pub fn new(config: &SchoolConfig) -> Result<Self, LedgerError> {
        let (_, ledger) = desk(config)?.into_ledger();
        Ok(Self { ledger })
    }

    /// Admit a student and return the new student id.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] when age, class, or guardian mobile is out of range.
    /// - [`LedgerError::CapacityExceeded`] when every seat is taken.
    pub fn admit(
        &mut self,
        name: &str,
        age: i64,
        std_class: i64,
        guardian_mobile: &str,
    ) -> Result<BookingId, LedgerError> {
        let record = Record::new()
            .with("name", name)
            .with("age", age)
            .with("std_class", std_class)
            .with("guardian_mobile", guardian_mobile);
        self.ledger.book(&BucketKey::from(POOL), record)
    }

    /// Student registered under `student_id`.
    #[must_use]
    pub fn view(&self, student_id: &BookingId) -> Option<Student> {
        self.ledger
            .view(&locate(student_id))
            .and_then(Student::from_booking)
    }

    /// Replace the guardian's mobile number.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] when `new_mobile` is not 10 digits, even if the
    /// student does not exist.
    pub fn update_mobile(
        &mut self,
        student_id: &BookingId,
        new_mobile: &str,
    ) -> Result<bool, LedgerError> {
        self.ledger.amend(
            &locate(student_id),
            "guardian_mobile",
            FieldValue::from(new_mobile),
        )
    }

    /// Move a student to another class.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] when `new_class` is outside 1 to 12.
    pub fn update_class(
        &mut self,
        student_id: &BookingId,
        new_class: i64,
    ) -> Result<bool, LedgerError> {
        self.ledger
            .amend(&locate(student_id), "std_class", FieldValue::from(new_class))
    }

    /// Remove a student, freeing their seat.
    pub fn remove(&mut self, student_id: &BookingId) -> bool {
        self.ledger.cancel(&locate(student_id))
    }

    /// Number of admitted students.
    #[must_use]
    pub fn enrolled(&self) -> usize {
        self.ledger.len()
    }
}

fn locate(student_id: &BookingId) -> Locator {
    Locator::Id(student_id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school() -> SchoolManagement {
        SchoolManagement::new(&SchoolConfig::default()).expect("default school is valid")
    }

    #[test]
    fn ids_start_at_1001_and_never_repeat() {
        let mut school = school();
        let neha = school.admit("Neha", 12, 7, "9123456789").expect("valid");
        let ravi = school.admit("Ravi", 9, 4, "9123456780").expect("valid");
        assert_eq!(neha, BookingId::from("1001"));
        assert_eq!(ravi, BookingId::from("1002"));

        assert!(school.remove(&ravi));
        let asha = school.admit("Asha", 6, 1, "9123456781").expect("valid");
        assert_eq!(asha, BookingId::from("1003"));
    }

    #[test]
    fn view_returns_admitted_fields() {
        let mut school = school();
        let id = school.admit("Neha", 12, 7, "9123456789").expect("valid");
        let student = school.view(&id).expect("admitted");
        assert_eq!(student.name, "Neha");
        assert_eq!(student.age, 12);
        assert_eq!(student.std_class, 7);
        assert_eq!(student.guardian_mobile, "9123456789");
    }

    #[test]
    fn admission_rules_are_enforced() {
        let mut school = school();
        for (age, class, mobile, field) in [
            (4, 1, "9123456789", "age"),
            (19, 1, "9123456789", "age"),
            (10, 0, "9123456789", "std_class"),
            (10, 13, "9123456789", "std_class"),
            (10, 5, "91234", "guardian_mobile"),
        ] {
            let err = school.admit("Kid", age, class, mobile).unwrap_err();
            let rejected_field = match &err {
                LedgerError::Validation { field: rejected, .. } => Some(rejected.as_str()),
                _ => None,
            };
            assert_eq!(
                rejected_field,
                Some(field),
                "expected {field} to be rejected, got {err}"
            );
        }
        assert_eq!(school.enrolled(), 0);
    }

    #[test]
    fn guardian_mobile_and_class_can_be_updated() {
        let mut school = school();
        let id = school.admit("Neha", 12, 7, "9123456789").expect("valid");

        assert_eq!(school.update_mobile(&id, "9000000000"), Ok(true));
        assert_eq!(school.update_class(&id, 8), Ok(true));
        let student = school.view(&id).expect("admitted");
        assert_eq!(student.guardian_mobile, "9000000000");
        assert_eq!(student.std_class, 8);
    }

    #[test]
    fn updates_validate_before_checking_the_student() {
        let mut school = school();
        let missing = BookingId::from("4242");
        assert!(school.update_mobile(&missing, "123").is_err());
        assert!(school.update_class(&missing, 13).is_err());
        assert_eq!(school.update_mobile(&missing, "9000000000"), Ok(false));
        assert_eq!(school.update_class(&missing, 3), Ok(false));
    }

    #[test]
    fn seats_are_limited() {
        let mut school = SchoolManagement::new(&SchoolConfig {
            seats: 1,
            ..SchoolConfig::default()
        })
        .expect("valid config");
        school.admit("Neha", 12, 7, "9123456789").expect("one seat");
        assert!(matches!(
            school.admit("Ravi", 9, 4, "9123456780"),
            Err(LedgerError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn removing_unknown_student_is_a_quiet_miss() {
        let mut school = school();
        assert!(!school.remove(&BookingId::from("1001")));
    }
}
