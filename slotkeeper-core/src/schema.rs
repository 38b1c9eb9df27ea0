//! Record schemas: which fields a booking carries, how they are checked, and how a booking is
//! looked up again.

use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::{BookingId, FieldValue, LookupKey, Record};
use crate::ports::{FieldRule, LedgerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Value kind a field accepts.
pub enum FieldKind {
    /// [`FieldValue::Text`].
    Text,
    /// [`FieldValue::Integer`].
    Integer,
}

impl FieldKind {
    fn accepts(self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (FieldKind::Text, FieldValue::Text(_)) | (FieldKind::Integer, FieldValue::Integer(_))
        )
    }

    /// Parse user input into a value of this kind.
    ///
    /// # Errors
    ///
    /// Returns a message when an integer field receives non-numeric input.
    pub fn parse(self, input: &str) -> Result<FieldValue, String> {
        let trimmed = input.trim();
        match self {
            FieldKind::Text => Ok(FieldValue::Text(trimmed.to_owned())),
            FieldKind::Integer => trimmed
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_err| format!("expected a whole number, got {trimmed:?}")),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => formatter.write_str("text"),
            FieldKind::Integer => formatter.write_str("integer"),
        }
    }
}

/// Declaration of one record field.
#[derive(Clone)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    rules: Vec<Arc<dyn FieldRule>>,
    amendable: bool,
}

impl FieldSpec {
    /// Required text field.
    #[must_use]
    pub fn text(name: &str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// Required integer field.
    #[must_use]
    pub fn integer(name: &str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            rules: Vec::new(),
            amendable: false,
        }
    }

    /// Attach a predicate; rules run in insertion order.
    #[must_use]
    pub fn rule<R: FieldRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Allow in-place updates after booking.
    #[must_use]
    pub fn amendable(mut self) -> Self {
        self.amendable = true;
        self
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepted value kind.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether `amend` may touch this field.
    #[must_use]
    pub fn is_amendable(&self) -> bool {
        self.amendable
    }

    fn check(&self, value: &FieldValue) -> Result<(), LedgerError> {
        if !self.kind.accepts(value) {
            return Err(LedgerError::validation(
                &self.name,
                format!("expected {}", self.kind),
            ));
        }
        for rule in &self.rules {
            rule.check(value)
                .map_err(|reason| LedgerError::validation(&self.name, reason))?;
        }
        Ok(())
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("rules", &self.rules.len())
            .field("amendable", &self.amendable)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// How bookings are addressed after creation.
pub enum LookupBy {
    /// Through the value of a record field, e.g. a mobile number.
    Field(String),
    /// Through the ledger-issued booking id, e.g. a ticket or student id.
    BookingId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// What happens when a new booking reuses a lookup key that is still live.
pub enum DuplicateKeyPolicy {
    /// The newer booking takes over the key; the older one stays booked and is re-exposed if
    /// the newer one is cancelled.
    #[default]
    Replace,
    /// The new booking is refused.
    Reject,
}

/// Set of fields, their rules, and the lookup mode of a desk.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    lookup: LookupBy,
    duplicates: DuplicateKeyPolicy,
}

impl Schema {
    /// Build a schema.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidSchema`] when field names repeat, or when the lookup field
    /// is missing or declared amendable.
    pub fn new(lookup: LookupBy, fields: Vec<FieldSpec>) -> Result<Self, LedgerError> {
        let mut seen = HashSet::new();
        for spec in &fields {
            if !seen.insert(spec.name.as_str()) {
                return Err(LedgerError::InvalidSchema(format!(
                    "field {} declared twice",
                    spec.name
                )));
            }
        }

        if let LookupBy::Field(name) = &lookup {
            let spec = fields
                .iter()
                .find(|spec| &spec.name == name)
                .ok_or_else(|| {
                    LedgerError::InvalidSchema(format!("lookup field {name} is not declared"))
                })?;
            if spec.amendable {
                return Err(LedgerError::InvalidSchema(format!(
                    "lookup field {name} cannot be amendable"
                )));
            }
        }

        Ok(Self {
            fields,
            lookup,
            duplicates: DuplicateKeyPolicy::default(),
        })
    }

    /// Choose how duplicate lookup keys are handled.
    #[must_use]
    pub fn with_duplicate_policy(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Declared fields in order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Declared field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Lookup mode.
    #[must_use]
    pub fn lookup(&self) -> &LookupBy {
        &self.lookup
    }

    /// Duplicate lookup key handling.
    #[must_use]
    pub fn duplicate_policy(&self) -> DuplicateKeyPolicy {
        self.duplicates
    }

    /// Check a full record: every declared field present and valid, nothing undeclared.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] naming the first offending field.
    pub fn validate(&self, record: &Record) -> Result<(), LedgerError> {
        for spec in &self.fields {
            let value = record
                .get(&spec.name)
                .ok_or_else(|| LedgerError::validation(&spec.name, "missing"))?;
            spec.check(value)?;
        }
        if let Some((name, _)) = record.iter().find(|(name, _)| self.field(name).is_none()) {
            return Err(LedgerError::validation(name, "not part of the schema"));
        }
        Ok(())
    }

    /// Check a single replacement value for `amend`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] for undeclared or non-amendable fields and for values
    /// the field's rules reject.
    pub fn validate_amend(&self, field: &str, value: &FieldValue) -> Result<(), LedgerError> {
        let spec = self
            .field(field)
            .ok_or_else(|| LedgerError::validation(field, "not part of the schema"))?;
        if !spec.amendable {
            return Err(LedgerError::validation(field, "cannot be amended"));
        }
        spec.check(value)
    }

    /// Key under which a booking is indexed.
    #[must_use]
    pub fn lookup_key(&self, id: &BookingId, record: &Record) -> LookupKey {
        match &self.lookup {
            LookupBy::Field(name) => {
                LookupKey(record.get(name).map(ToString::to_string).unwrap_or_default())
            }
            LookupBy::BookingId => LookupKey(id.0.clone()),
        }
    }
}

/// Text made of exactly `len` ASCII digits.
#[derive(Debug, Clone, Copy)]
pub struct Digits {
    len: usize,
}

impl Digits {
    /// Require exactly `len` digits.
    #[must_use]
    pub fn exact(len: usize) -> Self {
        Self { len }
    }
}

impl FieldRule for Digits {
    fn check(&self, value: &FieldValue) -> Result<(), String> {
        let text = value.as_text().unwrap_or_default();
        if text.len() == self.len && text.bytes().all(|byte| byte.is_ascii_digit()) {
            Ok(())
        } else {
            Err(format!("must be {} digits", self.len))
        }
    }
}

/// Integer inside an inclusive range.
#[derive(Debug, Clone)]
pub struct Within {
    range: RangeInclusive<i64>,
}

impl Within {
    /// Accept values in `min..=max`.
    #[must_use]
    pub fn range(min: i64, max: i64) -> Self {
        Self { range: min..=max }
    }
}

impl FieldRule for Within {
    fn check(&self, value: &FieldValue) -> Result<(), String> {
        match value.as_integer() {
            Some(number) if self.range.contains(&number) => Ok(()),
            _ => Err(format!(
                "must be between {} and {}",
                self.range.start(),
                self.range.end()
            )),
        }
    }
}

/// Text that is not blank.
#[derive(Debug, Clone, Copy)]
pub struct NonBlank;

impl FieldRule for NonBlank {
    fn check(&self, value: &FieldValue) -> Result<(), String> {
        match value.as_text() {
            Some(text) if !text.trim().is_empty() => Ok(()),
            _ => Err("must not be blank".to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_schema() -> Schema {
        Schema::new(
            LookupBy::Field("mobile".to_owned()),
            vec![
                FieldSpec::text("name").rule(NonBlank),
                FieldSpec::integer("age").rule(Within::range(0, 120)).amendable(),
                FieldSpec::text("mobile").rule(Digits::exact(10)),
            ],
        )
        .expect("schema is valid")
    }

    #[test]
    fn accepts_complete_record() {
        let record = Record::new()
            .with("name", "Aarav")
            .with("age", 27_i64)
            .with("mobile", "9876543210");
        assert_eq!(contact_schema().validate(&record), Ok(()));
    }

    #[test]
    fn rejects_short_mobile() {
        let record = Record::new()
            .with("name", "X")
            .with("age", 30_i64)
            .with("mobile", "123");
        let err = contact_schema().validate(&record).unwrap_err();
        assert_eq!(err, LedgerError::validation("mobile", "must be 10 digits"));
    }

    #[test]
    fn rejects_missing_and_undeclared_fields() {
        let missing = Record::new().with("name", "X").with("mobile", "9876543210");
        assert!(matches!(
            contact_schema().validate(&missing),
            Err(LedgerError::Validation { field, .. }) if field == "age"
        ));

        let extra = Record::new()
            .with("name", "X")
            .with("age", 3_i64)
            .with("mobile", "9876543210")
            .with("shoe_size", 42_i64);
        assert!(matches!(
            contact_schema().validate(&extra),
            Err(LedgerError::Validation { field, .. }) if field == "shoe_size"
        ));
    }

    #[test]
    fn rejects_wrong_kind() {
        let record = Record::new()
            .with("name", "X")
            .with("age", "thirty")
            .with("mobile", "9876543210");
        assert_eq!(
            contact_schema().validate(&record),
            Err(LedgerError::validation("age", "expected integer"))
        );
    }

    #[test]
    fn amend_respects_amendable_flag() {
        let schema = contact_schema();
        assert_eq!(schema.validate_amend("age", &FieldValue::Integer(31)), Ok(()));
        assert!(schema.validate_amend("age", &FieldValue::Integer(500)).is_err());
        assert_eq!(
            schema.validate_amend("name", &"Y".into()),
            Err(LedgerError::validation("name", "cannot be amended"))
        );
    }

    #[test]
    fn lookup_field_must_exist_and_stay_fixed() {
        let missing = Schema::new(
            LookupBy::Field("mobile".to_owned()),
            vec![FieldSpec::text("name")],
        );
        assert!(matches!(missing, Err(LedgerError::InvalidSchema(_))));

        let amendable = Schema::new(
            LookupBy::Field("mobile".to_owned()),
            vec![FieldSpec::text("mobile").amendable()],
        );
        assert!(matches!(amendable, Err(LedgerError::InvalidSchema(_))));
    }

    #[test]
    fn closures_work_as_rules() {
        let schema = Schema::new(
            LookupBy::BookingId,
            vec![FieldSpec::text("code").rule(|value: &FieldValue| {
                if value.as_text().is_some_and(|text| text.starts_with('R')) {
                    Ok(())
                } else {
                    Err("must start with R".to_owned())
                }
            })],
        )
        .expect("schema is valid");
        assert!(schema.validate(&Record::new().with("code", "R12")).is_ok());
        assert!(schema.validate(&Record::new().with("code", "X12")).is_err());
    }

    #[test]
    fn integer_kind_parses_input() {
        assert_eq!(FieldKind::Integer.parse(" 12 "), Ok(FieldValue::Integer(12)));
        assert!(FieldKind::Integer.parse("twelve").is_err());
        assert_eq!(FieldKind::Text.parse(" Neha "), Ok(FieldValue::from("Neha")));
    }
}
