//! Registry for all desks and the pieces each one supplies.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::ledger::Ledger;
use crate::ports::{IdStrategy, LedgerError};
use crate::schema::Schema;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a desk known to slotkeeper.
pub struct DeskId(pub String);

impl fmt::Display for DeskId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Metadata describing a desk and its human-friendly name.
pub struct DeskMeta {
    /// Unique identifier.
    pub id: DeskId,
    /// Display name.
    pub name: String,
    /// What a lookup key is called at this desk, e.g. "mobile" or "ticket id".
    pub lookup_label: String,
}

/// Everything a ledger needs for one domain.
pub struct DeskProfile {
    /// Static metadata describing the desk.
    pub meta: DeskMeta,
    /// Buckets and their ceilings.
    pub catalog: Catalog,
    /// Record fields and lookup mode.
    pub schema: Schema,
    /// Booking id generator.
    pub ids: Box<dyn IdStrategy>,
}

impl DeskProfile {
    /// Turn the profile into an empty ledger, keeping the metadata.
    #[must_use]
    pub fn into_ledger(self) -> (DeskMeta, Ledger) {
        let ledger = Ledger::with_boxed_ids(self.catalog, self.schema, self.ids);
        (self.meta, ledger)
    }
}

impl fmt::Debug for DeskProfile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DeskProfile")
            .field("meta", &self.meta)
            .field("catalog", &self.catalog)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Registry that resolves desk profiles by identifier, keeping registration order.
pub struct DeskRegistry {
    profiles: Vec<DeskProfile>,
}

impl DeskRegistry {
    /// Build a registry from the provided profiles.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidCatalog`] when two profiles share an id.
    pub fn new(profiles: Vec<DeskProfile>) -> Result<Self, LedgerError> {
        let mut seen = HashSet::with_capacity(profiles.len());
        for profile in &profiles {
            if !seen.insert(profile.meta.id.clone()) {
                return Err(LedgerError::InvalidCatalog(format!(
                    "desk {} registered twice",
                    profile.meta.id
                )));
            }
        }
        Ok(Self { profiles })
    }

    /// Return metadata for all registered desks.
    #[must_use]
    pub fn desks(&self) -> Vec<DeskMeta> {
        self.profiles
            .iter()
            .map(|profile| profile.meta.clone())
            .collect()
    }

    /// Look up a profile for the given desk.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnsupportedDesk`] when no profile is registered.
    pub fn profile(&self, desk: &DeskId) -> Result<&DeskProfile, LedgerError> {
        self.profiles
            .iter()
            .find(|profile| &profile.meta.id == desk)
            .ok_or_else(|| LedgerError::UnsupportedDesk(desk.0.clone()))
    }

    pub(crate) fn into_profiles(self) -> Vec<DeskProfile> {
        self.profiles
    }
}
