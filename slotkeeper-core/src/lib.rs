//! Core types and the reservation ledger shared by every Slotkeeper desk.

/// Resource buckets and the catalog that bounds them.
pub mod catalog;
/// Booking id generation strategies.
pub mod ids;
/// The capacity-constrained reservation engine.
pub mod ledger;
/// Identifiers, field values, records, and bookings.
pub mod model;
/// Registry bundling a desk's catalog, schema, and id strategy.
pub mod plugin;
/// Error type and the traits desks plug into.
pub mod ports;
/// Record schemas and the built-in field rules.
pub mod schema;
/// Thread-safe facade over one ledger per desk.
pub mod service;

pub use catalog::*;
pub use ids::*;
pub use ledger::*;
pub use model::*;
pub use plugin::*;
pub use ports::*;
pub use schema::*;
pub use service::*;
