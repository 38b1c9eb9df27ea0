//! Desk implementation for bus ticketing: each route is a bucket with a fixed number of seats and
//! a fare. Tickets carry a seat number taken from the route's current load and are found again by
//! ticket id.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use slotkeeper_core::{
    catalog::{Bucket, Catalog},
    ids::ShortUuid,
    ledger::Ledger,
    model::{Booking, BookingId, BucketKey, Locator, Record},
    plugin::{DeskId, DeskMeta, DeskProfile},
    ports::LedgerError,
    schema::{Digits, FieldSpec, LookupBy, NonBlank, Schema},
};

const DESK_ID: &str = "bus";
const PRICE: &str = "price";

/// A route and its fare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Route name, e.g. "Mumbai to Pune".
    pub name: String,
    /// Fare per seat.
    pub price: i64,
}

/// Bus network layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Seats per route.
    pub capacity: u32,
    /// Routes on sale.
    pub routes: Vec<RouteConfig>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: 40,
            routes: vec![
                RouteConfig {
                    name: "Mumbai to Pune".to_owned(),
                    price: 500,
                },
                RouteConfig {
                    name: "Delhi to Jaipur".to_owned(),
                    price: 600,
                },
            ],
        }
    }
}

/// Build the desk profile for bus ticketing.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidCatalog`] when a route is listed twice or the capacity is zero.
pub fn desk(config: &BusConfig) -> Result<DeskProfile, LedgerError> {
    let routes = config
        .routes
        .iter()
        .map(|route| {
            Bucket::new(route.name.as_str(), config.capacity).with_attribute(PRICE, route.price)
        })
        .collect();

    Ok(DeskProfile {
        meta: desk_meta(),
        catalog: Catalog::new(routes)?,
        schema: schema()?,
        ids: Box::new(ShortUuid),
    })
}

fn desk_meta() -> DeskMeta {
    DeskMeta {
        id: DeskId(String::from(DESK_ID)),
        name: String::from("Bus reservations"),
        lookup_label: String::from("ticket id"),
    }
}

fn schema() -> Result<Schema, LedgerError> {
    Schema::new(
        LookupBy::BookingId,
        vec![
            FieldSpec::text("name").rule(NonBlank),
            FieldSpec::integer("age"),
            FieldSpec::text("mobile").rule(Digits::exact(10)),
        ],
    )
}

/// A sold ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    /// Ticket id.
    pub ticket_id: BookingId,
    /// Passenger name.
    pub name: String,
    /// Passenger age.
    pub age: i64,
    /// Passenger mobile number.
    pub mobile: String,
    /// Route travelled.
    pub route: String,
    /// Seat number assigned at booking time: the route's live load plus one.
    ///
    /// Seats are not renumbered on cancellation, so after one a later ticket can carry the
    /// same seat number as a ticket that is still live.
    pub seat_no: u32,
    /// Fare paid.
    pub price: i64,
    /// When the ticket was sold.
    pub booked_at: DateTime<Utc>,
}

impl Ticket {
    fn from_booking(booking: &Booking) -> Option<Self> {
        let record = &booking.record;
        Some(Self {
            ticket_id: booking.id.clone(),
            name: record.text("name")?.to_owned(),
            age: record.integer("age")?,
            mobile: record.text("mobile")?.to_owned(),
            route: booking.bucket.0.clone(),
            seat_no: booking.position,
            price: record.integer(PRICE)?,
            booked_at: booking.booked_at,
        })
    }
}

/// Ticket office for a bus operator.
#[derive(Debug)]
pub struct BusReservation {
    ledger: Ledger,
}

impl BusReservation {
    /// Open a ticket office with no seats sold.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] when the configuration is unusable.
    pub fn new(config: &BusConfig) -> Result<Self, LedgerError> {
        let (_, ledger) = desk(config)?.into_ledger();
        Ok(Self { ledger })
    }

    /// Routes on sale with their fares.
    #[must_use]
    pub fn available_routes(&self) -> BTreeMap<String, i64> {
        self.ledger
            .catalog()
            .iter()
            .filter_map(|route| {
                let price = route.attributes.integer(PRICE)?;
                Some((route.key.0.clone(), price))
            })
            .collect()
    }

    /// Sell a seat on `route`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UnknownResource`] for a route that is not on sale.
    /// - [`LedgerError::Validation`] when the mobile number is not 10 digits.
    /// - [`LedgerError::CapacityExceeded`] when the bus is full.
    pub fn book(
        &mut self,
        name: &str,
        age: i64,
        mobile: &str,
        route: &str,
    ) -> Result<BookingId, LedgerError> {
        let record = Record::new()
            .with("name", name)
            .with("age", age)
            .with("mobile", mobile);
        self.ledger.book(&BucketKey::from(route), record)
    }

    /// Ticket sold under `ticket_id`.
    #[must_use]
    pub fn view(&self, ticket_id: &BookingId) -> Option<Ticket> {
        self.ledger
            .view(&Locator::Id(ticket_id.clone()))
            .and_then(Ticket::from_booking)
    }

    /// Cancel a ticket, freeing its seat for the next passenger.
    pub fn cancel(&mut self, ticket_id: &BookingId) -> bool {
        self.ledger.cancel(&Locator::Id(ticket_id.clone()))
    }

    /// Unsold seats on `route`.
    #[must_use]
    pub fn seats_left(&self, route: &str) -> Option<u32> {
        self.ledger
            .occupancy(&BucketKey::from(route))
            .map(|occupancy| occupancy.available())
    }
}
