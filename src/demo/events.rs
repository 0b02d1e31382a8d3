//! Sample event library.
//!
//! `BaseEvent` is abstract; every concrete event carries a uuid that its
//! normal constructor assigns. Raw instantiation skips those constructors, so
//! the populator has to fill the uuid through the private setter.

use chrono::{DateTime, Utc};
use impl_scanner_core::{FieldType, ScanError, TypeCatalog, TypeDescriptor};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Behaviour shared by all sample events.
pub trait Event {
    fn uuid(&self) -> Uuid;

    /// Short name of the concrete event.
    fn event_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub event: &'static str,
    pub uuid: Uuid,
}

fn serialize_cause<S: Serializer>(cause: &Option<Box<dyn Event>>, s: S) -> Result<S::Ok, S::Error> {
    cause
        .as_ref()
        .map(|event| EventSummary {
            event: event.event_name(),
            uuid: event.uuid(),
        })
        .serialize(s)
}

#[derive(Debug, Default, Serialize)]
pub struct UserCreatedEvent {
    uuid: Uuid,
    pub username: String,
    pub email: String,
}

impl UserCreatedEvent {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
        }
    }
}

impl Event for UserCreatedEvent {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn event_name(&self) -> &'static str {
        "UserCreatedEvent"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Cancelled,
}

#[derive(Debug, Default, Serialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: i32,
}

#[derive(Debug, Default, Serialize)]
pub struct OrderLine {
    pub sku: String,
    pub quantity: i32,
    pub unit_price: f64,
}

#[derive(Debug, Default, Serialize)]
pub struct OrderPlacedEvent {
    uuid: Uuid,
    pub customer: String,
    pub status: OrderStatus,
    pub total: f64,
    pub placed_at: DateTime<Utc>,
    pub shipping_address: Option<Address>,
    pub lines: Vec<OrderLine>,
}

impl Event for OrderPlacedEvent {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn event_name(&self) -> &'static str {
        "OrderPlacedEvent"
    }
}

#[derive(Default, Serialize)]
pub struct AccountClosedEvent {
    uuid: Uuid,
    pub account_id: i32,
    pub reason: String,
    pub closed_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_cause")]
    pub caused_by: Option<Box<dyn Event>>,
}

impl Event for AccountClosedEvent {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn event_name(&self) -> &'static str {
        "AccountClosedEvent"
    }
}

/// Renewal of a session; `previous` points at the renewal it replaced.
#[derive(Debug, Default, Serialize)]
pub struct SessionRenewedEvent {
    uuid: Uuid,
    pub session: Uuid,
    pub renewals: i32,
    pub previous: Option<Box<SessionRenewedEvent>>,
}

impl Event for SessionRenewedEvent {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn event_name(&self) -> &'static str {
        "SessionRenewedEvent"
    }
}

#[derive(Debug, Default, Serialize)]
pub struct Transaction {
    uuid: Uuid,
    pub amount: f64,
    pub currency: String,
    pub booked_at: DateTime<Utc>,
}

impl Event for Transaction {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn event_name(&self) -> &'static str {
        "Transaction"
    }
}

#[derive(Debug, Default, Serialize)]
pub struct RefundTransaction {
    uuid: Uuid,
    pub amount: f64,
    pub original: Uuid,
    pub reasons: Vec<String>,
}

impl Event for RefundTransaction {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn event_name(&self) -> &'static str {
        "RefundTransaction"
    }
}

/// Register the sample library into `catalog`.
pub fn register(catalog: &mut TypeCatalog) -> Result<(), ScanError> {
    catalog.register_all(vec![
        TypeDescriptor::abstract_type("BaseEvent"),
        TypeDescriptor::enumeration(
            "OrderStatus",
            [
                OrderStatus::Pending,
                OrderStatus::Paid,
                OrderStatus::Shipped,
                OrderStatus::Cancelled,
            ],
        ),
        TypeDescriptor::concrete::<Address>("Address")
            .field("street", FieldType::Text, |a: &mut Address, v: String| a.street = v)
            .field("city", FieldType::Text, |a: &mut Address, v: String| a.city = v)
            .field("postal_code", FieldType::Integer, |a: &mut Address, v: i32| {
                a.postal_code = v
            })
            .build(),
        TypeDescriptor::concrete::<OrderLine>("OrderLine")
            .field("sku", FieldType::Text, |l: &mut OrderLine, v: String| l.sku = v)
            .field("quantity", FieldType::Integer, |l: &mut OrderLine, v: i32| l.quantity = v)
            .field("unit_price", FieldType::Decimal, |l: &mut OrderLine, v: f64| {
                l.unit_price = v
            })
            .build(),
    ])?;

    catalog.register(
        TypeDescriptor::concrete::<UserCreatedEvent>("UserCreatedEvent")
            .implements::<dyn Event>("BaseEvent", |e| e as Box<dyn Event>)
            .private_field("uuid", FieldType::Uuid, |e: &mut UserCreatedEvent, v: Uuid| e.uuid = v)
            .field("username", FieldType::Text, |e: &mut UserCreatedEvent, v: String| {
                e.username = v
            })
            .field("email", FieldType::Text, |e: &mut UserCreatedEvent, v: String| e.email = v),
    )?;
    catalog.register(
        TypeDescriptor::concrete::<OrderPlacedEvent>("OrderPlacedEvent")
            .implements::<dyn Event>("BaseEvent", |e| e as Box<dyn Event>)
            .private_field("uuid", FieldType::Uuid, |e: &mut OrderPlacedEvent, v: Uuid| e.uuid = v)
            .field("customer", FieldType::Text, |e: &mut OrderPlacedEvent, v: String| {
                e.customer = v
            })
            .field(
                "status",
                FieldType::enumeration("OrderStatus"),
                |e: &mut OrderPlacedEvent, v: OrderStatus| e.status = v,
            )
            .field("total", FieldType::Decimal, |e: &mut OrderPlacedEvent, v: f64| e.total = v)
            .field(
                "placed_at",
                FieldType::Timestamp,
                |e: &mut OrderPlacedEvent, v: DateTime<Utc>| e.placed_at = v,
            )
            .field(
                "shipping_address",
                FieldType::object("Address"),
                |e: &mut OrderPlacedEvent, v: Address| e.shipping_address = Some(v),
            )
            .sequence(
                "lines",
                FieldType::object("OrderLine"),
                |e: &mut OrderPlacedEvent, v: Vec<OrderLine>| e.lines = v,
            ),
    )?;
    catalog.register(
        TypeDescriptor::concrete::<AccountClosedEvent>("AccountClosedEvent")
            .implements::<dyn Event>("BaseEvent", |e| e as Box<dyn Event>)
            .private_field("uuid", FieldType::Uuid, |e: &mut AccountClosedEvent, v: Uuid| {
                e.uuid = v
            })
            .field("account_id", FieldType::Integer, |e: &mut AccountClosedEvent, v: i32| {
                e.account_id = v
            })
            .field("reason", FieldType::Text, |e: &mut AccountClosedEvent, v: String| e.reason = v)
            .field(
                "closed_at",
                FieldType::Timestamp,
                |e: &mut AccountClosedEvent, v: DateTime<Utc>| e.closed_at = v,
            )
            .field(
                "caused_by",
                FieldType::object("BaseEvent"),
                |e: &mut AccountClosedEvent, v: Box<dyn Event>| e.caused_by = Some(v),
            ),
    )?;
    catalog.register(
        TypeDescriptor::concrete::<SessionRenewedEvent>("SessionRenewedEvent")
            .implements::<dyn Event>("BaseEvent", |e| e as Box<dyn Event>)
            .private_field("uuid", FieldType::Uuid, |e: &mut SessionRenewedEvent, v: Uuid| {
                e.uuid = v
            })
            .field("session", FieldType::Uuid, |e: &mut SessionRenewedEvent, v: Uuid| e.session = v)
            .field("renewals", FieldType::Integer, |e: &mut SessionRenewedEvent, v: i32| {
                e.renewals = v
            })
            .field(
                "previous",
                FieldType::object("SessionRenewedEvent"),
                |e: &mut SessionRenewedEvent, v: SessionRenewedEvent| e.previous = Some(Box::new(v)),
            ),
    )?;
    catalog.register(
        TypeDescriptor::concrete::<Transaction>("Transaction")
            .implements::<dyn Event>("BaseEvent", |e| e as Box<dyn Event>)
            .private_field("uuid", FieldType::Uuid, |t: &mut Transaction, v: Uuid| t.uuid = v)
            .field("amount", FieldType::Decimal, |t: &mut Transaction, v: f64| t.amount = v)
            .field("currency", FieldType::Text, |t: &mut Transaction, v: String| t.currency = v)
            .field(
                "booked_at",
                FieldType::Timestamp,
                |t: &mut Transaction, v: DateTime<Utc>| t.booked_at = v,
            ),
    )?;
    catalog.register(
        TypeDescriptor::concrete::<RefundTransaction>("RefundTransaction")
            .implements::<dyn Event>("Transaction", |e| e as Box<dyn Event>)
            .implements::<dyn Event>("BaseEvent", |e| e as Box<dyn Event>)
            .private_field("uuid", FieldType::Uuid, |t: &mut RefundTransaction, v: Uuid| t.uuid = v)
            .field("amount", FieldType::Decimal, |t: &mut RefundTransaction, v: f64| t.amount = v)
            .field("original", FieldType::Uuid, |t: &mut RefundTransaction, v: Uuid| {
                t.original = v
            })
            .sequence("reasons", FieldType::Text, |t: &mut RefundTransaction, v: Vec<String>| {
                t.reasons = v
            }),
    )?;
    Ok(())
}
