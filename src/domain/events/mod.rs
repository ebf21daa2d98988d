//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::{OrderStatus, PaymentPhase, PaymentStatus};

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Order(OrderEvent),
    Payment(PaymentEvent),
    Design(DesignEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, user_id: i64, grand_total: Decimal },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentEvent {
    Opened { payment_id: Uuid, order_id: Uuid, phase: PaymentPhase, amount: Decimal },
    StatusChanged { payment_id: Uuid, order_id: Uuid, status: PaymentStatus, order_status: OrderStatus },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DesignEvent {
    Saved { design_id: Uuid, user_id: i64, design_code: String },
    Deleted { user_id: i64, design_code: String },
    Shared { share_id: Uuid, design_code: String },
}

impl DomainEvent {
    /// Message subject the event is published under.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order(OrderEvent::Placed { .. }) => "commerce.order.placed",
            Self::Payment(PaymentEvent::Opened { .. }) => "commerce.payment.opened",
            Self::Payment(PaymentEvent::StatusChanged { .. }) => "commerce.payment.status_changed",
            Self::Design(DesignEvent::Saved { .. }) => "commerce.design.saved",
            Self::Design(DesignEvent::Deleted { .. }) => "commerce.design.deleted",
            Self::Design(DesignEvent::Shared { .. }) => "commerce.design.shared",
        }
    }
}
