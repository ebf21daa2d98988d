//! Custom Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::account::AddressSnapshot;
use crate::domain::aggregates::payment::PaymentStatus;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::CatalogId;
use crate::{CommerceError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::EnumString, strum::AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType { Pickup, Delivery }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::EnumString, strum::AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus { #[default] PendingPayment, Paid, Cancelled }

impl OrderStatus {
    /// Order status implied by a payment status, ignoring the current order state.
    pub fn following(payment: PaymentStatus) -> Self {
        match payment {
            PaymentStatus::Paid => Self::Paid,
            PaymentStatus::Cancelled | PaymentStatus::Denied | PaymentStatus::Failed => Self::Cancelled,
            PaymentStatus::Expired | PaymentStatus::WaitingForPayment | PaymentStatus::Challenge => Self::PendingPayment,
        }
    }

    /// Next status after a payment transition. `Paid` is terminal.
    pub fn advance(self, payment: PaymentStatus) -> Self {
        if self == Self::Paid { Self::Paid } else { Self::following(payment) }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedComponent {
    pub component_id: CatalogId,
    pub name: String,
    pub quantity: u32,
    pub locked_price_per_unit: Decimal,
    pub locked_sub_total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedOrderItem {
    /// Nil until the order is placed.
    pub id: Uuid,
    pub instance_id: String,
    pub product_base_id: CatalogId,
    pub product_name: String,
    pub material_id: Option<CatalogId>,
    pub material_name: Option<String>,
    pub locked_base_price: Decimal,
    pub locked_material_price: Decimal,
    pub item_total_price: Decimal,
    pub item_weight: Decimal,
    pub components: Vec<LockedComponent>,
}

/// Output of a pricing pass: every item locked at current catalog prices.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub locked_items: Vec<LockedOrderItem>,
    pub subtotal_price: Decimal,
    pub total_weight: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: i64,
    pub user_design_id: Option<Uuid>,
    pub design_snapshot: serde_json::Value,
    pub address_id: i64,
    pub address_snapshot: AddressSnapshot,
    pub delivery_type: DeliveryType,
    pub subtotal_price: Decimal,
    /// Grams, rounded up.
    pub total_weight: i64,
    pub delivery_fee: Decimal,
    pub delivery_distance: Option<f64>,
    pub grand_total_price: Decimal,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub items: Vec<LockedOrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Everything resolved before an order can be placed.
#[derive(Clone, Debug)]
pub struct NewOrder {
    pub user_id: i64,
    pub user_design_id: Option<Uuid>,
    pub design_snapshot: serde_json::Value,
    pub address_id: i64,
    pub address_snapshot: AddressSnapshot,
    pub delivery_type: DeliveryType,
    pub pricing: PriceSnapshot,
    pub delivery_fee: Decimal,
    pub delivery_distance: Option<f64>,
    pub notes: Option<String>,
}

impl Order {
    /// Builds a `PENDING_PAYMENT` order whose totals are fixed from here on.
    pub fn place(new: NewOrder) -> Result<(Self, DomainEvent)> {
        let total_weight = new.pricing.total_weight.ceil().to_i64()
            .filter(|w| *w > 0)
            .ok_or_else(|| CommerceError::InvalidPricing(format!("total weight {} is not positive", new.pricing.total_weight)))?;
        if new.delivery_fee.is_sign_negative() {
            return Err(CommerceError::InvalidPricing("delivery fee is negative".into()));
        }

        let mut items = new.pricing.locked_items;
        for item in &mut items {
            item.id = Uuid::now_v7();
        }

        let now = Utc::now();
        let order = Self {
            id: Uuid::now_v7(),
            user_id: new.user_id,
            user_design_id: new.user_design_id,
            design_snapshot: new.design_snapshot,
            address_id: new.address_id,
            address_snapshot: new.address_snapshot,
            delivery_type: new.delivery_type,
            subtotal_price: new.pricing.subtotal_price,
            total_weight,
            delivery_fee: new.delivery_fee,
            delivery_distance: new.delivery_distance,
            grand_total_price: new.pricing.subtotal_price + new.delivery_fee,
            status: OrderStatus::PendingPayment,
            notes: new.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            items,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let event = DomainEvent::Order(OrderEvent::Placed {
            order_id: order.id,
            user_id: order.user_id,
            grand_total: order.grand_total_price,
        });
        Ok((order, event))
    }

    pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_order(subtotal: i64, weight: Decimal, fee: i64) -> NewOrder {
        NewOrder {
            user_id: 7, user_design_id: None, design_snapshot: json!({"mainModels": []}),
            address_id: 3, address_snapshot: AddressSnapshot::default(), delivery_type: DeliveryType::Delivery,
            pricing: PriceSnapshot { locked_items: vec![], subtotal_price: Decimal::from(subtotal), total_weight: weight },
            delivery_fee: Decimal::from(fee), delivery_distance: Some(4.2), notes: Some("  leave at gate ".into()),
        }
    }

    #[test]
    fn test_place_fixes_totals() {
        let (order, event) = Order::place(new_order(500_000, Decimal::new(50005, 1), 20_000)).unwrap();
        assert_eq!(order.grand_total_price, Decimal::from(520_000));
        assert_eq!(order.total_weight, 5001);
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.notes.as_deref(), Some("leave at gate"));
        assert!(matches!(event, DomainEvent::Order(OrderEvent::Placed { .. })));
    }

    #[test]
    fn test_zero_weight_rejected() {
        let err = Order::place(new_order(100, Decimal::ZERO, 0)).unwrap_err();
        assert!(matches!(err, CommerceError::InvalidPricing(_)));
    }

    #[test]
    fn test_order_status_never_leaves_paid() {
        assert_eq!(OrderStatus::PendingPayment.advance(PaymentStatus::Paid), OrderStatus::Paid);
        assert_eq!(OrderStatus::Paid.advance(PaymentStatus::Cancelled), OrderStatus::Paid);
        assert_eq!(OrderStatus::Cancelled.advance(PaymentStatus::WaitingForPayment), OrderStatus::PendingPayment);
        assert_eq!(OrderStatus::PendingPayment.advance(PaymentStatus::Denied), OrderStatus::Cancelled);
        assert_eq!(OrderStatus::PendingPayment.advance(PaymentStatus::Expired), OrderStatus::PendingPayment);
        assert_eq!(OrderStatus::PendingPayment.advance(PaymentStatus::Challenge), OrderStatus::PendingPayment);
    }

    #[test]
    fn test_status_text_round_trip() {
        assert_eq!(OrderStatus::PendingPayment.as_ref(), "PENDING_PAYMENT");
        assert_eq!("PAID".parse::<OrderStatus>().unwrap(), OrderStatus::Paid);
        assert_eq!(DeliveryType::Pickup.as_ref(), "PICKUP");
    }
}
