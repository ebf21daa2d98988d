//! Payment gateway adapter: hosted payment page requests, webhook signature
//! verification and status vocabulary mapping.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use crate::domain::aggregates::{Account, Order, PaymentStatus};
use crate::Result;

pub const PAYMENT_TYPE_SNAP: &str = "SNAP";
const MAX_ITEM_NAME_LEN: usize = 50;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransactionRequest {
    pub transaction_details: TransactionDetails,
    pub customer_details: CustomerDetails,
    pub item_details: Vec<LineItem>,
    pub expiry: Expiry,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransactionDetails {
    /// Our payment id; the gateway echoes it back as `order_id` in webhooks.
    pub order_id: String,
    pub gross_amount: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl From<&Account> for CustomerDetails {
    fn from(a: &Account) -> Self {
        Self {
            first_name: a.first_name.clone(),
            last_name: a.last_name.clone(),
            email: a.email.clone(),
            phone: a.phone_number.clone().unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub id: String,
    pub price: i64,
    pub quantity: u32,
    pub name: String,
}

impl LineItem {
    fn new(id: impl Into<String>, name: &str, price: Decimal, quantity: u32) -> Self {
        Self {
            id: id.into(),
            price: price.round().to_i64().unwrap_or(0),
            quantity,
            name: name.chars().take(MAX_ITEM_NAME_LEN).collect(),
        }
    }

    fn total(&self) -> i64 { self.price * i64::from(self.quantity) }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Expiry {
    pub unit: &'static str,
    pub duration: u32,
}

impl Expiry {
    pub fn hours(duration: u32) -> Self { Self { unit: "hour", duration } }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TransactionResponse {
    pub token: String,
    pub redirect_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_transaction(&self, request: &TransactionRequest) -> Result<TransactionResponse>;
}

/// Itemises a locked order so the lines sum exactly to `gross_amount`.
///
/// Rounding leftovers are folded into the last single-quantity line that can
/// absorb them, otherwise into an explicit adjustment line.
pub fn build_line_items(order: &Order, gross_amount: i64) -> Vec<LineItem> {
    let mut lines = Vec::new();
    for item in &order.items {
        lines.push(LineItem::new(item.product_base_id.as_str(), &item.product_name, item.locked_base_price, 1));
        if let (Some(id), true) = (&item.material_id, item.locked_material_price > Decimal::ZERO) {
            let name = item.material_name.as_deref().unwrap_or("Material");
            lines.push(LineItem::new(id.as_str(), name, item.locked_material_price, 1));
        }
        for c in item.components.iter().filter(|c| c.locked_price_per_unit > Decimal::ZERO) {
            lines.push(LineItem::new(c.component_id.as_str(), &c.name, c.locked_price_per_unit, c.quantity));
        }
    }
    if order.delivery_fee > Decimal::ZERO {
        lines.push(LineItem::new("DELIVERY", "Delivery fee", order.delivery_fee, 1));
    }

    let diff = gross_amount - lines.iter().map(LineItem::total).sum::<i64>();
    if diff != 0 {
        match lines.iter_mut().rev().find(|l| l.quantity == 1 && l.price + diff >= 0) {
            Some(line) => line.price += diff,
            None => lines.push(LineItem { id: "ADJUSTMENT".into(), price: diff, quantity: 1, name: "Rounding adjustment".into() }),
        }
    }
    lines
}

/// Verifies `sha512(order_id + status_code + gross_amount + server_key)` signatures.
#[derive(Clone)]
pub struct SignatureVerifier {
    server_key: String,
}

impl SignatureVerifier {
    pub fn new(server_key: impl Into<String>) -> Self { Self { server_key: server_key.into() } }

    pub fn sign(&self, order_id: &str, status_code: &str, gross_amount: &str) -> String {
        let mut hasher = Sha512::new();
        hasher.update(order_id.as_bytes());
        hasher.update(status_code.as_bytes());
        hasher.update(gross_amount.as_bytes());
        hasher.update(self.server_key.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn verify(&self, order_id: &str, status_code: &str, gross_amount: &str, signature: &str) -> bool {
        constant_time_eq(&self.sign(order_id, status_code, gross_amount), signature)
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() { return false; }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) { res |= x ^ y; }
    res == 0
}

/// Maps gateway `transaction_status`/`fraud_status` to our payment status.
pub fn map_transaction_status(transaction_status: &str, fraud_status: Option<&str>) -> PaymentStatus {
    match transaction_status {
        "capture" if fraud_status == Some("challenge") => PaymentStatus::Challenge,
        "capture" | "settlement" => PaymentStatus::Paid,
        "pending" => PaymentStatus::WaitingForPayment,
        "deny" => PaymentStatus::Denied,
        "expire" => PaymentStatus::Expired,
        "cancel" => PaymentStatus::Cancelled,
        "failure" | "refund" | "partial_refund" | "chargeback" | "partial_chargeback" => PaymentStatus::Failed,
        _ => PaymentStatus::WaitingForPayment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{AddressSnapshot, DeliveryType, LockedComponent, LockedOrderItem, NewOrder, PriceSnapshot};
    use crate::domain::value_objects::CatalogId;
    use uuid::Uuid;

    #[test]
    fn test_signature() {
        let verifier = SignatureVerifier::new("SB-Mid-server-TEST");
        let expected = "9cc1745e727d2f771e707d908b224abc29302e2f7a5cefa151ab1c73ad987493b393da82d6e9588442c61860fce6c812d15357f685b2ea649501a38c4c3905db";
        let order_id = "3f2c8a1e-0000-7000-8000-000000000001";
        assert_eq!(verifier.sign(order_id, "200", "52000.00"), expected);
        assert!(verifier.verify(order_id, "200", "52000.00", expected));
        assert!(!verifier.verify(order_id, "200", "52001.00", expected));
        assert!(!verifier.verify(order_id, "200", "52000.00", &expected[1..]));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_transaction_status("capture", Some("challenge")), PaymentStatus::Challenge);
        assert_eq!(map_transaction_status("capture", Some("accept")), PaymentStatus::Paid);
        assert_eq!(map_transaction_status("settlement", None), PaymentStatus::Paid);
        assert_eq!(map_transaction_status("pending", None), PaymentStatus::WaitingForPayment);
        assert_eq!(map_transaction_status("deny", None), PaymentStatus::Denied);
        assert_eq!(map_transaction_status("expire", None), PaymentStatus::Expired);
        assert_eq!(map_transaction_status("cancel", None), PaymentStatus::Cancelled);
        assert_eq!(map_transaction_status("partial_chargeback", None), PaymentStatus::Failed);
        assert_eq!(map_transaction_status("authorize", None), PaymentStatus::WaitingForPayment);
    }

    fn order(base: Decimal, material: Decimal, component: Decimal, quantity: u32, fee: Decimal) -> Order {
        let item = LockedOrderItem {
            id: Uuid::nil(), instance_id: "sofa_1".into(), product_base_id: CatalogId::new("sofa"),
            product_name: "Luxury Velvet Sofa with an unreasonably long marketing name attached".into(),
            material_id: Some(CatalogId::new("velvet")), material_name: Some("Velvet".into()),
            locked_base_price: base, locked_material_price: material,
            item_total_price: base + material + component * Decimal::from(quantity), item_weight: Decimal::from(70),
            components: vec![LockedComponent {
                component_id: CatalogId::new("cushion"), name: "Cushion".into(), quantity,
                locked_price_per_unit: component, locked_sub_total: component * Decimal::from(quantity),
            }],
        };
        let subtotal = item.item_total_price;
        Order::place(NewOrder {
            user_id: 1, user_design_id: None, design_snapshot: serde_json::json!({}), address_id: 1,
            address_snapshot: AddressSnapshot::default(), delivery_type: DeliveryType::Delivery,
            pricing: PriceSnapshot { locked_items: vec![item], subtotal_price: subtotal, total_weight: Decimal::from(70) },
            delivery_fee: fee, delivery_distance: None, notes: None,
        }).unwrap().0
    }

    #[test]
    fn test_line_items_sum_to_gross() {
        let o = order(Decimal::from(8_900_000), Decimal::from(250_000), Decimal::from(45_000), 2, Decimal::from(20_000));
        let gross = o.grand_total_price.ceil().to_i64().unwrap();
        let lines = build_line_items(&o, gross);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines.iter().map(LineItem::total).sum::<i64>(), gross);
        assert_eq!(lines[0].name.chars().count(), 50);
        assert_eq!(lines[2].quantity, 2);
        assert_eq!(lines[3].id, "DELIVERY");
    }

    #[test]
    fn test_rounding_residual_folded() {
        // 1000.4 + 10.3 = 1010.7 -> gross 1011; lines round to 1000 + 10 = 1010
        let o = order(Decimal::new(10004, 1), Decimal::ZERO, Decimal::ZERO, 1, Decimal::new(103, 1));
        let gross = o.grand_total_price.ceil().to_i64().unwrap();
        let lines = build_line_items(&o, gross);
        assert_eq!(lines.iter().map(LineItem::total).sum::<i64>(), 1011);
        assert_eq!(lines.last().unwrap().price, 11);
    }

    #[test]
    fn test_adjustment_line_when_nothing_absorbs() {
        let o = order(Decimal::from(100), Decimal::ZERO, Decimal::new(333, 1), 3, Decimal::ZERO);
        // 100 + 3 * 33.3 = 199.9 -> gross 200; lines: 100 + 3 * 33 = 199, base line absorbs +1
        let lines = build_line_items(&o, 200);
        assert_eq!(lines.iter().map(LineItem::total).sum::<i64>(), 200);
        let lines = build_line_items(&o, -1);
        assert_eq!(lines.last().unwrap().id, "ADJUSTMENT");
    }
}
