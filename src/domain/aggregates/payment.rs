//! Payment Aggregate
//!
//! One row per attempt to pay an order phase. `PAID` is terminal; every other
//! status can be re-entered by a later gateway notification.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::order::OrderStatus;
use crate::{CommerceError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumString, strum::AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentPhase { #[default] Dp, Full }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::EnumString, strum::AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus { #[default] WaitingForPayment, Paid, Challenge, Denied, Expired, Cancelled, Failed }

impl PaymentStatus {
    /// Failed attempts that a new checkout replaces with a fresh payment row.
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Expired | Self::Cancelled | Self::Failed | Self::Denied)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub phase: PaymentPhase,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub external_id: Option<String>,
    pub payment_url: Option<String>,
    pub token: Option<String>,
    pub payment_type: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hosted payment page details returned by the gateway.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutDetails {
    pub payment_url: String,
    pub token: String,
    pub payment_type: String,
    pub expires_at: DateTime<Utc>,
}

impl CheckoutDetails {
    pub fn new(payment_url: String, token: String, payment_type: &str, expiry_hours: u32) -> Self {
        Self { payment_url, token, payment_type: payment_type.to_string(), expires_at: Utc::now() + Duration::hours(i64::from(expiry_hours)) }
    }
}

/// A verified gateway notification, already mapped to internal vocabulary.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusUpdate {
    pub status: PaymentStatus,
    pub payment_type: Option<String>,
    pub gross_amount: Decimal,
    pub received_at: DateTime<Utc>,
}

/// What a notification does to a payment and its order.
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// Payment already settled; nothing changes.
    Ignore,
    Apply(AppliedTransition),
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppliedTransition {
    pub status: PaymentStatus,
    pub payment_type: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub order_status: OrderStatus,
}

impl Payment {
    pub fn open(order_id: Uuid, phase: PaymentPhase, amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), order_id, phase, amount, status: PaymentStatus::WaitingForPayment,
            external_id: None, payment_url: None, token: None, payment_type: None,
            paid_at: None, expires_at: None, created_at: now, updated_at: now,
        }
    }

    pub fn is_paid(&self) -> bool { self.status == PaymentStatus::Paid }

    /// Amount charged at the gateway: the payment amount rounded up to a whole unit.
    pub fn gross_amount(&self) -> Result<Decimal> {
        let gross = self.amount.ceil();
        if gross <= Decimal::ZERO { return Err(CommerceError::InvalidAmount); }
        Ok(gross)
    }

    /// Decides the effect of `update` given the current order status.
    ///
    /// The amount is checked before the settled short-circuit so a forged amount
    /// is rejected even for a paid payment.
    pub fn plan(&self, order_status: OrderStatus, update: &StatusUpdate) -> Result<Transition> {
        let expected = self.gross_amount()?;
        if update.gross_amount != expected {
            return Err(CommerceError::AmountMismatch { expected, received: update.gross_amount.to_string() });
        }
        if self.is_paid() { return Ok(Transition::Ignore); }

        let paid_at = if update.status == PaymentStatus::Paid {
            self.paid_at.or(Some(update.received_at))
        } else {
            self.paid_at
        };
        Ok(Transition::Apply(AppliedTransition {
            status: update.status,
            payment_type: update.payment_type.clone().or_else(|| self.payment_type.clone()),
            paid_at,
            order_status: order_status.advance(update.status),
        }))
    }

    pub fn apply(&mut self, transition: &AppliedTransition) {
        self.status = transition.status;
        self.payment_type = transition.payment_type.clone();
        self.paid_at = transition.paid_at;
        self.updated_at = Utc::now();
    }

    pub fn record_checkout(&mut self, details: &CheckoutDetails) {
        self.external_id = Some(self.id.to_string());
        self.payment_url = Some(details.payment_url.clone());
        self.token = Some(details.token.clone());
        // A type already reported by a notification wins over the generic one.
        if self.payment_type.is_none() {
            self.payment_type = Some(details.payment_type.clone());
        }
        self.expires_at = Some(details.expires_at);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(status: PaymentStatus, gross: i64) -> StatusUpdate {
        StatusUpdate { status, payment_type: Some("bank_transfer".into()), gross_amount: Decimal::from(gross), received_at: Utc::now() }
    }

    #[test]
    fn test_gross_amount_rounds_up() {
        let p = Payment::open(Uuid::now_v7(), PaymentPhase::Dp, Decimal::new(5200001, 1));
        assert_eq!(p.gross_amount().unwrap(), Decimal::from(520_001));
        let zero = Payment::open(Uuid::now_v7(), PaymentPhase::Dp, Decimal::ZERO);
        assert!(matches!(zero.gross_amount(), Err(CommerceError::InvalidAmount)));
    }

    #[test]
    fn test_plan_settlement() {
        let p = Payment::open(Uuid::now_v7(), PaymentPhase::Dp, Decimal::from(520_000));
        let Transition::Apply(t) = p.plan(OrderStatus::PendingPayment, &update(PaymentStatus::Paid, 520_000)).unwrap() else {
            panic!("expected transition");
        };
        assert_eq!(t.status, PaymentStatus::Paid);
        assert_eq!(t.order_status, OrderStatus::Paid);
        assert!(t.paid_at.is_some());
        assert_eq!(t.payment_type.as_deref(), Some("bank_transfer"));
    }

    #[test]
    fn test_plan_ignores_paid_payment() {
        let mut p = Payment::open(Uuid::now_v7(), PaymentPhase::Dp, Decimal::from(1000));
        p.status = PaymentStatus::Paid;
        assert_eq!(p.plan(OrderStatus::Paid, &update(PaymentStatus::Cancelled, 1000)).unwrap(), Transition::Ignore);
    }

    #[test]
    fn test_plan_rejects_amount_mismatch() {
        let p = Payment::open(Uuid::now_v7(), PaymentPhase::Full, Decimal::from(1000));
        let err = p.plan(OrderStatus::PendingPayment, &update(PaymentStatus::Paid, 999)).unwrap_err();
        assert!(matches!(err, CommerceError::AmountMismatch { .. }));
    }

    #[test]
    fn test_plan_keeps_first_paid_at_and_paid_order() {
        let mut p = Payment::open(Uuid::now_v7(), PaymentPhase::Full, Decimal::from(1000));
        let first = Utc::now() - Duration::minutes(5);
        p.paid_at = Some(first);
        p.status = PaymentStatus::Challenge;
        let Transition::Apply(t) = p.plan(OrderStatus::Paid, &update(PaymentStatus::Paid, 1000)).unwrap() else {
            panic!("expected transition");
        };
        assert_eq!(t.paid_at, Some(first));
        let Transition::Apply(t) = p.plan(OrderStatus::Paid, &update(PaymentStatus::Cancelled, 1000)).unwrap() else {
            panic!("expected transition");
        };
        assert_eq!(t.order_status, OrderStatus::Paid);
    }

    #[test]
    fn test_record_checkout_keeps_reported_payment_type() {
        let details = CheckoutDetails::new("https://pay.test/t".into(), "t".into(), "SNAP", 24);
        let mut fresh = Payment::open(Uuid::now_v7(), PaymentPhase::Full, Decimal::from(1000));
        fresh.record_checkout(&details);
        assert_eq!(fresh.payment_type.as_deref(), Some("SNAP"));
        assert_eq!(fresh.external_id, Some(fresh.id.to_string()));

        let mut notified = Payment::open(Uuid::now_v7(), PaymentPhase::Full, Decimal::from(1000));
        notified.payment_type = Some("qris".into());
        notified.record_checkout(&details);
        assert_eq!(notified.payment_type.as_deref(), Some("qris"));
        assert_eq!(notified.token.as_deref(), Some("t"));
    }

    #[test]
    fn test_superseded_statuses() {
        assert!(PaymentStatus::Expired.is_superseded());
        assert!(PaymentStatus::Denied.is_superseded());
        assert!(!PaymentStatus::Challenge.is_superseded());
        assert!(!PaymentStatus::Paid.is_superseded());
        assert_eq!(PaymentStatus::WaitingForPayment.as_ref(), "WAITING_FOR_PAYMENT");
        assert_eq!("DP".parse::<PaymentPhase>().unwrap(), PaymentPhase::Dp);
    }
}
