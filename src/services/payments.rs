//! Hosted payment transactions and webhook reconciliation.

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use crate::config::GatewayConfig;
use crate::domain::aggregates::{
    CheckoutDetails, OrderStatus, Payment, PaymentPhase, PaymentStatus, StatusUpdate,
};
use crate::domain::events::{DomainEvent, PaymentEvent};
use crate::gateway::{
    build_line_items, map_transaction_status, CustomerDetails, Expiry, PaymentGateway,
    SignatureVerifier, TransactionDetails, TransactionRequest, PAYMENT_TYPE_SNAP,
};
use crate::publisher::EventPublisher;
use crate::store::{AccountDirectory, OrderRepository, PaymentRepository, Reconciliation};
use crate::{CommerceError, Result};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub order_id: Uuid,
    pub payment_id: Uuid,
    pub phase: PaymentPhase,
    pub amount: Decimal,
    pub payment_url: String,
    pub token: String,
}

/// Gateway notification body. Every field is optional on the wire.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WebhookPayload {
    pub order_id: Option<String>,
    pub status_code: Option<String>,
    pub gross_amount: Option<String>,
    pub signature_key: Option<String>,
    pub transaction_status: Option<String>,
    pub fraud_status: Option<String>,
    pub payment_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub received: bool,
    pub ignored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_status: Option<OrderStatus>,
}

impl WebhookAck {
    fn unknown() -> Self {
        Self { received: true, ignored: true, payment_id: None, payment_status: None, order_id: None, order_status: None }
    }

    fn for_payment(payment: &Payment, order_status: OrderStatus, ignored: bool) -> Self {
        Self {
            received: true,
            ignored,
            payment_id: Some(payment.id),
            payment_status: Some(payment.status),
            order_id: Some(payment.order_id),
            order_status: Some(order_status),
        }
    }
}

pub struct PaymentService {
    accounts: Arc<dyn AccountDirectory>,
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    verifier: SignatureVerifier,
    expiry_hours: u32,
    events: EventPublisher,
}

impl PaymentService {
    pub fn new(
        accounts: Arc<dyn AccountDirectory>,
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        config: &GatewayConfig,
        events: EventPublisher,
    ) -> Self {
        Self {
            accounts, orders, payments, gateway,
            verifier: SignatureVerifier::new(config.server_key.clone()),
            expiry_hours: config.expiry_hours,
            events,
        }
    }

    /// Opens (or resumes) a hosted payment page for one phase of an order.
    pub async fn create_snap_transaction(&self, user_id: i64, order_id: Uuid, phase: Option<PaymentPhase>) -> Result<CheckoutSession> {
        let phase = phase.unwrap_or_default();
        let order = self.orders.find_order(user_id, order_id).await?.ok_or(CommerceError::OrderNotFound)?;

        let payment = match self.payments.latest_payment(order.id, phase).await? {
            Some(p) if p.is_paid() => return Err(CommerceError::AlreadyPaid),
            Some(p) if !p.status.is_superseded() => p,
            _ => {
                let payment = Payment::open(order.id, phase, order.grand_total_price);
                payment.gross_amount()?;
                self.payments.insert_payment(&payment).await?;
                info!(payment_id = %payment.id, order_id = %order.id, phase = phase.as_ref(), amount = %payment.amount, "payment opened");
                self.events.publish(&DomainEvent::Payment(PaymentEvent::Opened {
                    payment_id: payment.id, order_id: order.id, phase, amount: payment.amount,
                })).await;
                payment
            }
        };

        // The gateway refuses a second transaction for the same reference, so an
        // unexpired session is handed back as is.
        if let (Some(url), Some(token), Some(expires_at)) = (&payment.payment_url, &payment.token, payment.expires_at) {
            if expires_at > Utc::now() {
                return Ok(session(&payment, url.clone(), token.clone()));
            }
        }

        let gross_amount = payment.gross_amount()?.to_i64().ok_or(CommerceError::InvalidAmount)?;
        let account = self.accounts.find_account(user_id).await?.ok_or(CommerceError::AccountUnavailable)?;
        let request = TransactionRequest {
            transaction_details: TransactionDetails { order_id: payment.id.to_string(), gross_amount },
            customer_details: CustomerDetails::from(&account),
            item_details: build_line_items(&order, gross_amount),
            expiry: Expiry::hours(self.expiry_hours),
        };

        let response = self.gateway.create_transaction(&request).await?;
        let details = CheckoutDetails::new(response.redirect_url, response.token, PAYMENT_TYPE_SNAP, self.expiry_hours);
        let payment = self.payments.record_checkout(payment.id, &details).await?;
        info!(payment_id = %payment.id, order_id = %order.id, gross_amount, "snap transaction recorded");
        Ok(session(&payment, details.payment_url, details.token))
    }

    /// Verifies and applies a gateway notification.
    ///
    /// Unknown payments and already settled payments are acknowledged with
    /// `ignored: true` so the gateway stops retrying.
    pub async fn handle_webhook(&self, payload: WebhookPayload) -> Result<WebhookAck> {
        let order_id = required(payload.order_id, "order_id")?;
        let status_code = required(payload.status_code, "status_code")?;
        let gross_amount = required(payload.gross_amount, "gross_amount")?;
        let signature_key = required(payload.signature_key, "signature_key")?;
        let transaction_status = required(payload.transaction_status, "transaction_status")?;
        let fraud_status = optional(payload.fraud_status);

        if !self.verifier.verify(&order_id, &status_code, &gross_amount, &signature_key) {
            warn!(payment_id = %order_id, %transaction_status, "webhook signature rejected");
            return Err(CommerceError::InvalidSignature);
        }

        let Ok(payment_id) = Uuid::parse_str(&order_id) else {
            info!(reference = %order_id, "webhook for foreign transaction ignored");
            return Ok(WebhookAck::unknown());
        };
        let gross = Decimal::from_str(&gross_amount)
            .map_err(|_| CommerceError::MalformedWebhook(format!("gross_amount {gross_amount:?} is not a number")))?;

        let update = StatusUpdate {
            status: map_transaction_status(&transaction_status, fraud_status.as_deref()),
            payment_type: optional(payload.payment_type),
            gross_amount: gross,
            received_at: Utc::now(),
        };

        match self.payments.reconcile(payment_id, &update).await {
            Ok(Reconciliation::UnknownPayment) => {
                info!(%payment_id, "webhook for unknown payment ignored");
                Ok(WebhookAck::unknown())
            }
            Ok(Reconciliation::Ignored { payment, order_status }) => {
                info!(%payment_id, status = payment.status.as_ref(), "webhook for settled payment ignored");
                Ok(WebhookAck::for_payment(&payment, order_status, true))
            }
            Ok(Reconciliation::Applied { payment, order_status }) => {
                info!(
                    %payment_id, order_id = %payment.order_id, status = payment.status.as_ref(),
                    order_status = order_status.as_ref(), "payment status updated"
                );
                self.events.publish(&DomainEvent::Payment(PaymentEvent::StatusChanged {
                    payment_id, order_id: payment.order_id, status: payment.status, order_status,
                })).await;
                Ok(WebhookAck::for_payment(&payment, order_status, false))
            }
            Err(e @ CommerceError::AmountMismatch { .. }) => {
                warn!(%payment_id, error = %e, "webhook amount rejected");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

fn session(payment: &Payment, payment_url: String, token: String) -> CheckoutSession {
    CheckoutSession {
        order_id: payment.order_id,
        payment_id: payment.id,
        phase: payment.phase,
        amount: payment.amount,
        payment_url,
        token,
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    optional(value).ok_or_else(|| CommerceError::MalformedWebhook(format!("{field} is required")))
}
