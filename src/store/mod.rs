//! Storage ports and their implementations.
//!
//! Services only see these traits. `PgStore` backs production, `MemoryStore`
//! backs local development and tests. Both implement the same consistency rules:
//! orders are written with all locked items in one unit, and payment/order
//! status writes are conditioned on the row not being `PAID`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::aggregates::{
    Account, Address, CatalogItem, CatalogKind, CheckoutDetails, DesignListQuery, Order, OrderStatus,
    Payment, PaymentPhase, SavedDesign, SharedDesign, StatusUpdate,
};
use crate::domain::value_objects::{CatalogId, DesignCode};
use crate::Result;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Read-only access to active, non-deleted catalog entries.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn find_active(&self, kind: CatalogKind, id: &CatalogId) -> Result<Option<CatalogItem>>;
}

#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_account(&self, user_id: i64) -> Result<Option<Account>>;
    async fn find_address(&self, user_id: i64, address_id: i64) -> Result<Option<Address>>;
}

/// Result of an insert guarded by a unique key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome { Inserted, DuplicateKey }

/// A user's design library. Soft-deleted rows are invisible to reads but
/// still hold their `(user_id, design_code)` key.
#[async_trait]
pub trait DesignRepository: Send + Sync {
    async fn find_design(&self, user_id: i64, code: &DesignCode) -> Result<Option<SavedDesign>>;
    async fn latest_untitled_name(&self, user_id: i64) -> Result<Option<String>>;
    async fn insert_design(&self, design: &SavedDesign) -> Result<InsertOutcome>;
    /// Inserts `design`, or overwrites the configuration of the row holding its
    /// code and restores it if deleted. The stored name only changes when `rename` is set.
    async fn upsert_design(&self, design: &SavedDesign, rename: bool) -> Result<SavedDesign>;
    /// One page of live designs and the total live count.
    async fn list_designs(&self, user_id: i64, query: &DesignListQuery) -> Result<(Vec<SavedDesign>, u64)>;
    /// Returns false when no live design holds the code.
    async fn soft_delete_design(&self, user_id: i64, code: &DesignCode) -> Result<bool>;
}

/// Public share links. Both `design_code` and `config_hash` are unique.
#[async_trait]
pub trait SharedDesignRepository: Send + Sync {
    async fn find_shared_by_hash(&self, config_hash: &str) -> Result<Option<SharedDesign>>;
    async fn find_shared(&self, code: &DesignCode) -> Result<Option<SharedDesign>>;
    async fn insert_shared(&self, shared: &SharedDesign) -> Result<InsertOutcome>;
    async fn renew_shared(&self, id: Uuid, expires_at: DateTime<Utc>) -> Result<SharedDesign>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists the order, its locked items and their components atomically.
    async fn insert_order(&self, order: &Order) -> Result<()>;
    async fn find_order(&self, user_id: i64, order_id: Uuid) -> Result<Option<Order>>;
    async fn list_orders(&self, user_id: i64) -> Result<Vec<Order>>;
}

/// Outcome of reconciling one gateway notification.
#[derive(Clone, Debug, PartialEq)]
pub enum Reconciliation {
    UnknownPayment,
    /// Settled already, or lost a race against a concurrent notification.
    Ignored { payment: Payment, order_status: OrderStatus },
    Applied { payment: Payment, order_status: OrderStatus },
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn latest_payment(&self, order_id: Uuid, phase: PaymentPhase) -> Result<Option<Payment>>;
    async fn insert_payment(&self, payment: &Payment) -> Result<()>;
    async fn record_checkout(&self, payment_id: Uuid, details: &CheckoutDetails) -> Result<Payment>;
    /// Loads the payment and its order, plans the transition and applies it,
    /// all inside one lock scope for `payment_id`.
    async fn reconcile(&self, payment_id: Uuid, update: &StatusUpdate) -> Result<Reconciliation>;
}
