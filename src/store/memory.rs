//! In-process store for local development and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;
use crate::domain::aggregates::{
    Account, Address, CatalogItem, CatalogKind, CheckoutDetails, DesignListQuery, DesignSort, Order,
    OrderStatus, Payment, PaymentPhase, SavedDesign, SharedDesign, SortOrder, StatusUpdate, Transition,
};
use crate::domain::value_objects::{CatalogId, DesignCode};
use crate::store::{
    AccountDirectory, CatalogLookup, DesignRepository, InsertOutcome, OrderRepository,
    PaymentRepository, Reconciliation, SharedDesignRepository,
};
use crate::{CommerceError, Result};

#[derive(Default)]
struct Inner {
    catalog: HashMap<(CatalogKind, CatalogId), CatalogItem>,
    accounts: HashMap<i64, Account>,
    addresses: HashMap<i64, Address>,
    designs: Vec<SavedDesign>,
    shared: Vec<SharedDesign>,
    orders: Vec<Order>,
    payments: Vec<Payment>,
}

/// Every operation holds one mutex, which gives the same atomicity the
/// Postgres store gets from transactions and row locks.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub async fn put_catalog_item(&self, item: CatalogItem) {
        self.inner.lock().await.catalog.insert((item.kind, item.id.clone()), item);
    }

    /// Admin-side price edit; already locked orders must not see it.
    pub async fn set_price(&self, kind: CatalogKind, id: &str, price: Decimal) {
        if let Some(item) = self.inner.lock().await.catalog.get_mut(&(kind, CatalogId::new(id))) {
            item.price = price;
        }
    }

    pub async fn put_account(&self, account: Account) {
        self.inner.lock().await.accounts.insert(account.id, account);
    }

    pub async fn put_address(&self, address: Address) {
        self.inner.lock().await.addresses.insert(address.id, address);
    }

    pub async fn put_shared(&self, shared: SharedDesign) {
        self.inner.lock().await.shared.push(shared);
    }

    pub async fn order_count(&self) -> usize { self.inner.lock().await.orders.len() }

    pub async fn payment(&self, payment_id: Uuid) -> Option<Payment> {
        self.inner.lock().await.payments.iter().find(|p| p.id == payment_id).cloned()
    }

    pub async fn payments_for(&self, order_id: Uuid) -> Vec<Payment> {
        self.inner.lock().await.payments.iter().filter(|p| p.order_id == order_id).cloned().collect()
    }
}

#[async_trait]
impl CatalogLookup for MemoryStore {
    async fn find_active(&self, kind: CatalogKind, id: &CatalogId) -> Result<Option<CatalogItem>> {
        let inner = self.inner.lock().await;
        Ok(inner.catalog.get(&(kind, id.clone())).filter(|i| i.is_available()).cloned())
    }
}

#[async_trait]
impl AccountDirectory for MemoryStore {
    async fn find_account(&self, user_id: i64) -> Result<Option<Account>> {
        Ok(self.inner.lock().await.accounts.get(&user_id).cloned())
    }

    async fn find_address(&self, user_id: i64, address_id: i64) -> Result<Option<Address>> {
        let inner = self.inner.lock().await;
        Ok(inner.addresses.get(&address_id).filter(|a| a.user_id == user_id).cloned())
    }
}

#[async_trait]
impl DesignRepository for MemoryStore {
    async fn find_design(&self, user_id: i64, code: &DesignCode) -> Result<Option<SavedDesign>> {
        let inner = self.inner.lock().await;
        Ok(inner.designs.iter()
            .find(|d| d.user_id == user_id && &d.design_code == code && d.deleted_at.is_none())
            .cloned())
    }

    async fn latest_untitled_name(&self, user_id: i64) -> Result<Option<String>> {
        let inner = self.inner.lock().await;
        Ok(inner.designs.iter()
            .filter(|d| d.user_id == user_id && d.deleted_at.is_none())
            .filter(|d| d.design_name.starts_with(crate::domain::aggregates::design::UNTITLED_PREFIX))
            .max_by_key(|d| d.created_at)
            .map(|d| d.design_name.clone()))
    }

    async fn insert_design(&self, design: &SavedDesign) -> Result<InsertOutcome> {
        let mut inner = self.inner.lock().await;
        if inner.designs.iter().any(|d| d.user_id == design.user_id && d.design_code == design.design_code) {
            return Ok(InsertOutcome::DuplicateKey);
        }
        inner.designs.push(design.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn upsert_design(&self, design: &SavedDesign, rename: bool) -> Result<SavedDesign> {
        let mut inner = self.inner.lock().await;
        match inner.designs.iter_mut().find(|d| d.user_id == design.user_id && d.design_code == design.design_code) {
            Some(existing) => {
                existing.configuration = design.configuration.clone();
                if rename {
                    existing.design_name = design.design_name.clone();
                }
                existing.deleted_at = None;
                existing.updated_at = Utc::now();
                Ok(existing.clone())
            }
            None => {
                inner.designs.push(design.clone());
                Ok(design.clone())
            }
        }
    }

    async fn list_designs(&self, user_id: i64, query: &DesignListQuery) -> Result<(Vec<SavedDesign>, u64)> {
        let inner = self.inner.lock().await;
        let mut live: Vec<SavedDesign> = inner.designs.iter()
            .filter(|d| d.user_id == user_id && d.deleted_at.is_none())
            .cloned()
            .collect();
        live.sort_by(|a, b| {
            let ordering = match query.sort_by {
                DesignSort::Id => a.id.cmp(&b.id),
                DesignSort::DesignName => a.design_name.cmp(&b.design_name),
                DesignSort::DesignCode => a.design_code.as_str().cmp(b.design_code.as_str()),
                DesignSort::CreatedAt => a.created_at.cmp(&b.created_at),
                DesignSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            };
            let ordering = if query.order == SortOrder::Desc { ordering.reverse() } else { ordering };
            if ordering == Ordering::Equal { a.id.cmp(&b.id) } else { ordering }
        });
        let total = live.len() as u64;
        let page = live.into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.per_page as usize)
            .collect();
        Ok((page, total))
    }

    async fn soft_delete_design(&self, user_id: i64, code: &DesignCode) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        match inner.designs.iter_mut().find(|d| d.user_id == user_id && &d.design_code == code && d.deleted_at.is_none()) {
            Some(design) => {
                let now = Utc::now();
                design.deleted_at = Some(now);
                design.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl SharedDesignRepository for MemoryStore {
    async fn find_shared_by_hash(&self, config_hash: &str) -> Result<Option<SharedDesign>> {
        let inner = self.inner.lock().await;
        Ok(inner.shared.iter().find(|s| s.config_hash == config_hash).cloned())
    }

    async fn find_shared(&self, code: &DesignCode) -> Result<Option<SharedDesign>> {
        let inner = self.inner.lock().await;
        Ok(inner.shared.iter().find(|s| &s.design_code == code).cloned())
    }

    async fn insert_shared(&self, shared: &SharedDesign) -> Result<InsertOutcome> {
        let mut inner = self.inner.lock().await;
        if inner.shared.iter().any(|s| s.design_code == shared.design_code || s.config_hash == shared.config_hash) {
            return Ok(InsertOutcome::DuplicateKey);
        }
        inner.shared.push(shared.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn renew_shared(&self, id: Uuid, expires_at: DateTime<Utc>) -> Result<SharedDesign> {
        let mut inner = self.inner.lock().await;
        let shared = inner.shared.iter_mut()
            .find(|s| s.id == id)
            .ok_or(CommerceError::Storage(sqlx::Error::RowNotFound))?;
        shared.expires_at = expires_at;
        Ok(shared.clone())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        self.inner.lock().await.orders.push(order.clone());
        Ok(())
    }

    async fn find_order(&self, user_id: i64, order_id: Uuid) -> Result<Option<Order>> {
        let inner = self.inner.lock().await;
        Ok(inner.orders.iter()
            .find(|o| o.id == order_id && o.user_id == user_id && !o.is_deleted())
            .cloned())
    }

    async fn list_orders(&self, user_id: i64) -> Result<Vec<Order>> {
        let inner = self.inner.lock().await;
        let mut orders: Vec<Order> = inner.orders.iter()
            .filter(|o| o.user_id == user_id && !o.is_deleted())
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn latest_payment(&self, order_id: Uuid, phase: PaymentPhase) -> Result<Option<Payment>> {
        let inner = self.inner.lock().await;
        Ok(inner.payments.iter()
            .filter(|p| p.order_id == order_id && p.phase == phase)
            .max_by_key(|p| (p.created_at, p.id))
            .cloned())
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<()> {
        self.inner.lock().await.payments.push(payment.clone());
        Ok(())
    }

    async fn record_checkout(&self, payment_id: Uuid, details: &CheckoutDetails) -> Result<Payment> {
        let mut inner = self.inner.lock().await;
        let payment = inner.payments.iter_mut()
            .find(|p| p.id == payment_id)
            .ok_or(CommerceError::Storage(sqlx::Error::RowNotFound))?;
        payment.record_checkout(details);
        Ok(payment.clone())
    }

    async fn reconcile(&self, payment_id: Uuid, update: &StatusUpdate) -> Result<Reconciliation> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let Some(payment) = inner.payments.iter_mut().find(|p| p.id == payment_id) else {
            return Ok(Reconciliation::UnknownPayment);
        };
        let order = inner.orders.iter_mut()
            .find(|o| o.id == payment.order_id)
            .ok_or(CommerceError::OrderNotFound)?;

        match payment.plan(order.status, update)? {
            Transition::Ignore => Ok(Reconciliation::Ignored { payment: payment.clone(), order_status: order.status }),
            Transition::Apply(transition) => {
                payment.apply(&transition);
                if order.status != OrderStatus::Paid {
                    order.status = transition.order_status;
                    order.updated_at = chrono::Utc::now();
                }
                Ok(Reconciliation::Applied { payment: payment.clone(), order_status: order.status })
            }
        }
    }
}
