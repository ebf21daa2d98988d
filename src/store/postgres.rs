//! PostgreSQL store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;
use crate::domain::aggregates::{
    Account, Address, AddressSnapshot, CatalogItem, CatalogKind, CheckoutDetails, DesignListQuery, DesignSort,
    LockedComponent, LockedOrderItem, Order, OrderStatus, Payment, PaymentPhase, SavedDesign, SharedDesign,
    SortOrder, StatusUpdate, Transition,
};
use crate::domain::value_objects::{CatalogId, DesignCode};
use crate::store::{
    AccountDirectory, CatalogLookup, DesignRepository, InsertOutcome, OrderRepository,
    PaymentRepository, Reconciliation, SharedDesignRepository,
};
use crate::{CommerceError, Result};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

fn decode<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse::<T>().map_err(|e| CommerceError::Storage(sqlx::Error::Decode(Box::new(e))))
}

fn decode_code(value: String) -> Result<DesignCode> {
    DesignCode::new(value).map_err(|e| CommerceError::Storage(sqlx::Error::Decode(Box::new(e))))
}

fn inserted(result: std::result::Result<sqlx::postgres::PgQueryResult, sqlx::Error>) -> Result<InsertOutcome> {
    match result {
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Ok(InsertOutcome::DuplicateKey),
        Err(e) => Err(e.into()),
    }
}

fn to_i32(quantity: u32) -> Result<i32> {
    i32::try_from(quantity).map_err(|e| CommerceError::Storage(sqlx::Error::Encode(Box::new(e))))
}

// =============================================================================
// Rows
// =============================================================================

#[derive(sqlx::FromRow)]
struct CatalogRow { id: String, name: String, sku: Option<String>, price: Decimal, weight: Decimal, is_active: bool, deleted_at: Option<DateTime<Utc>> }

#[derive(sqlx::FromRow)]
struct AccountRow { id: i64, first_name: String, last_name: String, email: String, phone_number: Option<String>, account_status: String, deleted_at: Option<DateTime<Utc>> }

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i64, user_id: i64, label: Option<String>, recipient_name: String, phone_number: String,
    line1: String, line2: Option<String>, city: String, district: Option<String>, subdistrict: Option<String>,
    province: String, postal_code: String, country: String, courier_subdistrict_id: Option<String>,
    latitude: Option<f64>, longitude: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct DesignRow { id: Uuid, user_id: i64, design_code: String, design_name: String, configuration: serde_json::Value, created_at: DateTime<Utc>, updated_at: DateTime<Utc>, deleted_at: Option<DateTime<Utc>> }

#[derive(sqlx::FromRow)]
struct SharedRow { id: Uuid, design_code: String, config_hash: String, configuration: serde_json::Value, expires_at: DateTime<Utc>, created_at: DateTime<Utc> }

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid, user_id: i64, user_design_id: Option<Uuid>, design_snapshot: serde_json::Value,
    address_id: i64, address_snapshot: Json<AddressSnapshot>, delivery_type: String,
    subtotal_price: Decimal, total_weight: i64, delivery_fee: Decimal, delivery_distance: Option<f64>,
    grand_total_price: Decimal, status: String, notes: Option<String>,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>, deleted_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid, order_id: Uuid, instance_id: String, product_base_id: String, product_name: String,
    material_id: Option<String>, material_name: Option<String>, locked_base_price: Decimal,
    locked_material_price: Decimal, item_total_price: Decimal, item_weight: Decimal,
}

#[derive(sqlx::FromRow)]
struct ComponentRow { order_item_id: Uuid, component_id: String, component_name: String, quantity: i32, locked_price_per_unit: Decimal, locked_sub_total: Decimal }

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid, order_id: Uuid, phase: String, amount: Decimal, status: String,
    external_id: Option<String>, payment_url: Option<String>, token: Option<String>, payment_type: Option<String>,
    paid_at: Option<DateTime<Utc>>, expires_at: Option<DateTime<Utc>>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = CommerceError;

    fn try_from(r: AccountRow) -> Result<Self> {
        Ok(Account {
            id: r.id, first_name: r.first_name, last_name: r.last_name, email: r.email,
            phone_number: r.phone_number, account_status: decode(&r.account_status)?, deleted_at: r.deleted_at,
        })
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = CommerceError;

    fn try_from(r: PaymentRow) -> Result<Self> {
        Ok(Payment {
            id: r.id, order_id: r.order_id, phase: decode(&r.phase)?, amount: r.amount, status: decode(&r.status)?,
            external_id: r.external_id, payment_url: r.payment_url, token: r.token, payment_type: r.payment_type,
            paid_at: r.paid_at, expires_at: r.expires_at, created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

const CATALOG_BASE_SQL: &str = "SELECT id, product_name AS name, sku, base_price AS price, weight, is_active, deleted_at FROM product_bases WHERE id = $1 AND is_active AND deleted_at IS NULL";
const CATALOG_MATERIAL_SQL: &str = "SELECT id, material_name AS name, sku, price, weight, is_active, deleted_at FROM product_materials WHERE id = $1 AND is_active AND deleted_at IS NULL";
const CATALOG_COMPONENT_SQL: &str = "SELECT id, component_name AS name, sku, price, weight, is_active, deleted_at FROM product_components WHERE id = $1 AND is_active AND deleted_at IS NULL";

#[async_trait]
impl CatalogLookup for PgStore {
    async fn find_active(&self, kind: CatalogKind, id: &CatalogId) -> Result<Option<CatalogItem>> {
        let sql = match kind {
            CatalogKind::BaseProduct => CATALOG_BASE_SQL,
            CatalogKind::Material => CATALOG_MATERIAL_SQL,
            CatalogKind::Component => CATALOG_COMPONENT_SQL,
        };
        let row = sqlx::query_as::<_, CatalogRow>(sql).bind(id.as_str()).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| CatalogItem {
            id: CatalogId::new(r.id), kind, name: r.name, sku: r.sku, price: r.price,
            weight: r.weight, is_active: r.is_active, deleted_at: r.deleted_at,
        }))
    }
}

#[async_trait]
impl AccountDirectory for PgStore {
    async fn find_account(&self, user_id: i64) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT id, first_name, last_name, email, phone_number, account_status, deleted_at FROM users WHERE id = $1")
            .bind(user_id).fetch_optional(&self.pool).await?;
        row.map(Account::try_from).transpose()
    }

    async fn find_address(&self, user_id: i64, address_id: i64) -> Result<Option<Address>> {
        let row = sqlx::query_as::<_, AddressRow>("SELECT * FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(address_id).bind(user_id).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| Address {
            id: r.id, user_id: r.user_id, label: r.label, recipient_name: r.recipient_name, phone_number: r.phone_number,
            line1: r.line1, line2: r.line2, city: r.city, district: r.district, subdistrict: r.subdistrict,
            province: r.province, postal_code: r.postal_code, country: r.country,
            courier_subdistrict_id: r.courier_subdistrict_id, latitude: r.latitude, longitude: r.longitude,
        }))
    }
}

impl TryFrom<DesignRow> for SavedDesign {
    type Error = CommerceError;

    fn try_from(r: DesignRow) -> Result<Self> {
        Ok(SavedDesign {
            id: r.id, user_id: r.user_id, design_code: decode_code(r.design_code)?, design_name: r.design_name,
            configuration: r.configuration, created_at: r.created_at, updated_at: r.updated_at, deleted_at: r.deleted_at,
        })
    }
}

impl TryFrom<SharedRow> for SharedDesign {
    type Error = CommerceError;

    fn try_from(r: SharedRow) -> Result<Self> {
        Ok(SharedDesign {
            id: r.id, design_code: decode_code(r.design_code)?, config_hash: r.config_hash,
            configuration: r.configuration, expires_at: r.expires_at, created_at: r.created_at,
        })
    }
}

fn design_order_by(query: &DesignListQuery) -> String {
    let column = match query.sort_by {
        DesignSort::Id => "id",
        DesignSort::DesignName => "design_name",
        DesignSort::DesignCode => "design_code",
        DesignSort::CreatedAt => "created_at",
        DesignSort::UpdatedAt => "updated_at",
    };
    let direction = match query.order { SortOrder::Asc => "ASC", SortOrder::Desc => "DESC" };
    format!("{column} {direction}, id ASC")
}

#[async_trait]
impl DesignRepository for PgStore {
    async fn find_design(&self, user_id: i64, code: &DesignCode) -> Result<Option<SavedDesign>> {
        sqlx::query_as::<_, DesignRow>("SELECT * FROM user_designs WHERE user_id = $1 AND design_code = $2 AND deleted_at IS NULL")
            .bind(user_id).bind(code.as_str())
            .fetch_optional(&self.pool).await?
            .map(SavedDesign::try_from)
            .transpose()
    }

    async fn latest_untitled_name(&self, user_id: i64) -> Result<Option<String>> {
        let name = sqlx::query_scalar::<_, String>("SELECT design_name FROM user_designs WHERE user_id = $1 AND design_name LIKE 'untitled-design-%' AND deleted_at IS NULL ORDER BY created_at DESC LIMIT 1")
            .bind(user_id).fetch_optional(&self.pool).await?;
        Ok(name)
    }

    async fn insert_design(&self, design: &SavedDesign) -> Result<InsertOutcome> {
        inserted(sqlx::query("INSERT INTO user_designs (id, user_id, design_code, design_name, configuration, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(design.id).bind(design.user_id).bind(design.design_code.as_str()).bind(&design.design_name)
            .bind(&design.configuration).bind(design.created_at).bind(design.updated_at)
            .execute(&self.pool).await)
    }

    async fn upsert_design(&self, design: &SavedDesign, rename: bool) -> Result<SavedDesign> {
        sqlx::query_as::<_, DesignRow>("INSERT INTO user_designs (id, user_id, design_code, design_name, configuration, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7) \
            ON CONFLICT (user_id, design_code) DO UPDATE SET configuration = EXCLUDED.configuration, \
            design_name = CASE WHEN $8 THEN EXCLUDED.design_name ELSE user_designs.design_name END, \
            deleted_at = NULL, updated_at = NOW() RETURNING *")
            .bind(design.id).bind(design.user_id).bind(design.design_code.as_str()).bind(&design.design_name)
            .bind(&design.configuration).bind(design.created_at).bind(design.updated_at).bind(rename)
            .fetch_one(&self.pool).await?
            .try_into()
    }

    async fn list_designs(&self, user_id: i64, query: &DesignListQuery) -> Result<(Vec<SavedDesign>, u64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_designs WHERE user_id = $1 AND deleted_at IS NULL")
            .bind(user_id).fetch_one(&self.pool).await?;
        let sql = format!("SELECT * FROM user_designs WHERE user_id = $1 AND deleted_at IS NULL ORDER BY {} LIMIT $2 OFFSET $3", design_order_by(query));
        let rows = sqlx::query_as::<_, DesignRow>(&sql)
            .bind(user_id).bind(i64::from(query.per_page)).bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool).await?;
        let designs = rows.into_iter().map(SavedDesign::try_from).collect::<Result<Vec<_>>>()?;
        Ok((designs, u64::try_from(total).unwrap_or_default()))
    }

    async fn soft_delete_design(&self, user_id: i64, code: &DesignCode) -> Result<bool> {
        let result = sqlx::query("UPDATE user_designs SET deleted_at = NOW(), updated_at = NOW() WHERE user_id = $1 AND design_code = $2 AND deleted_at IS NULL")
            .bind(user_id).bind(code.as_str()).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SharedDesignRepository for PgStore {
    async fn find_shared_by_hash(&self, config_hash: &str) -> Result<Option<SharedDesign>> {
        sqlx::query_as::<_, SharedRow>("SELECT * FROM shareable_designs WHERE config_hash = $1")
            .bind(config_hash).fetch_optional(&self.pool).await?
            .map(SharedDesign::try_from)
            .transpose()
    }

    async fn find_shared(&self, code: &DesignCode) -> Result<Option<SharedDesign>> {
        sqlx::query_as::<_, SharedRow>("SELECT * FROM shareable_designs WHERE design_code = $1")
            .bind(code.as_str()).fetch_optional(&self.pool).await?
            .map(SharedDesign::try_from)
            .transpose()
    }

    async fn insert_shared(&self, shared: &SharedDesign) -> Result<InsertOutcome> {
        inserted(sqlx::query("INSERT INTO shareable_designs (id, design_code, config_hash, configuration, expires_at, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(shared.id).bind(shared.design_code.as_str()).bind(&shared.config_hash)
            .bind(&shared.configuration).bind(shared.expires_at).bind(shared.created_at)
            .execute(&self.pool).await)
    }

    async fn renew_shared(&self, id: Uuid, expires_at: DateTime<Utc>) -> Result<SharedDesign> {
        sqlx::query_as::<_, SharedRow>("UPDATE shareable_designs SET expires_at = $2 WHERE id = $1 RETURNING *")
            .bind(id).bind(expires_at).fetch_one(&self.pool).await?
            .try_into()
    }
}

impl PgStore {
    async fn insert_items(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<()> {
        for (position, item) in order.items.iter().enumerate() {
            sqlx::query("INSERT INTO custom_order_items (id, order_id, position, instance_id, product_base_id, product_name, material_id, material_name, locked_base_price, locked_material_price, item_total_price, item_weight) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)")
                .bind(item.id).bind(order.id).bind(position as i32).bind(&item.instance_id)
                .bind(item.product_base_id.as_str()).bind(&item.product_name)
                .bind(item.material_id.as_ref().map(|m| m.as_str())).bind(&item.material_name)
                .bind(item.locked_base_price).bind(item.locked_material_price)
                .bind(item.item_total_price).bind(item.item_weight)
                .execute(&mut **tx).await?;
            for (component_position, c) in item.components.iter().enumerate() {
                sqlx::query("INSERT INTO custom_order_item_components (order_item_id, position, component_id, component_name, quantity, locked_price_per_unit, locked_sub_total) VALUES ($1, $2, $3, $4, $5, $6, $7)")
                    .bind(item.id).bind(component_position as i32).bind(c.component_id.as_str()).bind(&c.name)
                    .bind(to_i32(c.quantity)?).bind(c.locked_price_per_unit).bind(c.locked_sub_total)
                    .execute(&mut **tx).await?;
            }
        }
        Ok(())
    }

    /// Attaches locked items and components to freshly loaded order rows.
    async fn hydrate(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
        let order_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let items = sqlx::query_as::<_, ItemRow>("SELECT * FROM custom_order_items WHERE order_id = ANY($1) ORDER BY order_id, position")
            .bind(&order_ids).fetch_all(&self.pool).await?;
        let item_ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
        let components = sqlx::query_as::<_, ComponentRow>("SELECT * FROM custom_order_item_components WHERE order_item_id = ANY($1) ORDER BY order_item_id, position")
            .bind(&item_ids).fetch_all(&self.pool).await?;

        let mut components_by_item: HashMap<Uuid, Vec<LockedComponent>> = HashMap::new();
        for c in components {
            let quantity = u32::try_from(c.quantity).map_err(|e| CommerceError::Storage(sqlx::Error::Decode(Box::new(e))))?;
            components_by_item.entry(c.order_item_id).or_default().push(LockedComponent {
                component_id: CatalogId::new(c.component_id), name: c.component_name, quantity,
                locked_price_per_unit: c.locked_price_per_unit, locked_sub_total: c.locked_sub_total,
            });
        }
        let mut items_by_order: HashMap<Uuid, Vec<LockedOrderItem>> = HashMap::new();
        for i in items {
            items_by_order.entry(i.order_id).or_default().push(LockedOrderItem {
                components: components_by_item.remove(&i.id).unwrap_or_default(),
                id: i.id, instance_id: i.instance_id, product_base_id: CatalogId::new(i.product_base_id),
                product_name: i.product_name, material_id: i.material_id.map(CatalogId::new),
                material_name: i.material_name, locked_base_price: i.locked_base_price,
                locked_material_price: i.locked_material_price, item_total_price: i.item_total_price,
                item_weight: i.item_weight,
            });
        }

        rows.into_iter().map(|r| Ok(Order {
            items: items_by_order.remove(&r.id).unwrap_or_default(),
            id: r.id, user_id: r.user_id, user_design_id: r.user_design_id, design_snapshot: r.design_snapshot,
            address_id: r.address_id, address_snapshot: r.address_snapshot.0, delivery_type: decode(&r.delivery_type)?,
            subtotal_price: r.subtotal_price, total_weight: r.total_weight, delivery_fee: r.delivery_fee,
            delivery_distance: r.delivery_distance, grand_total_price: r.grand_total_price, status: decode(&r.status)?,
            notes: r.notes, created_at: r.created_at, updated_at: r.updated_at, deleted_at: r.deleted_at,
        })).collect()
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO custom_orders (id, user_id, user_design_id, design_snapshot, address_id, address_snapshot, delivery_type, subtotal_price, total_weight, delivery_fee, delivery_distance, grand_total_price, status, notes, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)")
            .bind(order.id).bind(order.user_id).bind(order.user_design_id).bind(&order.design_snapshot)
            .bind(order.address_id).bind(Json(&order.address_snapshot)).bind(order.delivery_type.as_ref())
            .bind(order.subtotal_price).bind(order.total_weight).bind(order.delivery_fee)
            .bind(order.delivery_distance).bind(order.grand_total_price).bind(order.status.as_ref())
            .bind(&order.notes).bind(order.created_at).bind(order.updated_at)
            .execute(&mut *tx).await?;
        Self::insert_items(&mut tx, order).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_order(&self, user_id: i64, order_id: Uuid) -> Result<Option<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM custom_orders WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL")
            .bind(order_id).bind(user_id).fetch_all(&self.pool).await?;
        Ok(self.hydrate(rows).await?.into_iter().next())
    }

    async fn list_orders(&self, user_id: i64) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM custom_orders WHERE user_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC")
            .bind(user_id).fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }
}

#[async_trait]
impl PaymentRepository for PgStore {
    async fn latest_payment(&self, order_id: Uuid, phase: PaymentPhase) -> Result<Option<Payment>> {
        sqlx::query_as::<_, PaymentRow>("SELECT * FROM payments WHERE order_id = $1 AND phase = $2 ORDER BY created_at DESC, id DESC LIMIT 1")
            .bind(order_id).bind(phase.as_ref())
            .fetch_optional(&self.pool).await?
            .map(Payment::try_from)
            .transpose()
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<()> {
        sqlx::query("INSERT INTO payments (id, order_id, phase, amount, status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(payment.id).bind(payment.order_id).bind(payment.phase.as_ref()).bind(payment.amount)
            .bind(payment.status.as_ref()).bind(payment.created_at).bind(payment.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn record_checkout(&self, payment_id: Uuid, details: &CheckoutDetails) -> Result<Payment> {
        sqlx::query_as::<_, PaymentRow>("UPDATE payments SET external_id = $2, payment_url = $3, token = $4, payment_type = COALESCE(payment_type, $5), expires_at = $6, updated_at = NOW() WHERE id = $1 RETURNING *")
            .bind(payment_id).bind(payment_id.to_string()).bind(&details.payment_url).bind(&details.token)
            .bind(&details.payment_type).bind(details.expires_at)
            .fetch_one(&self.pool).await?
            .try_into()
    }

    async fn reconcile(&self, payment_id: Uuid, update: &StatusUpdate) -> Result<Reconciliation> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, PaymentRow>("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
            .bind(payment_id).fetch_optional(&mut *tx).await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(Reconciliation::UnknownPayment);
        };
        let payment = Payment::try_from(row)?;
        // The order row is not locked; its write below is conditioned on status instead.
        let order_status: OrderStatus = sqlx::query_scalar::<_, String>("SELECT status FROM custom_orders WHERE id = $1")
            .bind(payment.order_id).fetch_optional(&mut *tx).await?
            .ok_or(CommerceError::OrderNotFound)
            .and_then(|s| decode(&s))?;

        let transition = match payment.plan(order_status, update)? {
            Transition::Ignore => {
                tx.commit().await?;
                return Ok(Reconciliation::Ignored { payment, order_status });
            }
            Transition::Apply(transition) => transition,
        };

        let updated = sqlx::query_as::<_, PaymentRow>("UPDATE payments SET status = $2, payment_type = $3, paid_at = $4, updated_at = NOW() WHERE id = $1 AND status <> 'PAID' RETURNING *")
            .bind(payment.id).bind(transition.status.as_ref()).bind(&transition.payment_type).bind(transition.paid_at)
            .fetch_optional(&mut *tx).await?;
        let Some(updated) = updated else {
            tx.commit().await?;
            return Ok(Reconciliation::Ignored { payment, order_status });
        };

        let order_status = match sqlx::query_scalar::<_, String>("UPDATE custom_orders SET status = $2, updated_at = NOW() WHERE id = $1 AND status <> 'PAID' RETURNING status")
            .bind(payment.order_id).bind(transition.order_status.as_ref())
            .fetch_optional(&mut *tx).await?
        {
            Some(status) => decode(&status)?,
            None => OrderStatus::Paid,
        };
        tx.commit().await?;
        Ok(Reconciliation::Applied { payment: updated.try_into()?, order_status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::AccountStatus;

    fn account_row(status: &str) -> AccountRow {
        AccountRow {
            id: 3, first_name: "Dewi".into(), last_name: "L".into(), email: "dewi@example.com".into(),
            phone_number: None, account_status: status.into(), deleted_at: None,
        }
    }

    #[test]
    fn test_design_order_by_uses_fixed_columns() {
        assert_eq!(design_order_by(&DesignListQuery::default()), "updated_at DESC, id ASC");
        let query = DesignListQuery { sort_by: DesignSort::DesignName, order: SortOrder::Asc, ..Default::default() };
        assert_eq!(design_order_by(&query), "design_name ASC, id ASC");
    }

    #[test]
    fn test_unknown_account_status_decodes_as_unavailable() {
        let account = Account::try_from(account_row("BANNED")).unwrap();
        assert_eq!(account.account_status, AccountStatus::Other("BANNED".into()));
        assert!(!account.can_order());
        assert!(Account::try_from(account_row("ACTIVE")).unwrap().can_order());
    }
}
