//! Reconciliation against a real Postgres.
//!
//! Run with `DATABASE_URL=postgres://... cargo test --test pg_reconcile -- --ignored`.

use atelier_commerce::domain::aggregates::{CheckoutDetails, OrderStatus, Payment, PaymentPhase, PaymentStatus, StatusUpdate};
use atelier_commerce::store::{PaymentRepository, PgStore, Reconciliation};
use chrono::Utc;
use rust_decimal_macros::dec;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch database");
    let pool = PgPoolOptions::new().max_connections(4).connect(&url).await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

/// Inserts a user and a pending order, returning the order id.
async fn pending_order(pool: &PgPool) -> Uuid {
    let user_id = sqlx::query_scalar::<_, i64>("INSERT INTO users (first_name, last_name, email) VALUES ('Pg', 'Test', $1) RETURNING id")
        .bind(format!("{}@example.com", Uuid::now_v7()))
        .fetch_one(pool).await.unwrap();
    let order_id = Uuid::now_v7();
    sqlx::query("INSERT INTO custom_orders (id, user_id, design_snapshot, address_id, address_snapshot, delivery_type, subtotal_price, total_weight, delivery_fee, grand_total_price) VALUES ($1, $2, '{}', 1, '{}', 'PICKUP', 150000, 3000, 0, 150000)")
        .bind(order_id).bind(user_id)
        .execute(pool).await.unwrap();
    order_id
}

fn update(status: PaymentStatus) -> StatusUpdate {
    StatusUpdate { status, payment_type: Some("qris".into()), gross_amount: dec!(150000), received_at: Utc::now() }
}

async fn order_status(pool: &PgPool, order_id: Uuid) -> String {
    sqlx::query_scalar::<_, String>("SELECT status FROM custom_orders WHERE id = $1").bind(order_id).fetch_one(pool).await.unwrap()
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_concurrent_settlements_apply_once() {
    let pool = pool().await;
    let store = PgStore::new(pool.clone());
    let order_id = pending_order(&pool).await;
    let payment = Payment::open(order_id, PaymentPhase::Full, dec!(150000));
    store.insert_payment(&payment).await.unwrap();

    let settle = update(PaymentStatus::Paid);
    let (first, second) = tokio::join!(store.reconcile(payment.id, &settle), store.reconcile(payment.id, &settle));
    let outcomes = [first.unwrap(), second.unwrap()];
    assert_eq!(outcomes.iter().filter(|o| matches!(o, Reconciliation::Applied { .. })).count(), 1);
    assert_eq!(outcomes.iter().filter(|o| matches!(o, Reconciliation::Ignored { .. })).count(), 1);
    assert_eq!(order_status(&pool, order_id).await, "PAID");
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_paid_order_is_not_overwritten_by_other_phase() {
    let pool = pool().await;
    let store = PgStore::new(pool.clone());
    let order_id = pending_order(&pool).await;
    let dp = Payment::open(order_id, PaymentPhase::Dp, dec!(150000));
    let full = Payment::open(order_id, PaymentPhase::Full, dec!(150000));
    store.insert_payment(&dp).await.unwrap();
    store.insert_payment(&full).await.unwrap();

    let paid_update = update(PaymentStatus::Paid);
    let cancelled_update = update(PaymentStatus::Cancelled);
    let (paid, cancelled) = tokio::join!(
        store.reconcile(dp.id, &paid_update),
        store.reconcile(full.id, &cancelled_update),
    );
    assert!(matches!(paid.unwrap(), Reconciliation::Applied { .. }));
    let Reconciliation::Applied { payment, .. } = cancelled.unwrap() else { panic!("expected applied cancellation") };
    assert_eq!(payment.status, PaymentStatus::Cancelled);
    assert_eq!(order_status(&pool, order_id).await, "PAID");

    let Reconciliation::Applied { order_status: settled, .. } = store.reconcile(full.id, &update(PaymentStatus::Expired)).await.unwrap() else {
        panic!("expected applied expiry");
    };
    assert_eq!(settled, OrderStatus::Paid);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn test_checkout_keeps_notified_payment_type() {
    let pool = pool().await;
    let store = PgStore::new(pool.clone());
    let order_id = pending_order(&pool).await;
    let payment = Payment::open(order_id, PaymentPhase::Full, dec!(150000));
    store.insert_payment(&payment).await.unwrap();
    store.reconcile(payment.id, &update(PaymentStatus::Challenge)).await.unwrap();

    let details = CheckoutDetails::new("https://pay.test/t".into(), "t".into(), "SNAP", 24);
    let recorded = store.record_checkout(payment.id, &details).await.unwrap();
    assert_eq!(recorded.payment_type.as_deref(), Some("qris"));
    assert_eq!(recorded.token.as_deref(), Some("t"));
}
