//! Order assembly: resolve design and address, price, and persist atomically.

use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use crate::domain::aggregates::{DeliveryType, NewOrder, Order, ParsedDesign};
use crate::domain::value_objects::DesignCode;
use crate::publisher::EventPublisher;
use crate::services::delivery::DeliveryFeeResolver;
use crate::services::pricing::PricingEngine;
use crate::store::{AccountDirectory, DesignRepository, OrderRepository};
use crate::{CommerceError, Result};

#[derive(Clone, Debug)]
pub struct CreateOrder {
    pub design_code: Option<String>,
    pub configuration: Option<Value>,
    pub delivery_type: DeliveryType,
    pub address_id: i64,
    pub notes: Option<String>,
}

pub struct OrderService {
    accounts: Arc<dyn AccountDirectory>,
    designs: Arc<dyn DesignRepository>,
    orders: Arc<dyn OrderRepository>,
    pricing: PricingEngine,
    delivery: DeliveryFeeResolver,
    events: EventPublisher,
}

impl OrderService {
    pub fn new(
        accounts: Arc<dyn AccountDirectory>,
        designs: Arc<dyn DesignRepository>,
        orders: Arc<dyn OrderRepository>,
        pricing: PricingEngine,
        delivery: DeliveryFeeResolver,
        events: EventPublisher,
    ) -> Self {
        Self { accounts, designs, orders, pricing, delivery, events }
    }

    /// Prices the design at current catalog prices and persists the order.
    ///
    /// Nothing is written unless every step succeeds.
    pub async fn create_order(&self, user_id: i64, request: CreateOrder) -> Result<Order> {
        let account = self.accounts.find_account(user_id).await?;
        if !account.is_some_and(|a| a.can_order()) {
            return Err(CommerceError::AccountUnavailable);
        }

        let (user_design_id, configuration) = self.resolve_design(user_id, &request).await?;

        let address = self.accounts.find_address(user_id, request.address_id).await?
            .ok_or(CommerceError::AddressNotFound)?;
        let destination = match request.delivery_type {
            DeliveryType::Delivery => Some(address.courier_subdistrict().ok_or(CommerceError::AddressNotGeocoded)?),
            DeliveryType::Pickup => None,
        };

        let design = ParsedDesign::parse(&configuration)?;
        let pricing = self.pricing.price(&design).await?;

        let (delivery_fee, delivery_distance) = match destination {
            Some(destination) => (
                self.delivery.calculate_fee(destination, pricing.total_weight).await?,
                self.delivery.calculate_distance_km(address.latitude, address.longitude),
            ),
            None => (Decimal::ZERO, None),
        };

        let (order, event) = Order::place(NewOrder {
            user_id,
            user_design_id,
            design_snapshot: configuration,
            address_id: address.id,
            address_snapshot: address.snapshot(),
            delivery_type: request.delivery_type,
            pricing,
            delivery_fee,
            delivery_distance,
            notes: request.notes,
        })?;
        self.orders.insert_order(&order).await?;

        info!(
            order_id = %order.id, user_id, items = order.items.len(),
            grand_total = %order.grand_total_price, delivery_type = order.delivery_type.as_ref(),
            "order created"
        );
        self.events.publish(&event).await;
        Ok(order)
    }

    pub async fn get_order(&self, user_id: i64, order_id: Uuid) -> Result<Order> {
        self.orders.find_order(user_id, order_id).await?.ok_or(CommerceError::OrderNotFound)
    }

    pub async fn list_orders(&self, user_id: i64) -> Result<Vec<Order>> {
        self.orders.list_orders(user_id).await
    }

    async fn resolve_design(&self, user_id: i64, request: &CreateOrder) -> Result<(Option<Uuid>, Value)> {
        let code = request.design_code.as_deref().map(str::trim).filter(|c| !c.is_empty());
        match code {
            Some(code) => {
                let code = DesignCode::new(code).map_err(|_| CommerceError::DesignNotFound)?;
                let design = self.designs.find_design(user_id, &code).await?
                    .ok_or(CommerceError::DesignNotFound)?;
                Ok((Some(design.id), design.configuration))
            }
            None => request.configuration.clone()
                .filter(Value::is_object)
                .map(|c| (None, c))
                .ok_or(CommerceError::ConfigurationRequired),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeliveryConfig;
    use crate::domain::aggregates::{Account, AccountStatus, Address, CatalogItem, CatalogKind};
    use crate::services::delivery::{RateApi, RateQuery, RateReply};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;

    struct NoRates;

    #[async_trait]
    impl RateApi for NoRates {
        async fn domestic_cost(&self, _api_key: &str, _query: &RateQuery) -> Result<RateReply> {
            Err(CommerceError::RateProviderError("offline".into()))
        }
    }

    async fn service() -> (OrderService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.put_catalog_item(CatalogItem::active(CatalogKind::BaseProduct, "desk", "Desk", Decimal::from(300_000), Decimal::from(8000))).await;
        store.put_account(Account {
            id: 1, first_name: "Dewi".into(), last_name: "L".into(), email: "dewi@example.com".into(),
            phone_number: None, account_status: AccountStatus::Active, deleted_at: None,
        }).await;
        store.put_address(Address { id: 5, user_id: 1, city: "Bandung".into(), ..Default::default() }).await;
        let config = DeliveryConfig { api_key: Some("key".into()), ..Default::default() };
        let svc = OrderService::new(
            store.clone(), store.clone(), store.clone(),
            PricingEngine::new(store.clone()),
            DeliveryFeeResolver::new(Arc::new(NoRates), config),
            EventPublisher::disabled(),
        );
        (svc, store)
    }

    fn request(delivery_type: DeliveryType) -> CreateOrder {
        CreateOrder {
            design_code: None, configuration: Some(json!({ "mainModels": [{ "id": "desk_1" }] })),
            delivery_type, address_id: 5, notes: None,
        }
    }

    #[tokio::test]
    async fn test_pickup_skips_rates() {
        let (svc, store) = service().await;
        let order = svc.create_order(1, request(DeliveryType::Pickup)).await.unwrap();
        assert_eq!(order.delivery_fee, Decimal::ZERO);
        assert_eq!(order.delivery_distance, None);
        assert_eq!(order.grand_total_price, Decimal::from(300_000));
        assert_eq!(store.order_count().await, 1);
        assert_eq!(svc.get_order(1, order.id).await.unwrap().id, order.id);
        assert!(matches!(svc.get_order(2, order.id).await, Err(CommerceError::OrderNotFound)));
    }

    #[tokio::test]
    async fn test_ungeocoded_address_rejected_for_delivery() {
        let (svc, store) = service().await;
        let err = svc.create_order(1, request(DeliveryType::Delivery)).await.unwrap_err();
        assert!(matches!(err, CommerceError::AddressNotGeocoded));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_rate_failure_leaves_no_order() {
        let (svc, store) = service().await;
        store.put_address(Address { id: 5, user_id: 1, courier_subdistrict_id: Some("17473".into()), ..Default::default() }).await;
        let err = svc.create_order(1, request(DeliveryType::Delivery)).await.unwrap_err();
        assert!(matches!(err, CommerceError::RateProviderError(_)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_design_resolution_errors() {
        let (svc, _) = service().await;
        let mut req = request(DeliveryType::Pickup);
        req.configuration = None;
        assert!(matches!(svc.create_order(1, req.clone()).await, Err(CommerceError::ConfigurationRequired)));
        req.design_code = Some("NOPE42".into());
        assert!(matches!(svc.create_order(1, req).await, Err(CommerceError::DesignNotFound)));
        assert!(matches!(svc.create_order(9, request(DeliveryType::Pickup)).await, Err(CommerceError::AccountUnavailable)));
        let mut req = request(DeliveryType::Pickup);
        req.address_id = 404;
        assert!(matches!(svc.create_order(1, req).await, Err(CommerceError::AddressNotFound)));
    }
}
