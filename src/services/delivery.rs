//! Delivery fee resolution against the courier rate provider.

use async_trait::async_trait;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};
use crate::config::DeliveryConfig;
use crate::{CommerceError, Result};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateQuery {
    pub origin: String,
    pub destination: String,
    pub weight_grams: u64,
    pub courier: String,
}

/// Raw upstream answer; interpreting it is the resolver's job.
#[derive(Clone, Debug)]
pub struct RateReply {
    pub status: u16,
    pub body: Value,
}

impl RateReply {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// Transport to the courier rate API.
#[async_trait]
pub trait RateApi: Send + Sync {
    async fn domestic_cost(&self, api_key: &str, query: &RateQuery) -> Result<RateReply>;
}

pub struct DeliveryFeeResolver {
    api: Arc<dyn RateApi>,
    config: DeliveryConfig,
}

impl DeliveryFeeResolver {
    pub fn new(api: Arc<dyn RateApi>, config: DeliveryConfig) -> Self { Self { api, config } }

    /// Shipping cost from the store to `destination_id` for `weight_grams`.
    pub async fn calculate_fee(&self, destination_id: &str, weight_grams: Decimal) -> Result<Decimal> {
        let api_key = self.config.api_key.as_deref()
            .ok_or_else(|| CommerceError::Misconfigured("rate provider key is not configured".into()))?;
        let query = RateQuery {
            origin: self.config.origin_subdistrict_id.clone(),
            destination: destination_id.to_string(),
            weight_grams: billable_weight(weight_grams),
            courier: self.config.courier.clone(),
        };

        let reply = self.api.domestic_cost(api_key, &query).await?;
        if !reply.is_success() {
            error!(status = reply.status, body = %reply.body, "rate provider rejected cost request");
            return Err(CommerceError::RateProviderError(format!("rate provider responded with status {}", reply.status)));
        }

        let cost = extract_cost(&reply.body)
            .filter(|c| !c.is_sign_negative())
            .ok_or_else(|| CommerceError::RateProviderError("rate provider returned invalid delivery fee".into()))?;
        info!(destination = %query.destination, weight = query.weight_grams, %cost, "delivery fee resolved");
        Ok(cost)
    }

    /// Great-circle distance from the store, in km rounded to 2 decimals.
    pub fn calculate_distance_km(&self, destination_lat: Option<f64>, destination_lng: Option<f64>) -> Option<f64> {
        haversine_km(self.config.store_latitude?, self.config.store_longitude?, destination_lat?, destination_lng?)
    }
}

/// Weight rounded up to a whole gram, never below 1.
pub fn billable_weight(weight_grams: Decimal) -> u64 {
    weight_grams.ceil().to_u64().unwrap_or(0).max(1)
}

/// Reads the cost from the current response shape, falling back to the legacy one.
pub fn extract_cost(body: &Value) -> Option<Decimal> {
    body.pointer("/data/0/cost")
        .and_then(number_to_decimal)
        .or_else(|| body.pointer("/rajaongkir/results/0/costs/0/cost/0/value").and_then(number_to_decimal))
}

fn number_to_decimal(value: &Value) -> Option<Decimal> {
    if let Some(i) = value.as_i64() {
        return Some(Decimal::from(i));
    }
    value.as_f64().filter(|f| f.is_finite()).and_then(Decimal::from_f64)
}

pub fn haversine_km(from_lat: f64, from_lng: f64, to_lat: f64, to_lng: f64) -> Option<f64> {
    if [from_lat, from_lng, to_lat, to_lng].iter().any(|c| c.is_nan()) {
        return None;
    }
    let d_lat = (to_lat - from_lat).to_radians();
    let d_lng = (to_lng - from_lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from_lat.to_radians().cos() * to_lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    Some((EARTH_RADIUS_KM * c * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct ScriptedRates {
        reply: RateReply,
        seen: Mutex<Vec<RateQuery>>,
    }

    #[async_trait]
    impl RateApi for ScriptedRates {
        async fn domestic_cost(&self, _api_key: &str, query: &RateQuery) -> Result<RateReply> {
            self.seen.lock().unwrap().push(query.clone());
            Ok(self.reply.clone())
        }
    }

    fn resolver(status: u16, body: Value) -> (DeliveryFeeResolver, Arc<ScriptedRates>) {
        let api = Arc::new(ScriptedRates { reply: RateReply { status, body }, seen: Mutex::new(vec![]) });
        let config = DeliveryConfig { api_key: Some("key".into()), store_latitude: Some(-6.2), store_longitude: Some(106.8), ..Default::default() };
        (DeliveryFeeResolver::new(api.clone(), config), api)
    }

    #[tokio::test]
    async fn test_modern_shape() {
        let (resolver, api) = resolver(200, json!({ "data": [{ "cost": 20000 }] }));
        assert_eq!(resolver.calculate_fee("17473", Decimal::new(50004, 1)).await.unwrap(), Decimal::from(20_000));
        let seen = api.seen.lock().unwrap();
        assert_eq!(seen[0], RateQuery { origin: "43249".into(), destination: "17473".into(), weight_grams: 5001, courier: "jne".into() });
    }

    #[tokio::test]
    async fn test_legacy_shape_fallback() {
        let body = json!({ "rajaongkir": { "results": [{ "costs": [{ "cost": [{ "value": 18000 }] }] }] } });
        let (resolver, _) = resolver(200, body);
        assert_eq!(resolver.calculate_fee("17473", Decimal::from(1200)).await.unwrap(), Decimal::from(18_000));
    }

    #[tokio::test]
    async fn test_invalid_costs_are_upstream_errors() {
        for body in [json!({ "data": [{ "cost": -5 }] }), json!({ "data": [{ "cost": "free" }] }), json!({ "data": [] })] {
            let (resolver, _) = resolver(200, body);
            let err = resolver.calculate_fee("1", Decimal::ONE).await.unwrap_err();
            assert!(matches!(err, CommerceError::RateProviderError(_)));
        }
        let (resolver, _) = resolver(503, json!({ "data": [{ "cost": 10 }] }));
        assert!(matches!(resolver.calculate_fee("1", Decimal::ONE).await, Err(CommerceError::RateProviderError(_))));
    }

    #[tokio::test]
    async fn test_missing_key_is_misconfiguration() {
        let api = Arc::new(ScriptedRates { reply: RateReply { status: 200, body: json!({}) }, seen: Mutex::new(vec![]) });
        let resolver = DeliveryFeeResolver::new(api, DeliveryConfig::default());
        assert!(matches!(resolver.calculate_fee("1", Decimal::ONE).await, Err(CommerceError::Misconfigured(_))));
    }

    #[test]
    fn test_billable_weight() {
        assert_eq!(billable_weight(Decimal::ZERO), 1);
        assert_eq!(billable_weight(Decimal::new(1, 1)), 1);
        assert_eq!(billable_weight(Decimal::new(26001, 3)), 27);
        assert_eq!(billable_weight(Decimal::from(5000)), 5000);
    }

    #[test]
    fn test_distance() {
        assert_eq!(haversine_km(0.0, 0.0, 0.0, 1.0), Some(111.19));
        assert_eq!(haversine_km(-6.2, 106.8, -6.2, 106.8), Some(0.0));
        assert_eq!(haversine_km(f64::NAN, 106.8, -6.2, 106.8), None);
        let (resolver, _) = resolver(200, json!({}));
        assert_eq!(resolver.calculate_distance_km(None, Some(106.9)), None);
        assert!(resolver.calculate_distance_km(Some(-6.9), Some(107.6)).unwrap() > 100.0);
    }
}
