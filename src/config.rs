//! Startup configuration, read once from the environment.

use anyhow::Context;
use std::time::Duration;

pub const DEFAULT_ORIGIN_SUBDISTRICT_ID: &str = "43249";
pub const DEFAULT_COURIER: &str = "jne";
pub const DEFAULT_COST_URL: &str = "https://rajaongkir.komerce.id/api/v1/calculate/domestic-cost";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub nats_url: Option<String>,
    pub delivery: DeliveryConfig,
    pub gateway: GatewayConfig,
    pub upstream_timeout: Duration,
}

/// Shipping rate lookup and store location.
#[derive(Clone, Debug)]
pub struct DeliveryConfig {
    pub api_key: Option<String>,
    pub cost_url: String,
    pub origin_subdistrict_id: String,
    pub courier: String,
    pub store_latitude: Option<f64>,
    pub store_longitude: Option<f64>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            cost_url: DEFAULT_COST_URL.to_string(),
            origin_subdistrict_id: DEFAULT_ORIGIN_SUBDISTRICT_ID.to_string(),
            courier: DEFAULT_COURIER.to_string(),
            store_latitude: None,
            store_longitude: None,
        }
    }
}

/// Hosted payment page credentials.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub server_key: String,
    pub is_production: bool,
    pub expiry_hours: u32,
}

impl GatewayConfig {
    pub fn snap_url(&self) -> &'static str {
        if self.is_production {
            "https://app.midtrans.com/snap/v1/transactions"
        } else {
            "https://app.sandbox.midtrans.com/snap/v1/transactions"
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let port = std::env::var("PORT")
            .ok()
            .map(|p| p.parse::<u16>())
            .transpose()
            .context("PORT must be a valid port number")?
            .unwrap_or(8083);

        let delivery = DeliveryConfig {
            api_key: non_empty_var("RAJAONGKIR_API_COST_KEY"),
            cost_url: non_empty_var("RAJAONGKIR_COST_URL").unwrap_or_else(|| DEFAULT_COST_URL.to_string()),
            origin_subdistrict_id: non_empty_var("RAJAONGKIR_ORIGIN_SUBDISTRICT_ID")
                .unwrap_or_else(|| DEFAULT_ORIGIN_SUBDISTRICT_ID.to_string()),
            courier: non_empty_var("SHIPPING_COURIER").unwrap_or_else(|| DEFAULT_COURIER.to_string()),
            store_latitude: non_empty_var("STORE_LATITUDE").and_then(|v| v.parse().ok()),
            store_longitude: non_empty_var("STORE_LONGITUDE").and_then(|v| v.parse().ok()),
        };

        let gateway = GatewayConfig {
            server_key: non_empty_var("MIDTRANS_SERVER_KEY").context("MIDTRANS_SERVER_KEY must be set")?,
            is_production: non_empty_var("MIDTRANS_IS_PRODUCTION").map(|v| v == "true").unwrap_or(false),
            expiry_hours: non_empty_var("PAYMENT_EXPIRY_HOURS")
                .map(|v| v.parse())
                .transpose()
                .context("PAYMENT_EXPIRY_HOURS must be a whole number")?
                .unwrap_or(24),
        };

        let timeout_secs: u64 = non_empty_var("UPSTREAM_TIMEOUT_SECS")
            .map(|v| v.parse())
            .transpose()
            .context("UPSTREAM_TIMEOUT_SECS must be a whole number")?
            .unwrap_or(15);

        Ok(Self {
            database_url,
            port,
            nats_url: non_empty_var("NATS_URL"),
            delivery,
            gateway,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_url_by_environment() {
        let mut cfg = GatewayConfig { server_key: "k".into(), is_production: false, expiry_hours: 24 };
        assert!(cfg.snap_url().contains("sandbox"));
        cfg.is_production = true;
        assert!(!cfg.snap_url().contains("sandbox"));
    }

    #[test]
    fn test_delivery_defaults() {
        let cfg = DeliveryConfig::default();
        assert_eq!(cfg.origin_subdistrict_id, "43249");
        assert_eq!(cfg.courier, "jne");
        assert!(cfg.api_key.is_none());
    }
}
