//! HTTP clients for upstream providers.

pub mod rajaongkir;
pub mod snap;

pub use rajaongkir::KomerceRateClient;
pub use snap::SnapClient;

use std::time::Duration;

pub(crate) fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}
