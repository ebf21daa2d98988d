//! Application services orchestrating the domain, storage and upstream collaborators.

pub mod delivery;
pub mod designs;
pub mod orders;
pub mod payments;
pub mod pricing;

pub use delivery::{DeliveryFeeResolver, RateApi, RateQuery, RateReply};
pub use designs::{DesignService, SaveDesign};
pub use orders::{CreateOrder, OrderService};
pub use payments::{CheckoutSession, PaymentService, WebhookAck, WebhookPayload};
pub use pricing::{AddOnAttribution, FirstItemAttribution, PricingEngine};
