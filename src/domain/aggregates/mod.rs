//! Aggregates module
pub mod account;
pub mod catalog;
pub mod design;
pub mod order;
pub mod payment;

pub use account::{Account, AccountStatus, Address, AddressSnapshot};
pub use catalog::{CatalogItem, CatalogKind};
pub use design::{
    AddOnCount, DesignListQuery, DesignSort, MainModelRef, Page, PageMeta, ParsedDesign, SavedDesign, SharedDesign,
    SortOrder,
};
pub use order::{DeliveryType, LockedComponent, LockedOrderItem, NewOrder, Order, OrderStatus, PriceSnapshot};
pub use payment::{AppliedTransition, CheckoutDetails, Payment, PaymentPhase, PaymentStatus, StatusUpdate, Transition};
