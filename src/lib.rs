//! Atelier Commerce
//!
//! Order pricing and payment reconciliation for a custom furniture storefront.
//!
//! ## Features
//! - Repricing of user-authored design configurations against the live catalog
//! - Locked price snapshots per order item and add-on component
//! - Courier rate lookup for delivery orders
//! - Hosted payment page transactions per order phase
//! - Idempotent, signature-verified payment webhook reconciliation
//! - Saved design library and expiring share links

use axum::http::StatusCode;
use rust_decimal::Decimal;
use thiserror::Error;

pub mod clients;
pub mod config;
pub mod domain;
pub mod gateway;
pub mod http;
pub mod publisher;
pub mod services;
pub mod store;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CommerceError {
    #[error("Invalid design configuration: {0}")]
    InvalidDesign(String),

    #[error("Design has no products to order")]
    EmptyDesign,

    #[error("{kind} not found or inactive: {id}")]
    CatalogItemUnavailable { kind: &'static str, id: String },

    #[error("Invalid pricing: {0}")]
    InvalidPricing(String),

    #[error("Rate provider error: {0}")]
    RateProviderError(String),

    #[error("User account not found or inactive")]
    AccountUnavailable,

    #[error("Design not found or doesn't belong to you")]
    DesignNotFound,

    #[error("Design not found or expired")]
    SharedDesignNotFound,

    #[error("configuration is required when designCode is not provided")]
    ConfigurationRequired,

    #[error("Shipping address not found")]
    AddressNotFound,

    #[error("Address has no courier subdistrict id. Please re-save this address.")]
    AddressNotGeocoded,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Payment already paid")]
    AlreadyPaid,

    #[error("Payment amount is invalid")]
    InvalidAmount,

    #[error("Payment gateway error: {0}")]
    PaymentGatewayError(String),

    #[error("Malformed webhook payload: {0}")]
    MalformedWebhook(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Gross amount mismatch: expected {expected}, received {received}")]
    AmountMismatch { expected: Decimal, received: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Failed to generate unique design code")]
    DesignCodeExhausted,

    #[error("Service misconfigured: {0}")]
    Misconfigured(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Failure taxonomy shared by every operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Authorization,
    Conflict,
    Upstream,
    Integrity,
    Security,
    Storage,
}

impl CommerceError {
    pub fn kind(&self) -> ErrorKind {
        use CommerceError::*;
        match self {
            InvalidDesign(_) | EmptyDesign | ConfigurationRequired | AddressNotGeocoded
            | InvalidAmount | MalformedWebhook(_) | Validation(_) => ErrorKind::Validation,
            CatalogItemUnavailable { .. } | AccountUnavailable | DesignNotFound | SharedDesignNotFound
            | AddressNotFound | OrderNotFound => ErrorKind::NotFound,
            Unauthenticated => ErrorKind::Authorization,
            AlreadyPaid | DesignCodeExhausted => ErrorKind::Conflict,
            RateProviderError(_) | PaymentGatewayError(_) => ErrorKind::Upstream,
            InvalidPricing(_) | Misconfigured(_) => ErrorKind::Integrity,
            InvalidSignature | AmountMismatch { .. } => ErrorKind::Security,
            Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        use CommerceError::*;
        match self {
            InvalidSignature | Unauthenticated => StatusCode::UNAUTHORIZED,
            AlreadyPaid | AmountMismatch { .. } => StatusCode::BAD_REQUEST,
            DesignCodeExhausted => StatusCode::CONFLICT,
            _ => match self.kind() {
                ErrorKind::Validation | ErrorKind::Security => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Authorization => StatusCode::FORBIDDEN,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
                ErrorKind::Integrity | ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        use CommerceError::*;
        match self {
            InvalidDesign(_) => "INVALID_DESIGN",
            EmptyDesign => "EMPTY_DESIGN",
            CatalogItemUnavailable { .. } => "CATALOG_ITEM_UNAVAILABLE",
            InvalidPricing(_) => "INVALID_PRICING",
            RateProviderError(_) => "RATE_PROVIDER_ERROR",
            AccountUnavailable => "ACCOUNT_UNAVAILABLE",
            DesignNotFound => "DESIGN_NOT_FOUND",
            SharedDesignNotFound => "SHARED_DESIGN_NOT_FOUND",
            ConfigurationRequired => "CONFIGURATION_REQUIRED",
            AddressNotFound => "ADDRESS_NOT_FOUND",
            AddressNotGeocoded => "ADDRESS_NOT_GEOCODED",
            OrderNotFound => "ORDER_NOT_FOUND",
            AlreadyPaid => "ALREADY_PAID",
            InvalidAmount => "INVALID_AMOUNT",
            PaymentGatewayError(_) => "PAYMENT_GATEWAY_ERROR",
            MalformedWebhook(_) => "MALFORMED_WEBHOOK",
            InvalidSignature => "INVALID_SIGNATURE",
            AmountMismatch { .. } => "AMOUNT_MISMATCH",
            Validation(_) => "VALIDATION_ERROR",
            Unauthenticated => "UNAUTHENTICATED",
            DesignCodeExhausted => "DESIGN_CODE_EXHAUSTED",
            Misconfigured(_) => "MISCONFIGURED",
            Storage(_) => "STORAGE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, CommerceError>;
