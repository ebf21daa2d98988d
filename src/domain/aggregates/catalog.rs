//! Catalog entries referenced by design configurations

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::CatalogId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogKind { BaseProduct, Material, Component }

impl CatalogKind {
    pub fn label(&self) -> &'static str {
        match self { Self::BaseProduct => "Product", Self::Material => "Material", Self::Component => "Component" }
    }
}

/// A base product, material or add-on component with its current price and weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogId,
    pub kind: CatalogKind,
    pub name: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub weight: Decimal,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CatalogItem {
    pub fn active(kind: CatalogKind, id: impl Into<String>, name: impl Into<String>, price: Decimal, weight: Decimal) -> Self {
        Self {
            id: CatalogId::new(id), kind, name: name.into(), sku: None,
            price, weight, is_active: true, deleted_at: None,
        }
    }

    pub fn is_available(&self) -> bool { self.is_active && self.deleted_at.is_none() }
}
