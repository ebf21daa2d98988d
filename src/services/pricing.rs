//! Pricing engine: reprices a parsed design against the live catalog and locks
//! the result into an immutable snapshot.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use crate::domain::aggregates::{
    CatalogItem, CatalogKind, LockedComponent, LockedOrderItem, ParsedDesign, PriceSnapshot,
};
use crate::domain::value_objects::CatalogId;
use crate::store::CatalogLookup;
use crate::{CommerceError, Result};

/// Add-on components priced once for the whole design.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AddOnBundle {
    pub components: Vec<LockedComponent>,
    pub total_price: Decimal,
    pub total_weight: Decimal,
}

/// A main model priced on its own, before add-ons are attributed.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemDraft {
    pub instance_id: String,
    pub product: CatalogItem,
    pub material: Option<CatalogItem>,
    pub components: Vec<LockedComponent>,
    pub add_on_price: Decimal,
    pub add_on_weight: Decimal,
}

/// Decides which items carry the design's add-on components.
pub trait AddOnAttribution: Send + Sync {
    fn attribute(&self, items: &mut [ItemDraft], bundle: &AddOnBundle);
}

/// Attaches every add-on to the first main model.
///
/// Add-on models carry no parent reference yet, so per-item attribution is not
/// possible; charging them once avoids double counting price and weight.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstItemAttribution;

impl AddOnAttribution for FirstItemAttribution {
    fn attribute(&self, items: &mut [ItemDraft], bundle: &AddOnBundle) {
        if let Some(first) = items.first_mut() {
            first.components = bundle.components.clone();
            first.add_on_price = bundle.total_price;
            first.add_on_weight = bundle.total_weight;
        }
    }
}

pub struct PricingEngine {
    catalog: Arc<dyn CatalogLookup>,
    attribution: Box<dyn AddOnAttribution>,
}

impl PricingEngine {
    pub fn new(catalog: Arc<dyn CatalogLookup>) -> Self {
        Self::with_attribution(catalog, Box::new(FirstItemAttribution))
    }

    pub fn with_attribution(catalog: Arc<dyn CatalogLookup>, attribution: Box<dyn AddOnAttribution>) -> Self {
        Self { catalog, attribution }
    }

    /// Locks current prices for every referenced catalog item.
    ///
    /// Any missing or inactive id aborts the whole pass.
    pub async fn price(&self, design: &ParsedDesign) -> Result<PriceSnapshot> {
        if design.main_models.is_empty() { return Err(CommerceError::EmptyDesign); }

        let mut bundle = AddOnBundle::default();
        for add_on in &design.add_ons {
            let component = self.require(CatalogKind::Component, &add_on.component_id).await?;
            let quantity = Decimal::from(add_on.quantity);
            let sub_total = component.price * quantity;
            bundle.total_price += sub_total;
            bundle.total_weight += component.weight * quantity;
            bundle.components.push(LockedComponent {
                component_id: component.id.clone(),
                name: component.name.clone(),
                quantity: add_on.quantity,
                locked_price_per_unit: component.price,
                locked_sub_total: sub_total,
            });
        }

        let mut drafts = Vec::with_capacity(design.main_models.len());
        for model in &design.main_models {
            let product = self.require(CatalogKind::BaseProduct, &model.product_base_id).await?;
            let material = match &model.material_id {
                Some(id) => Some(self.require(CatalogKind::Material, id).await?),
                None => None,
            };
            drafts.push(ItemDraft {
                instance_id: model.instance_id.clone(), product, material,
                components: vec![], add_on_price: Decimal::ZERO, add_on_weight: Decimal::ZERO,
            });
        }

        self.attribution.attribute(&mut drafts, &bundle);

        let mut subtotal_price = Decimal::ZERO;
        let mut total_weight = Decimal::ZERO;
        let locked_items: Vec<LockedOrderItem> = drafts.into_iter().map(|d| {
            let material_price = d.material.as_ref().map(|m| m.price).unwrap_or(Decimal::ZERO);
            let item_total_price = d.product.price + material_price + d.add_on_price;
            let item_weight = d.product.weight + d.add_on_weight;
            subtotal_price += item_total_price;
            total_weight += item_weight;
            LockedOrderItem {
                id: Uuid::nil(),
                instance_id: d.instance_id,
                product_base_id: d.product.id,
                product_name: d.product.name,
                material_id: d.material.as_ref().map(|m| m.id.clone()),
                material_name: d.material.map(|m| m.name),
                locked_base_price: d.product.price,
                locked_material_price: material_price,
                item_total_price,
                item_weight,
                components: d.components,
            }
        }).collect();

        if total_weight <= Decimal::ZERO {
            return Err(CommerceError::InvalidPricing(
                "total weight is zero, check product weights in the catalog".into(),
            ));
        }
        debug!(items = locked_items.len(), %subtotal_price, %total_weight, "design priced");
        Ok(PriceSnapshot { locked_items, subtotal_price, total_weight })
    }

    async fn require(&self, kind: CatalogKind, id: &CatalogId) -> Result<CatalogItem> {
        self.catalog.find_active(kind, id).await?
            .ok_or_else(|| CommerceError::CatalogItemUnavailable { kind: kind.label(), id: id.to_string() })
    }
}
