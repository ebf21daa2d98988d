use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::design::{DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::domain::aggregates::{
    DeliveryType, DesignListQuery, Order, Page, PaymentPhase, SavedDesign, SharedDesign, SortOrder,
};
use crate::http::extract::{malformed_webhook, ApiJson};
use crate::http::{AppState, AuthUser};
use crate::services::{CheckoutSession, CreateOrder, SaveDesign, WebhookAck, WebhookPayload};
use crate::{CommerceError, Result};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(max = 64))]
    pub design_code: Option<String>,
    pub configuration: Option<Value>,
    pub delivery_type: DeliveryType,
    #[validate(range(min = 1))]
    pub address_id: i64,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnapRequest {
    #[validate(length(min = 1))]
    pub order_id: String,
    pub phase: Option<PaymentPhase>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveDesignRequest {
    #[validate(length(max = 64))]
    pub design_code: Option<String>,
    #[validate(length(max = 120))]
    pub design_name: Option<String>,
    pub configuration: Value,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDesignRequest {
    #[validate(length(max = 120))]
    pub design_name: Option<String>,
    pub configuration: Value,
}

#[derive(Debug, Deserialize)]
pub struct ShareDesignRequest {
    pub configuration: Value,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListDesignsParams {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
    pub sort_by: Option<String>,
    pub order_by: Option<String>,
}

impl ListDesignsParams {
    fn into_query(self) -> crate::Result<DesignListQuery> {
        let order = match self.order_by.as_deref() {
            None => SortOrder::default(),
            Some(o) => o.parse().map_err(|_| CommerceError::Validation(format!("orderBy must be asc or desc, got {o}")))?,
        };
        Ok(DesignListQuery {
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(DEFAULT_PER_PAGE).min(MAX_PER_PAGE),
            sort_by: self.sort_by.as_deref().and_then(|s| s.parse().ok()).unwrap_or_default(),
            order,
        })
    }
}

fn validate(request: &impl Validate) -> Result<()> {
    request.validate().map_err(|e| CommerceError::Validation(e.to_string()))
}

pub async fn create_order(State(s): State<AppState>, user: AuthUser, ApiJson(r): ApiJson<CreateOrderRequest>) -> Result<(StatusCode, Json<Order>)> {
    validate(&r)?;
    let order = s.orders.create_order(user.id, CreateOrder {
        design_code: r.design_code,
        configuration: r.configuration,
        delivery_type: r.delivery_type,
        address_id: r.address_id,
        notes: r.notes,
    }).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(State(s): State<AppState>, user: AuthUser) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.orders.list_orders(user.id).await?))
}

pub async fn get_order(State(s): State<AppState>, user: AuthUser, Path(id): Path<String>) -> Result<Json<Order>> {
    let id = Uuid::parse_str(id.trim()).map_err(|_| CommerceError::OrderNotFound)?;
    Ok(Json(s.orders.get_order(user.id, id).await?))
}

pub async fn create_snap_transaction(State(s): State<AppState>, user: AuthUser, ApiJson(r): ApiJson<CreateSnapRequest>) -> Result<(StatusCode, Json<CheckoutSession>)> {
    validate(&r)?;
    let order_id = Uuid::parse_str(r.order_id.trim()).map_err(|_| CommerceError::OrderNotFound)?;
    let session = s.payments.create_snap_transaction(user.id, order_id, r.phase).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn handle_webhook(State(s): State<AppState>, payload: std::result::Result<Json<WebhookPayload>, JsonRejection>) -> Result<Json<WebhookAck>> {
    let Json(payload) = payload.map_err(malformed_webhook)?;
    Ok(Json(s.payments.handle_webhook(payload).await?))
}

pub async fn save_design(State(s): State<AppState>, user: AuthUser, ApiJson(r): ApiJson<SaveDesignRequest>) -> Result<(StatusCode, Json<SavedDesign>)> {
    validate(&r)?;
    let design = s.designs.save_design(user.id, SaveDesign {
        design_code: r.design_code,
        design_name: r.design_name,
        configuration: r.configuration,
    }).await?;
    Ok((StatusCode::CREATED, Json(design)))
}

pub async fn update_design(State(s): State<AppState>, user: AuthUser, Path(code): Path<String>, ApiJson(r): ApiJson<UpdateDesignRequest>) -> Result<Json<SavedDesign>> {
    validate(&r)?;
    let design = s.designs.save_design(user.id, SaveDesign {
        design_code: Some(code),
        design_name: r.design_name,
        configuration: r.configuration,
    }).await?;
    Ok(Json(design))
}

pub async fn list_designs(State(s): State<AppState>, user: AuthUser, params: std::result::Result<Query<ListDesignsParams>, QueryRejection>) -> Result<Json<Page<SavedDesign>>> {
    let Query(p) = params.map_err(|e| CommerceError::Validation(e.body_text()))?;
    validate(&p)?;
    Ok(Json(s.designs.list_designs(user.id, p.into_query()?).await?))
}

pub async fn get_design(State(s): State<AppState>, user: AuthUser, Path(code): Path<String>) -> Result<Json<SavedDesign>> {
    Ok(Json(s.designs.get_design(user.id, &code).await?))
}

pub async fn delete_design(State(s): State<AppState>, user: AuthUser, Path(code): Path<String>) -> Result<Json<Value>> {
    s.designs.delete_design(user.id, &code).await?;
    Ok(Json(json!({ "message": "Design deleted successfully" })))
}

pub async fn share_design(State(s): State<AppState>, ApiJson(r): ApiJson<ShareDesignRequest>) -> Result<(StatusCode, Json<SharedDesign>)> {
    Ok((StatusCode::CREATED, Json(s.designs.share_design(r.configuration).await?)))
}

pub async fn get_shared_design(State(s): State<AppState>, Path(code): Path<String>) -> Result<Json<SharedDesign>> {
    Ok(Json(s.designs.get_shared_design(&code).await?))
}
