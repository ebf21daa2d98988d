//! Design configurations authored by the 3D editor
//!
//! The editor stores an opaque JSON document. Only two arrays matter for
//! ordering: `mainModels` (placed furniture, each optionally textured with a
//! material) and `addOnModels` (placed add-on components). Both carry catalog ids
//! tagged with an instance suffix.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;
use crate::domain::value_objects::{CatalogId, DesignCode};
use crate::{CommerceError, Result};

/// One placed furniture instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MainModelRef {
    pub instance_id: String,
    pub product_base_id: CatalogId,
    pub material_id: Option<CatalogId>,
}

/// Add-on component with the number of placed instances sharing its id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AddOnCount {
    pub component_id: CatalogId,
    pub quantity: u32,
}

/// Structured references extracted from a design configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParsedDesign {
    pub main_models: Vec<MainModelRef>,
    /// Aggregated in first-seen order.
    pub add_ons: Vec<AddOnCount>,
}

#[derive(Deserialize)]
struct RawDesign {
    #[serde(rename = "mainModels")]
    main_models: Option<Vec<RawModel>>,
    #[serde(rename = "addOnModels", default)]
    add_on_models: Option<Vec<RawModel>>,
}

#[derive(Deserialize)]
struct RawModel {
    id: String,
    #[serde(default)]
    texture: Option<String>,
}

impl ParsedDesign {
    pub fn parse(configuration: &serde_json::Value) -> Result<Self> {
        if !configuration.is_object() {
            return Err(CommerceError::InvalidDesign("configuration must be an object".into()));
        }
        let raw: RawDesign = serde_json::from_value(configuration.clone())
            .map_err(|e| CommerceError::InvalidDesign(e.to_string()))?;

        let models = raw.main_models.ok_or_else(|| CommerceError::InvalidDesign("mainModels is required".into()))?;
        if models.is_empty() { return Err(CommerceError::EmptyDesign); }

        let main_models = models
            .into_iter()
            .map(|m| {
                let instance_id = non_blank(m.id, "mainModels[].id")?;
                let material_id = m.texture
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .map(|t| CatalogId::from_instance(&t));
                Ok(MainModelRef { product_base_id: CatalogId::from_instance(&instance_id), instance_id, material_id })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut add_ons: Vec<AddOnCount> = Vec::new();
        for model in raw.add_on_models.unwrap_or_default() {
            let component_id = CatalogId::from_instance(&non_blank(model.id, "addOnModels[].id")?);
            match add_ons.iter_mut().find(|a| a.component_id == component_id) {
                Some(existing) => existing.quantity += 1,
                None => add_ons.push(AddOnCount { component_id, quantity: 1 }),
            }
        }

        Ok(Self { main_models, add_ons })
    }
}

fn non_blank(value: String, field: &str) -> Result<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(CommerceError::InvalidDesign(format!("{field} must not be empty")));
    }
    Ok(value)
}

/// A design saved in a user's library.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDesign {
    pub id: Uuid,
    pub user_id: i64,
    pub design_code: DesignCode,
    pub design_name: String,
    pub configuration: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Columns a design listing can be ordered by. Unknown names fall back to `updatedAt`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum DesignSort { Id, DesignName, DesignCode, CreatedAt, #[default] UpdatedAt }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder { Asc, #[default] Desc }

pub const DEFAULT_PER_PAGE: u32 = 6;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DesignListQuery {
    pub page: u32,
    pub per_page: u32,
    pub sort_by: DesignSort,
    pub order: SortOrder,
}

impl Default for DesignListQuery {
    fn default() -> Self {
        Self { page: 1, per_page: DEFAULT_PER_PAGE, sort_by: DesignSort::default(), order: SortOrder::default() }
    }
}

impl DesignListQuery {
    pub fn offset(&self) -> u64 { u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub has_next: bool,
    pub has_previous: bool,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl PageMeta {
    pub fn new(query: &DesignListQuery, total: u64) -> Self {
        Self {
            has_next: total > u64::from(query.per_page) * u64::from(query.page),
            has_previous: query.page > 1,
            page: query.page,
            per_page: query.per_page,
            total,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Shared links stay readable for this long after creation.
pub const SHARE_TTL_DAYS: i64 = 30;

/// A configuration published under a public code, independent of any account.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedDesign {
    pub id: Uuid,
    pub design_code: DesignCode,
    pub config_hash: String,
    pub configuration: Value,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SharedDesign {
    pub fn new(design_code: DesignCode, configuration: Value, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            design_code,
            config_hash: config_hash(&configuration),
            configuration,
            expires_at: now + Duration::days(SHARE_TTL_DAYS),
            created_at: now,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool { self.expires_at > now }
}

/// SHA-256 over the configuration with object keys sorted at every depth,
/// so the same design always hashes the same regardless of key order.
pub fn config_hash(configuration: &Value) -> String {
    hex::encode(Sha256::digest(canonical(configuration).to_string().as_bytes()))
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Value::Object(keys.into_iter().map(|k| (k.clone(), canonical(&map[k]))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

pub const UNTITLED_PREFIX: &str = "untitled-design-";

/// Next name in the `untitled-design-<n>` sequence after `latest`.
pub fn next_untitled_name(latest: Option<&str>) -> String {
    let next = latest
        .and_then(|name| name.strip_prefix(UNTITLED_PREFIX))
        .and_then(|n| n.parse::<u32>().ok())
        .map(|n| n + 1)
        .unwrap_or(1);
    format!("{UNTITLED_PREFIX}{next}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_main_and_add_ons() {
        let config = json!({
            "mainModels": [
                { "id": "table_1", "texture": "oak_1" },
                { "id": "table_2", "texture": null },
                { "id": "chair" }
            ],
            "addOnModels": [{ "id": "knob_1" }, { "id": "leg_1" }, { "id": "knob_2" }],
            "camera": { "fov": 45 }
        });
        let parsed = ParsedDesign::parse(&config).unwrap();
        assert_eq!(parsed.main_models.len(), 3);
        assert_eq!(parsed.main_models[0].instance_id, "table_1");
        assert_eq!(parsed.main_models[0].product_base_id.as_str(), "table");
        assert_eq!(parsed.main_models[0].material_id, Some(CatalogId::new("oak")));
        assert_eq!(parsed.main_models[1].material_id, None);
        assert_eq!(parsed.main_models[2].product_base_id.as_str(), "chair");
        assert_eq!(parsed.add_ons, vec![
            AddOnCount { component_id: CatalogId::new("knob"), quantity: 2 },
            AddOnCount { component_id: CatalogId::new("leg"), quantity: 1 },
        ]);
    }

    #[test]
    fn test_missing_main_models_is_invalid() {
        let err = ParsedDesign::parse(&json!({ "addOnModels": [] })).unwrap_err();
        assert!(matches!(err, CommerceError::InvalidDesign(_)));
        let err = ParsedDesign::parse(&json!("not an object")).unwrap_err();
        assert!(matches!(err, CommerceError::InvalidDesign(_)));
        let err = ParsedDesign::parse(&json!({ "mainModels": [{ "texture": "oak" }] })).unwrap_err();
        assert!(matches!(err, CommerceError::InvalidDesign(_)));
    }

    #[test]
    fn test_empty_main_models() {
        let err = ParsedDesign::parse(&json!({ "mainModels": [] })).unwrap_err();
        assert!(matches!(err, CommerceError::EmptyDesign));
    }

    #[test]
    fn test_config_hash_ignores_key_order() {
        let a = json!({ "mainModels": [{ "id": "bed_1", "texture": "oak_1" }], "camera": { "x": 1, "y": 2 } });
        let b = json!({ "camera": { "y": 2, "x": 1 }, "mainModels": [{ "texture": "oak_1", "id": "bed_1" }] });
        assert_eq!(config_hash(&a), config_hash(&b));
        assert_eq!(config_hash(&a).len(), 64);
        let c = json!({ "mainModels": [{ "id": "bed_2" }] });
        assert_ne!(config_hash(&a), config_hash(&c));
    }

    #[test]
    fn test_shared_design_expires_after_ttl() {
        let now = Utc::now();
        let shared = SharedDesign::new(DesignCode::new("SHR001").unwrap(), json!({ "mainModels": [] }), now);
        assert_eq!(shared.expires_at - shared.created_at, Duration::days(SHARE_TTL_DAYS));
        assert!(shared.is_live(now + Duration::days(29)));
        assert!(!shared.is_live(now + Duration::days(30)));
    }

    #[test]
    fn test_list_query_paging() {
        assert_eq!("designName".parse::<DesignSort>().unwrap(), DesignSort::DesignName);
        assert!("password".parse::<DesignSort>().is_err());
        let query = DesignListQuery { page: 3, per_page: 6, ..Default::default() };
        assert_eq!(query.offset(), 12);
        let meta = PageMeta::new(&query, 19);
        assert!(meta.has_next && meta.has_previous);
        assert!(!PageMeta::new(&query, 18).has_next);
        assert!(!PageMeta::new(&DesignListQuery::default(), 6).has_previous);
    }

    #[test]
    fn test_untitled_names() {
        assert_eq!(next_untitled_name(None), "untitled-design-1");
        assert_eq!(next_untitled_name(Some("untitled-design-7")), "untitled-design-8");
        assert_eq!(next_untitled_name(Some("untitled-design-x")), "untitled-design-1");
    }
}
