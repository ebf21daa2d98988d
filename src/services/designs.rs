//! Saved design library and public share links.

use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use crate::domain::aggregates::design::{config_hash, next_untitled_name, SHARE_TTL_DAYS};
use crate::domain::aggregates::{DesignListQuery, Page, PageMeta, ParsedDesign, SavedDesign, SharedDesign};
use crate::domain::events::{DesignEvent, DomainEvent};
use crate::domain::value_objects::DesignCode;
use crate::publisher::EventPublisher;
use crate::store::{AccountDirectory, DesignRepository, InsertOutcome, SharedDesignRepository};
use crate::{CommerceError, Result};

const MAX_CODE_ATTEMPTS: usize = 3;
const MAX_SHARE_ATTEMPTS: usize = 5;

#[derive(Clone, Debug)]
pub struct SaveDesign {
    /// Saving under an existing code overwrites that design.
    pub design_code: Option<String>,
    pub design_name: Option<String>,
    pub configuration: Value,
}

pub struct DesignService {
    accounts: Arc<dyn AccountDirectory>,
    designs: Arc<dyn DesignRepository>,
    shares: Arc<dyn SharedDesignRepository>,
    events: EventPublisher,
    generate_code: fn() -> DesignCode,
}

impl DesignService {
    pub fn new(
        accounts: Arc<dyn AccountDirectory>,
        designs: Arc<dyn DesignRepository>,
        shares: Arc<dyn SharedDesignRepository>,
        events: EventPublisher,
    ) -> Self {
        Self { accounts, designs, shares, events, generate_code: DesignCode::generate }
    }

    /// Replaces the random code source, for deterministic collision handling.
    pub fn with_code_source(mut self, generate_code: fn() -> DesignCode) -> Self {
        self.generate_code = generate_code;
        self
    }

    async fn ensure_active(&self, user_id: i64) -> Result<()> {
        let account = self.accounts.find_account(user_id).await?;
        if !account.is_some_and(|a| a.can_order()) {
            return Err(CommerceError::AccountUnavailable);
        }
        Ok(())
    }

    pub async fn save_design(&self, user_id: i64, request: SaveDesign) -> Result<SavedDesign> {
        self.ensure_active(user_id).await?;
        ParsedDesign::parse(&request.configuration)?;

        let explicit_code = request.design_code.as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(DesignCode::new)
            .transpose()
            .map_err(|e| CommerceError::Validation(format!("designCode: {e}")))?;
        let given_name = request.design_name.as_deref().map(str::trim).filter(|n| !n.is_empty()).map(String::from);
        let design_name = match &given_name {
            Some(name) => name.clone(),
            None => next_untitled_name(self.designs.latest_untitled_name(user_id).await?.as_deref()),
        };

        let now = Utc::now();
        let mut design = SavedDesign {
            id: Uuid::now_v7(),
            user_id,
            design_code: explicit_code.clone().unwrap_or_else(self.generate_code),
            design_name,
            configuration: request.configuration,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        if explicit_code.is_some() {
            let saved = self.designs.upsert_design(&design, given_name.is_some()).await?;
            self.announce_saved(&saved).await;
            return Ok(saved);
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            match self.designs.insert_design(&design).await? {
                InsertOutcome::Inserted => {
                    self.announce_saved(&design).await;
                    return Ok(design);
                }
                InsertOutcome::DuplicateKey => {
                    warn!(user_id, attempt, code = %design.design_code, "design code collision");
                    design.design_code = (self.generate_code)();
                }
            }
        }
        Err(CommerceError::DesignCodeExhausted)
    }

    async fn announce_saved(&self, design: &SavedDesign) {
        info!(design_id = %design.id, user_id = design.user_id, code = %design.design_code, "design saved");
        self.events.publish(&DomainEvent::Design(DesignEvent::Saved {
            design_id: design.id, user_id: design.user_id, design_code: design.design_code.to_string(),
        })).await;
    }

    pub async fn get_design(&self, user_id: i64, design_code: &str) -> Result<SavedDesign> {
        self.ensure_active(user_id).await?;
        let code = DesignCode::new(design_code).map_err(|_| CommerceError::DesignNotFound)?;
        self.designs.find_design(user_id, &code).await?.ok_or(CommerceError::DesignNotFound)
    }

    pub async fn list_designs(&self, user_id: i64, query: DesignListQuery) -> Result<Page<SavedDesign>> {
        self.ensure_active(user_id).await?;
        let (data, total) = self.designs.list_designs(user_id, &query).await?;
        Ok(Page { data, meta: PageMeta::new(&query, total) })
    }

    pub async fn delete_design(&self, user_id: i64, design_code: &str) -> Result<()> {
        self.ensure_active(user_id).await?;
        let code = DesignCode::new(design_code).map_err(|_| CommerceError::DesignNotFound)?;
        if !self.designs.soft_delete_design(user_id, &code).await? {
            return Err(CommerceError::DesignNotFound);
        }
        info!(user_id, code = %code, "design deleted");
        self.events.publish(&DomainEvent::Design(DesignEvent::Deleted { user_id, design_code: code.to_string() })).await;
        Ok(())
    }

    /// Publishes a configuration under a public code. Sharing an identical
    /// configuration again returns the existing link, renewed if it expired.
    pub async fn share_design(&self, configuration: Value) -> Result<SharedDesign> {
        ParsedDesign::parse(&configuration)?;
        let now = Utc::now();
        let hash = config_hash(&configuration);
        if let Some(existing) = self.reuse_share(&hash).await? {
            return Ok(existing);
        }

        let mut shared = SharedDesign::new((self.generate_code)(), configuration, now);
        for attempt in 1..=MAX_SHARE_ATTEMPTS {
            match self.shares.insert_shared(&shared).await? {
                InsertOutcome::Inserted => {
                    info!(share_id = %shared.id, code = %shared.design_code, "design shared");
                    self.events.publish(&DomainEvent::Design(DesignEvent::Shared {
                        share_id: shared.id, design_code: shared.design_code.to_string(),
                    })).await;
                    return Ok(shared);
                }
                InsertOutcome::DuplicateKey => {
                    // A concurrent share of the same configuration wins the hash.
                    if let Some(existing) = self.reuse_share(&hash).await? {
                        return Ok(existing);
                    }
                    warn!(attempt, code = %shared.design_code, "share code collision");
                    shared.design_code = (self.generate_code)();
                }
            }
        }
        Err(CommerceError::DesignCodeExhausted)
    }

    async fn reuse_share(&self, hash: &str) -> Result<Option<SharedDesign>> {
        let Some(existing) = self.shares.find_shared_by_hash(hash).await? else { return Ok(None) };
        let now = Utc::now();
        if existing.is_live(now) {
            return Ok(Some(existing));
        }
        Ok(Some(self.shares.renew_shared(existing.id, now + Duration::days(SHARE_TTL_DAYS)).await?))
    }

    pub async fn get_shared_design(&self, design_code: &str) -> Result<SharedDesign> {
        let code = DesignCode::new(design_code).map_err(|_| CommerceError::SharedDesignNotFound)?;
        self.shares.find_shared(&code).await?
            .filter(|s| s.is_live(Utc::now()))
            .ok_or(CommerceError::SharedDesignNotFound)
    }
}
