//! Ordering accounts and their address book

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Only `ACTIVE` accounts may act. Any other stored text is kept verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    #[default]
    Active,
    #[strum(default)]
    #[serde(untagged)]
    Other(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub account_status: AccountStatus,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Not soft-deleted and `ACTIVE`. Gates ordering, paying and the design library.
    pub fn can_order(&self) -> bool { self.deleted_at.is_none() && self.account_status == AccountStatus::Active }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub label: Option<String>,
    pub recipient_name: String,
    pub phone_number: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub district: Option<String>,
    pub subdistrict: Option<String>,
    pub province: String,
    pub postal_code: String,
    pub country: String,
    /// Courier-side subdistrict id resolved when the address was saved.
    pub courier_subdistrict_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Copy of an address frozen into an order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSnapshot {
    pub label: Option<String>,
    pub recipient_name: String,
    pub phone_number: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub district: Option<String>,
    pub subdistrict: Option<String>,
    pub province: String,
    pub postal_code: String,
    pub country: String,
    pub courier_subdistrict_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Address {
    pub fn snapshot(&self) -> AddressSnapshot {
        AddressSnapshot {
            label: self.label.clone(),
            recipient_name: self.recipient_name.clone(),
            phone_number: self.phone_number.clone(),
            line1: self.line1.clone(),
            line2: self.line2.clone(),
            city: self.city.clone(),
            district: self.district.clone(),
            subdistrict: self.subdistrict.clone(),
            province: self.province.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
            courier_subdistrict_id: self.courier_subdistrict_id.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn courier_subdistrict(&self) -> Option<&str> {
        self.courier_subdistrict_id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_can_order() {
        let mut account = Account {
            id: 1, first_name: "Sari".into(), last_name: "W".into(), email: "sari@example.com".into(),
            phone_number: None, account_status: AccountStatus::Active, deleted_at: None,
        };
        assert!(account.can_order());
        account.account_status = AccountStatus::Other("SUSPENDED".into());
        assert!(!account.can_order());
        account.account_status = AccountStatus::Active;
        account.deleted_at = Some(Utc::now());
        assert!(!account.can_order());
    }

    #[test]
    fn test_unknown_status_text_is_not_active() {
        assert_eq!("ACTIVE".parse::<AccountStatus>().unwrap(), AccountStatus::Active);
        assert_eq!("BANNED".parse::<AccountStatus>().unwrap(), AccountStatus::Other("BANNED".into()));
        assert_eq!("active".parse::<AccountStatus>().unwrap(), AccountStatus::Other("active".into()));
        let status: AccountStatus = serde_json::from_str("\"PENDING_REVIEW\"").unwrap();
        assert_eq!(status, AccountStatus::Other("PENDING_REVIEW".into()));
    }

    #[test]
    fn test_courier_subdistrict_blank_is_missing() {
        let mut address = Address { courier_subdistrict_id: Some("  ".into()), ..Default::default() };
        assert_eq!(address.courier_subdistrict(), None);
        address.courier_subdistrict_id = Some("17473".into());
        assert_eq!(address.courier_subdistrict(), Some("17473"));
        assert_eq!(address.snapshot().courier_subdistrict_id.as_deref(), Some("17473"));
    }
}
