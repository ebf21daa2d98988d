//! Value Objects for custom furniture orders

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog identifier with any placement instance suffix removed.
///
/// The design editor places several instances of the same catalog item and tags
/// each with `_<n>`, so `"cmx70008_2"` refers to catalog item `"cmx70008"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CatalogId(String);

impl CatalogId {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }

    pub fn from_instance(instance_id: &str) -> Self { Self(strip_instance_suffix(instance_id).to_string()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Removes a trailing `_<digits>` suffix, leaving other underscores untouched.
pub fn strip_instance_suffix(instance_id: &str) -> &str {
    match instance_id.rsplit_once('_') {
        Some((base, suffix)) if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) => base,
        _ => instance_id,
    }
}

const DESIGN_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const DESIGN_CODE_LEN: usize = 6;

/// Short shareable code identifying a saved design within a user's library.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DesignCode(String);

impl DesignCode {
    pub fn new(value: impl Into<String>) -> Result<Self, DesignCodeError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(DesignCodeError::Empty); }
        if value.len() > 64 { return Err(DesignCodeError::TooLong); }
        Ok(Self(value))
    }

    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let code = (0..DESIGN_CODE_LEN)
            .map(|_| DESIGN_CODE_ALPHABET[rng.gen_range(0..DESIGN_CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for DesignCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum DesignCodeError { Empty, TooLong }
impl std::error::Error for DesignCodeError {}
impl fmt::Display for DesignCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "design code empty"), Self::TooLong => write!(f, "design code too long") }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_instance_suffix() {
        assert_eq!(strip_instance_suffix("cmlsujgx70008fgvtwbc0myzs_1"), "cmlsujgx70008fgvtwbc0myzs");
        assert_eq!(strip_instance_suffix("chair_12"), "chair");
        assert_eq!(strip_instance_suffix("oak_table"), "oak_table");
        assert_eq!(strip_instance_suffix("oak_table_3"), "oak_table");
        assert_eq!(strip_instance_suffix("sofa_"), "sofa_");
        assert_eq!(strip_instance_suffix("plain"), "plain");
    }

    #[test]
    fn test_design_code() {
        assert_eq!(DesignCode::new("  ABC123 ").unwrap().as_str(), "ABC123");
        assert_eq!(DesignCode::new("   "), Err(DesignCodeError::Empty));
        let generated = DesignCode::generate();
        assert_eq!(generated.as_str().len(), 6);
        assert!(generated.as_str().bytes().all(|b| DESIGN_CODE_ALPHABET.contains(&b)));
    }
}
