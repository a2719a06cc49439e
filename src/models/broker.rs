// file: src/models/broker.rs
// description: normalized broker record produced by every parser and extractor
// reference: internal data structures

use crate::models::EntityCounts;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Canonical in-memory broker shape consumed by validation and import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalizedBrokerRecord {
    pub name: Option<String>,
    pub website: Option<String>,
    pub regulations: Vec<Regulation>,
    pub features: Vec<Feature>,
    pub trading_conditions: Vec<TradingCondition>,
    pub account_types: Vec<AccountType>,
    pub platforms: Vec<Platform>,
    pub payment_methods: Vec<PaymentMethod>,
    pub support: Vec<SupportChannel>,
    pub education: Vec<EducationItem>,
    pub reviews: Vec<Review>,
    pub affiliate_links: Vec<AffiliateLink>,
    pub promotions: Vec<Promotion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Regulation {
    #[serde(alias = "regulator", alias = "name")]
    pub authority: String,
    #[serde(alias = "license", alias = "licenseNo")]
    pub license_number: Option<String>,
    #[serde(alias = "jurisdiction")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feature {
    #[serde(alias = "title")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingCondition {
    #[serde(alias = "name", alias = "key")]
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountType {
    pub name: String,
    #[serde(alias = "minimumDeposit", alias = "min_deposit")]
    pub min_deposit: Option<String>,
    pub spreads: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Platform {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentMethod {
    pub name: String,
    pub fees: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportChannel {
    #[serde(alias = "name", alias = "type")]
    pub channel: String,
    #[serde(alias = "hours")]
    pub availability: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationItem {
    #[serde(alias = "name")]
    pub title: String,
    #[serde(alias = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Review {
    pub author: Option<String>,
    #[serde(alias = "score")]
    pub rating: Option<f64>,
    #[serde(alias = "text", alias = "content")]
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffiliateLink {
    #[serde(alias = "href", alias = "link")]
    pub url: String,
    #[serde(alias = "text")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Promotion {
    #[serde(alias = "name")]
    pub title: String,
    pub description: Option<String>,
}

/// Items that can be built from a bare string, for sources listing a
/// collection as `["MT4", "MT5"]` instead of objects.
pub trait FromLabel {
    fn from_label(label: String) -> Self;
}

impl FromLabel for Regulation {
    fn from_label(label: String) -> Self {
        Self {
            authority: label,
            ..Self::default()
        }
    }
}

impl FromLabel for Feature {
    fn from_label(label: String) -> Self {
        Self {
            name: label,
            description: None,
        }
    }
}

impl FromLabel for TradingCondition {
    fn from_label(label: String) -> Self {
        match label.split_once(':') {
            Some((key, value)) => Self {
                label: key.trim().to_string(),
                value: value.trim().to_string(),
            },
            None => Self {
                label,
                value: String::new(),
            },
        }
    }
}

impl FromLabel for AccountType {
    fn from_label(label: String) -> Self {
        Self {
            name: label,
            ..Self::default()
        }
    }
}

impl FromLabel for Platform {
    fn from_label(label: String) -> Self {
        Self { name: label }
    }
}

impl FromLabel for PaymentMethod {
    fn from_label(label: String) -> Self {
        Self {
            name: label,
            fees: None,
        }
    }
}

impl FromLabel for SupportChannel {
    fn from_label(label: String) -> Self {
        Self {
            channel: label,
            availability: None,
        }
    }
}

impl FromLabel for EducationItem {
    fn from_label(label: String) -> Self {
        Self {
            title: label,
            kind: None,
        }
    }
}

impl FromLabel for Review {
    fn from_label(label: String) -> Self {
        Self {
            body: label,
            ..Self::default()
        }
    }
}

impl FromLabel for AffiliateLink {
    fn from_label(label: String) -> Self {
        Self {
            url: label,
            label: None,
        }
    }
}

impl FromLabel for Promotion {
    fn from_label(label: String) -> Self {
        Self {
            title: label,
            description: None,
        }
    }
}

impl NormalizedBrokerRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Trimmed broker name, `None` when absent or blank.
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn entity_counts(&self) -> EntityCounts {
        EntityCounts {
            regulations: self.regulations.len(),
            features: self.features.len(),
            trading_conditions: self.trading_conditions.len(),
            account_types: self.account_types.len(),
            platforms: self.platforms.len(),
            payment_methods: self.payment_methods.len(),
            support: self.support.len(),
            education: self.education.len(),
            reviews: self.reviews.len(),
            affiliate_links: self.affiliate_links.len(),
            promotions: self.promotions.len(),
        }
    }

    pub fn content_hash(&self) -> String {
        let serialized = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&serialized);
        format!("{:x}", hasher.finalize())
    }
}
