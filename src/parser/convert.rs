// file: src/parser/convert.rs
// description: conversion of loosely shaped json broker literals into normalized records
// reference: https://docs.rs/serde_json

use crate::models::{
    AffiliateLink, FromLabel, NormalizedBrokerRecord, TradingCondition,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const NAME_KEYS: &[&str] = &["name", "brokerName", "broker_name", "title", "broker"];
const WRAPPER_KEYS: &[&str] = &["brokers", "brokerList", "broker_list", "items", "data"];
const WEBSITE_KEYS: &[&str] = &["website", "url", "site", "homepage"];

/// Maps script-bundle objects onto the canonical record. Accepts camelCase
/// and snake_case keys plus a few common synonyms, and collection items given
/// either as bare strings or as objects.
#[derive(Debug, Clone, Default)]
pub struct RecordConverter;

impl RecordConverter {
    pub fn new() -> Self {
        Self
    }

    /// Expands a parsed literal into the broker objects it holds: an array,
    /// an object wrapping a `brokers` list, or a single broker object. An
    /// object carrying a broker name is never treated as a wrapper.
    pub fn broker_values(value: &Value) -> Vec<&Value> {
        match value {
            Value::Array(items) => items.iter().filter(|v| v.is_object()).collect(),
            Value::Object(map) => Self::wrapped(map).unwrap_or_else(|| vec![value]),
            _ => Vec::new(),
        }
    }

    fn wrapped(map: &Map<String, Value>) -> Option<Vec<&Value>> {
        if is_named(map) {
            return None;
        }

        match find(map, WRAPPER_KEYS)? {
            Value::Array(items) => {
                let brokers: Vec<&Value> = items.iter().filter(|v| v.is_object()).collect();
                (!brokers.is_empty()).then_some(brokers)
            }
            inner @ Value::Object(inner_map) if is_named(inner_map) => Some(vec![inner]),
            Value::Object(inner_map) => Self::wrapped(inner_map),
            _ => None,
        }
    }

    pub fn convert(&self, value: &Value) -> Option<NormalizedBrokerRecord> {
        let map = value.as_object()?;

        Some(NormalizedBrokerRecord {
            name: text(find(map, NAME_KEYS)),
            website: text(find(map, WEBSITE_KEYS)),
            regulations: items(find(map, &["regulations", "regulation", "licenses", "regulators"])),
            features: items(find(map, &["features", "highlights"])),
            trading_conditions: trading_conditions(find(
                map,
                &["tradingConditions", "trading_conditions", "conditions"],
            )),
            account_types: items(find(map, &["accountTypes", "account_types", "accounts"])),
            platforms: items(find(map, &["platforms", "tradingPlatforms", "trading_platforms"])),
            payment_methods: items(find(
                map,
                &["paymentMethods", "payment_methods", "payments", "depositMethods"],
            )),
            support: items(find(map, &["support", "supportChannels", "support_channels", "customerSupport"])),
            education: items(find(map, &["education", "educationItems", "educational_resources", "learning"])),
            reviews: items(find(map, &["reviews", "userReviews", "user_reviews"])),
            affiliate_links: affiliate_links(map),
            promotions: items(find(map, &["promotions", "bonuses", "offers"])),
        })
    }
}

fn find<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
}

fn is_named(map: &Map<String, Value>) -> bool {
    text(find(map, NAME_KEYS)).is_some()
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn items<T: DeserializeOwned + FromLabel>(value: Option<&Value>) -> Vec<T> {
    match value {
        Some(Value::Array(entries)) => entries.iter().filter_map(item).collect(),
        Some(single) => item(single).into_iter().collect(),
        None => Vec::new(),
    }
}

fn item<T: DeserializeOwned + FromLabel>(value: &Value) -> Option<T> {
    match value {
        Value::String(label) if !label.trim().is_empty() => {
            Some(T::from_label(label.trim().to_string()))
        }
        Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}

/// Conditions are often a flat `{ "spread": "0.6", "leverage": "1:500" }` map.
fn trading_conditions(value: Option<&Value>) -> Vec<TradingCondition> {
    match value {
        Some(Value::Object(map)) if !map.contains_key("label") && !map.contains_key("value") => map
            .iter()
            .filter_map(|(label, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => return None,
                    other => other.to_string(),
                };
                Some(TradingCondition {
                    label: label.clone(),
                    value,
                })
            })
            .collect(),
        other => items(other),
    }
}

fn affiliate_links(map: &Map<String, Value>) -> Vec<AffiliateLink> {
    let mut links: Vec<AffiliateLink> =
        items(find(map, &["affiliateLinks", "affiliate_links", "affiliates"]));

    if let Some(url) = text(find(map, &["affiliateUrl", "affiliate_url", "affiliateLink"])) {
        if !links.iter().any(|link| link.url == url) {
            links.push(AffiliateLink { url, label: None });
        }
    }

    links
}
