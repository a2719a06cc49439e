// file: src/validator/rules.rs
// description: field-level rules for normalized broker records

use crate::models::NormalizedBrokerRecord;
use crate::utils::Validator;
use crate::validator::{RecordValidator, ValidationOutcome};

pub const DEFAULT_MAX_NAME_LENGTH: usize = 120;
pub const MAX_RATING: f64 = 5.0;

/// Errors make a record invalid; warnings flag thin but importable data.
#[derive(Debug, Clone)]
pub struct BrokerValidator {
    max_name_length: usize,
}

impl BrokerValidator {
    pub fn new() -> Self {
        Self {
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }

    pub fn with_max_name_length(mut self, max_name_length: usize) -> Self {
        self.max_name_length = max_name_length;
        self
    }

    fn check_name(&self, record: &NormalizedBrokerRecord, errors: &mut Vec<String>) {
        match record.display_name() {
            None => errors.push("missing name".to_string()),
            Some(name) if name.chars().count() > self.max_name_length => errors.push(format!(
                "name exceeds {} characters: {}",
                self.max_name_length,
                Validator::truncate_text(name, 40)
            )),
            Some(_) => {}
        }
    }

    fn check_collections(record: &NormalizedBrokerRecord, errors: &mut Vec<String>) {
        for (index, regulation) in record.regulations.iter().enumerate() {
            if regulation.authority.trim().is_empty() {
                errors.push(format!("regulation #{} has no authority", index + 1));
            }
        }

        for link in &record.affiliate_links {
            if let Err(e) = Validator::validate_url(&link.url) {
                errors.push(format!("affiliate link rejected: {}", e));
            }
        }

        if let Some(website) = &record.website {
            if Validator::validate_url(website).is_err() {
                errors.push(format!("website is not a valid URL: {}", website));
            }
        }

        for (index, review) in record.reviews.iter().enumerate() {
            if let Some(rating) = review.rating {
                if !(0.0..=MAX_RATING).contains(&rating) {
                    errors.push(format!(
                        "review #{} rating {} outside 0-{}",
                        index + 1,
                        rating,
                        MAX_RATING
                    ));
                }
            }
        }
    }

    fn coverage_warnings(record: &NormalizedBrokerRecord) -> Vec<String> {
        let checks = [
            (record.regulations.is_empty(), "no regulations found"),
            (record.platforms.is_empty(), "no platforms found"),
            (record.payment_methods.is_empty(), "no payment methods found"),
            (record.account_types.is_empty(), "no account types found"),
        ];

        checks
            .iter()
            .filter(|(missing, _)| *missing)
            .map(|(_, message)| message.to_string())
            .collect()
    }
}

impl Default for BrokerValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordValidator for BrokerValidator {
    fn validate(&self, record: &NormalizedBrokerRecord) -> ValidationOutcome {
        let mut errors = Vec::new();
        self.check_name(record, &mut errors);
        Self::check_collections(record, &mut errors);

        ValidationOutcome::from_findings(errors, Self::coverage_warnings(record))
    }
}
