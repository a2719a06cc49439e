// file: src/models/counts.rs
// description: per-entity counters folded from file to batch to pipeline totals

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCounts {
    pub regulations: usize,
    pub features: usize,
    pub trading_conditions: usize,
    pub account_types: usize,
    pub platforms: usize,
    pub payment_methods: usize,
    pub support: usize,
    pub education: usize,
    pub reviews: usize,
    pub affiliate_links: usize,
    pub promotions: usize,
}

impl EntityCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.entries().iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Label/value pairs in a stable display order.
    pub fn entries(&self) -> [(&'static str, usize); 11] {
        [
            ("regulations", self.regulations),
            ("features", self.features),
            ("trading conditions", self.trading_conditions),
            ("account types", self.account_types),
            ("platforms", self.platforms),
            ("payment methods", self.payment_methods),
            ("support", self.support),
            ("education", self.education),
            ("reviews", self.reviews),
            ("affiliate links", self.affiliate_links),
            ("promotions", self.promotions),
        ]
    }
}

impl AddAssign for EntityCounts {
    fn add_assign(&mut self, other: Self) {
        self.regulations += other.regulations;
        self.features += other.features;
        self.trading_conditions += other.trading_conditions;
        self.account_types += other.account_types;
        self.platforms += other.platforms;
        self.payment_methods += other.payment_methods;
        self.support += other.support;
        self.education += other.education;
        self.reviews += other.reviews;
        self.affiliate_links += other.affiliate_links;
        self.promotions += other.promotions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_assign_is_field_wise() {
        let mut totals = EntityCounts {
            platforms: 2,
            reviews: 1,
            ..EntityCounts::default()
        };
        totals += EntityCounts {
            platforms: 3,
            promotions: 4,
            ..EntityCounts::default()
        };

        assert_eq!(totals.platforms, 5);
        assert_eq!(totals.reviews, 1);
        assert_eq!(totals.promotions, 4);
        assert_eq!(totals.total(), 10);
    }

    #[test]
    fn test_empty_counts() {
        assert!(EntityCounts::new().is_empty());
    }
}
