// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod broker;
pub mod counts;

pub use broker::{
    AccountType, AffiliateLink, EducationItem, Feature, FromLabel, NormalizedBrokerRecord,
    PaymentMethod, Platform, Promotion, Regulation, Review, SupportChannel, TradingCondition,
};
pub use counts::EntityCounts;
