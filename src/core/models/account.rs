use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Rounding rule applied to a bid's CPM before it is stringified into a
/// targeting key (§4.4, Glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PriceGranularity {
    Low,
    #[default]
    Med,
    High,
    Auto,
    Dense,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    #[serde(default)]
    pub price_granularity: PriceGranularity,
}

impl Account {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            price_granularity: PriceGranularity::default(),
        }
    }
}
