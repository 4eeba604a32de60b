//! An in-process adapter used by the orchestrator's own test suite to
//! exercise the deadline-bound fan-out without a network hop.

use super::{Adapter, AdapterError};
use crate::core::models::{BidderRequest, MediaType, PBSBid, PBSBidBuilder, UsersyncInfo};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

enum MockOutcome {
    Bids(Vec<PBSBid>),
    NoBid,
    Error(String),
}

pub struct MockAdapter {
    code: String,
    family_name: String,
    delay: Duration,
    outcome: MockOutcome,
    usersync: Option<UsersyncInfo>,
    skip_no_cookies: bool,
}

impl MockAdapter {
    /// Responds after `delay` with a single banner bid at `price` for
    /// every ad unit the bidder was sent.
    pub fn bid(code: impl Into<String>, price: f64, delay: Duration) -> Self {
        let code = code.into();
        Self {
            family_name: code.clone(),
            code,
            delay,
            outcome: MockOutcome::Bids(Vec::new()),
            usersync: None,
            skip_no_cookies: false,
        }
        .with_price(price)
    }

    fn with_price(mut self, price: f64) -> Self {
        self.outcome = MockOutcome::Bids(vec![PriceTemplate(price).into()]);
        self
    }

    pub fn no_bid(code: impl Into<String>, delay: Duration) -> Self {
        let code = code.into();
        Self {
            family_name: code.clone(),
            code,
            delay,
            outcome: MockOutcome::NoBid,
            usersync: None,
            skip_no_cookies: false,
        }
    }

    pub fn erroring(code: impl Into<String>, delay: Duration, message: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            family_name: code.clone(),
            code,
            delay,
            outcome: MockOutcome::Error(message.into()),
            usersync: None,
            skip_no_cookies: false,
        }
    }

    pub fn with_usersync(mut self, info: UsersyncInfo, skip_no_cookies: bool) -> Self {
        self.usersync = Some(info);
        self.skip_no_cookies = skip_no_cookies;
        self
    }

    pub fn with_family_name(mut self, family_name: impl Into<String>) -> Self {
        self.family_name = family_name.into();
        self
    }
}

/// A marker used purely to build a templated per-ad-unit bid at
/// construction time; the real per-ad-unit expansion happens in `call`.
struct PriceTemplate(f64);

impl From<PriceTemplate> for PBSBid {
    fn from(t: PriceTemplate) -> Self {
        PBSBidBuilder::default()
            .bidder_code("template")
            .bid_id("template")
            .ad_unit_code("template")
            .price(t.0)
            .creative_media_type(MediaType::Banner)
            .build()
            .expect("template bid always builds")
    }
}

#[async_trait]
impl Adapter for MockAdapter {
    fn code(&self) -> &str {
        &self.code
    }

    fn family_name(&self) -> &str {
        &self.family_name
    }

    fn usersync_info(&self) -> Option<UsersyncInfo> {
        self.usersync.clone()
    }

    fn skip_no_cookies(&self) -> bool {
        self.skip_no_cookies
    }

    async fn call(
        &self,
        deadline: Instant,
        bidder: &BidderRequest,
    ) -> Result<Vec<PBSBid>, AdapterError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if Instant::now() >= deadline {
            return Err(AdapterError::Timeout);
        }

        match &self.outcome {
            MockOutcome::NoBid => Ok(Vec::new()),
            MockOutcome::Error(msg) => Err(AdapterError::Other(msg.clone())),
            MockOutcome::Bids(template) => {
                let Some(template_bid) = template.first() else {
                    return Ok(Vec::new());
                };

                let bids = bidder
                    .ad_units
                    .iter()
                    .map(|au| {
                        PBSBidBuilder::default()
                            .bidder_code(self.code.clone())
                            .bid_id(au.bid_id.clone())
                            .ad_unit_code(au.code.clone())
                            .price(template_bid.price)
                            .creative_media_type(MediaType::Banner)
                            .build()
                            .expect("mock bid always builds")
                    })
                    .collect();

                Ok(bids)
            }
        }
    }
}
