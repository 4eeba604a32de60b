use compact_str::CompactString;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::Mutex;

use crate::core::cookie::UserSyncCookie;

/// A single acceptable pixel size for an ad unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

/// The media type of a returned creative. Bidders that do not report one
/// are assumed to be `Banner` for size-reconciliation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Banner,
    Video,
    Native,
    Audio,
}

/// A slot on the publisher's page or in-app placement.
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct AdUnit {
    pub code: CompactString,
    #[builder(default)]
    pub sizes: Vec<Size>,
    pub bid_id: CompactString,
    /// Opaque bidder-specific params, keyed by bidder code. Not interpreted
    /// by the orchestrator; forwarded to adapters verbatim.
    #[builder(default)]
    pub params: HashMap<String, serde_json::Value>,
}

/// App-context record. Its mere presence changes cookie-sync behavior
/// (§4.2, §4.5): there is no browser cookie to consult in an app request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppContext {
    pub bundle: Option<String>,
    pub name: Option<String>,
}

/// Per-bidder scratch state, populated during the auction and always
/// present in the response exactly once per dispatched bidder code
/// (§3 invariants).
#[derive(Debug, Clone, Serialize, Default)]
pub struct BidderRequest {
    pub bidder_code: CompactString,
    pub ad_units: Vec<AdUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(default)]
    pub num_bids: u32,
    #[serde(default)]
    pub no_cookie: bool,
    #[serde(default)]
    pub no_bid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usersync_info: Option<UsersyncInfo>,
}

impl BidderRequest {
    pub fn new(bidder_code: impl Into<CompactString>, ad_units: Vec<AdUnit>) -> Self {
        Self {
            bidder_code: bidder_code.into(),
            ad_units,
            ..Default::default()
        }
    }
}

/// A redirect target + metadata the client should follow to establish a
/// user-sync for a given bidder family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersyncInfo {
    pub url: String,
    pub r#type: String,
}

/// A single returned bid, normalized across adapters.
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct PBSBid {
    pub bidder_code: CompactString,
    pub bid_id: CompactString,
    pub ad_unit_code: CompactString,
    pub price: f64,
    #[builder(default)]
    pub adm: String,
    #[builder(default)]
    pub nurl: String,
    #[builder(default)]
    pub width: u32,
    #[builder(default)]
    pub height: u32,
    #[builder(default)]
    pub creative_media_type: MediaType,
    #[builder(default)]
    pub cache_id: Option<String>,
    #[builder(default)]
    pub ad_server_targeting: HashMap<String, String>,
    #[builder(default)]
    pub response_time: u64,
}

/// Inbound JSON body for `POST /auction`, pre-validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAuctionRequest {
    pub tid: String,
    #[serde(rename = "accountId")]
    pub account_id: String,
    pub url: Option<String>,
    pub app: Option<AppContext>,
    #[serde(rename = "timeoutMillis")]
    pub timeout_millis: Option<u64>,
    #[serde(rename = "adUnits")]
    pub ad_units: Vec<RawAdUnit>,
    #[serde(rename = "cacheMarkup", default)]
    pub cache_markup: bool,
    #[serde(rename = "sortBids", default)]
    pub sort_bids: bool,
    #[serde(rename = "maxKeyLength")]
    pub max_key_length: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAdUnit {
    pub code: String,
    #[serde(default)]
    pub sizes: Vec<Size>,
    #[serde(rename = "bidId")]
    pub bid_id: String,
    /// Bidder code -> opaque params, declares which bidders should receive
    /// this ad unit.
    pub bids: Vec<RawAdUnitBid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAdUnitBid {
    pub bidder: String,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

/// A fully validated, defaulted auction request, ready for the orchestrator.
pub struct AuctionRequest {
    pub tid: String,
    pub account_id: String,
    pub url: Option<String>,
    pub app: Option<AppContext>,
    pub timeout_millis: u64,
    pub ad_units: Vec<AdUnit>,
    pub bidders: Vec<BidderRequest>,
    pub cache_markup: bool,
    pub sort_bids: bool,
    pub max_key_length: Option<usize>,
    pub cookie: UserSyncCookie,
    pub start: tokio::time::Instant,
    pub is_safari: bool,
}

/// Mutable, shared-ownership per-bid-settlement context: result channel
/// senders populate `bidders` and `bids` concurrently during fan-out, then
/// the post-processing pipeline runs over the drained snapshot serially.
#[derive(Default)]
pub struct AuctionResultState {
    pub bidders: Mutex<Vec<BidderRequest>>,
    pub bids: Mutex<Vec<PBSBid>>,
    pub status: OnceLock<AuctionStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    Ok,
    NoCookie,
}

impl AuctionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AuctionStatus::Ok => "OK",
            AuctionStatus::NoCookie => "no_cookie",
        }
    }
}

/// Outbound JSON body for a successful `POST /auction`.
#[derive(Debug, Serialize)]
pub struct AuctionResponse {
    pub status: &'static str,
    pub tid: String,
    #[serde(rename = "bidderStatus")]
    pub bidder_status: Vec<BidderRequest>,
    pub bids: Vec<PBSBid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auction_status_as_str_matches_spec_wire_values() {
        assert_eq!(AuctionStatus::Ok.as_str(), "OK");
        assert_eq!(AuctionStatus::NoCookie.as_str(), "no_cookie");
    }

    #[test]
    fn bidder_request_new_starts_clean() {
        let br = BidderRequest::new("appnexus", vec![]);
        assert_eq!(br.bidder_code, "appnexus");
        assert!(!br.no_cookie);
        assert!(!br.no_bid);
        assert!(br.error.is_none());
    }
}
