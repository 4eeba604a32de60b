//! The one concrete adapter we ship: a config-driven HTTP/JSON bidder
//! client. Real bidder adapters are out of scope (§1); this exists so the
//! orchestrator has a real implementation of the `Adapter` contract to
//! dispatch to, and so operators can point it at any endpoint that speaks
//! the generic envelope below.

use super::{Adapter, AdapterError};
use crate::core::models::{AdUnit, BidderRequest, MediaType, PBSBid, PBSBidBuilder, UsersyncInfo};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    bidder_code: &'a str,
    ad_units: &'a [AdUnit],
}

#[derive(Debug, Deserialize)]
struct WireBid {
    bid_id: String,
    ad_unit_code: String,
    price: f64,
    #[serde(default)]
    adm: String,
    #[serde(default)]
    nurl: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    creative_media_type: MediaType,
}

/// Configuration for a single bidder endpoint, deserialized straight out
/// of `AppConfig.bidders[]` (§6 configuration table).
#[derive(Debug, Clone, Deserialize)]
pub struct HttpAdapterConfig {
    pub code: String,
    #[serde(default = "HttpAdapterConfig::default_family_name_placeholder")]
    pub family_name: Option<String>,
    pub endpoint: String,
    pub user_sync_url: Option<String>,
    #[serde(default)]
    pub skip_no_cookies: bool,
}

impl HttpAdapterConfig {
    fn default_family_name_placeholder() -> Option<String> {
        None
    }
}

pub struct HttpAdapter {
    code: String,
    family_name: String,
    endpoint: String,
    usersync: Option<UsersyncInfo>,
    skip_no_cookies: bool,
    client: Client,
}

impl HttpAdapter {
    pub fn new(config: HttpAdapterConfig, client: Client) -> Self {
        let family_name = config.family_name.clone().unwrap_or_else(|| config.code.clone());
        let usersync = config.user_sync_url.clone().map(|url| UsersyncInfo {
            url,
            r#type: "redirect".to_string(),
        });

        Self {
            code: config.code,
            family_name,
            endpoint: config.endpoint,
            usersync,
            skip_no_cookies: config.skip_no_cookies,
            client,
        }
    }
}

#[async_trait]
impl Adapter for HttpAdapter {
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
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(AdapterError::Timeout);
        }

        let body = WireRequest {
            bidder_code: &bidder.bidder_code,
            ad_units: &bidder.ad_units,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(remaining)
            .json(&body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        if !response.status().is_success() {
            debug!(
                bidder = self.code,
                status = response.status().as_u16(),
                "bidder returned non-success status"
            );
            return Ok(Vec::new());
        }

        let wire_bids: Vec<WireBid> = response.json().await.map_err(classify_reqwest_error)?;

        let mut bids = Vec::with_capacity(wire_bids.len());
        for wb in wire_bids {
            match PBSBidBuilder::default()
                .bidder_code(self.code.clone())
                .bid_id(wb.bid_id)
                .ad_unit_code(wb.ad_unit_code)
                .price(wb.price)
                .adm(wb.adm)
                .nurl(wb.nurl)
                .width(wb.width)
                .height(wb.height)
                .creative_media_type(wb.creative_media_type)
                .build()
            {
                Ok(bid) => bids.push(bid),
                Err(e) => warn!(bidder = self.code, error = %e, "dropping malformed bid"),
            }
        }

        Ok(bids)
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> AdapterError {
    if err.is_timeout() {
        AdapterError::Timeout
    } else {
        AdapterError::Other(err.to_string())
    }
}

/// Builds the shared `reqwest::Client` used by every `HttpAdapter`
/// instance, mirroring the connection-pooling defaults a high-QPS exchange
/// needs: bounded connect/total timeouts, keepalive, and http2 upgrades.
pub fn build_demand_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent("hbauction/1.0")
        .connect_timeout(Duration::from_millis(500))
        .pool_max_idle_per_host(128)
        .pool_idle_timeout(Some(Duration::from_secs(30)))
        .tcp_keepalive(Some(Duration::from_secs(20)))
        .tcp_nodelay(true)
        .gzip(true)
        .deflate(true)
        .build()
}
