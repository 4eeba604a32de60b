//! C4: turns a raw inbound `/auction` body into a validated, defaulted
//! `AuctionRequest` the orchestrator can run. Account resolution (C2) and
//! cookie parsing (C3) happen here so the orchestrator never has to know
//! about either.

use crate::app::config::AppConfig;
use crate::core::accounts::AccountStore;
use crate::core::cookie::UserSyncCookie;
use crate::core::errors::AuctionError;
use crate::core::metrics::MetricsRegistry;
use crate::core::models::{
    Account, AdUnit, AdUnitBuilder, AuctionRequest, BidderRequest, RawAuctionRequest,
};
use actix_web::HttpRequest;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Parses and validates a decoded JSON body into an `AuctionRequest`,
/// resolving the account alongside it (the caller needs both to build an
/// `AuctionContext`).
pub async fn parse(
    raw: RawAuctionRequest,
    http_req: &HttpRequest,
    account_store: &dyn AccountStore,
    config: &AppConfig,
) -> Result<(AuctionRequest, Account), AuctionError> {
    let account = account_store
        .get(&raw.account_id)
        .await
        .map_err(|e| AuctionError::BadRequest(e.to_string()))?
        .ok_or(AuctionError::UnknownAccount(raw.account_id.clone()))?;

    MetricsRegistry::record_auction_request(&account.account_id);

    let timeout_millis = config.resolve_timeout_ms(raw.timeout_millis);

    let ad_units = raw
        .ad_units
        .iter()
        .map(|u| {
            AdUnitBuilder::default()
                .code(u.code.clone())
                .sizes(u.sizes.clone())
                .bid_id(u.bid_id.clone())
                .build()
                .map_err(|e| AuctionError::BadRequest(e.to_string()))
        })
        .collect::<Result<Vec<AdUnit>, AuctionError>>()?;

    let bidders = group_by_bidder(&raw)?;

    let is_safari = http_req
        .headers()
        .get("User-Agent")
        .and_then(|v| v.to_str().ok())
        .map(is_safari_user_agent)
        .unwrap_or(false);

    if is_safari {
        MetricsRegistry::record_safari_request();
    }

    let cookie = parse_cookie(http_req, &config.host_cookie.cookie_name);

    Ok((
        AuctionRequest {
            tid: raw.tid,
            account_id: raw.account_id,
            url: raw.url,
            app: raw.app,
            timeout_millis,
            ad_units,
            bidders,
            cache_markup: raw.cache_markup,
            sort_bids: raw.sort_bids,
            max_key_length: raw.max_key_length,
            cookie,
            start: tokio::time::Instant::now(),
            is_safari,
        },
        account,
    ))
}

/// Groups `adUnits` by declared bidder, preserving first-seen bidder
/// order (§4.1) rather than a `HashMap`'s unspecified iteration order —
/// §8's invariant that `bidderStatus` mirrors input order depends on it.
fn group_by_bidder(raw: &RawAuctionRequest) -> Result<Vec<BidderRequest>, AuctionError> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: std::collections::HashMap<String, Vec<AdUnit>> =
        std::collections::HashMap::new();

    for ad_unit in &raw.ad_units {
        for bid in &ad_unit.bids {
            let unit = AdUnitBuilder::default()
                .code(ad_unit.code.clone())
                .sizes(ad_unit.sizes.clone())
                .bid_id(ad_unit.bid_id.clone())
                .params(bid.params.clone())
                .build()
                .map_err(|e| AuctionError::BadRequest(e.to_string()))?;

            grouped.entry(bid.bidder.clone()).or_default().push(unit);
            if !order.contains(&bid.bidder) {
                order.push(bid.bidder.clone());
            }
        }
    }

    Ok(order
        .into_iter()
        .map(|code| {
            let units = grouped.remove(&code).unwrap_or_default();
            BidderRequest::new(code, units)
        })
        .collect())
}

fn is_safari_user_agent(ua: &str) -> bool {
    ua.contains("Safari")
        && !ua.contains("Chrome")
        && !ua.contains("Chromium")
        && !ua.contains("CriOS")
        && !ua.contains("Edg")
}

/// Decodes the host cookie (base64 JSON, §9 design notes). A missing or
/// malformed cookie is treated as an empty one rather than a request
/// failure — cookie state is advisory everywhere except cookie-sync.
pub(crate) fn parse_cookie(http_req: &HttpRequest, cookie_name: &str) -> UserSyncCookie {
    if cookie_name.is_empty() {
        return UserSyncCookie::empty();
    }

    http_req
        .cookie(cookie_name)
        .and_then(|c| URL_SAFE_NO_PAD.decode(c.value()).ok())
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_else(UserSyncCookie::empty)
}

/// Encodes a cookie back to the same base64-JSON wire shape `parse_cookie`
/// decodes, for handlers that mutate it (`/setuid`).
pub(crate) fn encode_cookie(cookie: &UserSyncCookie) -> String {
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(cookie).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_real_safari_but_not_chrome_or_ios_chrome() {
        assert!(is_safari_user_agent(
            "Mozilla/5.0 (Macintosh) AppleWebKit/605 Safari/605.1"
        ));
        assert!(!is_safari_user_agent(
            "Mozilla/5.0 (Macintosh) AppleWebKit/537 Chrome/117 Safari/537"
        ));
        assert!(!is_safari_user_agent(
            "Mozilla/5.0 (iPhone) AppleWebKit/605 CriOS/117 Safari/605"
        ));
    }

    #[test]
    fn group_by_bidder_preserves_first_seen_order() {
        let raw: RawAuctionRequest = serde_json::from_value(serde_json::json!({
            "tid": "t1",
            "accountId": "acc",
            "adUnits": [
                {"code": "u1", "bidId": "b1", "bids": [{"bidder": "rubicon"}, {"bidder": "appnexus"}]},
                {"code": "u2", "bidId": "b2", "bids": [{"bidder": "appnexus"}]}
            ]
        }))
        .unwrap();

        let bidders = group_by_bidder(&raw).unwrap();
        assert_eq!(bidders[0].bidder_code, "rubicon");
        assert_eq!(bidders[1].bidder_code, "appnexus");
        assert_eq!(bidders[1].ad_units.len(), 2);
    }
}
