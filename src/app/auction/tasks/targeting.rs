use crate::app::auction::context::AuctionContext;
use crate::app::pipeline::AsyncTask;
use crate::core::errors::AuctionError;
use crate::core::models::{PBSBid, PriceGranularity};
use crate::core::pricing::bucket_price;
use async_trait::async_trait;
use std::collections::HashMap;

const AUDIENCE_NETWORK: &str = "audienceNetwork";

/// Post-processing pipeline stage; a no-op unless the request set `sortBids`.
pub struct TargetingTask;

#[async_trait]
impl AsyncTask<AuctionContext, AuctionError> for TargetingTask {
    async fn run(&self, ctx: &AuctionContext) -> Result<(), AuctionError> {
        if !ctx.request.sort_bids {
            return Ok(());
        }

        let mut bids = ctx.result.bids.lock().await;
        build_targeting(&mut bids, ctx.account.price_granularity, ctx.request.max_key_length);
        Ok(())
    }
}

/// §4.4: builds per-bid ad-server targeting keys. A pure function of
/// `(bids, granularity, max_key_length)` — grouping, sorting and key
/// assembly never touch anything outside the slice.
pub fn build_targeting(bids: &mut [PBSBid], granularity: PriceGranularity, max_key_length: Option<usize>) {
    let mut by_ad_unit: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, bid) in bids.iter().enumerate() {
        by_ad_unit.entry(bid.ad_unit_code.to_string()).or_default().push(idx);
    }

    for indices in by_ad_unit.values_mut() {
        indices.sort_by(|&a, &b| bids[b].price.total_cmp(&bids[a].price));

        for (rank, &idx) in indices.iter().enumerate() {
            let keys = bid_keys(&bids[idx], granularity, max_key_length);
            bids[idx].ad_server_targeting = keys;

            if rank == 0 {
                let top_keys = top_bid_keys(&bids[idx], granularity, max_key_length);
                bids[idx].ad_server_targeting.extend(top_keys);
            }
        }
    }
}

fn truncate_key(key: String, max_key_length: Option<usize>) -> String {
    match max_key_length {
        Some(max) if key.len() > max => String::from_utf8_lossy(&key.as_bytes()[..max]).into_owned(),
        _ => key,
    }
}

fn bid_keys(bid: &PBSBid, granularity: PriceGranularity, max_key_length: Option<usize>) -> HashMap<String, String> {
    let suffix = bid.bidder_code.as_str();
    let price = bucket_price(bid.price, granularity);
    let mut keys = HashMap::new();

    keys.insert(truncate_key(format!("hb_pb_{suffix}"), max_key_length), price);
    keys.insert(
        truncate_key(format!("hb_bidder_{suffix}"), max_key_length),
        bid.bidder_code.to_string(),
    );
    keys.insert(
        truncate_key(format!("hb_cache_id_{suffix}"), max_key_length),
        bid.cache_id.clone().unwrap_or_default(),
    );

    if bid.width != 0 && bid.height != 0 {
        keys.insert(
            truncate_key(format!("hb_size_{suffix}"), max_key_length),
            format!("{}x{}", bid.width, bid.height),
        );
    }

    keys
}

fn top_bid_keys(bid: &PBSBid, granularity: PriceGranularity, max_key_length: Option<usize>) -> HashMap<String, String> {
    let price = bucket_price(bid.price, granularity);
    let mut keys = HashMap::new();

    keys.insert(truncate_key("hb_pb".to_string(), max_key_length), price);
    keys.insert(
        truncate_key("hb_bidder".to_string(), max_key_length),
        bid.bidder_code.to_string(),
    );
    keys.insert(
        truncate_key("hb_cache_id".to_string(), max_key_length),
        bid.cache_id.clone().unwrap_or_default(),
    );

    if bid.width != 0 && bid.height != 0 {
        keys.insert(
            truncate_key("hb_size".to_string(), max_key_length),
            format!("{}x{}", bid.width, bid.height),
        );
    }

    let load_type = if bid.bidder_code == AUDIENCE_NETWORK {
        "demand_sdk"
    } else {
        "html"
    };
    keys.insert(
        truncate_key("hb_creative_loadtype".to_string(), max_key_length),
        load_type.to_string(),
    );

    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::PBSBidBuilder;

    fn bid(bidder: &str, ad_unit: &str, price: f64) -> PBSBid {
        PBSBidBuilder::default()
            .bidder_code(bidder)
            .bid_id("b1")
            .ad_unit_code(ad_unit)
            .price(price)
            .width(300u32)
            .height(250u32)
            .build()
            .unwrap()
    }

    #[test]
    fn top_bid_gets_unsuffixed_keys_and_all_bids_get_suffixed_keys() {
        let mut bids = vec![bid("appnexus", "u1", 1.23), bid("rubicon", "u1", 0.50)];

        build_targeting(&mut bids, PriceGranularity::Med, None);

        let top = bids.iter().find(|b| b.bidder_code == "appnexus").unwrap();
        assert_eq!(top.ad_server_targeting.get("hb_pb").unwrap(), "1.20");
        assert_eq!(top.ad_server_targeting.get("hb_pb_appnexus").unwrap(), "1.20");

        let second = bids.iter().find(|b| b.bidder_code == "rubicon").unwrap();
        assert!(!second.ad_server_targeting.contains_key("hb_pb"));
        assert_eq!(second.ad_server_targeting.get("hb_pb_rubicon").unwrap(), "0.50");
    }

    #[test]
    fn audience_network_gets_demand_sdk_loadtype() {
        let mut bids = vec![bid("audienceNetwork", "u1", 1.0)];
        build_targeting(&mut bids, PriceGranularity::Med, None);
        assert_eq!(
            bids[0].ad_server_targeting.get("hb_creative_loadtype").unwrap(),
            "demand_sdk"
        );
    }

    #[test]
    fn non_audience_network_gets_html_loadtype() {
        let mut bids = vec![bid("appnexus", "u1", 1.0)];
        build_targeting(&mut bids, PriceGranularity::Med, None);
        assert_eq!(
            bids[0].ad_server_targeting.get("hb_creative_loadtype").unwrap(),
            "html"
        );
    }

    #[test]
    fn max_key_length_truncates_key_names_not_values() {
        let mut bids = vec![bid("appnexus", "u1", 1.23)];
        build_targeting(&mut bids, PriceGranularity::Med, Some(5));

        let keys: Vec<&String> = bids[0].ad_server_targeting.keys().collect();
        assert!(keys.iter().all(|k| k.len() <= 5));
    }

    #[test]
    fn groups_are_independent_across_ad_units() {
        let mut bids = vec![bid("appnexus", "u1", 1.0), bid("appnexus", "u2", 5.0)];
        build_targeting(&mut bids, PriceGranularity::Med, None);

        assert!(bids[0].ad_server_targeting.contains_key("hb_pb"));
        assert!(bids[1].ad_server_targeting.contains_key("hb_pb"));
    }
}
