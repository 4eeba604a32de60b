use crate::app::auction::context::AuctionContext;
use crate::app::pipeline::AsyncTask;
use crate::core::cache::{CacheClient, CachePut};
use crate::core::errors::AuctionError;
use crate::core::models::PBSBid;
use async_trait::async_trait;

/// Bounded post-processing window cache population gets after fan-out has
/// already spent the request's own deadline (§8: "Total wall-clock …
/// ≤ timeoutMillis + ε where ε is bounded post-processing time").
const CACHE_POPULATION_EPSILON: std::time::Duration = std::time::Duration::from_millis(250);

/// Post-processing pipeline stage wired into [`super::super::pipeline::build_auction_pipeline`];
/// a no-op unless the request set `cacheMarkup` and a cache client is configured.
pub struct CachePopulationTask;

#[async_trait]
impl AsyncTask<AuctionContext, AuctionError> for CachePopulationTask {
    async fn run(&self, ctx: &AuctionContext) -> Result<(), AuctionError> {
        if !ctx.request.cache_markup {
            return Ok(());
        }

        let Some(cache_client) = ctx.cache_client.as_deref() else {
            return Ok(());
        };

        // Its own slice of time starting now, not a reuse of the fan-out
        // deadline fan_out.rs already raced — that one is routinely fully
        // spent by a real timeout and would leave nothing here.
        let deadline = tokio::time::Instant::now() + CACHE_POPULATION_EPSILON;

        let mut bids = ctx.result.bids.lock().await;
        populate_cache(&mut bids, cache_client, deadline).await
    }
}

/// §4.2 post-processing step 1: pushes every surviving bid's creative to
/// the external cache, then replaces `adm`/`nurl` with the returned
/// `cacheId` so the response never carries bulky markup once cached.
pub async fn populate_cache(
    bids: &mut [PBSBid],
    cache_client: &CacheClient,
    deadline: tokio::time::Instant,
) -> Result<(), AuctionError> {
    if bids.is_empty() {
        return Ok(());
    }

    let puts = bids
        .iter()
        .map(|bid| {
            if !bid.adm.is_empty() {
                CachePut::markup(bid.adm.clone(), bid.width, bid.height)
            } else {
                CachePut::nurl(bid.nurl.clone(), bid.width, bid.height)
            }
        })
        .collect();

    let ids = cache_client
        .put_batch(puts, deadline)
        .await
        .map_err(|e| AuctionError::CacheFailure(e.to_string()))?;

    for (bid, id) in bids.iter_mut().zip(ids) {
        bid.cache_id = Some(id);
        bid.adm.clear();
        bid.nurl.clear();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::PBSBidBuilder;

    fn bid(adm: &str) -> PBSBid {
        PBSBidBuilder::default()
            .bidder_code("appnexus")
            .bid_id("b1")
            .ad_unit_code("u1")
            .price(1.0)
            .adm(adm)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn empty_bid_list_never_touches_the_cache_client() {
        let client = CacheClient::new("http://127.0.0.1:1").unwrap();
        let mut bids: Vec<PBSBid> = Vec::new();
        populate_cache(&mut bids, &client, tokio::time::Instant::now()).await.unwrap();
    }

    #[test]
    fn markup_put_is_preferred_over_nurl_when_both_present() {
        let b = bid("<div/>");
        assert!(!b.adm.is_empty());
    }
}
