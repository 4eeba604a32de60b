use crate::app::auction::context::AuctionContext;
use crate::app::auction::tasks::admission::{Admitted, admit};
use crate::app::auction::tasks::size_reconciliation::reconcile_sizes;
use crate::app::pipeline::AsyncTask;
use crate::core::adapters::{Adapter, AdapterError};
use crate::core::errors::AuctionError;
use crate::core::metrics::MetricsRegistry;
use crate::core::models::{BidderRequest, PBSBid};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{Instrument, debug, info_span};

/// C6, the heart: admits every bidder, dispatches each non-skipped one as
/// an independent task racing `tokio::time::timeout_at` against the
/// shared deadline, and drains exactly `sentBids` terminal records off a
/// bounded channel before handing control to the post-processing stages
/// (§4.2, §5, §9).
pub struct FanOutTask;

#[async_trait]
impl AsyncTask<AuctionContext, AuctionError> for FanOutTask {
    async fn run(&self, ctx: &AuctionContext) -> Result<(), AuctionError> {
        let span = info_span!("fan_out_task", tid = %ctx.request.tid, bidders = ctx.request.bidders.len());
        self.run0(ctx).instrument(span).await
    }
}

impl FanOutTask {
    async fn run0(&self, ctx: &AuctionContext) -> Result<(), AuctionError> {
        let deadline = ctx.request.start
            + std::time::Duration::from_millis(ctx.request.timeout_millis);

        let has_app = ctx.request.app.is_some();
        let admitted = admit(
            ctx.request.bidders.clone(),
            &ctx.adapters,
            has_app,
            &ctx.request.cookie,
        );

        let total = admitted.len();
        let mut slots: Vec<Option<BidderRequest>> = (0..total).map(|_| None).collect();

        let mut dispatched: Vec<(usize, Arc<dyn Adapter>, BidderRequest)> = Vec::new();
        for (idx, entry) in admitted.into_iter().enumerate() {
            match entry {
                Admitted::Settled(bidder) => slots[idx] = Some(bidder),
                Admitted::Dispatch { adapter, bidder } => dispatched.push((idx, adapter, bidder)),
            }
        }

        let sent_bids = dispatched.len();
        let mut flat_bids: Vec<PBSBid> = Vec::new();

        if sent_bids > 0 {
            let (tx, mut rx) = tokio::sync::mpsc::channel(sent_bids);

            for (idx, adapter, bidder) in dispatched {
                let tx = tx.clone();
                let ad_units = ctx.request.ad_units.clone();
                tokio::spawn(async move {
                    let (idx, bidder, bids) = run_bidder(idx, adapter, bidder, deadline, &ad_units).await;
                    let _ = tx.send((idx, bidder, bids)).await;
                });
            }
            drop(tx);

            for _ in 0..sent_bids {
                let (idx, bidder, bids) = rx
                    .recv()
                    .await
                    .expect("every dispatched bidder delivers exactly one terminal record");
                slots[idx] = Some(bidder);
                flat_bids.extend(bids);
            }
        }

        let bidder_status: Vec<BidderRequest> = slots
            .into_iter()
            .map(|s| s.expect("every admitted bidder settles exactly once"))
            .collect();

        debug!(sent_bids, bids = flat_bids.len(), "fan-out complete");

        *ctx.result.bidders.lock().await = bidder_status;
        *ctx.result.bids.lock().await = flat_bids;

        Ok(())
    }
}

/// Runs a single admitted bidder to completion: races the adapter call
/// against the shared deadline, records its terminal outcome onto the
/// bidder's scratch fields, and runs size reconciliation on any returned
/// bids before handing them back.
async fn run_bidder(
    idx: usize,
    adapter: Arc<dyn Adapter>,
    mut bidder: BidderRequest,
    deadline: Instant,
    ad_units: &[crate::core::models::AdUnit],
) -> (usize, BidderRequest, Vec<PBSBid>) {
    let start = Instant::now();
    let outcome = tokio::time::timeout_at(deadline, adapter.call(deadline, &bidder)).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    bidder.response_time = Some(elapsed_ms);

    let bids = match outcome {
        Err(_) => {
            bidder.error = Some("Timed out".to_string());
            MetricsRegistry::record_bidder_timeout(&bidder.bidder_code);
            Vec::new()
        }
        Ok(Err(AdapterError::Timeout)) => {
            bidder.error = Some("Timed out".to_string());
            MetricsRegistry::record_bidder_timeout(&bidder.bidder_code);
            Vec::new()
        }
        Ok(Err(AdapterError::Other(message))) => {
            bidder.error = Some(message);
            MetricsRegistry::record_bidder_error(&bidder.bidder_code);
            Vec::new()
        }
        Ok(Ok(returned)) if returned.is_empty() => {
            bidder.no_bid = true;
            MetricsRegistry::record_bidder_no_bid(&bidder.bidder_code);
            Vec::new()
        }
        Ok(Ok(mut returned)) => {
            for bid in &mut returned {
                bid.response_time = elapsed_ms;
                MetricsRegistry::record_bid_price(&bidder.bidder_code, bid.price);
            }

            let reconciled = reconcile_sizes(returned, ad_units);
            bidder.num_bids = reconciled.len() as u32;
            reconciled
        }
    };

    (idx, bidder, bids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adapters::{AdapterRegistry, MockAdapter};
    use crate::core::cookie::UserSyncCookie;
    use crate::core::models::{Account, AdUnitBuilder, AuctionRequest};
    use std::time::Duration;

    fn ad_unit(code: &str, bid_id: &str) -> crate::core::models::AdUnit {
        AdUnitBuilder::default()
            .code(code)
            .bid_id(bid_id)
            .sizes(vec![crate::core::models::Size { w: 300, h: 250 }])
            .build()
            .unwrap()
    }

    fn context(adapters: AdapterRegistry, timeout_millis: u64) -> AuctionContext {
        let ad_units = vec![ad_unit("u1", "b1")];
        let bidders = vec![BidderRequest::new("appnexus", ad_units.clone())];

        let request = AuctionRequest {
            tid: "t1".into(),
            account_id: "pub1".into(),
            url: None,
            app: None,
            timeout_millis,
            ad_units,
            bidders,
            cache_markup: false,
            sort_bids: false,
            max_key_length: None,
            cookie: UserSyncCookie::empty(),
            start: Instant::now(),
            is_safari: false,
        };

        AuctionContext::new(request, Account::new("pub1"), Arc::new(adapters), None)
    }

    #[tokio::test]
    async fn fast_bidder_produces_one_settled_bid() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(MockAdapter::bid("appnexus", 1.23, Duration::ZERO)));

        let ctx = context(registry, 200);
        FanOutTask.run(&ctx).await.unwrap();

        let bidders = ctx.result.bidders.lock().await;
        assert_eq!(bidders.len(), 1);
        assert_eq!(bidders[0].num_bids, 1);

        let bids = ctx.result.bids.lock().await;
        assert_eq!(bids.len(), 1);
    }

    #[tokio::test]
    async fn slow_bidder_times_out_before_deadline() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(MockAdapter::bid(
            "appnexus",
            1.0,
            Duration::from_millis(200),
        )));

        let ctx = context(registry, 20);
        FanOutTask.run(&ctx).await.unwrap();

        let bidders = ctx.result.bidders.lock().await;
        assert_eq!(bidders[0].error.as_deref(), Some("Timed out"));

        let bids = ctx.result.bids.lock().await;
        assert!(bids.is_empty());
    }

    #[tokio::test]
    async fn unsupported_bidder_never_dispatches_but_still_settles() {
        let registry = AdapterRegistry::new();
        let mut ctx = context(registry, 200);
        ctx.request.bidders = vec![BidderRequest::new("unknown", vec![])];

        FanOutTask.run(&ctx).await.unwrap();

        let bidders = ctx.result.bidders.lock().await;
        assert_eq!(bidders.len(), 1);
        assert_eq!(bidders[0].error.as_deref(), Some("Unsupported bidder"));
    }
}
