use crate::core::adapters::Adapter;
use crate::core::adapters::AdapterRegistry;
use crate::core::cookie::UserSyncCookie;
use crate::core::metrics::MetricsRegistry;
use crate::core::models::BidderRequest;
use std::sync::Arc;

/// The outcome of admitting a single `BidderRequest` (§4.2 admission
/// rules): either it's handed off for dispatch, or it's already terminal
/// (unsupported bidder, or skipped for lack of a sync under adapter
/// policy) and never counts toward `sentBids`.
pub enum Admitted {
    Dispatch {
        adapter: Arc<dyn Adapter>,
        bidder: BidderRequest,
    },
    Settled(BidderRequest),
}

/// Applies §4.2 admission rules to every bidder in request order. Order of
/// the returned vector matches the input order, which the aggregator
/// relies on to rebuild `bidderStatus` in input order regardless of
/// dispatch/arrival order.
pub fn admit(
    bidders: Vec<BidderRequest>,
    registry: &AdapterRegistry,
    has_app: bool,
    cookie: &UserSyncCookie,
) -> Vec<Admitted> {
    bidders
        .into_iter()
        .map(|mut bidder| {
            let adapter = match registry.get(&bidder.bidder_code) {
                Some(adapter) => adapter,
                None => {
                    bidder.error = Some("Unsupported bidder".to_string());
                    return Admitted::Settled(bidder);
                }
            };

            if !has_app && !cookie.has_live_sync(adapter.family_name()) {
                bidder.no_cookie = true;
                bidder.usersync_info = adapter.usersync_info();

                if adapter.skip_no_cookies() {
                    MetricsRegistry::record_bidder_no_cookie_skip(&bidder.bidder_code);
                    return Admitted::Settled(bidder);
                }
            }

            Admitted::Dispatch { adapter, bidder }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adapters::MockAdapter;
    use std::time::Duration;

    fn registry() -> AdapterRegistry {
        let mut r = AdapterRegistry::new();
        r.register(Arc::new(MockAdapter::bid("appnexus", 1.0, Duration::ZERO)));
        r
    }

    #[test]
    fn unsupported_bidder_settles_immediately_with_an_error() {
        let bidders = vec![BidderRequest::new("unknown", vec![])];
        let admitted = admit(bidders, &registry(), false, &UserSyncCookie::empty());

        assert_eq!(admitted.len(), 1);
        match &admitted[0] {
            Admitted::Settled(b) => assert_eq!(b.error.as_deref(), Some("Unsupported bidder")),
            Admitted::Dispatch { .. } => panic!("expected settled"),
        }
    }

    #[test]
    fn no_cookie_without_skip_policy_still_dispatches() {
        let bidders = vec![BidderRequest::new("appnexus", vec![])];
        let admitted = admit(bidders, &registry(), false, &UserSyncCookie::empty());

        match &admitted[0] {
            Admitted::Dispatch { bidder, .. } => assert!(bidder.no_cookie),
            Admitted::Settled(_) => panic!("expected dispatch"),
        }
    }

    #[test]
    fn app_context_skips_cookie_checks_entirely() {
        let bidders = vec![BidderRequest::new("appnexus", vec![])];
        let admitted = admit(bidders, &registry(), true, &UserSyncCookie::empty());

        match &admitted[0] {
            Admitted::Dispatch { bidder, .. } => assert!(!bidder.no_cookie),
            Admitted::Settled(_) => panic!("expected dispatch"),
        }
    }
}
