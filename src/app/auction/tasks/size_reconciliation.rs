use crate::core::models::{AdUnit, MediaType, PBSBid};
use tracing::warn;

/// §4.3: a bid with an unreported banner size borrows its one unambiguous
/// size from the originating ad unit; bids an originating unit can't
/// disambiguate (more than one declared size, or no matching unit at all)
/// are dropped. Pure on the input slice; returns a compacted vector.
pub fn reconcile_sizes(bids: Vec<PBSBid>, ad_units: &[AdUnit]) -> Vec<PBSBid> {
    bids.into_iter()
        .filter_map(|mut bid| {
            if bid.creative_media_type != MediaType::Banner || (bid.width != 0 && bid.height != 0)
            {
                return Some(bid);
            }

            let unit = ad_units
                .iter()
                .find(|u| u.bid_id == bid.bid_id && u.code == bid.ad_unit_code)?;

            match unit.sizes.as_slice() {
                [only] => {
                    bid.width = only.w;
                    bid.height = only.h;
                    Some(bid)
                }
                _ => {
                    warn!(
                        bidder = %bid.bidder_code,
                        ad_unit_code = %bid.ad_unit_code,
                        "dropping banner bid with unreported size and ambiguous ad unit"
                    );
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{AdUnitBuilder, PBSBidBuilder, Size};

    fn unit(code: &str, bid_id: &str, sizes: Vec<Size>) -> AdUnit {
        AdUnitBuilder::default()
            .code(code)
            .bid_id(bid_id)
            .sizes(sizes)
            .build()
            .unwrap()
    }

    fn banner_bid(bid_id: &str, ad_unit_code: &str, width: u32, height: u32) -> PBSBid {
        PBSBidBuilder::default()
            .bidder_code("appnexus")
            .bid_id(bid_id)
            .ad_unit_code(ad_unit_code)
            .price(1.0)
            .width(width)
            .height(height)
            .build()
            .unwrap()
    }

    #[test]
    fn fills_size_from_the_sole_declared_size() {
        let units = vec![unit("u1", "b1", vec![Size { w: 300, h: 250 }])];
        let bids = vec![banner_bid("b1", "u1", 0, 0)];

        let reconciled = reconcile_sizes(bids, &units);

        assert_eq!(reconciled.len(), 1);
        assert_eq!(reconciled[0].width, 300);
        assert_eq!(reconciled[0].height, 250);
    }

    #[test]
    fn drops_bid_when_ad_unit_declares_multiple_sizes() {
        let units = vec![unit(
            "u1",
            "b1",
            vec![Size { w: 300, h: 250 }, Size { w: 728, h: 90 }],
        )];
        let bids = vec![banner_bid("b1", "u1", 0, 0)];

        assert!(reconcile_sizes(bids, &units).is_empty());
    }

    #[test]
    fn drops_bid_with_no_matching_ad_unit() {
        let units = vec![unit("u1", "b1", vec![Size { w: 300, h: 250 }])];
        let bids = vec![banner_bid("wrong-bid-id", "u1", 0, 0)];

        assert!(reconcile_sizes(bids, &units).is_empty());
    }

    #[test]
    fn passes_through_bids_with_both_dimensions_already_set() {
        let units = vec![unit("u1", "b1", vec![])];
        let bids = vec![banner_bid("b1", "u1", 160, 600)];

        let reconciled = reconcile_sizes(bids, &units);
        assert_eq!(reconciled.len(), 1);
        assert_eq!(reconciled[0].width, 160);
    }

    #[test]
    fn passes_through_non_banner_bids_with_zero_dimensions() {
        let units = vec![unit("u1", "b1", vec![Size { w: 300, h: 250 }])];
        let mut bid = banner_bid("b1", "u1", 0, 0);
        bid.creative_media_type = MediaType::Video;
        let reconciled = reconcile_sizes(vec![bid], &units);

        assert_eq!(reconciled.len(), 1);
        assert_eq!(reconciled[0].width, 0);
    }
}
