pub mod account;
pub mod auction;

pub use account::{Account, PriceGranularity};
pub use auction::{
    AdUnit, AdUnitBuilder, AppContext, AuctionRequest, AuctionResponse, AuctionResultState,
    AuctionStatus, BidderRequest, MediaType, PBSBid, PBSBidBuilder, RawAdUnit, RawAdUnitBid,
    RawAuctionRequest, Size, UsersyncInfo,
};
