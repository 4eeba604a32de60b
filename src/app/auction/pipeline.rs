use crate::app::auction::context::AuctionContext;
use crate::app::auction::tasks::{
    CachePopulationTask, FanOutTask, ResponseFramingTask, TargetingTask,
};
use crate::app::pipeline::{Pipeline, PipelineBuilder};
use crate::core::errors::AuctionError;

/// Assembles the auction pipeline in the order §4.2 requires: fan-out and
/// per-bidder settlement first, then the post-processing stages (cache
/// population, then targeting-key construction) over the drained
/// aggregate, and finally response-status framing.
pub fn build_auction_pipeline() -> Pipeline<AuctionContext, AuctionError> {
    PipelineBuilder::new()
        .with_async(Box::new(FanOutTask))
        .with_async(Box::new(CachePopulationTask))
        .with_async(Box::new(TargetingTask))
        .with_async(Box::new(ResponseFramingTask))
        .build()
        .expect("auction pipeline always has at least the fan-out stage")
}
