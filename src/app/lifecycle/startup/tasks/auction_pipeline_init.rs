use crate::app::auction::build_auction_pipeline;
use crate::app::lifecycle::context::StartupContext;
use crate::app::pipeline::BlockingTask;
use anyhow::{Error, anyhow};
use std::sync::Arc;

pub(crate) struct AuctionPipelineInitTask;

impl BlockingTask<StartupContext, Error> for AuctionPipelineInitTask {
    fn run(&self, ctx: &StartupContext) -> Result<(), Error> {
        ctx.auction_pipeline
            .set(Arc::new(build_auction_pipeline()))
            .map_err(|_| anyhow!("auction pipeline already initialized"))?;

        Ok(())
    }
}
