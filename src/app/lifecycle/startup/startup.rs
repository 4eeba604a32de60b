use crate::app::lifecycle::context::StartupContext;
use crate::app::lifecycle::startup::tasks::{
    AccountStoreInitTask, AdapterRegistryInitTask, AuctionPipelineInitTask, CacheClientInitTask,
    ConfigLoadTask, ConfigureObservabilityTask, StartServerTask,
};
use crate::app::pipeline::{Pipeline, PipelineBuilder};
use crate::app::span::WrappedPipelineTask;
use tracing::{Span, info_span};

/// Builds the ordering of startup tasks required for a successful boot
/// (§9): config and observability first (so everything after it can log),
/// then the shared process-wide collaborators in dependency order, then
/// the server itself.
pub fn build_start_pipeline() -> Pipeline<StartupContext, anyhow::Error> {
    // logging isn't configured yet, so this stage runs under no span at all
    let boot_loader = PipelineBuilder::new()
        .with_blocking(Box::new(ConfigLoadTask))
        .with_blocking(Box::new(ConfigureObservabilityTask))
        .build()
        .expect("boot loader should have tasks");

    // everything past this point can log, so it's worth wrapping in a span
    let start_pipeline = PipelineBuilder::new()
        .with_async(Box::new(AccountStoreInitTask))
        .with_blocking(Box::new(AdapterRegistryInitTask))
        .with_blocking(Box::new(CacheClientInitTask))
        .with_blocking(Box::new(AuctionPipelineInitTask))
        .with_async(Box::new(StartServerTask))
        .build()
        .expect("startup pipeline should have tasks");

    let nop_boot_loader = WrappedPipelineTask::new(boot_loader, Span::none);
    let observed_start_pipeline =
        WrappedPipelineTask::new(start_pipeline, || info_span!("start_pipeline"));

    PipelineBuilder::new()
        .with_async(Box::new(nop_boot_loader))
        .with_async(Box::new(observed_start_pipeline))
        .build()
        .expect("pipeline should have tasks")
}
