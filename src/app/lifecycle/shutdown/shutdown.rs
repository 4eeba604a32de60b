use crate::app::lifecycle::context::StartupContext;
use crate::app::lifecycle::shutdown::tasks::{ObservabilityShutdownTask, StopServerTask};
use crate::app::pipeline::{Pipeline, PipelineBuilder};

/// Builds the graceful-shutdown ordering (§9): stop accepting new work
/// before tearing down the observability pipeline that's logging it.
pub fn build_shutdown_pipeline() -> Pipeline<StartupContext, anyhow::Error> {
    PipelineBuilder::new()
        .with_async(Box::new(StopServerTask))
        .with_async(Box::new(ObservabilityShutdownTask))
        .build()
        .expect("shutdown pipeline should have tasks")
}
