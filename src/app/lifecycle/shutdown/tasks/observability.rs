use crate::app::lifecycle::context::StartupContext;
use crate::app::pipeline::AsyncTask;
use crate::core::observability;
use anyhow::{Context, Error, anyhow};
use async_trait::async_trait;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::time::Duration;
use tracing::{instrument, warn};

pub(crate) struct ObservabilityShutdownTask;

#[async_trait]
impl AsyncTask<StartupContext, Error> for ObservabilityShutdownTask {
    #[instrument(skip_all, name = "observability_shutdown_task")]
    async fn run(&self, context: &StartupContext) -> Result<(), Error> {
        let Some(provider) = context.tracer_provider.get() else {
            return Ok(());
        };

        // Mirrors the 10-second drain budget each server flush gets (§9);
        // the flush itself is blocking exporter I/O, so it runs off-thread.
        let provider: SdkTracerProvider = provider.clone();
        let flush = tokio::task::spawn_blocking(move || observability::shutdown(&provider));

        match tokio::time::timeout(Duration::from_secs(10), flush).await {
            Ok(Ok(result)) => result.context("failed to shut down observability"),
            Ok(Err(join_err)) => Err(anyhow!("observability shutdown task panicked: {join_err}")),
            Err(_) => {
                warn!("observability shutdown did not complete within 10s");
                Ok(())
            }
        }
    }
}
