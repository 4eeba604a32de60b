use crate::app::lifecycle::context::StartupContext;
use crate::app::pipeline::BlockingTask;
use crate::core::observability;
use anyhow::{Error, anyhow};
use tracing::info;

pub(crate) struct ConfigureObservabilityTask;

impl BlockingTask<StartupContext, Error> for ConfigureObservabilityTask {
    fn run(&self, context: &StartupContext) -> Result<(), Error> {
        let config = context
            .config
            .get()
            .ok_or_else(|| anyhow!("config not loaded before observability initialization"))?;

        // a provider is returned only if an otel sink was configured; stdout
        // and file sinks are already live once this call returns either way.
        if let Some(provider) = observability::init(&config.logging)? {
            context
                .tracer_provider
                .set(provider)
                .map_err(|_| anyhow!("observability already initialized"))?;
        }

        info!("observability configured");

        Ok(())
    }
}
