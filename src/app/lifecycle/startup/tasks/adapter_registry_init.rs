use crate::app::lifecycle::context::StartupContext;
use crate::app::pipeline::BlockingTask;
use crate::core::adapters::http_adapter::build_demand_client;
use crate::core::adapters::{AdapterRegistry, HttpAdapter};
use anyhow::{Error, anyhow};
use std::sync::Arc;
use tracing::info;

/// Builds the C1 adapter registry (§4.2, §6 `bidders[]`) off one shared,
/// pooled `reqwest::Client` for every configured endpoint.
pub(crate) struct AdapterRegistryInitTask;

impl BlockingTask<StartupContext, Error> for AdapterRegistryInitTask {
    fn run(&self, ctx: &StartupContext) -> Result<(), Error> {
        let config = ctx
            .config
            .get()
            .ok_or_else(|| anyhow!("config not loaded before adapter registry initialization"))?;

        let client = build_demand_client()?;
        let mut registry = AdapterRegistry::new();

        for bidder_config in &config.bidders {
            registry.register(Arc::new(HttpAdapter::new(bidder_config.clone(), client.clone())));
        }

        info!(count = registry.len(), "adapter registry built");

        ctx.adapters
            .set(Arc::new(registry))
            .map_err(|_| anyhow!("adapter registry already initialized"))?;

        Ok(())
    }
}
