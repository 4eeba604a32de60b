use crate::app::lifecycle::context::StartupContext;
use crate::app::pipeline::BlockingTask;
use crate::core::cache::CacheClient;
use anyhow::{Error, anyhow};
use std::sync::Arc;

/// Builds the optional C7 creative cache client (§4.4, §6 `cacheUrl`).
/// `cacheUrl` unset means creative caching is simply skipped — callers see
/// `None` rather than a startup failure.
pub(crate) struct CacheClientInitTask;

impl BlockingTask<StartupContext, Error> for CacheClientInitTask {
    fn run(&self, ctx: &StartupContext) -> Result<(), Error> {
        let config = ctx
            .config
            .get()
            .ok_or_else(|| anyhow!("config not loaded before cache client initialization"))?;

        let client = config
            .cache_url
            .as_ref()
            .map(|url| CacheClient::new(url.clone()).map(Arc::new))
            .transpose()?;

        ctx.cache_client
            .set(client)
            .map_err(|_| anyhow!("cache client already initialized"))?;

        Ok(())
    }
}
