use crate::app::config::DataCacheConfig;
use crate::app::lifecycle::context::StartupContext;
use crate::app::pipeline::AsyncTask;
use crate::core::accounts::{
    AccountStore, CachedAccountStore, DummyAccountStore, FileAccountStore, FirestoreAccountStore,
};
use anyhow::{Error, anyhow};
use async_trait::async_trait;
use std::sync::Arc;

/// Builds the configured `dataCache` backend (§4.6, §6) and wraps it in
/// the bounded/TTL cache every backend shares.
pub(crate) struct AccountStoreInitTask;

#[async_trait]
impl AsyncTask<StartupContext, Error> for AccountStoreInitTask {
    async fn run(&self, ctx: &StartupContext) -> Result<(), Error> {
        let config = ctx
            .config
            .get()
            .ok_or_else(|| anyhow!("config not loaded before account store initialization"))?;

        let cache = &config.account_cache;
        let store: Arc<dyn AccountStore> = match &config.data_cache {
            DataCacheConfig::Dummy { default_account } => Arc::new(CachedAccountStore::new(
                DummyAccountStore::new(default_account.clone()),
                cache.max_capacity,
                cache.ttl,
            )),
            DataCacheConfig::File { path } => Arc::new(CachedAccountStore::new(
                FileAccountStore::load(path).await?,
                cache.max_capacity,
                cache.ttl,
            )),
            DataCacheConfig::Firestore(fs_config) => Arc::new(CachedAccountStore::new(
                FirestoreAccountStore::connect(fs_config).await?,
                cache.max_capacity,
                cache.ttl,
            )),
        };

        ctx.account_store
            .set(store)
            .map_err(|_| anyhow!("account store already initialized"))?;

        Ok(())
    }
}
