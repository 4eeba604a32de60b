mod account_store_init;
mod adapter_registry_init;
mod auction_pipeline_init;
mod cache_client_init;
mod config_load;
mod observability;
mod start_server;

pub(crate) use account_store_init::AccountStoreInitTask;
pub(crate) use adapter_registry_init::AdapterRegistryInitTask;
pub(crate) use auction_pipeline_init::AuctionPipelineInitTask;
pub(crate) use cache_client_init::CacheClientInitTask;
pub(crate) use config_load::ConfigLoadTask;
pub(crate) use observability::ConfigureObservabilityTask;
pub(crate) use start_server::StartServerTask;
