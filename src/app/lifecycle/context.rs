use crate::app::auction::AuctionContext;
use crate::app::config::AppConfig;
use crate::app::pipeline::Pipeline;
use crate::core::accounts::AccountStore;
use crate::core::adapters::AdapterRegistry;
use crate::core::cache::CacheClient;
use crate::core::errors::AuctionError;
use actix_web::dev::ServerHandle;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::{Arc, OnceLock};

/// Carries everything built during startup through to shutdown. Mirrors
/// the teacher codebase's `StartupContext` shape: config and shared,
/// process-wide collaborators land in `OnceLock`s as each startup task
/// constructs them, and shutdown tasks read the same slots back out.
#[derive(Default)]
pub struct StartupContext {
    pub config: OnceLock<AppConfig>,
    /// Present only if an otel sink was configured; flushed at shutdown.
    pub tracer_provider: OnceLock<SdkTracerProvider>,

    pub account_store: OnceLock<Arc<dyn AccountStore>>,
    pub adapters: OnceLock<Arc<AdapterRegistry>>,
    pub cache_client: OnceLock<Option<Arc<CacheClient>>>,
    pub auction_pipeline: OnceLock<Arc<Pipeline<AuctionContext, AuctionError>>>,

    pub server: OnceLock<ServerHandle>,
    pub admin_server: OnceLock<ServerHandle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_every_slot_empty() {
        let ctx = StartupContext::default();
        assert!(ctx.config.get().is_none());
        assert!(ctx.server.get().is_none());
        assert!(ctx.admin_server.get().is_none());
    }
}
