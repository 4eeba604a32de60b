use crate::core::adapters::AdapterRegistry;
use crate::core::cache::CacheClient;
use crate::core::models::{Account, AuctionRequest, AuctionResultState};
use std::sync::Arc;

/// Top-level auction context carried through the pipeline. Mirrors the
/// teacher codebase's `AuctionContext` shape: the inbound request, a
/// terminal result slot, and shared handles into process-wide,
/// read-mostly collaborators.
pub struct AuctionContext {
    pub request: AuctionRequest,
    pub account: Account,
    pub result: AuctionResultState,
    pub adapters: Arc<AdapterRegistry>,
    pub cache_client: Option<Arc<CacheClient>>,
}

impl AuctionContext {
    pub fn new(
        request: AuctionRequest,
        account: Account,
        adapters: Arc<AdapterRegistry>,
        cache_client: Option<Arc<CacheClient>>,
    ) -> Self {
        Self {
            request,
            account,
            result: AuctionResultState::default(),
            adapters,
            cache_client,
        }
    }
}
