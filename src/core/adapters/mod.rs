pub mod http_adapter;
pub mod mock;

pub use http_adapter::HttpAdapter;
pub use mock::MockAdapter;

use crate::core::models::{BidderRequest, PBSBid, UsersyncInfo};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;

/// Any failure an adapter call can report. The orchestrator's own
/// `tokio::time::timeout_at` wrapper is the authoritative deadline signal
/// (§4.2); this variant exists for adapters that detect their own
/// sub-deadline expiry (e.g. a client-side request timeout firing before
/// the shared scope does).
#[derive(Debug)]
pub enum AdapterError {
    Timeout,
    Other(String),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::Timeout => write!(f, "Timed out"),
            AdapterError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for AdapterError {}

/// A remote demand source (Glossary: Adapter / bidder). Opaque beyond this
/// contract — individual bidder adapters are explicitly out of scope
/// (§1); `HttpAdapter` is the one concrete, generic implementation we ship
/// so the orchestrator has something real to dispatch to.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// The bidder code this adapter answers to, e.g. `"appnexus"`.
    fn code(&self) -> &str;

    /// The user-sync family name, used to key cookie lookups (§4.2, §4.5).
    /// Distinct from `code()` because some adapters share a sync family
    /// (aliases of the same demand source).
    fn family_name(&self) -> &str;

    /// Redirect target the client should follow to sync this bidder.
    fn usersync_info(&self) -> Option<UsersyncInfo>;

    /// Whether this adapter should simply be skipped (not dispatched) when
    /// the user has no live sync for it, rather than dispatched anyway
    /// with `no_cookie` set (§4.2).
    fn skip_no_cookies(&self) -> bool {
        false
    }

    /// Perform the bid request. `deadline` is the shared auction
    /// cancellation scope's absolute expiry; well-behaved adapters size
    /// their own network timeouts off of it rather than relying solely on
    /// the orchestrator's outer `timeout_at`.
    async fn call(
        &self,
        deadline: Instant,
        bidder: &BidderRequest,
    ) -> Result<Vec<PBSBid>, AdapterError>;
}

/// Name -> adapter lookup (C1), process-wide and read-mostly after
/// startup (§5 shared resource policy).
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn Adapter>) {
        self.adapters.insert(adapter.code().to_string(), adapter);
    }

    pub fn get(&self, code: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(code).cloned()
    }

    /// All registered bidder codes, for `GET /bidders/params` and
    /// diagnostics. Order is not significant.
    pub fn codes(&self) -> Vec<&str> {
        self.adapters.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adapters::mock::MockAdapter;
    use std::time::Duration;

    #[test]
    fn registry_round_trips_registered_adapters() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(MockAdapter::bid("appnexus", 1.0, Duration::ZERO)));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("appnexus").is_some());
        assert!(registry.get("rubicon").is_none());
    }
}
