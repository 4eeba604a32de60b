use super::AccountStore;
use crate::core::models::Account;
use async_trait::async_trait;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Wraps any `AccountStore` with a bounded, TTL-expiring in-memory cache,
/// per the "implementations may cache entries ... bounded size and TTL"
/// allowance in §4.6. Misses (including confirmed not-found lookups) are
/// cached too, so a storm of requests for an unknown account id doesn't
/// hammer the backing store.
pub struct CachedAccountStore<S: AccountStore> {
    inner: S,
    cache: Cache<String, Option<Arc<Account>>>,
}

impl<S: AccountStore> CachedAccountStore<S> {
    pub fn new(inner: S, max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { inner, cache }
    }
}

#[async_trait]
impl<S: AccountStore> AccountStore for CachedAccountStore<S> {
    async fn get(&self, account_id: &str) -> anyhow::Result<Option<Account>> {
        if let Some(hit) = self.cache.get(account_id) {
            return Ok(hit.map(|a| (*a).clone()));
        }

        let fetched = self.inner.get(account_id).await?;
        self.cache
            .insert(account_id.to_string(), fetched.clone().map(Arc::new));

        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::accounts::DummyAccountStore;

    #[tokio::test]
    async fn caches_hits_and_misses_behind_the_inner_store() {
        let store = CachedAccountStore::new(
            DummyAccountStore::default(),
            100,
            Duration::from_secs(60),
        );

        let first = store.get("pub1").await.unwrap().unwrap();
        let second = store.get("pub1").await.unwrap().unwrap();
        assert_eq!(first.account_id, second.account_id);
    }
}
