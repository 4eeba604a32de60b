pub mod cached;
pub mod dummy;
pub mod file;
pub mod firestore;

pub use cached::CachedAccountStore;
pub use dummy::DummyAccountStore;
pub use file::FileAccountStore;
pub use firestore::FirestoreAccountStore;

use crate::core::models::Account;
use async_trait::async_trait;

/// C2: read-only account/config resolution, behind one interface so the
/// orchestrator never knows which backend is configured (§4.6).
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Resolves an account id, or `None` if unknown (the caller maps that
    /// to `AuctionError::UnknownAccount`).
    async fn get(&self, account_id: &str) -> anyhow::Result<Option<Account>>;
}
