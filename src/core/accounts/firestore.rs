use super::AccountStore;
use crate::core::models::Account;
use async_trait::async_trait;
use firestore::{FirestoreDb, FirestoreDbOptions};

/// Configuration for the externally-managed account backend. Stands in
/// for "relational" in §4.6/§6: a remote, operator-run data store as
/// opposed to the purely local dummy/file backends.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct FirestoreAccountConfig {
    pub project_id: String,
    pub collection: String,
    pub database_id: Option<String>,
    pub emulator_host: Option<String>,
}

/// Reads account documents from a remote document store on every miss.
/// There is no local watch/listener here (unlike the teacher codebase's
/// provider abstraction) because accounts are looked up by id on the hot
/// path rather than streamed wholesale; `CachedAccountStore` in front of
/// this is what keeps steady-state latency low.
pub struct FirestoreAccountStore {
    db: FirestoreDb,
    collection: String,
}

impl FirestoreAccountStore {
    pub async fn connect(config: &FirestoreAccountConfig) -> anyhow::Result<Self> {
        let mut options = FirestoreDbOptions::new(config.project_id.clone());

        if let Some(db_id) = &config.database_id {
            options = options.with_database_id(db_id.clone());
        }

        if let Some(host) = &config.emulator_host {
            options = options.with_firebase_api_url(format!("http://{host}"));
        }

        let db = FirestoreDb::with_options(options).await?;

        Ok(Self {
            db,
            collection: config.collection.clone(),
        })
    }
}

#[async_trait]
impl AccountStore for FirestoreAccountStore {
    async fn get(&self, account_id: &str) -> anyhow::Result<Option<Account>> {
        let doc: Option<Account> = self
            .db
            .fluent()
            .select()
            .by_id_in(&self.collection)
            .obj()
            .one(account_id)
            .await?;

        Ok(doc)
    }
}
