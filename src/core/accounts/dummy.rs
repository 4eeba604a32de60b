use super::AccountStore;
use crate::core::models::Account;
use async_trait::async_trait;

/// Returns a single configured default account for any requested id.
/// Intended for local development only (§4.6).
pub struct DummyAccountStore {
    default_account: Account,
}

impl DummyAccountStore {
    pub fn new(default_account: Account) -> Self {
        Self { default_account }
    }
}

impl Default for DummyAccountStore {
    fn default() -> Self {
        Self::new(Account::new("dummy"))
    }
}

#[async_trait]
impl AccountStore for DummyAccountStore {
    async fn get(&self, account_id: &str) -> anyhow::Result<Option<Account>> {
        let mut account = self.default_account.clone();
        account.account_id = account_id.to_string();
        Ok(Some(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_any_id_to_the_default_account() {
        let store = DummyAccountStore::default();
        let account = store.get("anything").await.unwrap().unwrap();
        assert_eq!(account.account_id, "anything");
    }
}
