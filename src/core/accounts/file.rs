use super::AccountStore;
use crate::core::models::Account;
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Reads a flat account list from a local YAML/JSON file at startup,
/// indexed in memory (§4.6).
pub struct FileAccountStore {
    accounts: HashMap<String, Account>,
}

impl FileAccountStore {
    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading account file {}", path.display()))?;

        let accounts: Vec<Account> = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_str(&raw).context("parsing account file as JSON")?
        } else {
            serde_yaml_shim::from_str(&raw).context("parsing account file as YAML")?
        };

        Ok(Self::from_accounts(accounts))
    }

    pub fn from_accounts(accounts: Vec<Account>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|a| (a.account_id.clone(), a))
            .collect();

        Self { accounts }
    }
}

#[async_trait]
impl AccountStore for FileAccountStore {
    async fn get(&self, account_id: &str) -> anyhow::Result<Option<Account>> {
        Ok(self.accounts.get(account_id).cloned())
    }
}

/// The `config` crate already depends on a YAML parser for its own file
/// sources; we reuse that support here rather than pulling in a second
/// YAML crate for this one flat-file loader.
mod serde_yaml_shim {
    use serde::de::DeserializeOwned;

    pub fn from_str<T: DeserializeOwned>(raw: &str) -> anyhow::Result<T> {
        let value: config::Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Yaml))
            .build()?;

        Ok(value.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::PriceGranularity;

    #[tokio::test]
    async fn resolves_known_ids_and_misses_unknown_ones() {
        let store = FileAccountStore::from_accounts(vec![Account {
            account_id: "pub1".into(),
            price_granularity: PriceGranularity::High,
        }]);

        let known = store.get("pub1").await.unwrap().unwrap();
        assert_eq!(known.price_granularity, PriceGranularity::High);

        assert!(store.get("pub2").await.unwrap().is_none());
    }
}
