use anyhow::anyhow;
use reqwest::{Client, redirect, retry};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

/// One creative payload submitted for caching. Exactly one of `adm`/`nurl`
/// is expected to be populated, mirroring what the bid carried (§4.4).
#[derive(Debug, Clone, Serialize)]
pub struct CachePut {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: CreativeValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreativeValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nurl: Option<String>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    puts: &'a [CachePut],
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    responses: Vec<PutResponseEntry>,
}

#[derive(Debug, Deserialize)]
struct PutResponseEntry {
    uuid: String,
}

/// C7: populates an external creative cache and hands back opaque ids for
/// `hb_cache_id` targeting keys (§4.4). A request that fails entirely is
/// surfaced as `CacheFailure`; the orchestrator decides per-bid whether to
/// drop the bid or fall back to an uncached markup.
pub struct CacheClient {
    http: Client,
    base_url: String,
}

impl CacheClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_millis(500))
            .pool_max_idle_per_host(128)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .tcp_keepalive(Some(Duration::from_secs(20)))
            .retry(retry::never())
            .referer(false)
            .redirect(redirect::Policy::none())
            .tcp_nodelay(true)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(anyhow::Error::from)?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Populates the external cache with a batch of creatives and returns
    /// one generated id per entry, in submitted order. A locally generated
    /// uuid is used as a correlation aid only; the cache's own returned
    /// `uuid` is what callers should key off of.
    #[instrument(skip_all, fields(correlation_id = %Self::correlation_id(), puts = puts.len()))]
    pub async fn put_batch(
        &self,
        puts: Vec<CachePut>,
        deadline: tokio::time::Instant,
    ) -> anyhow::Result<Vec<String>> {
        if puts.is_empty() {
            return Ok(Vec::new());
        }

        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return Err(anyhow!("cache deadline already elapsed"));
        }

        let body = PutRequest { puts: &puts };

        let res = self
            .http
            .post(format!("{}/cache", self.base_url))
            .timeout(remaining)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("cache request failed: {e}"))?;

        if !res.status().is_success() {
            return Err(anyhow!("cache request returned status {}", res.status()));
        }

        let parsed: PutResponse = res
            .json()
            .await
            .map_err(|e| anyhow!("cache response was not valid JSON: {e}"))?;

        if parsed.responses.len() != puts.len() {
            return Err(anyhow!(
                "cache returned {} ids for {} puts",
                parsed.responses.len(),
                puts.len()
            ));
        }

        Ok(parsed.responses.into_iter().map(|r| r.uuid).collect())
    }

    /// Builds a correlation id for a put that has no cache-assigned uuid
    /// yet; used only for logging, never sent on the wire.
    pub fn correlation_id() -> Uuid {
        Uuid::new_v4()
    }
}

impl CachePut {
    pub fn markup(adm: String, width: u32, height: u32) -> Self {
        Self {
            kind: "json",
            value: CreativeValue {
                adm: Some(adm),
                nurl: None,
                width,
                height,
            },
        }
    }

    pub fn nurl(nurl: String, width: u32, height: u32) -> Self {
        Self {
            kind: "json",
            value: CreativeValue {
                adm: None,
                nurl: Some(nurl),
                width,
                height,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_put_carries_only_adm() {
        let put = CachePut::markup("<div/>".into(), 300, 250);
        assert!(put.value.adm.is_some());
        assert!(put.value.nurl.is_none());
    }

    #[test]
    fn nurl_put_carries_only_nurl() {
        let put = CachePut::nurl("https://example/win".into(), 300, 250);
        assert!(put.value.nurl.is_some());
        assert!(put.value.adm.is_none());
    }

    #[tokio::test]
    async fn empty_batch_short_circuits_without_a_request() {
        let client = CacheClient::new("http://127.0.0.1:1").unwrap();
        let ids = client
            .put_batch(Vec::new(), tokio::time::Instant::now() + Duration::from_secs(1))
            .await
            .unwrap();
        assert!(ids.is_empty());
    }
}
