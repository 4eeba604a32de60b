use crate::core::adapters::AdapterRegistry;
use crate::core::cookie::UserSyncCookie;
use crate::core::models::UsersyncInfo;
use serde::{Deserialize, Serialize};

/// §4.5 inbound body.
#[derive(Debug, Clone, Deserialize)]
pub struct CookieSyncRequest {
    pub uuid: String,
    #[serde(default)]
    pub bidders: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BidderStatus {
    #[serde(rename = "bidderCode")]
    pub bidder_code: String,
    #[serde(rename = "noCookie")]
    pub no_cookie: bool,
    #[serde(rename = "usersyncInfo", skip_serializing_if = "Option::is_none")]
    pub usersync_info: Option<UsersyncInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CookieSyncResponse {
    pub uuid: String,
    pub status: &'static str,
    pub bidder_status: Vec<BidderStatus>,
}

/// §4.5: for each requested bidder code registered in C1 with no live
/// sync for its family, emit a `BidderStatus`. Already-synced and
/// unregistered bidders are omitted silently. Opt-out is handled by the
/// caller before this function runs (it maps to 401, not a response body).
pub fn decide(
    request: &CookieSyncRequest,
    registry: &AdapterRegistry,
    cookie: &UserSyncCookie,
) -> CookieSyncResponse {
    let status = if cookie.live_sync_count() == 0 { "no_cookie" } else { "ok" };

    let bidder_status = request
        .bidders
        .iter()
        .filter_map(|code| {
            let adapter = registry.get(code)?;

            if cookie.has_live_sync(adapter.family_name()) {
                return None;
            }

            Some(BidderStatus {
                bidder_code: code.clone(),
                no_cookie: true,
                usersync_info: adapter.usersync_info(),
            })
        })
        .collect();

    CookieSyncResponse {
        uuid: request.uuid.clone(),
        status,
        bidder_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adapters::MockAdapter;
    use crate::core::cookie::SyncEntry;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn registry() -> AdapterRegistry {
        let mut r = AdapterRegistry::new();
        r.register(Arc::new(MockAdapter::bid("appnexus", 1.0, Duration::ZERO)));
        r.register(Arc::new(MockAdapter::bid("rubicon", 1.0, Duration::ZERO)));
        r
    }

    fn cookie_synced_for(family: &str) -> UserSyncCookie {
        let mut syncs = HashMap::new();
        syncs.insert(
            family.to_string(),
            SyncEntry {
                uid: "u".into(),
                ts: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs(),
            },
        );
        UserSyncCookie { opted_out: false, syncs }
    }

    #[test]
    fn omits_already_synced_and_unregistered_bidders() {
        let request = CookieSyncRequest {
            uuid: "u1".into(),
            bidders: vec!["appnexus".into(), "rubicon".into(), "unknown".into()],
        };

        let response = decide(&request, &registry(), &cookie_synced_for("appnexus"));

        assert_eq!(response.bidder_status.len(), 1);
        assert_eq!(response.bidder_status[0].bidder_code, "rubicon");
    }

    #[test]
    fn no_live_syncs_reports_no_cookie_status() {
        let request = CookieSyncRequest {
            uuid: "u1".into(),
            bidders: vec![],
        };

        let response = decide(&request, &registry(), &UserSyncCookie::empty());
        assert_eq!(response.status, "no_cookie");
    }

    #[test]
    fn any_live_sync_reports_ok_status() {
        let request = CookieSyncRequest {
            uuid: "u1".into(),
            bidders: vec![],
        };

        let response = decide(&request, &registry(), &cookie_synced_for("appnexus"));
        assert_eq!(response.status, "ok");
    }
}
