//! The inbound user-sync cookie, modeled as a small value object parsed once
//! per request (§9 design notes). We only need the three capabilities the
//! orchestrator and cookie-sync endpoint actually consult: opt-out, live
//! sync count, and per-family sync lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// How long a stored sync is considered "live" before it must be refreshed.
pub const SYNC_TTL: Duration = Duration::from_secs(14 * 24 * 3600);

/// A single bidder-family sync entry as carried in the cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEntry {
    /// The bidder's own identifier for this browser.
    pub uid: String,
    /// Unix seconds the sync was last refreshed.
    pub ts: u64,
}

/// The wire shape of the cookie's JSON payload (base64-decoded by the
/// caller before reaching us; decoding is the HTTP layer's concern).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserSyncCookie {
    #[serde(default)]
    pub opted_out: bool,
    /// family name -> sync entry.
    #[serde(default)]
    pub syncs: HashMap<String, SyncEntry>,
}

impl UserSyncCookie {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the user currently allows sync pixels to be fired at all.
    pub fn allow_syncs(&self) -> bool {
        !self.opted_out
    }

    fn is_live(entry: &SyncEntry, now: u64) -> bool {
        now.saturating_sub(entry.ts) < SYNC_TTL.as_secs()
    }

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Count of syncs that are present and not yet expired.
    pub fn live_sync_count(&self) -> usize {
        let now = Self::now_secs();
        self.syncs.values().filter(|e| Self::is_live(e, now)).count()
    }

    /// Whether the given bidder family has a live (non-expired) sync.
    pub fn has_live_sync(&self, family: &str) -> bool {
        let now = Self::now_secs();
        self.syncs
            .get(family)
            .is_some_and(|e| Self::is_live(e, now))
    }

    /// The stored remote uid for a family, regardless of liveness.
    pub fn get_uid(&self, family: &str) -> Option<&str> {
        self.syncs.get(family).map(|e| e.uid.as_str())
    }

    /// Upserts a family's sync, stamping it as refreshed now (`/setuid`).
    pub fn set_sync(&mut self, family: impl Into<String>, uid: impl Into<String>) {
        self.syncs.insert(
            family.into(),
            SyncEntry {
                uid: uid.into(),
                ts: Self::now_secs(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_entry() -> SyncEntry {
        SyncEntry {
            uid: "abc".into(),
            ts: UserSyncCookie::now_secs(),
        }
    }

    fn expired_entry() -> SyncEntry {
        SyncEntry {
            uid: "abc".into(),
            ts: 0,
        }
    }

    #[test]
    fn opted_out_blocks_syncs() {
        let cookie = UserSyncCookie {
            opted_out: true,
            syncs: HashMap::new(),
        };
        assert!(!cookie.allow_syncs());
    }

    #[test]
    fn live_sync_count_ignores_expired_entries() {
        let mut syncs = HashMap::new();
        syncs.insert("appnexus".to_string(), live_entry());
        syncs.insert("rubicon".to_string(), expired_entry());

        let cookie = UserSyncCookie {
            opted_out: false,
            syncs,
        };

        assert_eq!(cookie.live_sync_count(), 1);
        assert!(cookie.has_live_sync("appnexus"));
        assert!(!cookie.has_live_sync("rubicon"));
        assert!(!cookie.has_live_sync("unknown"));
    }

    #[test]
    fn empty_cookie_has_zero_live_syncs() {
        let cookie = UserSyncCookie::empty();
        assert_eq!(cookie.live_sync_count(), 0);
        assert!(cookie.allow_syncs());
    }

    #[test]
    fn get_uid_returns_stored_value_even_if_expired() {
        let mut syncs = HashMap::new();
        syncs.insert("rubicon".to_string(), expired_entry());
        let cookie = UserSyncCookie {
            opted_out: false,
            syncs,
        };
        assert_eq!(cookie.get_uid("rubicon"), Some("abc"));
    }

    #[test]
    fn set_sync_upserts_a_live_entry() {
        let mut cookie = UserSyncCookie::empty();
        assert!(!cookie.has_live_sync("appnexus"));

        cookie.set_sync("appnexus", "new-uid");
        assert!(cookie.has_live_sync("appnexus"));
        assert_eq!(cookie.get_uid("appnexus"), Some("new-uid"));

        cookie.set_sync("appnexus", "refreshed-uid");
        assert_eq!(cookie.get_uid("appnexus"), Some("refreshed-uid"));
    }
}
