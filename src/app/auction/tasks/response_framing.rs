use crate::app::auction::context::AuctionContext;
use crate::app::pipeline::AsyncTask;
use crate::core::cookie::UserSyncCookie;
use crate::core::errors::AuctionError;
use crate::core::models::{AppContext, AuctionStatus};
use async_trait::async_trait;

/// §4.2 response framing: an app request is always `"OK"` (there is no
/// browser cookie to be missing); a web request with zero live syncs is
/// `"no_cookie"`.
pub fn determine_status(app: Option<&AppContext>, cookie: &UserSyncCookie) -> AuctionStatus {
    if app.is_some() {
        return AuctionStatus::Ok;
    }

    if cookie.live_sync_count() == 0 {
        AuctionStatus::NoCookie
    } else {
        AuctionStatus::Ok
    }
}

/// Last pipeline stage: records the top-level status the HTTP layer
/// serializes into `AuctionResponse.status`.
pub struct ResponseFramingTask;

#[async_trait]
impl AsyncTask<AuctionContext, AuctionError> for ResponseFramingTask {
    async fn run(&self, ctx: &AuctionContext) -> Result<(), AuctionError> {
        let status = determine_status(ctx.request.app.as_ref(), &ctx.request.cookie);
        let _ = ctx.result.status.set(status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_requests_are_always_ok() {
        let cookie = UserSyncCookie::empty();
        let app = AppContext::default();
        assert_eq!(determine_status(Some(&app), &cookie), AuctionStatus::Ok);
    }

    #[test]
    fn web_request_with_no_live_syncs_is_no_cookie() {
        let cookie = UserSyncCookie::empty();
        assert_eq!(determine_status(None, &cookie), AuctionStatus::NoCookie);
    }
}
