//! The request-scoped error taxonomy (§7). Bidder-scoped failures never
//! reach here — they are absorbed into the bidder's own diagnostic record
//! by the orchestrator and never fail the request.

use crate::core::metrics::MetricsRegistry;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct StatusBody {
    pub status: String,
}

/// Request-scoped failures. HTTP status is 200 for all of these except
/// `OptOut`, which is cookie-sync-only and returns 401 per §6/§4.5.
#[derive(Debug)]
pub enum AuctionError {
    BadRequest(String),
    UnknownAccount(String),
    CacheFailure(String),
    OptOut,
}

impl fmt::Display for AuctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuctionError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            AuctionError::UnknownAccount(id) => write!(f, "Unknown account id: {id}"),
            AuctionError::CacheFailure(msg) => write!(f, "Cache failure: {msg}"),
            AuctionError::OptOut => write!(f, "User has opted out"),
        }
    }
}

impl std::error::Error for AuctionError {}

impl AuctionError {
    /// The `status` field value carried in the JSON body, per §8 scenario 3
    /// (`{status:"Unknown account id: Unknown account"}`).
    fn status_field(&self) -> String {
        match self {
            AuctionError::UnknownAccount(_) => "Unknown account id: Unknown account".to_string(),
            AuctionError::BadRequest(msg) => msg.clone(),
            AuctionError::CacheFailure(msg) => msg.clone(),
            AuctionError::OptOut => "User has opted out".to_string(),
        }
    }

    /// Taxonomy name for the request-error counter. `OptOut` has its own
    /// dedicated opt-out counter and is excluded here.
    fn kind(&self) -> Option<&'static str> {
        match self {
            AuctionError::BadRequest(_) => Some("bad_request"),
            AuctionError::UnknownAccount(_) => Some("unknown_account"),
            AuctionError::CacheFailure(_) => Some("cache_failure"),
            AuctionError::OptOut => None,
        }
    }
}

impl ResponseError for AuctionError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuctionError::OptOut => StatusCode::UNAUTHORIZED,
            _ => StatusCode::OK,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Some(kind) = self.kind() {
            MetricsRegistry::record_request_error(kind);
        }

        if matches!(self, AuctionError::OptOut) {
            return HttpResponse::Unauthorized().body(self.status_field());
        }

        HttpResponse::Ok().json(StatusBody {
            status: self.status_field(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_account_renders_the_documented_status_text() {
        let err = AuctionError::UnknownAccount("nope".into());
        assert_eq!(err.status_field(), "Unknown account id: Unknown account");
    }

    #[test]
    fn opt_out_maps_to_401() {
        let err = AuctionError::OptOut;
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn bad_request_and_cache_failure_still_map_to_200() {
        assert_eq!(
            AuctionError::BadRequest("x".into()).status_code(),
            StatusCode::OK
        );
        assert_eq!(
            AuctionError::CacheFailure("x".into()).status_code(),
            StatusCode::OK
        );
    }

    #[test]
    fn opt_out_is_excluded_from_the_request_error_taxonomy() {
        assert_eq!(AuctionError::OptOut.kind(), None);
        assert_eq!(AuctionError::BadRequest("x".into()).kind(), Some("bad_request"));
        assert_eq!(
            AuctionError::UnknownAccount("x".into()).kind(),
            Some("unknown_account")
        );
        assert_eq!(
            AuctionError::CacheFailure("x".into()).kind(),
            Some("cache_failure")
        );
    }
}
