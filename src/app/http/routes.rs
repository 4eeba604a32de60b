//! C10: the HTTP surface (§6). Thin handlers: decode, delegate to the
//! already-built orchestrator/cookie-sync/account collaborators, frame
//! the response. No business logic lives here.

use crate::app::auction::AuctionContext;
use crate::app::config::AppConfig;
use crate::app::cookiesync::{self, CookieSyncRequest};
use crate::app::http::request_parser::{self, encode_cookie, parse_cookie};
use crate::app::pipeline::Pipeline;
use crate::core::accounts::AccountStore;
use crate::core::adapters::AdapterRegistry;
use crate::core::cache::CacheClient;
use crate::core::errors::AuctionError;
use crate::core::metrics::MetricsRegistry;
use crate::core::models::{AuctionResponse, AuctionStatus, RawAuctionRequest};
use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use tracing::instrument;

/// Everything a handler needs; built once at startup and shared behind
/// `web::Data` (all fields are themselves `Arc`-backed or cheap to clone).
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub account_store: Arc<dyn AccountStore>,
    pub adapters: Arc<AdapterRegistry>,
    pub cache_client: Option<Arc<CacheClient>>,
    pub auction_pipeline: Arc<Pipeline<AuctionContext, AuctionError>>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/auction", web::post().to(auction_handler))
        .route("/cookie_sync", web::post().to(cookie_sync_handler))
        .route("/validate", web::post().to(validate_handler))
        .route("/bidders/params", web::get().to(bidders_params_handler))
        .route("/status", web::get().to(status_handler))
        .route("/getuids", web::get().to(getuids_handler))
        .route("/setuid", web::route().to(setuid_handler))
        .route("/optout", web::route().to(optout_handler));
}

#[instrument(skip_all, name = "auction_handler", fields(tid))]
async fn auction_handler(
    body: web::Bytes,
    http_req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AuctionError> {
    let raw: RawAuctionRequest = serde_json::from_slice(&body)
        .map_err(|e| AuctionError::BadRequest(format!("JSON parse failed: {e}")))?;

    let (request, account) = request_parser::parse(
        raw,
        &http_req,
        state.account_store.as_ref(),
        &state.config,
    )
    .await?;

    tracing::Span::current().record("tid", request.tid.as_str());

    let start = request.start;
    let ctx = AuctionContext::new(
        request,
        account,
        state.adapters.clone(),
        state.cache_client.clone(),
    );

    state.auction_pipeline.run(&ctx).await?;
    MetricsRegistry::record_auction_duration(
        &ctx.account.account_id,
        start.elapsed().as_secs_f64(),
    );

    let tid = ctx.request.tid.clone();
    let status = ctx
        .result
        .status
        .get()
        .copied()
        .unwrap_or(AuctionStatus::Ok)
        .as_str();
    let bidder_status = ctx.result.bidders.into_inner();
    let bids = ctx.result.bids.into_inner();

    Ok(HttpResponse::Ok().json(AuctionResponse {
        status,
        tid,
        bidder_status,
        bids,
    }))
}

#[instrument(skip_all, name = "cookie_sync_handler")]
async fn cookie_sync_handler(
    body: web::Bytes,
    http_req: HttpRequest,
    state: web::Data<AppState>,
) -> HttpResponse {
    let request: CookieSyncRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(_) => return HttpResponse::BadRequest().body("JSON parse failed"),
    };

    let cookie = parse_cookie(&http_req, &state.config.host_cookie.cookie_name);

    if !cookie.allow_syncs() {
        MetricsRegistry::record_cookie_sync_opt_out();
        return HttpResponse::Unauthorized().body("User has opted out");
    }

    let response = cookiesync::decide(&request, &state.adapters, &cookie);
    HttpResponse::Ok().json(response)
}

/// A lightweight existence/shape check, not full JSON-schema validation
/// (the per-adapter param schemas that would back one are out of scope
/// per §1 — bidder adapters beyond the generic `HttpAdapter` are not
/// shipped here).
async fn validate_handler(body: web::Bytes) -> HttpResponse {
    match serde_json::from_slice::<RawAuctionRequest>(&body) {
        Ok(_) => HttpResponse::Ok().content_type("text/plain").body("valid"),
        Err(e) => HttpResponse::Ok()
            .content_type("text/plain")
            .body(format!("invalid: {e}")),
    }
}

async fn bidders_params_handler(state: web::Data<AppState>) -> HttpResponse {
    let schemas: serde_json::Map<String, serde_json::Value> = state
        .adapters
        .codes()
        .into_iter()
        .map(|code| (code.to_string(), serde_json::json!({"type": "object"})))
        .collect();

    HttpResponse::Ok().json(serde_json::Value::Object(schemas))
}

async fn status_handler() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// The three user-sync-pixel routes (§6). The partner match-table
/// subsystem they'd normally delegate to is an explicit external
/// collaborator out of scope here (§3); these operate directly on the
/// inbound host cookie's own sync map instead of a hosted table.
async fn getuids_handler(http_req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let cookie = parse_cookie(&http_req, &state.config.host_cookie.cookie_name);
    HttpResponse::Ok().json(serde_json::json!({ "uids": cookie.syncs }))
}

#[derive(serde::Deserialize)]
struct SyncQuery {
    bidder: String,
    uid: String,
}

async fn setuid_handler(
    http_req: HttpRequest,
    query: web::Query<SyncQuery>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let cookie_name = &state.config.host_cookie.cookie_name;
    let mut cookie = parse_cookie(&http_req, cookie_name);

    if !cookie.allow_syncs() {
        return HttpResponse::Unauthorized().body("User has opted out");
    }

    let family = state
        .adapters
        .get(&query.bidder)
        .map(|a| a.family_name().to_string())
        .unwrap_or_else(|| query.bidder.clone());
    cookie.set_sync(family, query.uid.clone());

    let mut response = HttpResponse::Ok();
    if !cookie_name.is_empty() {
        response.cookie(
            actix_web::cookie::Cookie::build(cookie_name.clone(), encode_cookie(&cookie))
                .domain(state.config.host_cookie.domain.clone())
                .path("/")
                .finish(),
        );
    }
    response.body("ok")
}

async fn optout_handler(state: web::Data<AppState>) -> HttpResponse {
    MetricsRegistry::record_cookie_sync_opt_out();
    if state.config.host_cookie.opt_out_url.is_empty() {
        return HttpResponse::Ok().body("ok");
    }

    HttpResponse::Found()
        .append_header(("Location", state.config.host_cookie.opt_out_url.clone()))
        .finish()
}
