//! Process-wide HTTP middleware (§6): every response carries the
//! no-cache triad, and CORS allows credentialed cross-origin requests so
//! a publisher's page can call `/auction` and `/cookie_sync` directly.

use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;

pub fn cache_control() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Cache-Control", "no-cache, no-store, must-revalidate"))
        .add(("Pragma", "no-cache"))
        .add(("Expires", "0"))
}

pub fn cors() -> Cors {
    // Credentialed CORS cannot pair with a wildcard origin (the browser
    // rejects it), so every origin is individually reflected instead.
    Cors::default()
        .allowed_origin_fn(|_origin, _req_head| true)
        .supports_credentials()
        .allow_any_method()
        .allow_any_header()
}
