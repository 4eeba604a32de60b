use crate::app::http::middleware;
use crate::app::http::{self, AppState};
use crate::app::lifecycle::context::StartupContext;
use crate::app::pipeline::AsyncTask;
use actix_web::{App, HttpResponse, HttpServer, web};
use anyhow::{Error, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

pub(crate) struct StartServerTask;

#[async_trait]
impl AsyncTask<StartupContext, Error> for StartServerTask {
    #[instrument(skip_all, name = "start_server_task")]
    async fn run(&self, ctx: &StartupContext) -> Result<(), Error> {
        let config = ctx.config.get().ok_or_else(|| anyhow!("config missing during start server task"))?;

        let state = web::Data::new(AppState {
            config: Arc::new(config.clone()),
            account_store: ctx
                .account_store
                .get()
                .ok_or_else(|| anyhow!("account store not built"))?
                .clone(),
            adapters: ctx
                .adapters
                .get()
                .ok_or_else(|| anyhow!("adapter registry not built"))?
                .clone(),
            cache_client: ctx
                .cache_client
                .get()
                .ok_or_else(|| anyhow!("cache client not built"))?
                .clone(),
            auction_pipeline: ctx
                .auction_pipeline
                .get()
                .ok_or_else(|| anyhow!("auction pipeline not built"))?
                .clone(),
        });

        let bind_addr = (config.host.clone(), config.port);
        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(middleware::cors())
                .wrap(middleware::cache_control())
                .wrap(actix_web::middleware::Compress::default())
                .configure(http::configure)
        })
        .bind(bind_addr.clone())
        .map_err(|e| anyhow!("binding {}:{} failed: {e}", bind_addr.0, bind_addr.1))?
        .shutdown_timeout(10)
        .run();

        let handle = server.handle();
        actix_web::rt::spawn(server);

        ctx.server
            .set(handle)
            .map_err(|_| anyhow!("server already started"))?;

        let admin_handle = start_admin_server(config.host.clone(), config.admin_port)?;
        ctx.admin_server
            .set(admin_handle)
            .map_err(|_| anyhow!("admin server already started"))?;

        info!(host = %config.host, port = config.port, "http server started");

        Ok(())
    }
}

/// A minimal second listener for diagnostics/profiling (§6: "admin server
/// binds host:adminPort"). It carries no business routes of its own —
/// just a liveness probe, since the profiling/diagnostics surface itself
/// is an operational concern out of scope here. Its handle is returned so
/// shutdown can drain it alongside the main server (§9: each server flush
/// gets its own 10-second deadline).
fn start_admin_server(host: String, port: u16) -> Result<actix_web::dev::ServerHandle, Error> {
    let server = HttpServer::new(|| {
        App::new().route("/status", web::get().to(|| async { HttpResponse::Ok().finish() }))
    })
    .bind((host.clone(), port))
    .map_err(|e| anyhow!("binding admin server {host}:{port} failed: {e}"))?
    .shutdown_timeout(10)
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    Ok(handle)
}
