mod app;
mod core;

use crate::app::lifecycle::{StartupContext, build_shutdown_pipeline, build_start_pipeline};
use tracing::{error, info};

#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[actix_web::main]
async fn main() {
    let startup_pipeline = build_start_pipeline();
    let startup_ctx = StartupContext::default();

    if let Err(e) = startup_pipeline.run(&startup_ctx).await {
        panic!("startup failed: {e:?}");
    }
    info!("startup complete");

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, draining");

    let shutdown_pipeline = build_shutdown_pipeline();
    if let Err(e) = shutdown_pipeline.run(&startup_ctx).await {
        error!("shutdown did not complete cleanly: {e:?}");
    }
}

/// Waits for either `SIGTERM` or `SIGINT` (§9), matching the signals a
/// container orchestrator and an interactive terminal each send.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    }
}
