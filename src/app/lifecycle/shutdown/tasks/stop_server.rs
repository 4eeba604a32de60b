use crate::app::lifecycle::context::StartupContext;
use crate::app::pipeline::AsyncTask;
use anyhow::Error;
use async_trait::async_trait;
use tracing::info;

pub(crate) struct StopServerTask;

#[async_trait]
impl AsyncTask<StartupContext, Error> for StopServerTask {
    async fn run(&self, context: &StartupContext) -> Result<(), Error> {
        match context.server.get() {
            Some(handle) => {
                info!("closing listener");
                handle.stop(true).await;
                info!("listener closed");
            }
            None => info!("skipping listener shutdown, server was never started"),
        }

        match context.admin_server.get() {
            Some(handle) => {
                info!("closing admin listener");
                handle.stop(true).await;
                info!("admin listener closed");
            }
            None => info!("skipping admin listener shutdown, admin server was never started"),
        }

        Ok(())
    }
}
