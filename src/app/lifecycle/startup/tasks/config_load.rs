use crate::app::config::AppConfig;
use crate::app::lifecycle::context::StartupContext;
use crate::app::pipeline::BlockingTask;
use anyhow::{Error, anyhow};

pub(crate) struct ConfigLoadTask;

impl BlockingTask<StartupContext, Error> for ConfigLoadTask {
    fn run(&self, ctx: &StartupContext) -> Result<(), Error> {
        let config = AppConfig::load()?;
        config.logging.validate()?;

        ctx.config
            .set(config)
            .map_err(|_| anyhow!("config already initialized"))?;

        Ok(())
    }
}
