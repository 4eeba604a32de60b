use async_trait::async_trait;

/// A pipeline stage that does its own blocking/sync work against a shared
/// context. Blocking tasks run inline on the calling executor thread; they
/// exist for steps cheap enough that spawning a blocking thread would cost
/// more than it saves (e.g. parsing, validation, small mutations).
pub trait BlockingTask<C, E>: Send + Sync {
    fn run(&self, context: &C) -> Result<(), E>;
}

/// A pipeline stage that awaits on I/O or otherwise yields.
#[async_trait]
pub trait AsyncTask<C, E>: Send + Sync {
    async fn run(&self, context: &C) -> Result<(), E>;
}

enum Stage<C, E> {
    Blocking(Box<dyn BlockingTask<C, E>>),
    Async(Box<dyn AsyncTask<C, E>>),
}

/// An ordered sequence of stages run serially over a shared context,
/// stopping at the first error. A `Pipeline` is itself an `AsyncTask`, so
/// pipelines can be nested and wrapped (see [`crate::app::span::WrappedPipelineTask`]).
pub struct Pipeline<C, E> {
    stages: Vec<Stage<C, E>>,
}

impl<C: Send + Sync, E> Pipeline<C, E> {
    pub async fn run(&self, context: &C) -> Result<(), E> {
        for stage in &self.stages {
            match stage {
                Stage::Blocking(task) => task.run(context)?,
                Stage::Async(task) => task.run(context).await?,
            }
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[async_trait]
impl<C: Send + Sync, E: Send + Sync> AsyncTask<C, E> for Pipeline<C, E> {
    async fn run(&self, context: &C) -> Result<(), E> {
        Pipeline::run(self, context).await
    }
}

/// Builds a [`Pipeline`] by appending blocking and async stages in call
/// order. `build()` returns `None` for an empty pipeline so callers can
/// distinguish "nothing configured" from "pipeline with no-op stages",
/// matching how optional finalizer pipelines are assembled at startup.
#[derive(Default)]
pub struct PipelineBuilder<C, E> {
    stages: Vec<Stage<C, E>>,
}

impl<C, E> PipelineBuilder<C, E> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn with_blocking(mut self, task: Box<dyn BlockingTask<C, E>>) -> Self {
        self.stages.push(Stage::Blocking(task));
        self
    }

    pub fn with_async(mut self, task: Box<dyn AsyncTask<C, E>>) -> Self {
        self.stages.push(Stage::Async(task));
        self
    }

    pub fn add_blocking(&mut self, task: Box<dyn BlockingTask<C, E>>) {
        self.stages.push(Stage::Blocking(task));
    }

    pub fn add_async(&mut self, task: Box<dyn AsyncTask<C, E>>) {
        self.stages.push(Stage::Async(task));
    }

    pub fn build(self) -> Option<Pipeline<C, E>> {
        if self.stages.is_empty() {
            None
        } else {
            Some(Pipeline { stages: self.stages })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Increment<'a>(&'a AtomicUsize);

    impl BlockingTask<(), anyhow::Error> for Increment<'_> {
        fn run(&self, _context: &()) -> Result<(), anyhow::Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl AsyncTask<(), anyhow::Error> for AlwaysFails {
        async fn run(&self, _context: &()) -> Result<(), anyhow::Error> {
            Err(anyhow::anyhow!("boom"))
        }
    }

    #[test]
    fn empty_builder_yields_no_pipeline() {
        let pipeline: Option<Pipeline<(), anyhow::Error>> = PipelineBuilder::new().build();
        assert!(pipeline.is_none());
    }

    #[tokio::test]
    async fn runs_stages_in_order_and_stops_on_error() {
        let counter = AtomicUsize::new(0);

        let pipeline = PipelineBuilder::new()
            .with_blocking(Box::new(Increment(&counter)))
            .with_blocking(Box::new(Increment(&counter)))
            .with_async(Box::new(AlwaysFails))
            .with_blocking(Box::new(Increment(&counter)))
            .build()
            .unwrap();

        let result = pipeline.run(&()).await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
