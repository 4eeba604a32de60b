pub mod context;
pub mod shutdown;
pub mod startup;

pub use context::StartupContext;
pub use shutdown::build_shutdown_pipeline;
pub use startup::build_start_pipeline;
