pub mod admission;
pub mod cache_population;
pub mod fan_out;
pub mod response_framing;
pub mod size_reconciliation;
pub mod targeting;

pub use cache_population::CachePopulationTask;
pub use fan_out::FanOutTask;
pub use response_framing::ResponseFramingTask;
pub use targeting::TargetingTask;
