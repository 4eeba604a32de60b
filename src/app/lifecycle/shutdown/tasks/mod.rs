mod observability;
mod stop_server;

pub(crate) use observability::ObservabilityShutdownTask;
pub(crate) use stop_server::StopServerTask;
