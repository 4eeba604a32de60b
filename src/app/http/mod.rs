pub mod middleware;
pub mod request_parser;
pub mod routes;

pub use routes::{AppState, configure};
