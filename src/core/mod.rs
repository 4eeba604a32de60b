pub mod accounts;
pub mod adapters;
pub mod cache;
pub mod cookie;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod pricing;
