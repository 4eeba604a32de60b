pub mod client;

pub use client::{CachePut, CacheClient};
