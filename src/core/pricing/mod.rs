pub mod granularity;

pub use granularity::bucket_price;
