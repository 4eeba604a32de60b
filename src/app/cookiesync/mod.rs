mod decision;

pub use decision::{BidderStatus, CookieSyncRequest, CookieSyncResponse, decide};
