use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::{KeyValue, global};
use std::sync::LazyLock;

static AUCTION_REQUESTS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("hbauction:auction")
        .u64_counter("auction.requests")
        .with_description("Total /auction requests received")
        .with_unit("1")
        .build()
});

static AUCTION_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    global::meter("hbauction:auction")
        .f64_histogram("auction.duration")
        .with_description("Total auction wall time")
        .with_unit("s")
        .build()
});

static BIDDER_TIMEOUTS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("hbauction:auction")
        .u64_counter("auction.bidder.timeouts")
        .with_description("Bidder calls that missed the auction deadline")
        .with_unit("1")
        .build()
});

static BIDDER_ERRORS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("hbauction:auction")
        .u64_counter("auction.bidder.errors")
        .with_description("Bidder calls that returned a transport or adapter error")
        .with_unit("1")
        .build()
});

static BIDDER_NO_BIDS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("hbauction:auction")
        .u64_counter("auction.bidder.no_bids")
        .with_description("Bidder calls that completed with no bid")
        .with_unit("1")
        .build()
});

static BID_PRICE: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    global::meter("hbauction:auction")
        .f64_histogram("auction.bid.price")
        .with_description("Accepted bid CPM price")
        .with_unit("{USD}")
        .build()
});

static COOKIE_SYNC_OPT_OUTS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("hbauction:cookiesync")
        .u64_counter("cookiesync.opt_outs")
        .with_description("Cookie-sync requests rejected for opted-out users")
        .with_unit("1")
        .build()
});

static SAFARI_REQUESTS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("hbauction:auction")
        .u64_counter("auction.safari_requests")
        .with_description("Auction requests identified as Safari, where third-party cookie caveats apply")
        .with_unit("1")
        .build()
});

static REQUEST_ERRORS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("hbauction:auction")
        .u64_counter("auction.request_errors")
        .with_description("Requests rejected before fan-out (bad request, unknown account, cache failure)")
        .with_unit("1")
        .build()
});

static BIDDER_NO_COOKIE_SKIPS: LazyLock<Counter<u64>> = LazyLock::new(|| {
    global::meter("hbauction:auction")
        .u64_counter("auction.bidder.no_cookie_skips")
        .with_description("Bidders settled without dispatch because of missing sync under a skip-no-cookies policy")
        .with_unit("1")
        .build()
});

/// C5: a thin, ergonomic wrapper around the static OTel instruments above,
/// so call sites don't repeat attribute plumbing. Mirrors the teacher's
/// module-level `LazyLock<Counter<_>>` pattern rather than a struct holding
/// live instrument handles, since OTel instruments are already process-wide
/// singletons once registered with the global meter provider.
pub struct MetricsRegistry;

impl MetricsRegistry {
    pub fn record_auction_request(account_id: &str) {
        AUCTION_REQUESTS.add(1, &[KeyValue::new("account_id", account_id.to_string())]);
    }

    pub fn record_auction_duration(account_id: &str, seconds: f64) {
        AUCTION_DURATION.record(seconds, &[KeyValue::new("account_id", account_id.to_string())]);
    }

    pub fn record_bidder_timeout(bidder_code: &str) {
        BIDDER_TIMEOUTS.add(1, &[KeyValue::new("bidder_code", bidder_code.to_string())]);
    }

    pub fn record_bidder_error(bidder_code: &str) {
        BIDDER_ERRORS.add(1, &[KeyValue::new("bidder_code", bidder_code.to_string())]);
    }

    pub fn record_bidder_no_bid(bidder_code: &str) {
        BIDDER_NO_BIDS.add(1, &[KeyValue::new("bidder_code", bidder_code.to_string())]);
    }

    pub fn record_bid_price(bidder_code: &str, price: f64) {
        BID_PRICE.record(price, &[KeyValue::new("bidder_code", bidder_code.to_string())]);
    }

    pub fn record_cookie_sync_opt_out() {
        COOKIE_SYNC_OPT_OUTS.add(1, &[]);
    }

    pub fn record_safari_request() {
        SAFARI_REQUESTS.add(1, &[]);
    }

    /// A request-scoped failure that never reaches fan-out (§7: `BadRequest`,
    /// `UnknownAccount`, `CacheFailure`) — `kind` is the taxonomy name, not
    /// the free-form message.
    pub fn record_request_error(kind: &str) {
        REQUEST_ERRORS.add(1, &[KeyValue::new("kind", kind.to_string())]);
    }

    pub fn record_bidder_no_cookie_skip(bidder_code: &str) {
        BIDDER_NO_COOKIE_SKIPS.add(1, &[KeyValue::new("bidder_code", bidder_code.to_string())]);
    }
}
