//! Price bucketing (§4.4, §9 design notes). Each granularity is expressed
//! as a data-driven sequence of `(max_price, increment, precision)` rows,
//! so the rounding function stays a small, trivially testable fold rather
//! than a pile of per-variant branches.

use crate::core::models::PriceGranularity;

/// One row of a price bucket table: bids at or below `max_price` (in CPM)
/// are rounded down to the nearest `increment`, then formatted with
/// `precision` decimal places.
struct BucketRow {
    max_price: f64,
    increment: f64,
    precision: usize,
}

const fn row(max_price: f64, increment: f64, precision: usize) -> BucketRow {
    BucketRow {
        max_price,
        increment,
        precision,
    }
}

fn table(granularity: PriceGranularity) -> &'static [BucketRow] {
    match granularity {
        PriceGranularity::Low => &[row(5.0, 0.50, 2)],
        PriceGranularity::Med => &[row(20.0, 0.10, 2)],
        PriceGranularity::High => &[row(20.0, 0.01, 2)],
        PriceGranularity::Auto => &[
            row(5.0, 0.05, 2),
            row(10.0, 0.10, 2),
            row(20.0, 0.50, 2),
        ],
        PriceGranularity::Dense => &[
            row(3.0, 0.01, 2),
            row(8.0, 0.05, 2),
            row(20.0, 0.50, 2),
        ],
    }
}

/// Buckets `price` (a CPM value) per `granularity` and returns the
/// stringified value used as a targeting key, e.g. `"1.20"`.
///
/// Prices above the table's final `max_price` are capped at that row's
/// ceiling, bucketed with its increment/precision (matches the common
/// header-bidding convention of a "cap" bucket rather than an unbounded
/// top end).
pub fn bucket_price(price: f64, granularity: PriceGranularity) -> String {
    if !price.is_finite() || price <= 0.0 {
        return format!("{:.*}", table(granularity).first().map_or(2, |r| r.precision), 0.0);
    }

    let rows = table(granularity);
    let row = rows
        .iter()
        .find(|r| price <= r.max_price)
        .unwrap_or_else(|| rows.last().expect("bucket table is never empty"));

    let capped = price.min(row.max_price);
    let bucketed = (capped / row.increment).floor() * row.increment;

    format!("{:.*}", row.precision, bucketed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn med_granularity_buckets_to_ten_cent_increments() {
        assert_eq!(bucket_price(1.23, PriceGranularity::Med), "1.20");
        assert_eq!(bucket_price(1.29, PriceGranularity::Med), "1.20");
        assert_eq!(bucket_price(1.30, PriceGranularity::Med), "1.30");
    }

    #[test]
    fn low_granularity_buckets_to_fifty_cent_increments() {
        assert_eq!(bucket_price(1.74, PriceGranularity::Low), "1.50");
        assert_eq!(bucket_price(2.49, PriceGranularity::Low), "2.00");
    }

    #[test]
    fn high_granularity_buckets_to_cents() {
        assert_eq!(bucket_price(1.2345, PriceGranularity::High), "1.23");
    }

    #[test]
    fn auto_granularity_switches_increment_by_price_band() {
        assert_eq!(bucket_price(2.03, PriceGranularity::Auto), "2.00");
        assert_eq!(bucket_price(7.23, PriceGranularity::Auto), "7.20");
        assert_eq!(bucket_price(15.40, PriceGranularity::Auto), "15.00");
    }

    #[test]
    fn prices_above_the_table_cap_at_the_final_row() {
        assert_eq!(bucket_price(999.0, PriceGranularity::Med), "20.00");
    }

    #[test]
    fn non_positive_or_non_finite_prices_bucket_to_zero() {
        assert_eq!(bucket_price(0.0, PriceGranularity::Med), "0.00");
        assert_eq!(bucket_price(-1.0, PriceGranularity::Med), "0.00");
        assert_eq!(bucket_price(f64::NAN, PriceGranularity::Med), "0.00");
    }
}
