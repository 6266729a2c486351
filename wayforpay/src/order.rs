//! Order reference and order date generation.

use chrono::{DateTime, Utc};
use donate_types::FieldValue;
use rand::Rng;
use rand::distr::Alphanumeric;

const SUFFIX_LEN: usize = 4;

/// Builds `<productName>-<YYYYMMDDHHMMSS>-<4 alphanumerics>`.
///
/// The timestamp is UTC with second precision; the random suffix keeps
/// references unique within the same second.
pub fn order_reference(product_name: &FieldValue, now: DateTime<Utc>) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();

    format!(
        "{}-{}-{}",
        product_name.joined(),
        now.format("%Y%m%d%H%M%S"),
        suffix
    )
}

/// Unix time in whole seconds, as the gateway expects it.
pub fn order_date(now: DateTime<Utc>) -> String {
    now.timestamp().to_string()
}
