use alloy::primitives::U256;
use bigdecimal::{num_bigint::BigInt, BigDecimal};
use chrono::NaiveDateTime;

/// On-chain amounts are fixed point integers with 18 fractional digits.
pub const AMOUNT_DECIMALS: i64 = 18;

pub fn amount_to_decimal(amount: U256) -> BigDecimal {
    let digits = BigInt::from_bytes_be(
        bigdecimal::num_bigint::Sign::Plus,
        &amount.to_be_bytes::<32>(),
    );
    BigDecimal::new(digits, AMOUNT_DECIMALS).normalized()
}

pub fn unix_to_datetime(timestamp: u64) -> Option<NaiveDateTime> {
    let timestamp = i64::try_from(timestamp).ok()?;
    chrono::DateTime::from_timestamp(timestamp, 0).map(|dt| dt.naive_utc())
}
