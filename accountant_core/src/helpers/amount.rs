//! Exact conversions between explorer-reported amounts and atomic units.
//!
//! Nothing in here goes through binary floating point: integers are parsed as
//! `BigInt` and decimal strings as `BigDecimal`, so large balances survive
//! unchanged.

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use std::str::FromStr;

/// Parse an integer amount that is already expressed in atomic units.
pub fn parse_atomic_integer(raw: &str) -> Option<BigInt> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    BigInt::from_str(trimmed).ok()
}

/// Upper bound on the power of ten an amount may be scaled up by. Exponent
/// notation like `1e2000000000` would otherwise allocate a gigantic integer.
const MAX_SCALE_UP: i64 = 128;

/// Scale a decimal string such as `"0.5"` by `10^decimals` and truncate the
/// remainder toward zero. Amounts whose exponent is out of range are rejected.
pub fn scale_decimal_to_atomic(raw: &str, decimals: u32) -> Option<BigInt> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = BigDecimal::from_str(trimmed).ok()?;
    let (digits, scale) = value.into_bigint_and_exponent();
    let shifted = scale.checked_sub(i64::from(decimals))?;
    if shifted < -MAX_SCALE_UP {
        return None;
    }
    // Everything is behind the point, so truncation leaves zero.
    let digit_count = i64::try_from(digits.magnitude().to_string().len()).ok()?;
    if shifted >= digit_count {
        return Some(BigInt::from(0));
    }

    let (atomic, _) = BigDecimal::new(digits, shifted)
        .with_scale(0)
        .into_bigint_and_exponent();
    Some(atomic)
}

pub fn atomic_to_decimal(atomic: &BigInt, decimals: u32) -> BigDecimal {
    BigDecimal::new(atomic.clone(), i64::from(decimals))
}

/// Render atomic units with exactly `decimals` fractional digits, e.g.
/// `1500000000000000000` with 18 decimals becomes `"1.500000000000000000"`.
pub fn to_decimal_string(atomic: &BigInt, decimals: u32) -> String {
    let sign = if atomic.sign() == Sign::Minus { "-" } else { "" };
    let magnitude = atomic.magnitude().to_string();
    let width = decimals as usize;
    if width == 0 {
        return format!("{}{}", sign, magnitude);
    }

    let padded = if magnitude.len() <= width {
        format!("{}{}", "0".repeat(width + 1 - magnitude.len()), magnitude)
    } else {
        magnitude
    };
    let (integer, fraction) = padded.split_at(padded.len() - width);
    format!("{}{}.{}", sign, integer, fraction)
}

/// Drop trailing fractional zeros and a dangling decimal point.
pub fn trim_decimal_string(value: &str) -> String {
    if !value.contains('.') {
        return value.to_string();
    }
    value
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

pub fn format_amount(atomic: &BigInt, decimals: u32) -> String {
    trim_decimal_string(&to_decimal_string(atomic, decimals))
}

/// Fiat values are shown with two digits, truncated.
pub fn format_fiat(value: &BigDecimal) -> String {
    let (cents, _) = value.with_scale(2).into_bigint_and_exponent();
    to_decimal_string(&cents, 2)
}
