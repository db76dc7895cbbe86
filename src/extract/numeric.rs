//! Engagement-count normalization
//!
//! Counts are rendered as `500`, `1,234`, `12.3k` or `1.2m`. A `k` suffix
//! multiplies by one thousand and an `m` suffix by one million, truncating
//! any remaining fraction.

use crate::extract::FormatError;

const THOUSAND: u64 = 1_000;
const MILLION: u64 = 1_000_000;

/// Parses an engagement-count token into an integer
///
/// # Rules (applied in order)
///
/// 1. Thousands separators (`,`) are removed
/// 2. A token containing `k` is scaled by 1,000
/// 3. A token containing `m` is scaled by 1,000,000
/// 4. Anything else must be a plain non-negative integer
///
/// Scaled values are computed in exact decimal arithmetic and truncated, so
/// `1.15k` is 1150 rather than a float artifact like 1149.
///
/// # Errors
///
/// Returns [`FormatError::InvalidCount`] if the remainder is not numeric.
/// Callers should degrade to an absent count rather than abort.
///
/// # Examples
///
/// ```
/// use feed_harvest::extract::parse_count;
///
/// assert_eq!(parse_count("12.3k").unwrap(), 12_300);
/// assert_eq!(parse_count("1.2m").unwrap(), 1_200_000);
/// assert_eq!(parse_count("500").unwrap(), 500);
/// assert!(parse_count("abc").is_err());
/// ```
pub fn parse_count(token: &str) -> Result<u64, FormatError> {
    let invalid = || FormatError::InvalidCount(token.to_string());

    let cleaned: String = token
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if cleaned.contains('k') {
        scale_decimal(&cleaned.replace('k', ""), THOUSAND).ok_or_else(invalid)
    } else if cleaned.contains('m') {
        scale_decimal(&cleaned.replace('m', ""), MILLION).ok_or_else(invalid)
    } else {
        cleaned.parse::<u64>().map_err(|_| invalid())
    }
}

/// Multiplies a decimal string by `multiplier`, truncating excess fraction digits
fn scale_decimal(mantissa: &str, multiplier: u64) -> Option<u64> {
    let mantissa = mantissa.trim();
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut value = whole.checked_mul(multiplier)?;

    let mut place = multiplier;
    for digit in fraction.bytes() {
        place /= 10;
        if place == 0 {
            break;
        }
        value = value.checked_add(u64::from(digit - b'0') * place)?;
    }

    Some(value)
}
