//! Conversion between human-readable prices and base units.
//!
//! Prices cross the contract boundary as wei. The UI works with decimal
//! strings in ether.

use ethers_core::types::U256;
use ethers_core::utils::format_units;

/// Decimals of the native currency.
pub const NATIVE_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price is empty")]
    Empty,

    #[error("price must not be negative: {0}")]
    Negative(String),

    #[error("invalid price {input:?}: {reason}")]
    Invalid { input: String, reason: String },
}

/// Parse a decimal price string into base units.
///
/// Accepts ASCII digits with at most one `.` and no more than
/// [`NATIVE_DECIMALS`] fractional digits. Amounts that do not fit in a
/// `U256` are rejected rather than wrapped.
pub fn parse_price(price: &str) -> Result<U256, PriceError> {
    let trimmed = price.trim();
    if trimmed.is_empty() {
        return Err(PriceError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(PriceError::Negative(trimmed.to_string()));
    }

    let invalid = |reason: &str| PriceError::Invalid {
        input: trimmed.to_string(),
        reason: reason.to_string(),
    };

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected a decimal number"));
    }
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("expected a decimal number"));
    }
    if fraction.len() > NATIVE_DECIMALS as usize {
        return Err(invalid("too many decimal places"));
    }

    let too_large = || invalid("amount is too large");
    let whole = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|_| too_large())?
    };
    let padded = format!("{fraction:0<width$}", width = NATIVE_DECIMALS as usize);
    let fraction = U256::from_dec_str(&padded).map_err(|_| too_large())?;

    whole
        .checked_mul(U256::exp10(NATIVE_DECIMALS as usize))
        .and_then(|wei| wei.checked_add(fraction))
        .ok_or_else(too_large)
}

/// Format base units as a decimal price string with trailing zeros trimmed.
///
/// Whole amounts keep one fractional digit (`1.0`).
pub fn format_price(amount: U256) -> Result<String, PriceError> {
    let formatted = format_units(amount, NATIVE_DECIMALS).map_err(|e| PriceError::Invalid {
        input: amount.to_string(),
        reason: e.to_string(),
    })?;

    Ok(trim_fraction(&formatted))
}

fn trim_fraction(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => format!("{formatted}.0"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    #[test]
    fn parses_decimal_prices_into_wei() {
        assert_eq!(parse_price("1").unwrap(), ether(1));
        assert_eq!(
            parse_price("1.5").unwrap(),
            U256::from(1_500_000_000_000_000_000u64)
        );
        assert_eq!(
            parse_price("0.025").unwrap(),
            U256::from(25_000_000_000_000_000u64)
        );
        assert_eq!(parse_price(" 2 ").unwrap(), ether(2));
    }

    #[test]
    fn rejects_empty_negative_and_garbage() {
        assert_eq!(parse_price(""), Err(PriceError::Empty));
        assert_eq!(parse_price("   "), Err(PriceError::Empty));
        assert!(matches!(parse_price("-1"), Err(PriceError::Negative(_))));
        assert!(matches!(parse_price("abc"), Err(PriceError::Invalid { .. })));
        assert!(matches!(parse_price("."), Err(PriceError::Invalid { .. })));
        assert!(matches!(parse_price("1.2.3"), Err(PriceError::Invalid { .. })));
        assert!(matches!(parse_price("1e18"), Err(PriceError::Invalid { .. })));
    }

    #[test]
    fn accepts_bare_fraction_and_trailing_dot() {
        assert_eq!(
            parse_price(".5").unwrap(),
            U256::from(500_000_000_000_000_000u64)
        );
        assert_eq!(parse_price("3.").unwrap(), ether(3));
    }

    #[test]
    fn rejects_amounts_beyond_u256() {
        let huge = format!("1{}", "0".repeat(65));
        assert!(matches!(parse_price(&huge), Err(PriceError::Invalid { .. })));

        let overflowing_whole = "9".repeat(80);
        assert!(matches!(
            parse_price(&overflowing_whole),
            Err(PriceError::Invalid { .. })
        ));

        // Largest whole amount that still fits once scaled to wei
        let max_whole = (U256::MAX / U256::exp10(18)).to_string();
        assert!(parse_price(&max_whole).is_ok());
    }

    #[test]
    fn rejects_non_ascii_digits() {
        assert!(matches!(
            parse_price("0.00000000000000000\u{e9}"),
            Err(PriceError::Invalid { .. })
        ));
        assert!(matches!(parse_price("\u{661}"), Err(PriceError::Invalid { .. })));
    }

    #[test]
    fn rejects_more_than_eighteen_decimals() {
        let err = parse_price("0.0000000000000000001").unwrap_err();
        assert!(matches!(
            err,
            PriceError::Invalid { ref reason, .. } if reason.contains("decimal")
        ));
    }

    #[test]
    fn formats_wei_without_trailing_zeros() {
        assert_eq!(format_price(ether(1)).unwrap(), "1.0");
        assert_eq!(
            format_price(U256::from(1_500_000_000_000_000_000u64)).unwrap(),
            "1.5"
        );
        assert_eq!(format_price(U256::from(1u64)).unwrap(), "0.000000000000000001");
        assert_eq!(format_price(U256::zero()).unwrap(), "0.0");
    }

    #[test]
    fn price_survives_the_contract_boundary() {
        for price in ["0.01", "0.025", "1.5", "42", "123.456789", "0.000000000000000001"] {
            let wei = parse_price(price).unwrap();
            let back = format_price(wei).unwrap();
            assert_eq!(parse_price(&back).unwrap(), wei, "price {price} came back as {back}");
        }
    }

    #[test]
    fn trim_fraction_handles_plain_integers() {
        assert_eq!(trim_fraction("7"), "7.0");
        assert_eq!(trim_fraction("7.000"), "7.0");
        assert_eq!(trim_fraction("7.250"), "7.25");
    }
}
