//! Fixed-point coin arithmetic.
//!
//! The banking API exchanges amounts as decimal strings with up to eight
//! fractional digits, and the cached balance must track them exactly
//! (`10.00000000 + 1.5 = 11.50000000`). [`Coins`] stores a signed value
//! scaled by `10^8` so addition and subtraction are exact integer ops, and
//! always renders with the full eight fractional digits.

use std::fmt;

use crate::errors::{Error, Result};

const SCALE: i64 = 100_000_000;
const FRACTION_DIGITS: usize = 8;

/// A coin amount with eight fractional digits of precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Coins(i64);

impl Coins {
    /// Parses a decimal string such as `"10"`, `"1.5"` or `"-0.00000001"`.
    ///
    /// Fractional digits beyond the eighth are truncated, matching how the
    /// cached balance has always been kept at eight digits.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidAmount(text.to_string());

        let trimmed = text.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };

        let frac_digits: String = frac_part.chars().take(FRACTION_DIGITS).collect();
        let mut frac: i64 = if frac_digits.is_empty() {
            0
        } else {
            frac_digits.parse().map_err(|_| invalid())?
        };
        frac *= 10_i64.pow((FRACTION_DIGITS - frac_digits.len()) as u32);

        let magnitude = whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(invalid)?;

        Ok(Self(if negative { -magnitude } else { magnitude }))
    }

    /// Converts a user-entered floating amount, rounding to eight digits.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::InvalidAmount(value.to_string()));
        }
        let scaled = (value * SCALE as f64).round();
        if scaled.abs() >= i64::MAX as f64 {
            return Err(Error::InvalidAmount(value.to_string()));
        }
        Ok(Self(scaled as i64))
    }

    /// Checked addition.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:08}",
            magnitude / SCALE as u64,
            magnitude % SCALE as u64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_precision_string() {
        let coins = Coins::parse("10.00000000").expect("valid");
        assert_eq!(coins.to_string(), "10.00000000");
    }

    #[test]
    fn parses_short_fraction() {
        let coins = Coins::parse("1.5").expect("valid");
        assert_eq!(coins.to_string(), "1.50000000");
    }

    #[test]
    fn parses_integer_and_bare_fraction() {
        assert_eq!(Coins::parse("7").expect("valid").to_string(), "7.00000000");
        assert_eq!(Coins::parse(".25").expect("valid").to_string(), "0.25000000");
    }

    #[test]
    fn truncates_beyond_eight_digits() {
        let coins = Coins::parse("0.123456789").expect("valid");
        assert_eq!(coins.to_string(), "0.12345678");
    }

    #[test]
    fn claim_scenario_adds_exactly() {
        let balance = Coins::parse("10.00000000").expect("valid");
        let claimed = Coins::parse("1.5").expect("valid");
        let updated = balance.checked_add(claimed).expect("no overflow");
        assert_eq!(updated.to_string(), "11.50000000");
    }

    #[test]
    fn transfer_scenario_subtracts_exactly() {
        let balance = Coins::parse("11.50000000").expect("valid");
        let sent = Coins::from_f64(5.0).expect("finite");
        let updated = balance.checked_sub(sent).expect("no overflow");
        assert_eq!(updated.to_string(), "6.50000000");
    }

    #[test]
    fn negative_amounts_render_with_sign() {
        let coins = Coins::parse("-0.00000001").expect("valid");
        assert_eq!(coins.to_string(), "-0.00000001");
    }

    #[test]
    fn rejects_garbage() {
        assert!(Coins::parse("abc").is_err());
        assert!(Coins::parse("").is_err());
        assert!(Coins::parse("1.2.3").is_err());
        assert!(Coins::parse("1e5").is_err());
    }

    #[test]
    fn rejects_non_finite_floats() {
        assert!(Coins::from_f64(f64::NAN).is_err());
        assert!(Coins::from_f64(f64::INFINITY).is_err());
    }
}
