//! Exact decimal prices.
//!
//! Shelf labels carry the price in whole cents, so the conversion from a
//! decimal amount must round exactly the way a decimal type would. Going
//! through `f64 * 100.0` gets values like `1.005` wrong, so prices are kept
//! as a scaled integer until they are rounded.

use std::fmt;
use std::str::FromStr;

use crate::error::{ReolkodeError, Result};

/// More digits than this cannot be represented without overflow.
const MAX_DIGITS: usize = 30;

/// A decimal amount, stored as `mantissa / 10^scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Price {
    mantissa: i128,
    scale: u32,
}

impl Price {
    /// Exact price from a signed number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self {
            mantissa: cents as i128,
            scale: 2,
        }
    }

    /// Price from a float, using its shortest round-trip decimal form.
    ///
    /// `Price::from_f64(1.005)` is exactly 1.005, not 1.00499999...
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(ReolkodeError::invalid(format!(
                "price must be a finite number, got {}",
                value
            )));
        }
        value.to_string().parse()
    }

    /// Signed cent count, rounded half away from zero.
    pub fn cents(&self) -> i128 {
        let magnitude = self.rounded_abs_cents() as i128;
        if self.mantissa < 0 { -magnitude } else { magnitude }
    }

    /// Absolute cent count, rounded half away from zero. The sign is dropped.
    pub fn abs_cents(&self) -> u128 {
        self.rounded_abs_cents()
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa < 0
    }

    fn rounded_abs_cents(&self) -> u128 {
        let abs = self.mantissa.unsigned_abs();
        if self.scale <= 2 {
            return abs * 10u128.pow(2 - self.scale);
        }
        let divisor = 10u128.pow(self.scale - 2);
        let quotient = abs / divisor;
        let remainder = abs % divisor;
        if remainder * 2 >= divisor {
            quotient + 1
        } else {
            quotient
        }
    }
}

impl FromStr for Price {
    type Err = ReolkodeError;

    /// Accepts `12`, `4.56`, `-3,5`, `+0.125`. Both `.` and `,` are
    /// accepted as decimal separator; thousands separators are not.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || ReolkodeError::invalid(format!("'{}' is not a valid price", s));

        let (negative, body) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let (int_part, frac_part) = match body.find(['.', ',']) {
            Some(pos) => (&body[..pos], &body[pos + 1..]),
            None => (body, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }

        // Leading zeros carry no information and would eat into MAX_DIGITS.
        let int_part = int_part.trim_start_matches('0');
        if int_part.len() + frac_part.len() > MAX_DIGITS {
            return Err(ReolkodeError::invalid(format!(
                "price '{}' has more than {} digits",
                s, MAX_DIGITS
            )));
        }

        let mut mantissa: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa * 10 + (b - b'0') as i128;
        }
        if negative {
            mantissa = -mantissa;
        }

        Ok(Self {
            mantissa,
            scale: frac_part.len() as u32,
        })
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.mantissa.unsigned_abs();
        let sign = if self.mantissa < 0 { "-" } else { "" };
        if self.scale == 0 {
            return write!(f, "{}{}", sign, abs);
        }
        let divisor = 10u128.pow(self.scale);
        write!(
            f,
            "{}{}.{:0width$}",
            sign,
            abs / divisor,
            abs % divisor,
            width = self.scale as usize
        )
    }
}
