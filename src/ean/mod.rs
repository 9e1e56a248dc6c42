//! # EAN-13 Encoding Engine
//!
//! Turns a shelf identifier and a price into a validated 13-digit EAN code.
//!
//! ## Code Layout
//!
//! ```text
//! ┌──────── Data12 ────────┐
//! │ shelf (N) │ cents (M)  │ check │   N + M = 12
//! │  000123   │  000456    │   ?   │
//! └───────────┴────────────┴───────┘
//! ```
//!
//! Both segments are left-padded with `'0'`. The default split is 6 + 6.
//!
//! ## Example
//!
//! ```
//! use reolkode::ean::{self, Price, SegmentWidths};
//!
//! let price: Price = "4.56".parse()?;
//! let code = ean::build("A12-3", price, SegmentWidths::default())?;
//! assert_eq!(code.as_str(), "0001230004561");
//! assert!(ean::validate_ean13(code.as_str()).is_ok());
//! # Ok::<(), reolkode::ReolkodeError>(())
//! ```

pub mod modules;
pub mod price;

pub use modules::{ModulePattern, encode_modules};
pub use price::Price;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ReolkodeError, Result};

/// Digits in the payload (everything but the check digit).
pub const DATA_LEN: usize = 12;

/// Digits in a complete code.
pub const CODE_LEN: usize = 13;

/// How the 12 payload digits are split between shelf number and price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentWidths {
    /// Digits reserved for the shelf number (leftmost).
    pub shelf: usize,
    /// Digits reserved for the price in cents (rightmost).
    pub price: usize,
}

impl Default for SegmentWidths {
    fn default() -> Self {
        Self { shelf: 6, price: 6 }
    }
}

impl SegmentWidths {
    /// Checked constructor.
    pub fn new(shelf: usize, price: usize) -> Result<Self> {
        let widths = Self { shelf, price };
        widths.validate()?;
        Ok(widths)
    }

    pub fn validate(&self) -> Result<()> {
        let total = self.shelf.checked_add(self.price);
        if self.shelf < 1 || self.price < 1 || total != Some(DATA_LEN) {
            return Err(ReolkodeError::invalid(format!(
                "digit widths must be >=1 and sum to 12 (got shelf={}, price={})",
                self.shelf, self.price
            )));
        }
        Ok(())
    }
}

fn is_all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn digit_values(s: &str) -> impl Iterator<Item = u32> + '_ {
    s.bytes().map(|b| (b - b'0') as u32)
}

/// Weighted mod-10 checksum over exactly 12 digits. Caller guarantees the shape.
fn checksum(digits: &str) -> u8 {
    let sum: u32 = digit_values(digits)
        .enumerate()
        .map(|(i, d)| if i % 2 == 1 { d * 3 } else { d })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

// ============================================================================
// DATA12
// ============================================================================

/// Twelve ASCII digits: shelf segment followed by price-in-cents segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Data12(String);

impl Data12 {
    /// Wrap an externally supplied payload after checking its shape.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != DATA_LEN || !is_all_digits(s) {
            return Err(ReolkodeError::invalid(format!(
                "check digit input must be exactly 12 digits, got '{}'",
                s
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checksum digit (0-9) for this payload.
    pub fn check_digit(&self) -> u8 {
        checksum(&self.0)
    }

    /// Append the check digit.
    pub fn into_ean13(self) -> Ean13 {
        let check = self.check_digit();
        let mut code = self.0;
        code.push((b'0' + check) as char);
        Ean13(code)
    }
}

impl fmt::Display for Data12 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Data12 {
    type Err = ReolkodeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ============================================================================
// EAN13
// ============================================================================

/// A checksum-verified 13-digit EAN code.
///
/// The only ways to obtain one are [`build`], [`Data12::into_ean13`] and
/// [`Ean13::parse`], so holding an `Ean13` means the checksum holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ean13(String);

impl Ean13 {
    /// Validate and wrap a code, e.g. one read by a scanner.
    pub fn parse(code: &str) -> Result<Self> {
        let invalid = || {
            ReolkodeError::invalid(format!(
                "'{}' is not a valid EAN-13 code (format or checksum)",
                code
            ))
        };
        if code.len() != CODE_LEN || !is_all_digits(code) {
            return Err(invalid());
        }
        let expected = checksum(&code[..DATA_LEN]);
        if code.as_bytes()[DATA_LEN] - b'0' != expected {
            return Err(invalid());
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digit values 0-9, left to right.
    pub fn digits(&self) -> [u8; CODE_LEN] {
        let mut out = [0u8; CODE_LEN];
        for (slot, b) in out.iter_mut().zip(self.0.bytes()) {
            *slot = b - b'0';
        }
        out
    }

    /// The payload without the check digit.
    pub fn data12(&self) -> Data12 {
        Data12(self.0[..DATA_LEN].to_string())
    }

    pub fn check_digit(&self) -> u8 {
        self.0.as_bytes()[DATA_LEN] - b'0'
    }

    /// Shelf segment as written in the code (zero padded).
    pub fn shelf_digits(&self, widths: SegmentWidths) -> Result<&str> {
        widths.validate()?;
        Ok(&self.0[..widths.shelf])
    }

    /// Price segment interpreted as a cent count.
    pub fn price_cents(&self, widths: SegmentWidths) -> Result<u64> {
        widths.validate()?;
        Ok(digit_values(&self.0[widths.shelf..DATA_LEN]).fold(0u64, |acc, d| acc * 10 + d as u64))
    }
}

impl fmt::Display for Ean13 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ean13 {
    type Err = ReolkodeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Ean13 {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Compose the 12-digit payload from a shelf identifier and a price.
///
/// Non-digit characters in `shelf` are dropped; an empty result counts as
/// shelf `0`. The price is rounded to whole cents half away from zero and
/// its sign is discarded.
pub fn compose_data12(shelf: &str, price: Price, widths: SegmentWidths) -> Result<Data12> {
    widths.validate()?;

    let mut shelf_digits: String = shelf.chars().filter(|c| c.is_ascii_digit()).collect();
    if shelf_digits.is_empty() {
        shelf_digits.push('0');
    }
    if shelf_digits.len() > widths.shelf {
        return Err(ReolkodeError::invalid(format!(
            "shelf number '{}' has {} digits, only {} fit",
            shelf,
            shelf_digits.len(),
            widths.shelf
        )));
    }

    let cents = price.abs_cents().to_string();
    if cents.len() > widths.price {
        return Err(ReolkodeError::invalid(format!(
            "price {} is {} cents, more than {} digits",
            price, cents, widths.price
        )));
    }

    Ok(Data12(format!(
        "{:0>sw$}{:0>pw$}",
        shelf_digits,
        cents,
        sw = widths.shelf,
        pw = widths.price
    )))
}

/// Checksum digit for an externally supplied 12-digit string.
pub fn compute_check_digit(data12: &str) -> Result<u8> {
    Ok(Data12::parse(data12)?.check_digit())
}

/// Compose the payload and append its check digit.
pub fn build(shelf: &str, price: Price, widths: SegmentWidths) -> Result<Ean13> {
    let code = compose_data12(shelf, price, widths)?.into_ean13();
    debug!(shelf, %price, code = %code, "built EAN-13");
    Ok(code)
}

/// Check length, digits and checksum of a 13-digit code.
///
/// All failures are reported as [`ReolkodeError::InvalidArgument`].
pub fn validate_ean13(code: &str) -> Result<()> {
    Ean13::parse(code).map(|_| ())
}
