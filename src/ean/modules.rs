//! # EAN-13 Module Patterns
//!
//! Expands a validated code into its 95-module bar sequence.
//!
//! ```text
//! 101 │ 6 × 7 modules (L/G) │ 01010 │ 6 × 7 modules (R) │ 101
//!  3  │         42          │   5   │        42         │  3   = 95
//! ```
//!
//! The first digit is not drawn; it selects which of the next six digits
//! use the G set instead of the L set.

use std::fmt;

use super::Ean13;

/// Modules in a complete pattern (without quiet zones).
pub const PATTERN_MODULES: usize = 95;

/// Modules per encoded digit.
pub const DIGIT_MODULES: usize = 7;

const START_GUARD: [bool; 3] = [true, false, true];
const MIDDLE_GUARD: [bool; 5] = [false, true, false, true, false];
const END_GUARD: [bool; 3] = [true, false, true];

/// L set (odd parity), MSB = leftmost module.
const L_CODES: [u8; 10] = [
    0b0001101, // 0
    0b0011001, // 1
    0b0010011, // 2
    0b0111101, // 3
    0b0100011, // 4
    0b0110001, // 5
    0b0101111, // 6
    0b0111011, // 7
    0b0110111, // 8
    0b0001011, // 9
];

/// G set (even parity).
const G_CODES: [u8; 10] = [
    0b0100111, // 0
    0b0110011, // 1
    0b0011011, // 2
    0b0100001, // 3
    0b0011101, // 4
    0b0111001, // 5
    0b0000101, // 6
    0b0010001, // 7
    0b0001001, // 8
    0b0010111, // 9
];

/// R set, the bitwise complement of L.
const R_CODES: [u8; 10] = [
    0b1110010, // 0
    0b1100110, // 1
    0b1101100, // 2
    0b1000010, // 3
    0b1011100, // 4
    0b1001110, // 5
    0b1010000, // 6
    0b1000100, // 7
    0b1001000, // 8
    0b1110100, // 9
];

/// Left-half parity by leading digit.
const PARITY: [&str; 10] = [
    "LLLLLL", // 0
    "LLGLGG", // 1
    "LLGGLG", // 2
    "LLGGGL", // 3
    "LGLLGG", // 4
    "LGGLLG", // 5
    "LGGGLL", // 6
    "LGLGLG", // 7
    "LGLGGL", // 8
    "LGGLGL", // 9
];

/// The 95-module bar sequence of one code. `true` = dark module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModulePattern {
    modules: Vec<bool>,
}

impl ModulePattern {
    pub fn modules(&self) -> &[bool] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Contiguous dark runs as `(first_module, width)` pairs, left to right.
    pub fn bar_runs(&self) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut start = None;
        for (i, &dark) in self.modules.iter().enumerate() {
            match (dark, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    runs.push((s, i - s));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            runs.push((s, self.modules.len() - s));
        }
        runs
    }
}

impl fmt::Display for ModulePattern {
    /// `"1"`/`"0"` per module.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &dark in &self.modules {
            f.write_str(if dark { "1" } else { "0" })?;
        }
        Ok(())
    }
}

fn push_code(out: &mut Vec<bool>, code: u8) {
    for bit in (0..DIGIT_MODULES).rev() {
        out.push((code >> bit) & 1 == 1);
    }
}

/// Expand a code into its module pattern.
pub fn encode_modules(code: &Ean13) -> ModulePattern {
    let digits = code.digits();
    let parity = PARITY[digits[0] as usize].as_bytes();

    let mut modules = Vec::with_capacity(PATTERN_MODULES);
    modules.extend_from_slice(&START_GUARD);

    for (i, &d) in digits[1..7].iter().enumerate() {
        let table = if parity[i] == b'G' { &G_CODES } else { &L_CODES };
        push_code(&mut modules, table[d as usize]);
    }

    modules.extend_from_slice(&MIDDLE_GUARD);

    for &d in &digits[7..13] {
        push_code(&mut modules, R_CODES[d as usize]);
    }

    modules.extend_from_slice(&END_GUARD);

    debug_assert_eq!(modules.len(), PATTERN_MODULES);
    ModulePattern { modules }
}
