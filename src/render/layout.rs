//! Label geometry and text.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Reol: 123  Pris 4,56 kr.                 │  header (pad + line + pad)
//! │   ▌▌ ▌ ▌▌▌ ▌ ▌▌ ▌▌▌ ▌ ▌ ▌▌ ▌▌▌ ▌ ▌▌▌     │  bars: (10 + 95 + 10) × scale wide
//! │   ▌▌ ▌ ▌▌▌ ▌ ▌▌ ▌▌▌ ▌ ▌ ▌▌ ▌▌▌ ▌ ▌▌▌     │
//! │              0001230004561               │  optional digit line
//! └──────────────────────────────────────────┘
//! ```

use super::font::{FontSet, TextRender};
use crate::ean::{Ean13, SegmentWidths};
use crate::ean::modules::PATTERN_MODULES;
use crate::error::{ReolkodeError, Result};

/// Blank modules left and right of the pattern.
pub const QUIET_ZONE_MODULES: usize = 10;

/// Quiet zones plus pattern.
pub const TOTAL_MODULES: usize = QUIET_ZONE_MODULES + PATTERN_MODULES + QUIET_ZONE_MODULES;

const HEADER_PAD_TOP: u32 = 4;
const HEADER_PAD_BOTTOM: u32 = 4;
const DIGITS_GAP: u32 = 2;
const DIGITS_PAD_BOTTOM: u32 = 4;

pub fn header_pixel_height(scale: u32) -> f32 {
    12.0 + 2.0 * scale as f32
}

pub fn digits_pixel_height(scale: u32) -> f32 {
    10.0 + 2.0 * scale as f32
}

fn too_large() -> ReolkodeError {
    ReolkodeError::invalid("label dimensions overflow")
}

/// `a * b`, or an error when it does not fit in a `u32`.
fn mul(a: u32, b: u32) -> Result<u32> {
    a.checked_mul(b).ok_or_else(too_large)
}

/// Sum of all terms, or an error when it does not fit in a `u32`.
fn sum(terms: &[u32]) -> Result<u32> {
    terms
        .iter()
        .try_fold(0u32, |acc, &t| acc.checked_add(t))
        .ok_or_else(too_large)
}

/// Shelf number without padding zeros; `"0"` when it is all zeros.
pub fn shelf_display(shelf_digits: &str) -> &str {
    let trimmed = shelf_digits.trim_start_matches('0');
    if trimmed.is_empty() { "0" } else { trimmed }
}

/// Cents as kroner with a decimal comma: 1250 -> "12,50".
pub fn price_display(cents: u64) -> String {
    format!("{},{:02}", cents / 100, cents % 100)
}

/// The two header runs: regular shelf part, bold price part.
pub fn header_runs(code: &Ean13, widths: SegmentWidths) -> Result<(String, String)> {
    let shelf = shelf_display(code.shelf_digits(widths)?);
    let price = price_display(code.price_cents(widths)?);
    Ok((format!("Reol: {}  ", shelf), format!("Pris {} kr.", price)))
}

/// Runs of differently styled text sharing one baseline.
pub struct TextLine {
    pub width: u32,
    pub height: u32,
    /// (render, x offset, y offset) per run
    pub runs: Vec<(TextRender, u32, u32)>,
}

impl TextLine {
    pub fn from_runs(runs: Vec<TextRender>) -> Self {
        let ascent = runs.iter().map(|r| r.ascent).max().unwrap_or(0);
        let descent = runs.iter().map(|r| r.descent()).max().unwrap_or(0);

        let mut x = 0usize;
        let mut placed = Vec::with_capacity(runs.len());
        for run in runs {
            let width = run.width;
            let y = ascent - run.ascent;
            placed.push((run, x as u32, y as u32));
            x += width;
        }

        Self {
            width: x as u32,
            height: (ascent + descent) as u32,
            runs: placed,
        }
    }
}

/// Pixel positions of everything on one label.
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub module_width: u32,
    /// Left edge of the first pattern module (after the quiet zone).
    pub pattern_x: u32,
    pub bars_y: u32,
    pub bar_height: u32,
    pub header: TextLine,
    pub header_x: u32,
    pub header_y: u32,
    /// Digit line with its top-left corner.
    pub digits: Option<(TextLine, u32, u32)>,
}

impl Layout {
    pub fn compute(
        code: &Ean13,
        widths: SegmentWidths,
        scale: u32,
        bar_height: u32,
        include_numbers: bool,
        fonts: &FontSet,
    ) -> Result<Self> {
        if !(super::MIN_SCALE..=super::MAX_SCALE).contains(&scale) {
            return Err(ReolkodeError::invalid(format!(
                "scale must be between {} and {}, got {}",
                super::MIN_SCALE,
                super::MAX_SCALE,
                scale
            )));
        }

        let (shelf_text, price_text) = header_runs(code, widths)?;
        let header_px = header_pixel_height(scale);
        let header = TextLine::from_runs(vec![
            fonts.regular().face.render(&shelf_text, header_px)?,
            fonts.bold().face.render(&price_text, header_px)?,
        ]);

        let digits = if include_numbers {
            let line = fonts.regular().face.render(code.as_str(), digits_pixel_height(scale))?;
            Some(TextLine::from_runs(vec![line]))
        } else {
            None
        };

        let quiet = mul(QUIET_ZONE_MODULES as u32, scale)?;
        let bars_width = mul(TOTAL_MODULES as u32, scale)?;
        let text_width = header
            .width
            .max(digits.as_ref().map_or(0, |d| d.width));
        let width = bars_width.max(sum(&[text_width, quiet, quiet])?);

        let bars_x = (width - bars_width) / 2;
        let bars_y = sum(&[HEADER_PAD_TOP, header.height, HEADER_PAD_BOTTOM])?;
        let mut height = sum(&[bars_y, bar_height])?;

        let digits = match digits {
            Some(line) => {
                let x = (width - line.width) / 2;
                let y = sum(&[height, DIGITS_GAP])?;
                height = sum(&[y, line.height, DIGITS_PAD_BOTTOM])?;
                Some((line, x, y))
            }
            None => None,
        };

        Ok(Self {
            width,
            height,
            module_width: scale,
            pattern_x: sum(&[bars_x, quiet])?,
            bars_y,
            bar_height,
            header,
            header_x: quiet,
            header_y: HEADER_PAD_TOP,
            digits,
        })
    }
}
