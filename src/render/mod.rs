//! # Barcode Renderer
//!
//! Renders a validated EAN-13 code to a PNG shelf label.
//!
//! ## Pipeline
//!
//! ```text
//! "0001230004561" → Ean13::parse → encode_modules → Layout → Canvas → PNG bytes
//!                                        │             │
//!                                   95 modules    header text, bars,
//!                                                 digit line
//! ```
//!
//! Two sizing strategies are offered:
//!
//! - **Pixel-exact**: [`RenderOptions`] with a module `scale` and `bar_height`.
//! - **Physical**: [`PhysicalSize`] in millimetres at a given DPI, converted
//!   to a scale and bar height for the pixel-exact path.
//!
//! Every precondition is checked before a canvas is allocated, so a call
//! either returns a complete image or an error.
//!
//! ## Example
//!
//! ```
//! use reolkode::render::{BarcodeRenderer, FontSet, RenderOptions};
//!
//! let renderer = BarcodeRenderer::new(FontSet::builtin());
//! let png = renderer.render_png("5901234123457", &RenderOptions::default())?;
//! assert_eq!(&png[1..4], b"PNG");
//! # Ok::<(), reolkode::ReolkodeError>(())
//! ```

pub mod canvas;
pub mod font;
pub mod layout;

pub use font::{FontSet, FontSource, NoFonts, Resolution, SystemFonts, Weight};
pub use layout::{QUIET_ZONE_MODULES, TOTAL_MODULES};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::ean::{Ean13, SegmentWidths, encode_modules};
use crate::error::{ReolkodeError, Result};
use canvas::Canvas;
use layout::Layout;

pub const MIN_SCALE: u32 = 1;
pub const MIN_BAR_HEIGHT: u32 = 10;
/// Largest pixels-per-module accepted. A 64x label is already 7360 px wide.
pub const MAX_SCALE: u32 = 64;
pub const MAX_BAR_HEIGHT: u32 = 10_000;
pub const MIN_DPI: u32 = 72;

/// Bar height derived from a physical height never drops below this.
pub const MIN_PHYSICAL_BAR_HEIGHT: u32 = 30;

/// Share of the physical label height given to the bars.
pub const BAR_HEIGHT_RATIO: f64 = 0.65;

const MM_PER_INCH: f64 = 25.4;

/// Pixel-exact rendering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Pixels per module.
    pub scale: u32,
    /// Bar height in pixels.
    pub bar_height: u32,
    /// Print the 13 digits under the bars.
    pub include_numbers: bool,
    /// Split used to read shelf and price back out of the code for the header.
    pub widths: SegmentWidths,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 2,
            bar_height: 60,
            include_numbers: true,
            widths: SegmentWidths::default(),
        }
    }
}

impl RenderOptions {
    pub fn new(scale: u32, bar_height: u32, include_numbers: bool) -> Self {
        Self {
            scale,
            bar_height,
            include_numbers,
            widths: SegmentWidths::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.scale) {
            return Err(ReolkodeError::invalid(format!(
                "scale must be between {} and {}, got {}",
                MIN_SCALE, MAX_SCALE, self.scale
            )));
        }
        if !(MIN_BAR_HEIGHT..=MAX_BAR_HEIGHT).contains(&self.bar_height) {
            return Err(ReolkodeError::invalid(format!(
                "bar height must be between {} and {}, got {}",
                MIN_BAR_HEIGHT, MAX_BAR_HEIGHT, self.bar_height
            )));
        }
        self.widths.validate()
    }
}

/// Label size in millimetres at a printer resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSize {
    pub width_mm: f64,
    pub height_mm: f64,
    pub dpi: u32,
    pub include_numbers: bool,
    /// Split used to read shelf and price back out of the code for the header.
    #[serde(default)]
    pub widths: SegmentWidths,
}

impl PhysicalSize {
    pub fn new(width_mm: f64, height_mm: f64, dpi: u32, include_numbers: bool) -> Self {
        Self {
            width_mm,
            height_mm,
            dpi,
            include_numbers,
            widths: SegmentWidths::default(),
        }
    }

    pub fn with_widths(mut self, widths: SegmentWidths) -> Self {
        self.widths = widths;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.width_mm) || !positive(self.height_mm) {
            return Err(ReolkodeError::invalid(format!(
                "label size must be positive, got {} x {} mm",
                self.width_mm, self.height_mm
            )));
        }
        if self.dpi < MIN_DPI {
            return Err(ReolkodeError::invalid(format!(
                "dpi must be >= {}, got {}",
                MIN_DPI, self.dpi
            )));
        }
        Ok(())
    }

    fn mm_to_px(&self, mm: f64) -> f64 {
        mm / MM_PER_INCH * self.dpi as f64
    }

    /// Largest whole module scale that fits the width, and 65% of the
    /// height for the bars.
    ///
    /// Labels too large for [`MAX_SCALE`] or [`MAX_BAR_HEIGHT`] are rejected.
    pub fn to_options(&self) -> Result<RenderOptions> {
        self.validate()?;

        let scale = (self.mm_to_px(self.width_mm) / TOTAL_MODULES as f64)
            .floor()
            .max(MIN_SCALE as f64);
        if scale > MAX_SCALE as f64 {
            return Err(ReolkodeError::invalid(format!(
                "{} mm at {} dpi needs scale {}, more than {}",
                self.width_mm, self.dpi, scale, MAX_SCALE
            )));
        }

        let bar_height = (self.mm_to_px(self.height_mm) * BAR_HEIGHT_RATIO)
            .round()
            .max(MIN_PHYSICAL_BAR_HEIGHT as f64);
        if bar_height > MAX_BAR_HEIGHT as f64 {
            return Err(ReolkodeError::invalid(format!(
                "{} mm at {} dpi needs {} px bars, more than {}",
                self.height_mm, self.dpi, bar_height, MAX_BAR_HEIGHT
            )));
        }

        let options = RenderOptions {
            scale: scale as u32,
            bar_height: bar_height as u32,
            include_numbers: self.include_numbers,
            widths: self.widths,
        };
        options.validate()?;
        Ok(options)
    }
}

/// Cooperative cancellation for [`BarcodeRenderer::render_png_async`].
///
/// Only observed before a render starts; a started render always finishes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Stateless EAN-13 label renderer.
///
/// Holds only the resolved fonts, which are shared read-only; one renderer
/// can be used from many threads at once.
#[derive(Debug, Clone)]
pub struct BarcodeRenderer {
    fonts: Arc<FontSet>,
}

impl Default for BarcodeRenderer {
    /// Renderer using installed system fonts.
    fn default() -> Self {
        Self {
            fonts: FontSet::system(),
        }
    }
}

impl BarcodeRenderer {
    pub fn new(fonts: FontSet) -> Self {
        Self {
            fonts: Arc::new(fonts),
        }
    }

    pub fn with_shared_fonts(fonts: Arc<FontSet>) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    /// Render with pixel-exact sizing.
    pub fn render_png(&self, code: &str, options: &RenderOptions) -> Result<Vec<u8>> {
        let code = Ean13::parse(code)?;
        options.validate()?;
        self.render_validated(&code, options)
    }

    /// Render sized for a physical label.
    pub fn render_png_physical(&self, code: &str, size: &PhysicalSize) -> Result<Vec<u8>> {
        let options = size.to_options()?;
        let code = Ean13::parse(code)?;
        debug!(
            width_mm = size.width_mm,
            height_mm = size.height_mm,
            dpi = size.dpi,
            scale = options.scale,
            bar_height = options.bar_height,
            "derived pixel sizing"
        );
        self.render_validated(&code, &options)
    }

    /// Render on tokio's blocking pool.
    ///
    /// Arguments are validated before anything is spawned. If `cancel` is set
    /// before the render begins, the result is [`ReolkodeError::Cancelled`].
    pub async fn render_png_async(
        &self,
        code: &str,
        options: RenderOptions,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>> {
        let code = Ean13::parse(code)?;
        options.validate()?;
        if cancel.is_cancelled() {
            return Err(ReolkodeError::Cancelled);
        }

        let renderer = self.clone();
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || {
            if cancel.is_cancelled() {
                return Err(ReolkodeError::Cancelled);
            }
            renderer.render_validated(&code, &options)
        })
        .await
        .map_err(|e| ReolkodeError::Image(format!("render task failed: {}", e)))?
    }

    /// Render many codes in parallel. Results come back in input order.
    pub fn render_batch<S>(&self, codes: &[S], options: &RenderOptions) -> Vec<Result<Vec<u8>>>
    where
        S: AsRef<str> + Sync,
    {
        codes
            .par_iter()
            .map(|code| self.render_png(code.as_ref(), options))
            .collect()
    }

    fn render_validated(&self, code: &Ean13, options: &RenderOptions) -> Result<Vec<u8>> {
        let pattern = encode_modules(code);
        let layout = Layout::compute(
            code,
            options.widths,
            options.scale,
            options.bar_height,
            options.include_numbers,
            &self.fonts,
        )?;

        let mut canvas = Canvas::new(layout.width, layout.height);

        for (run, dx, dy) in &layout.header.runs {
            canvas.draw_text(run, layout.header_x + dx, layout.header_y + dy);
        }

        for (start, width) in pattern.bar_runs() {
            canvas.fill_rect(
                layout.pattern_x + start as u32 * layout.module_width,
                layout.bars_y,
                width as u32 * layout.module_width,
                layout.bar_height,
            );
        }

        if let Some((line, x, y)) = &layout.digits {
            for (run, dx, dy) in &line.runs {
                canvas.draw_text(run, x + dx, y + dy);
            }
        }

        let png = canvas.to_png()?;
        debug!(
            code = %code,
            width = layout.width,
            height = layout.height,
            bytes = png.len(),
            "rendered label"
        );
        Ok(png)
    }
}

/// Render with system fonts and pixel-exact sizing.
pub fn render_png(code: &str, scale: u32, bar_height: u32, include_numbers: bool) -> Result<Vec<u8>> {
    BarcodeRenderer::default().render_png(code, &RenderOptions::new(scale, bar_height, include_numbers))
}

/// Render with system fonts, sized for a physical label.
pub fn render_png_physical(
    code: &str,
    width_mm: f64,
    height_mm: f64,
    dpi: u32,
    include_numbers: bool,
) -> Result<Vec<u8>> {
    BarcodeRenderer::default().render_png_physical(code, &PhysicalSize::new(width_mm, height_mm, dpi, include_numbers))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn renderer() -> BarcodeRenderer {
        BarcodeRenderer::new(FontSet::builtin())
    }

    #[test]
    fn test_render_produces_png() {
        let png = renderer()
            .render_png("0001230004561", &RenderOptions::new(2, 40, true))
            .unwrap();
        assert_eq!(png[..8], PNG_SIGNATURE);
        assert!(png.len() > 100);
    }

    #[test]
    fn test_render_rejects_bad_parameters() {
        let r = renderer();
        let code = "5901234123457";
        assert!(r.render_png(code, &RenderOptions::new(0, 40, true)).unwrap_err().is_invalid_argument());
        assert!(r.render_png(code, &RenderOptions::new(1, 9, true)).unwrap_err().is_invalid_argument());
        assert!(r.render_png(code, &RenderOptions::new(1, 10, false)).is_ok());
    }

    #[test]
    fn test_render_rejects_oversized_parameters() {
        let r = renderer();
        let code = "5901234123457";
        for options in [
            RenderOptions::new(MAX_SCALE + 1, 40, true),
            RenderOptions::new(u32::MAX, 40, true),
            RenderOptions::new(2, MAX_BAR_HEIGHT + 1, true),
            RenderOptions::new(2, u32::MAX, false),
        ] {
            let err = r.render_png(code, &options).unwrap_err();
            assert!(err.is_invalid_argument(), "{:?}", options);
        }
        assert!(r.render_png(code, &RenderOptions::new(MAX_SCALE, 10, true)).is_ok());
    }

    #[test]
    fn test_physical_rejects_oversized_labels() {
        for size in [
            PhysicalSize::new(1e12, 30.0, 203, false),
            PhysicalSize::new(58.0, 1e12, 203, false),
            PhysicalSize::new(f64::MAX, f64::MAX, 203, true),
            PhysicalSize::new(58.0, 30.0, u32::MAX, true),
        ] {
            let err = renderer().render_png_physical("5901234123457", &size).unwrap_err();
            assert!(err.is_invalid_argument(), "{:?}", size);
        }
    }

    #[test]
    fn test_render_rejects_tampered_code() {
        let err = renderer()
            .render_png("5901234123458", &RenderOptions::default())
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_physical_sizing() {
        // 58mm at 203 dpi = 463.5px -> 4 px/module; 30mm -> 239.8px * 0.65 = 156
        let options = PhysicalSize::new(58.0, 30.0, 203, true)
            .to_options()
            .unwrap();
        assert_eq!(options.scale, 4);
        assert_eq!(options.bar_height, 156);
        assert_eq!(options.widths, SegmentWidths::default());
    }

    #[test]
    fn test_physical_sizing_keeps_widths() {
        let widths = SegmentWidths::new(4, 8).unwrap();
        let options = PhysicalSize::new(58.0, 30.0, 203, true)
            .with_widths(widths)
            .to_options()
            .unwrap();
        assert_eq!(options.widths, widths);
    }

    #[test]
    fn test_physical_sizing_clamps() {
        let options = PhysicalSize::new(10.0, 5.0, 72, false)
            .to_options()
            .unwrap();
        assert_eq!(options.scale, 1);
        assert_eq!(options.bar_height, 30);
        assert!(!options.include_numbers);
    }

    #[test]
    fn test_physical_rejects_bad_parameters() {
        for size in [
            PhysicalSize::new(0.0, 30.0, 203, true),
            PhysicalSize::new(58.0, -1.0, 203, true),
            PhysicalSize::new(f64::NAN, 30.0, 203, true),
            PhysicalSize::new(58.0, 30.0, 71, true),
        ] {
            let err = renderer().render_png_physical("5901234123457", &size).unwrap_err();
            assert!(err.is_invalid_argument(), "{:?}", size);
        }
    }

    #[test]
    fn test_batch_keeps_order() {
        let codes = ["5901234123457", "5901234123458", "0001230004561"];
        let results = renderer().render_batch(&codes, &RenderOptions::default());
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].as_ref().unwrap_err().is_invalid_argument());
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_async_render_matches_sync() {
        let r = renderer();
        let options = RenderOptions::default();
        let sync = r.render_png("5901234123457", &options).unwrap();
        let async_png = r
            .render_png_async("5901234123457", options, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(sync, async_png);
    }

    #[tokio::test]
    async fn test_async_render_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let err = renderer()
            .render_png_async("5901234123457", RenderOptions::default(), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, ReolkodeError::Cancelled));
    }

    #[tokio::test]
    async fn test_async_render_validates_first() {
        let token = CancelToken::new();
        token.cancel();
        // invalid input wins over cancellation
        let err = renderer()
            .render_png_async("123", RenderOptions::default(), &token)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
