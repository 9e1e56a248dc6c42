//! # Label Tests
//!
//! End-to-end checks of the encode → render pipeline.
//!
//! Rendered PNGs are decoded again and the bar row is sampled module by
//! module, so the picture is verified against the 95-module pattern rather
//! than against stored golden images. Renders use the built-in bitmap face
//! or the DejaVu Sans copy in `tests/fonts/`, so results do not depend on
//! installed fonts.

use ab_glyph::FontArc;
use barcoders::sym::ean13::EAN13;
use image::GrayImage;
use pretty_assertions::assert_eq;

use reolkode::ean::{self, Ean13, Price, SegmentWidths, encode_modules};
use reolkode::render::layout::{Layout, QUIET_ZONE_MODULES};
use reolkode::render::{
    BarcodeRenderer, FontSet, FontSource, PhysicalSize, RenderOptions, Resolution, Weight,
};
use reolkode::{LabelProfile, ReolkodeError};

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

const DEJAVU_SANS: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");

/// Installs DejaVu Sans (regular only) under the name "DejaVu Sans".
struct BundledFonts;

impl FontSource for BundledFonts {
    fn load(&self, family: &str, weight: Weight) -> reolkode::Result<Option<FontArc>> {
        if family == "DejaVu Sans" && weight == Weight::Regular {
            Ok(Some(FontArc::try_from_slice(DEJAVU_SANS).unwrap()))
        } else {
            Ok(None)
        }
    }
}

fn outline_renderer() -> BarcodeRenderer {
    let families = vec!["Arial".to_string(), "DejaVu Sans".to_string()];
    BarcodeRenderer::new(FontSet::resolve(&BundledFonts, &families))
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn price(s: &str) -> Price {
    s.parse().unwrap()
}

fn renderer() -> BarcodeRenderer {
    BarcodeRenderer::new(FontSet::builtin())
}

fn decode(png: &[u8]) -> GrayImage {
    image::load_from_memory(png).unwrap().to_luma8()
}

fn is_black(img: &GrayImage, x: u32, y: u32) -> bool {
    img.get_pixel(x, y).0[0] == 0
}

/// Sample the middle of every module on the middle bar row and compare
/// with the pattern. Also checks that both quiet zones stay white.
fn assert_bars_match(code: &str, options: &RenderOptions) {
    assert_bars_match_with(&renderer(), code, options);
}

fn assert_bars_match_with(renderer: &BarcodeRenderer, code: &str, options: &RenderOptions) {
    let png = renderer.render_png(code, options).unwrap();
    let img = decode(&png);

    let ean = Ean13::parse(code).unwrap();
    let layout = Layout::compute(
        &ean,
        options.widths,
        options.scale,
        options.bar_height,
        options.include_numbers,
        renderer.fonts(),
    )
    .unwrap();
    assert_eq!((img.width(), img.height()), (layout.width, layout.height));

    let row = layout.bars_y + options.bar_height / 2;
    let pattern = encode_modules(&ean);
    for (i, &dark) in pattern.modules().iter().enumerate() {
        for offset in 0..options.scale {
            let x = layout.pattern_x + i as u32 * options.scale + offset;
            assert_eq!(is_black(&img, x, row), dark, "module {} of {} (pixel {})", i, code, x);
        }
    }

    let quiet = QUIET_ZONE_MODULES as u32 * options.scale;
    for dx in 0..quiet {
        assert!(!is_black(&img, layout.pattern_x - quiet + dx, row), "left quiet zone");
        assert!(!is_black(&img, layout.pattern_x + 95 * options.scale + dx, row), "right quiet zone");
    }
}

// ============================================================================
// ENCODING
// ============================================================================

#[test]
fn test_worked_example_checksum() {
    assert_eq!(ean::compute_check_digit("590123412345").unwrap(), 7);
    assert!(ean::validate_ean13("5901234123457").is_ok());
}

#[test]
fn test_composition_scenario() {
    let data = ean::compose_data12("A12-3", price("4.56"), SegmentWidths::default()).unwrap();
    assert_eq!(data.as_str(), "000123000456");
}

#[test]
fn test_build_scenario() {
    let widths = SegmentWidths::default();
    let data = ean::compose_data12("123", price("4.56"), widths).unwrap();
    let code = ean::build("123", price("4.56"), widths).unwrap();
    assert_eq!(code.as_str().len(), 13);
    assert_eq!(code.as_str(), format!("{}{}", data, ean::compute_check_digit(data.as_str()).unwrap()));
}

#[test]
fn test_widths_five_and_five_fail() {
    let err = ean::compose_data12("1", price("1"), SegmentWidths { shelf: 5, price: 5 }).unwrap_err();
    assert!(matches!(err, ReolkodeError::InvalidArgument(_)));
}

#[test]
fn test_pattern_matches_barcoders() {
    for data in ["590123412345", "000123000456", "123456789012", "999999999999", "400638133393"] {
        let ours = encode_modules(&ean::Data12::parse(data).unwrap().into_ean13());
        let theirs = EAN13::new(data).unwrap().encode();
        let ours: Vec<u8> = ours.modules().iter().map(|&m| m as u8).collect();
        assert_eq!(ours, theirs, "pattern for {}", data);
    }
}

// ============================================================================
// RENDERING
// ============================================================================

#[test]
fn test_render_scenario_png() {
    let code = ean::build("123", price("4.56"), SegmentWidths::default()).unwrap();
    let png = renderer()
        .render_png(code.as_str(), &RenderOptions::new(2, 40, true))
        .unwrap();
    assert_eq!(png[..8], PNG_SIGNATURE);
    assert!(png.len() > 100);
}

#[test]
fn test_bars_scale_1() {
    assert_bars_match("5901234123457", &RenderOptions::new(1, 10, false));
}

#[test]
fn test_bars_scale_3_with_numbers() {
    assert_bars_match("0001230004561", &RenderOptions::new(3, 50, true));
}

#[test]
fn test_bars_every_leading_digit() {
    // one code per parity table entry
    for lead in 0..10u8 {
        let data = format!("{}12345678901", lead);
        let code = ean::Data12::parse(&data).unwrap().into_ean13();
        assert_bars_match(code.as_str(), &RenderOptions::new(2, 20, false));
    }
}

#[test]
fn test_background_white_and_ink_black() {
    let png = renderer()
        .render_png("5901234123457", &RenderOptions::default())
        .unwrap();
    let img = decode(&png);
    assert!(img.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    assert!(!is_black(&img, 0, 0));
    assert!(!is_black(&img, img.width() - 1, img.height() - 1));
}

#[test]
fn test_digit_line_adds_height() {
    let with = decode(&renderer().render_png("5901234123457", &RenderOptions::new(2, 40, true)).unwrap());
    let without = decode(&renderer().render_png("5901234123457", &RenderOptions::new(2, 40, false)).unwrap());
    assert_eq!(with.width(), without.width());
    assert!(with.height() > without.height());
}

#[test]
fn test_header_has_ink() {
    let options = RenderOptions::new(2, 40, false);
    let img = decode(&renderer().render_png("0001230004561", &options).unwrap());
    let ean = Ean13::parse("0001230004561").unwrap();
    let layout = Layout::compute(&ean, options.widths, 2, 40, false, renderer().fonts()).unwrap();
    let ink = (0..layout.bars_y)
        .flat_map(|y| (0..img.width()).map(move |x| (x, y)))
        .filter(|&(x, y)| is_black(&img, x, y))
        .count();
    assert!(ink > 0, "header text should be drawn");
}

#[test]
fn test_outline_font_label() {
    let r = outline_renderer();
    assert_eq!(r.fonts().regular().resolution, Resolution::Fallback("DejaVu Sans".to_string()));
    assert_eq!(r.fonts().bold().resolution, r.fonts().regular().resolution);

    let options = RenderOptions::new(2, 40, true);
    assert_bars_match_with(&r, "0001230004561", &options);

    let img = decode(&r.render_png("0001230004561", &options).unwrap());
    assert!(img.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    let ean = Ean13::parse("0001230004561").unwrap();
    let layout = Layout::compute(&ean, options.widths, 2, 40, true, r.fonts()).unwrap();
    let header_ink = (0..layout.bars_y)
        .flat_map(|y| (0..img.width()).map(move |x| (x, y)))
        .filter(|&(x, y)| is_black(&img, x, y))
        .count();
    assert!(header_ink > 0, "outline header text should be drawn");

    // differs from the bitmap rendering of the same label
    let bitmap = renderer().render_png("0001230004561", &options).unwrap();
    assert_ne!(r.render_png("0001230004561", &options).unwrap(), bitmap);
}

#[test]
fn test_oversized_requests_fail_cleanly() {
    let r = renderer();
    let err = r
        .render_png("5901234123457", &RenderOptions::new(u32::MAX, 40, true))
        .unwrap_err();
    assert!(err.is_invalid_argument());

    let err = r
        .render_png_physical("5901234123457", &PhysicalSize::new(1e12, 30.0, 203, false))
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_physical_render_reads_header_with_custom_widths() {
    let widths = SegmentWidths::new(4, 8).unwrap();
    let code = ean::build("17", price("1234.5"), widths).unwrap();
    let size = PhysicalSize::new(58.0, 30.0, 203, false).with_widths(widths);
    let options = size.to_options().unwrap();
    assert_eq!(options.widths, widths);

    let physical = renderer().render_png_physical(code.as_str(), &size).unwrap();
    let pixel = renderer().render_png(code.as_str(), &options).unwrap();
    assert_eq!(physical, pixel);

    // default split reads a different header, so the image differs
    let default_split = renderer()
        .render_png_physical(code.as_str(), &PhysicalSize::new(58.0, 30.0, 203, false))
        .unwrap();
    assert_ne!(physical, default_split);
}

#[test]
fn test_tampered_code_rejected_by_validate_and_render() {
    let valid = "5901234123457";
    for d in (0..=9u8).filter(|&d| d != 7) {
        let tampered = format!("{}{}", &valid[..12], d);
        assert!(ean::validate_ean13(&tampered).is_err());
        let err = renderer()
            .render_png(&tampered, &RenderOptions::default())
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }
}

#[test]
fn test_physical_render_uses_derived_scale() {
    let size = PhysicalSize::new(58.0, 30.0, 203, false);
    let png = renderer().render_png_physical("5901234123457", &size).unwrap();
    let img = decode(&png);
    // scale 4: 115 modules * 4 px
    assert_eq!(img.width(), 460);
    assert_bars_match("5901234123457", &RenderOptions::new(4, 156, false));
}

#[test]
fn test_profile_drives_render() {
    let profile = LabelProfile::from_json_str(
        r#"{ "widths": { "shelf": 4, "price": 8 }, "sizing": { "type": "pixel", "scale": 2, "bar_height": 30 } }"#,
    )
    .unwrap();
    let code = ean::build("17", price("1234.5"), profile.widths).unwrap();
    assert_eq!(code.data12().as_str(), "001700123450");
    let options = profile.render_options().unwrap();
    assert_bars_match(code.as_str(), &options);
}

#[test]
fn test_concurrent_renders_are_identical() {
    let r = renderer();
    let codes = vec!["5901234123457"; 8];
    let results = r.render_batch(&codes, &RenderOptions::default());
    let first = results[0].as_ref().unwrap();
    assert!(results.iter().all(|res| res.as_ref().unwrap() == first));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let r = r.clone();
            std::thread::spawn(move || r.render_png("5901234123457", &RenderOptions::default()).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(&handle.join().unwrap(), first);
    }
}
