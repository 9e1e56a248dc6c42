//! Font resolution and text rasterization for label text.
//!
//! Fonts are looked up by family name through a [`FontSource`], trying an
//! ordered preference list. When nothing on the list can be loaded the
//! built-in Spleen 8x16 bitmap face is used, so rendering never fails for
//! lack of fonts.

use ab_glyph::{Font, FontArc, ScaleFont};
use spleen_font::{FONT_8X16, PSF2Font};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use crate::error::{ReolkodeError, Result};

/// Families tried in order when no preference list is configured.
pub const DEFAULT_FAMILIES: &[&str] = &[
    "Segoe UI",
    "Arial",
    "Helvetica",
    "Liberation Sans",
    "DejaVu Sans",
    "Noto Sans",
];

const BITMAP_WIDTH: usize = 8;
const BITMAP_HEIGHT: usize = 16;
/// Rows above the baseline in the Spleen 8x16 face.
const BITMAP_ASCENT: usize = 12;

/// Directory depth limit when scanning font folders.
const MAX_SCAN_DEPTH: usize = 6;

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weight {
    Regular,
    Bold,
}

/// Anything that can hand out an outline font for a family and weight.
pub trait FontSource: Send + Sync {
    /// `Ok(None)` when the family is not available. `Err` when it exists
    /// but cannot be used.
    fn load(&self, family: &str, weight: Weight) -> Result<Option<FontArc>>;
}

/// A source with no fonts at all. Always resolves to the bitmap face.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFonts;

impl FontSource for NoFonts {
    fn load(&self, _family: &str, _weight: Weight) -> Result<Option<FontArc>> {
        Ok(None)
    }
}

/// Fonts installed on this machine, found by file name.
#[derive(Debug, Clone, Default)]
pub struct SystemFonts {
    /// (normalized file stem, path)
    files: Vec<(String, PathBuf)>,
}

impl SystemFonts {
    /// Index the platform's usual font directories.
    pub fn discover() -> Self {
        Self::scan(&platform_font_dirs())
    }

    /// Index `.ttf`/`.otf` files and `.ttc` collections below the given
    /// directories. Collections are loaded as their first face.
    pub fn scan(dirs: &[PathBuf]) -> Self {
        let mut files = Vec::new();
        for dir in dirs {
            collect_font_files(dir, 0, &mut files);
        }
        debug!(count = files.len(), "indexed font files");
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FontSource for SystemFonts {
    fn load(&self, family: &str, weight: Weight) -> Result<Option<FontArc>> {
        let Some((_, path)) = self
            .files
            .iter()
            .find(|(stem, _)| stem_matches(stem, family, weight))
        else {
            return Ok(None);
        };
        let bytes = std::fs::read(path)?;
        FontArc::try_from_vec(bytes)
            .map(Some)
            .map_err(|e| ReolkodeError::Font(format!("{}: {}", path.display(), e)))
    }
}

fn platform_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let home = std::env::var_os("HOME").map(PathBuf::from);

    if cfg!(target_os = "windows") {
        let windir = std::env::var_os("WINDIR").map(PathBuf::from);
        dirs.push(windir.unwrap_or_else(|| PathBuf::from(r"C:\Windows")).join("Fonts"));
    } else if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/Library/Fonts"));
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        if let Some(home) = &home {
            dirs.push(home.join("Library/Fonts"));
        }
    } else {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Some(home) = &home {
            dirs.push(home.join(".fonts"));
            dirs.push(home.join(".local/share/fonts"));
        }
    }
    dirs
}

fn collect_font_files(dir: &Path, depth: usize, out: &mut Vec<(String, PathBuf)>) {
    if depth > MAX_SCAN_DEPTH {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_font_files(&path, depth + 1, out);
            continue;
        }
        let is_font = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| FONT_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)));
        if let (true, Some(stem)) = (is_font, path.file_stem().and_then(|s| s.to_str())) {
            out.push((normalize(stem), path));
        }
    }
}

/// Lowercase alphanumerics only: "DejaVu Sans" and "DejaVuSans-Bold" become
/// comparable.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Does a normalized file stem name this family at this weight?
///
/// Covers the common naming schemes: `DejaVuSans.ttf`,
/// `LiberationSans-Regular.ttf`, `arialbd.ttf`, `segoeuib.ttf`.
fn stem_matches(stem: &str, family: &str, weight: Weight) -> bool {
    let family = normalize(family);
    let Some(rest) = stem.strip_prefix(family.as_str()) else {
        return false;
    };
    match weight {
        Weight::Regular => matches!(rest, "" | "regular" | "book" | "roman"),
        Weight::Bold => matches!(rest, "bold" | "bd" | "b"),
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// How a face was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The first preferred family.
    Exact(String),
    /// A later family on the preference list.
    Fallback(String),
    /// Nothing on the list was usable; built-in bitmap face.
    PlatformDefault,
}

/// A face that can measure and rasterize text.
#[derive(Clone)]
pub enum Face {
    Outline(FontArc),
    Bitmap,
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Face::Outline(_) => f.write_str("Face::Outline"),
            Face::Bitmap => f.write_str("Face::Bitmap"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedFace {
    pub face: Face,
    pub resolution: Resolution,
}

impl ResolvedFace {
    fn platform_default() -> Self {
        Self {
            face: Face::Bitmap,
            resolution: Resolution::PlatformDefault,
        }
    }
}

/// Index and value of the first candidate `load` accepts.
fn first_available<T>(
    families: &[String],
    mut load: impl FnMut(&str) -> Option<T>,
) -> Option<(usize, T)> {
    families
        .iter()
        .enumerate()
        .find_map(|(i, family)| load(family).map(|value| (i, value)))
}

/// Try each family in order; fall back to the built-in face.
pub fn resolve_face(source: &dyn FontSource, families: &[String], weight: Weight) -> ResolvedFace {
    let found = first_available(families, |family| match source.load(family, weight) {
        Ok(font) => font,
        Err(e) => {
            warn!(family, ?weight, error = %e, "skipping unusable font");
            None
        }
    });

    match found {
        Some((index, font)) => {
            let name = families[index].clone();
            debug!(family = %name, ?weight, index, "resolved font");
            ResolvedFace {
                face: Face::Outline(font),
                resolution: if index == 0 {
                    Resolution::Exact(name)
                } else {
                    Resolution::Fallback(name)
                },
            }
        }
        None => {
            warn!(?weight, "no preferred font available, using built-in bitmap face");
            ResolvedFace::platform_default()
        }
    }
}

/// Regular and bold faces used for one label style.
#[derive(Debug, Clone)]
pub struct FontSet {
    regular: ResolvedFace,
    bold: ResolvedFace,
}

impl FontSet {
    /// Resolve both weights. A missing bold face reuses the regular one.
    pub fn resolve(source: &dyn FontSource, families: &[String]) -> Self {
        let regular = resolve_face(source, families, Weight::Regular);
        let mut bold = resolve_face(source, families, Weight::Bold);
        if bold.resolution == Resolution::PlatformDefault {
            bold = regular.clone();
        }
        Self { regular, bold }
    }

    /// Built-in bitmap face only. Output does not depend on installed fonts.
    pub fn builtin() -> Self {
        Self {
            regular: ResolvedFace::platform_default(),
            bold: ResolvedFace::platform_default(),
        }
    }

    /// System fonts with [`DEFAULT_FAMILIES`], resolved once per process.
    pub fn system() -> Arc<FontSet> {
        static SYSTEM: OnceLock<Arc<FontSet>> = OnceLock::new();
        SYSTEM
            .get_or_init(|| {
                let families: Vec<String> = DEFAULT_FAMILIES.iter().map(|s| s.to_string()).collect();
                Arc::new(FontSet::resolve(&SystemFonts::discover(), &families))
            })
            .clone()
    }

    pub fn regular(&self) -> &ResolvedFace {
        &self.regular
    }

    pub fn bold(&self) -> &ResolvedFace {
        &self.bold
    }
}

// ============================================================================
// RASTERIZATION
// ============================================================================

/// A rasterized run of text.
pub struct TextRender {
    pub width: usize,
    pub height: usize,
    /// Rows from the top edge to the baseline.
    pub ascent: usize,
    /// Coverage values: 0.0 = background, 1.0 = ink.
    pub data: Vec<f32>,
}

impl TextRender {
    pub fn descent(&self) -> usize {
        self.height - self.ascent
    }

    pub fn coverage(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }
}

impl Face {
    /// Rasterize `text` at roughly `pixel_height` pixels per line.
    pub fn render(&self, text: &str, pixel_height: f32) -> Result<TextRender> {
        match self {
            Face::Outline(font) => Ok(render_outline(font, text, pixel_height)),
            Face::Bitmap => render_bitmap(text, pixel_height),
        }
    }
}

fn render_outline(font: &FontArc, text: &str, pixel_height: f32) -> TextRender {
    let scaled = font.as_scaled(pixel_height);

    let mut glyphs = Vec::new();
    let mut caret_x = 0.0f32;
    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        glyphs.push((glyph_id, caret_x));
        caret_x += scaled.h_advance(glyph_id);
    }

    let width = (caret_x.ceil() as usize).max(1);
    let ascent = scaled.ascent().ceil().max(1.0);
    let descent = (-scaled.descent()).ceil().max(0.0);
    let height = (ascent + descent) as usize;
    let baseline_y = ascent;

    let mut data = vec![0.0f32; width * height];

    for &(glyph_id, glyph_x) in &glyphs {
        let glyph = glyph_id.with_scale_and_position(pixel_height, ab_glyph::point(glyph_x, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;
                if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
                    let idx = y as usize * width + x as usize;
                    data[idx] = (data[idx] + coverage).min(1.0);
                }
            });
        }
    }

    TextRender {
        width,
        height,
        ascent: ascent as usize,
        data,
    }
}

/// Integer upscale of the 8x16 face closest to the requested height.
fn bitmap_factor(pixel_height: f32) -> usize {
    ((pixel_height / BITMAP_HEIGHT as f32).round() as usize).max(1)
}

fn render_bitmap(text: &str, pixel_height: f32) -> Result<TextRender> {
    let factor = bitmap_factor(pixel_height);
    let cell_w = BITMAP_WIDTH * factor;
    let cell_h = BITMAP_HEIGHT * factor;
    let count = text.chars().count();
    let width = (cell_w * count).max(1);

    let mut data = vec![0.0f32; width * cell_h];
    let mut spleen = PSF2Font::new(FONT_8X16)
        .map_err(|_| ReolkodeError::Font("built-in bitmap font failed to load".to_string()))?;

    for (i, ch) in text.chars().enumerate() {
        let origin_x = i * cell_w;
        let mut utf8 = [0u8; 4];
        let encoded = ch.encode_utf8(&mut utf8);

        let mut cell = vec![false; BITMAP_WIDTH * BITMAP_HEIGHT];
        match spleen.glyph_for_utf8(encoded.as_bytes()) {
            Some(glyph) => {
                for (row_y, row) in glyph.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        if row_y < BITMAP_HEIGHT && col_x < BITMAP_WIDTH {
                            cell[row_y * BITMAP_WIDTH + col_x] = on;
                        }
                    }
                }
            }
            None => draw_box(&mut cell, BITMAP_WIDTH, BITMAP_HEIGHT),
        }

        for y in 0..cell_h {
            for x in 0..cell_w {
                if cell[(y / factor) * BITMAP_WIDTH + x / factor] {
                    data[y * width + origin_x + x] = 1.0;
                }
            }
        }
    }

    Ok(TextRender {
        width,
        height: cell_h,
        ascent: BITMAP_ASCENT * factor,
        data,
    })
}

/// Outline box for characters the bitmap face lacks.
fn draw_box(cell: &mut [bool], width: usize, height: usize) {
    for x in 1..width - 1 {
        cell[2 * width + x] = true;
        cell[(height - 3) * width + x] = true;
    }
    for y in 2..height - 2 {
        cell[y * width + 1] = true;
        cell[y * width + width - 2] = true;
    }
}
