//! # Label Profiles
//!
//! A [`LabelProfile`] bundles everything needed to turn a shelf number and
//! price into a finished label: the digit split, the sizing strategy, the
//! digit line toggle and the font preference list.
//!
//! ## Built-in Profiles
//!
//! | Profile | Sizing | Notes |
//! |---------|--------|-------|
//! | `thermal_58x30` | 58 × 30 mm at 203 DPI | Common thermal label roll |
//! | `screen` | scale 2, 60 px bars | On-screen preview |
//!
//! ## File Format
//!
//! ```json
//! {
//!   "name": "Shop labels",
//!   "widths": { "shelf": 4, "price": 8 },
//!   "sizing": { "type": "physical", "width_mm": 58.0, "height_mm": 30.0, "dpi": 203 },
//!   "include_numbers": true,
//!   "font_families": ["Arial", "DejaVu Sans"]
//! }
//! ```
//!
//! Every field is optional; missing fields take the `screen` defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::ean::SegmentWidths;
use crate::error::{ReolkodeError, Result};
use crate::render::font::DEFAULT_FAMILIES;
use crate::render::{BarcodeRenderer, FontSet, FontSource, PhysicalSize, RenderOptions, SystemFonts};

/// How the label's pixel size is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Sizing {
    /// Fixed pixels per module and bar height.
    Pixel { scale: u32, bar_height: u32 },
    /// Fit a physical label at a printer resolution.
    Physical { width_mm: f64, height_mm: f64, dpi: u32 },
}

impl Default for Sizing {
    fn default() -> Self {
        Sizing::Pixel {
            scale: 2,
            bar_height: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelProfile {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub widths: SegmentWidths,

    #[serde(default)]
    pub sizing: Sizing,

    #[serde(default = "default_include_numbers")]
    pub include_numbers: bool,

    /// Tried in order; the built-in bitmap face is used when none load.
    #[serde(default = "default_font_families")]
    pub font_families: Vec<String>,
}

fn default_name() -> String {
    "Screen".to_string()
}

fn default_include_numbers() -> bool {
    true
}

fn default_font_families() -> Vec<String> {
    DEFAULT_FAMILIES.iter().map(|s| s.to_string()).collect()
}

impl Default for LabelProfile {
    fn default() -> Self {
        Self::screen()
    }
}

impl LabelProfile {
    /// 58 × 30 mm thermal label at 203 DPI.
    pub fn thermal_58x30() -> Self {
        Self {
            name: "Thermal 58x30".to_string(),
            widths: SegmentWidths::default(),
            sizing: Sizing::Physical {
                width_mm: 58.0,
                height_mm: 30.0,
                dpi: 203,
            },
            include_numbers: true,
            font_families: default_font_families(),
        }
    }

    /// On-screen preview: two pixels per module.
    pub fn screen() -> Self {
        Self {
            name: default_name(),
            widths: SegmentWidths::default(),
            sizing: Sizing::default(),
            include_numbers: true,
            font_families: default_font_families(),
        }
    }

    /// Look up a built-in profile by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "thermal_58x30" | "thermal" => Some(Self::thermal_58x30()),
            "screen" => Some(Self::screen()),
            _ => None,
        }
    }

    pub fn list_builtin() -> &'static [&'static str] {
        &["screen", "thermal_58x30"]
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let profile: Self =
            serde_json::from_str(json).map_err(|e| ReolkodeError::Config(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Read and validate a JSON profile file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let profile = Self::from_json_str(&json)?;
        debug!(path = %path.display(), name = %profile.name, "loaded label profile");
        Ok(profile)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReolkodeError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.render_options().map(|_| ())
    }

    /// Concrete pixel parameters for this profile.
    pub fn render_options(&self) -> Result<RenderOptions> {
        let options = match self.sizing {
            Sizing::Pixel { scale, bar_height } => RenderOptions {
                scale,
                bar_height,
                include_numbers: self.include_numbers,
                widths: self.widths,
            },
            Sizing::Physical {
                width_mm,
                height_mm,
                dpi,
            } => PhysicalSize::new(width_mm, height_mm, dpi, self.include_numbers)
                .with_widths(self.widths)
                .to_options()?,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn font_set(&self, source: &dyn FontSource) -> FontSet {
        FontSet::resolve(source, &self.font_families)
    }

    /// Renderer with this profile's font preferences, using system fonts.
    pub fn renderer(&self) -> BarcodeRenderer {
        if self.font_families == default_font_families() {
            BarcodeRenderer::with_shared_fonts(FontSet::system())
        } else {
            BarcodeRenderer::with_shared_fonts(Arc::new(self.font_set(&SystemFonts::discover())))
        }
    }
}
