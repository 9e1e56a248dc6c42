//! # Reolkode - EAN-13 Shelf Labels
//!
//! Reolkode turns a rental shelf number and a price into an EAN-13 code and
//! renders it as a PNG label. It provides:
//!
//! - **Encoding**: payload composition, checksum, validation
//! - **Module patterns**: the standard L/G/R tables and guard bars
//! - **Rendering**: header text, bars and digit line, sized in pixels or millimetres
//! - **Profiles**: JSON-loadable label settings with built-in presets
//!
//! ## Quick Start
//!
//! ```
//! use reolkode::{
//!     ean::{self, Price, SegmentWidths},
//!     render::{BarcodeRenderer, FontSet, RenderOptions},
//! };
//!
//! // Shelf "A12-3" selling at 4.56 kr.
//! let price: Price = "4.56".parse()?;
//! let code = ean::build("A12-3", price, SegmentWidths::default())?;
//!
//! // Render with the built-in bitmap font
//! let renderer = BarcodeRenderer::new(FontSet::builtin());
//! let png = renderer.render_png(code.as_str(), &RenderOptions::new(2, 40, true))?;
//! assert!(png.starts_with(b"\x89PNG"));
//!
//! # Ok::<(), reolkode::ReolkodeError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`ean`] | Code composition, checksum and module patterns |
//! | [`render`] | PNG label rendering |
//! | [`config`] | Label profiles |
//! | [`error`] | Error types |

pub mod config;
pub mod ean;
pub mod error;
pub mod render;

// Re-exports for convenience
pub use config::LabelProfile;
pub use ean::{Data12, Ean13, ModulePattern, Price, SegmentWidths};
pub use error::{ReolkodeError, Result};
pub use render::{BarcodeRenderer, PhysicalSize, RenderOptions};
