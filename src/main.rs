//! # Reolkode CLI
//!
//! Command-line interface for shelf label codes.
//!
//! ## Usage
//!
//! ```bash
//! # Compose a code for shelf A12-3 at 4,56 kr.
//! reolkode build A12-3 4.56
//!
//! # Check digit of a 12-digit payload
//! reolkode check 590123412345
//!
//! # Validate a scanned code
//! reolkode validate 5901234123457
//!
//! # Print the 95-module bar pattern
//! reolkode modules 5901234123457
//!
//! # Render an existing code
//! reolkode render 5901234123457 --png label.png --scale 3 --bar-height 80
//!
//! # Build and render for a 58x30mm thermal label
//! reolkode label A12-3 4.56 --png label.png --width-mm 58 --height-mm 30 --dpi 203
//! ```
//!
//! Set `RUST_LOG=reolkode=debug` to see font resolution and sizing decisions.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reolkode::{
    LabelProfile, Price, ReolkodeError, SegmentWidths,
    config::Sizing,
    ean::{self, encode_modules},
};

/// Reolkode - EAN-13 shelf label utility
#[derive(Parser, Debug)]
#[command(name = "reolkode")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Digits reserved for the shelf number
    #[arg(long, global = true)]
    shelf_width: Option<usize>,

    /// Digits reserved for the price in cents
    #[arg(long, global = true)]
    price_width: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compose a 13-digit code from shelf number and price
    Build {
        /// Shelf number; non-digits are ignored
        shelf: String,
        /// Price, e.g. 4.56 or 4,56
        #[arg(allow_hyphen_values = true)]
        price: Price,
    },

    /// Compute the check digit of a 12-digit payload
    Check {
        data: String,
    },

    /// Validate a 13-digit code
    Validate {
        code: String,
    },

    /// Print the 95-module bar pattern of a code
    Modules {
        code: String,
    },

    /// Render an existing code to PNG
    Render {
        code: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Build a code and render it in one step
    Label {
        shelf: String,
        #[arg(allow_hyphen_values = true)]
        price: Price,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List built-in label profiles
    Profiles {
        /// Print the named profile as JSON
        #[arg(long)]
        show: Option<String>,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output PNG file
    #[arg(long, value_name = "FILE")]
    png: PathBuf,

    /// Label profile JSON file
    #[arg(long, value_name = "FILE", conflicts_with = "preset")]
    profile: Option<PathBuf>,

    /// Built-in profile name (see `reolkode profiles`)
    #[arg(long)]
    preset: Option<String>,

    /// Pixels per module
    #[arg(long)]
    scale: Option<u32>,

    /// Bar height in pixels
    #[arg(long)]
    bar_height: Option<u32>,

    /// Label width in millimetres (physical sizing)
    #[arg(long, requires = "height_mm")]
    width_mm: Option<f64>,

    /// Label height in millimetres (physical sizing)
    #[arg(long, requires = "width_mm")]
    height_mm: Option<f64>,

    /// Printer resolution for physical sizing
    #[arg(long)]
    dpi: Option<u32>,

    /// Leave out the digit line under the bars
    #[arg(long)]
    no_numbers: bool,
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean for codes and patterns.
///
/// `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), ReolkodeError> {
    let cli = Cli::parse();
    let widths = segment_widths(&cli);

    match cli.command {
        Commands::Build { shelf, price } => {
            let code = ean::build(&shelf, price, widths.unwrap_or_default())?;
            println!("{}", code);
        }

        Commands::Check { data } => {
            println!("{}", ean::compute_check_digit(&data)?);
        }

        Commands::Validate { code } => {
            ean::validate_ean13(&code)?;
            println!("{} is valid", code);
        }

        Commands::Modules { code } => {
            let code = ean::Ean13::parse(&code)?;
            println!("{}", encode_modules(&code));
        }

        Commands::Render { code, output } => {
            let profile = resolve_profile(&output, widths)?;
            render_to_file(&code, &profile, &output.png)?;
        }

        Commands::Label { shelf, price, output } => {
            let profile = resolve_profile(&output, widths)?;
            let code = ean::build(&shelf, price, profile.widths)?;
            println!("{}", code);
            render_to_file(code.as_str(), &profile, &output.png)?;
        }

        Commands::Profiles { show } => match show {
            Some(name) => {
                let profile = LabelProfile::by_name(&name).ok_or_else(|| {
                    ReolkodeError::Config(format!(
                        "Unknown profile '{}'. Run `reolkode profiles` to see available options.",
                        name
                    ))
                })?;
                println!("{}", profile.to_json()?);
            }
            None => {
                println!("Available profiles:");
                for name in LabelProfile::list_builtin() {
                    println!("  {}", name);
                }
            }
        },
    }

    Ok(())
}

fn segment_widths(cli: &Cli) -> Option<SegmentWidths> {
    match (cli.shelf_width, cli.price_width) {
        (None, None) => None,
        (Some(shelf), None) => Some(SegmentWidths { shelf, price: 12usize.saturating_sub(shelf) }),
        (None, Some(price)) => Some(SegmentWidths { shelf: 12usize.saturating_sub(price), price }),
        (Some(shelf), Some(price)) => Some(SegmentWidths { shelf, price }),
    }
}

/// Start from a profile file, a preset or the screen defaults, then apply
/// command-line overrides.
fn resolve_profile(
    output: &OutputArgs,
    widths: Option<SegmentWidths>,
) -> Result<LabelProfile, ReolkodeError> {
    let mut profile = match (&output.profile, &output.preset) {
        (Some(path), _) => LabelProfile::load(path)?,
        (None, Some(name)) => LabelProfile::by_name(name).ok_or_else(|| {
            ReolkodeError::Config(format!("Unknown preset '{}'", name))
        })?,
        (None, None) => LabelProfile::screen(),
    };

    if let Some(widths) = widths {
        profile.widths = widths;
    }

    if let (Some(width_mm), Some(height_mm)) = (output.width_mm, output.height_mm) {
        let dpi = match (output.dpi, profile.sizing) {
            (Some(dpi), _) => dpi,
            (None, Sizing::Physical { dpi, .. }) => dpi,
            (None, Sizing::Pixel { .. }) => 203,
        };
        profile.sizing = Sizing::Physical {
            width_mm,
            height_mm,
            dpi,
        };
    } else if output.scale.is_some() || output.bar_height.is_some() {
        let (scale, bar_height) = match profile.sizing {
            Sizing::Pixel { scale, bar_height } => (scale, bar_height),
            Sizing::Physical { .. } => (2, 60),
        };
        profile.sizing = Sizing::Pixel {
            scale: output.scale.unwrap_or(scale),
            bar_height: output.bar_height.unwrap_or(bar_height),
        };
    } else if let (Some(dpi), Sizing::Physical { width_mm, height_mm, .. }) = (output.dpi, profile.sizing) {
        profile.sizing = Sizing::Physical {
            width_mm,
            height_mm,
            dpi,
        };
    }

    if output.no_numbers {
        profile.include_numbers = false;
    }

    profile.validate()?;
    Ok(profile)
}

fn render_to_file(code: &str, profile: &LabelProfile, path: &Path) -> Result<(), ReolkodeError> {
    let options = profile.render_options()?;
    let png = profile.renderer().render_png(code, &options)?;
    std::fs::write(path, &png)?;
    info!(
        code,
        scale = options.scale,
        bar_height = options.bar_height,
        path = %path.display(),
        "saved label"
    );
    Ok(())
}
