/*
 * Copyright (C) Simon Werner, 2022
 *
 * This program is free software; you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation; either version 2 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program; if not, see <http://www.gnu.org/licenses/>.
 */

//! Render spectrogram bitmaps into labelled plots.
//!
//! The analyser writes its spectrograms as bare bitmaps.  This crate puts
//! them on calibrated time and frequency axes, adds an optional magnitude
//! colorbar, and writes a fixed set of plot variants.
//!
//! # Example
//!
//! ```Rust
//!   let settings = Settings::from_file(Path::new("../config.toml"))?;
//!   VariantRunner::new(&settings).run(Path::new("."))?;
//! ```

mod bitmap;
mod colour_gradient;
mod errors;
mod fonts;
mod freq_scales;
mod render;
mod settings;
mod variants;

pub use bitmap::{stretch_rgb, Bitmap, Channels};
pub use colour_gradient::{ColourGradient, RGBAColour, MAGNITUDE_MAX, MAGNITUDE_MIN};
pub use errors::SonoplotError;
pub use fonts::FONT_FAMILY;
pub use freq_scales::{AxisTransform, FrequencyScale, LinearTransform, LogTransform, LOG_BASE};
pub use render::{
    draw_plot, frequency_ticks, ColorbarLayout, PlotLayout, RenderJob, Renderer, COLORBAR_LABEL,
    FIGURE_HEIGHT, FIGURE_WIDTH, X_LABEL, Y_LABEL,
};
pub use settings::{
    derive_extent, PlotExtent, Settings, SettingsMap, HOP_LEN, MAX_FREQUENCY, MIN_FREQUENCY,
    SAMPLE_RATE, TIME_WIDTH,
};
pub use variants::{Variant, VariantRunner, LINEAR_SOURCE, LOG_SOURCE, VARIANTS};

use std::path::{Path, PathBuf};

/// Settings file, relative to the plot directory.
pub const CONFIG_FILE: &str = "../config.toml";

///
/// Render every declared variant inside `plot_dir`.  The settings are read
/// first, so a bad configuration fails before any file is written.
///
/// # Returns
///
/// * The paths of the written plots, in variant order.
///
pub fn run(plot_dir: &Path) -> Result<Vec<PathBuf>, SonoplotError> {
    let settings = Settings::from_file(&plot_dir.join(CONFIG_FILE))?;
    let written = VariantRunner::new(&settings).run(plot_dir)?;
    Ok(written.into_iter().map(|(path, _)| path).collect())
}
