/*
 * Copyright (C) Simon Werner, 2022.
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

//! The fixed set of plots produced from the analyser's spectrograms.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::bitmap::Bitmap;
use crate::colour_gradient::ColourGradient;
use crate::errors::SonoplotError;
use crate::freq_scales::FrequencyScale;
use crate::render::{PlotLayout, RenderJob, Renderer};
use crate::settings::{PlotExtent, Settings};

///
/// One declared output: the source bitmap it is drawn from, its file
/// name and its decorations.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Variant {
    pub source: &'static str,
    pub output: &'static str,
    pub scale: FrequencyScale,
    pub show_xlabel: bool,
    pub show_ylabel: bool,
    pub show_colorbar: bool,
}

const fn variant(
    source: &'static str,
    output: &'static str,
    scale: FrequencyScale,
    show_ylabel: bool,
    show_colorbar: bool,
) -> Variant {
    Variant {
        source,
        output,
        scale,
        show_xlabel: true,
        show_ylabel,
        show_colorbar,
    }
}

pub const LINEAR_SOURCE: &str = "spectrogram-linear.png";
pub const LOG_SOURCE: &str = "spectrogram-log.png";

/// Every plot the tool makes, in the order they are made.
pub const VARIANTS: &[Variant] = &[
    variant(LINEAR_SOURCE, "plot-linear.png", FrequencyScale::Linear, true, true),
    variant(LOG_SOURCE, "plot-log.png", FrequencyScale::Log, true, true),
    variant(LOG_SOURCE, "plot-no-colorbar.png", FrequencyScale::Log, true, false),
    variant(LOG_SOURCE, "plot-no-colorbar-ylabel.png", FrequencyScale::Log, false, false),
    variant(LOG_SOURCE, "plot-no-ylabel.png", FrequencyScale::Log, false, true),
];

impl Variant {
    /// Resolve this variant to a job with paths inside `dir`.
    pub fn job(&self, dir: &Path) -> RenderJob {
        RenderJob {
            input_path: dir.join(self.source),
            output_path: dir.join(self.output),
            transform: self.scale.transform(),
            show_xlabel: self.show_xlabel,
            show_ylabel: self.show_ylabel,
            show_colorbar: self.show_colorbar,
        }
    }
}

///
/// Renders a list of variants one after the other.  Each source bitmap is
/// decoded once per run.  The first failing job stops the run.
///
pub struct VariantRunner {
    extent: PlotExtent,
    renderer: Renderer,
    variants: Vec<Variant>,
}

impl VariantRunner {
    pub fn new(settings: &Settings) -> Self {
        Self::with_variants(settings, VARIANTS.to_vec())
    }

    pub fn with_variants(settings: &Settings, variants: Vec<Variant>) -> Self {
        VariantRunner {
            extent: settings.extent(),
            renderer: Renderer::new(ColourGradient::magma()),
            variants,
        }
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    ///
    /// Render every variant, reading sources from and writing plots into
    /// `dir`.
    ///
    /// # Returns
    ///
    /// * The output paths and what was drawn into each, in variant order.
    ///
    pub fn run(&self, dir: &Path) -> Result<Vec<(PathBuf, PlotLayout)>, SonoplotError> {
        let mut sources: BTreeMap<PathBuf, Bitmap> = BTreeMap::new();
        let mut written = Vec::with_capacity(self.variants.len());

        for variant in &self.variants {
            let job = variant.job(dir);

            if !sources.contains_key(&job.input_path) {
                let bitmap = Bitmap::open(&job.input_path)?;
                sources.insert(job.input_path.clone(), bitmap);
            } else {
                debug!("reusing {}", job.input_path.display());
            }
            let bitmap = &sources[&job.input_path];

            let output = job.output_path.clone();
            let layout = self.renderer.render_bitmap(job, bitmap, &self.extent)?;
            written.push((output, layout));
        }

        info!("rendered {} plots into {}", written.len(), dir.display());
        Ok(written)
    }
}
