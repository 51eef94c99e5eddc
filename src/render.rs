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

//! Turn a spectrogram bitmap into a labelled plot.
//!
//! The bitmap is stretched over the physical extent, time along x and
//! frequency along y, with no regard for its aspect ratio.  The y axis
//! is ticked at `0` and the top frequency only, and the `0` tick is left
//! out when the displayed band starts above 0 Hz.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::element::BitMapElement;
use plotters::prelude::*;
use plotters_backend::DrawingBackend;
use tracing::{debug, info};

use crate::bitmap::{stretch_rgb, Bitmap};
use crate::colour_gradient::ColourGradient;
use crate::errors::SonoplotError;
use crate::fonts::{self, FONT_FAMILY};
use crate::freq_scales::AxisTransform;
use crate::settings::PlotExtent;

/// Output image size in pixels.
pub const FIGURE_WIDTH: u32 = 640;
pub const FIGURE_HEIGHT: u32 = 480;

pub const X_LABEL: &str = "Time (s)";
pub const Y_LABEL: &str = "Frequency (Hz)";
pub const COLORBAR_LABEL: &str = "Magnitude (dB)";

const COLORBAR_WIDTH: u32 = 100;
const COLORBAR_STEPS: usize = 256;
const MARGIN: u32 = 15;
const X_LABEL_AREA: u32 = 45;
const Y_LABEL_AREA: u32 = 75;
const COLORBAR_LABEL_AREA: u32 = 60;
const X_TICKS: usize = 6;
const LABEL_SIZE: i32 = 14;
const DESC_SIZE: i32 = 16;

///
/// One plot to produce: which bitmap to read, where to write the result
/// and which decorations to draw.
///
pub struct RenderJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub transform: Box<dyn AxisTransform>,
    pub show_xlabel: bool,
    pub show_ylabel: bool,
    pub show_colorbar: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorbarLayout {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
}

///
/// Everything a plot shows besides its pixels.  [PlotLayout::new] gives
/// the decorations a job asks for, [draw_plot] returns the ones that were
/// actually drawn, and those are stored in the output PNG as `tEXt`
/// chunks.
///
#[derive(Debug, Clone, PartialEq)]
pub struct PlotLayout {
    pub width: u32,
    pub height: u32,
    pub extent: PlotExtent,
    pub y_ticks: Vec<f64>,
    pub x_label: Option<&'static str>,
    pub y_label: Option<&'static str>,
    pub colorbar: Option<ColorbarLayout>,
    pub frequency_scale: &'static str,
}

impl PlotLayout {
    pub fn new(job: &RenderJob, extent: &PlotExtent, gradient: &ColourGradient) -> Self {
        PlotLayout {
            width: FIGURE_WIDTH,
            height: FIGURE_HEIGHT,
            extent: *extent,
            y_ticks: frequency_ticks(extent),
            x_label: job.show_xlabel.then_some(X_LABEL),
            y_label: job.show_ylabel.then_some(Y_LABEL),
            colorbar: job.show_colorbar.then(|| ColorbarLayout {
                label: COLORBAR_LABEL,
                min: f64::from(gradient.min()),
                max: f64::from(gradient.max()),
            }),
            frequency_scale: job.transform.name(),
        }
    }

    /// Key/value pairs written into the PNG, absent decorations are left out.
    pub fn text_chunks(&self) -> Vec<(String, String)> {
        let join = |values: &[f64]| {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };

        let e = &self.extent;
        let mut chunks = vec![
            (
                "Software".to_string(),
                format!("sonoplot {}", env!("CARGO_PKG_VERSION")),
            ),
            (
                "frequency-scale".to_string(),
                self.frequency_scale.to_string(),
            ),
            (
                "extent".to_string(),
                join(&[e.x_min, e.x_max, e.y_min, e.y_max]),
            ),
            ("y-ticks".to_string(), join(&self.y_ticks)),
        ];
        if let Some(label) = self.x_label {
            chunks.push(("x-label".to_string(), label.to_string()));
        }
        if let Some(label) = self.y_label {
            chunks.push(("y-label".to_string(), label.to_string()));
        }
        if let Some(bar) = &self.colorbar {
            chunks.push(("colorbar".to_string(), bar.label.to_string()));
            chunks.push(("colorbar-range".to_string(), join(&[bar.min, bar.max])));
        }
        chunks
    }
}

///
/// The y axis is ticked at 0 Hz and at the top frequency only.  A tick
/// below the displayed band (0 Hz when `min_frequency > 0`) is dropped.
///
pub fn frequency_ticks(extent: &PlotExtent) -> Vec<f64> {
    [0.0, extent.y_max]
        .into_iter()
        .filter(|t| (extent.y_min..=extent.y_max).contains(t))
        .collect()
}

/// Linear frequency coordinate whose only key points are fixed ticks.
#[derive(Clone)]
struct FrequencyAxis {
    linear: RangedCoordf64,
    ticks: Vec<f64>,
}

impl FrequencyAxis {
    fn new(extent: &PlotExtent, ticks: &[f64]) -> Self {
        FrequencyAxis {
            linear: (extent.y_min..extent.y_max).into(),
            ticks: ticks.to_vec(),
        }
    }
}

impl Ranged for FrequencyAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.linear.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        // No light mesh lines
        if hint.weight().allow_light_points() {
            return vec![];
        }
        self.ticks.clone()
    }

    fn range(&self) -> Range<f64> {
        self.linear.range()
    }
}

/// Draws plots with one fixed colour mapping.
pub struct Renderer {
    gradient: ColourGradient,
}

impl Renderer {
    pub fn new(gradient: ColourGradient) -> Self {
        Self { gradient }
    }

    pub fn gradient(&self) -> &ColourGradient {
        &self.gradient
    }

    ///
    /// Load the job's bitmap, draw it and write the plot to the job's
    /// output path, replacing any file already there.
    ///
    pub fn render(&self, job: RenderJob, extent: &PlotExtent) -> Result<PlotLayout, SonoplotError> {
        let bitmap = Bitmap::open(&job.input_path)?;
        self.render_bitmap(job, &bitmap, extent)
    }

    /// Same as [Renderer::render] for a bitmap that is already decoded.
    pub fn render_bitmap(
        &self,
        job: RenderJob,
        bitmap: &Bitmap,
        extent: &PlotExtent,
    ) -> Result<PlotLayout, SonoplotError> {
        debug!(
            "rendering {} ({}x{}) with {} scale",
            job.input_path.display(),
            bitmap.width(),
            bitmap.height(),
            job.transform.name()
        );

        let planned = PlotLayout::new(&job, extent, &self.gradient);
        let mut buf = vec![0u8; planned.width as usize * planned.height as usize * 3];
        let drawn = {
            let root = BitMapBackend::with_buffer(&mut buf, (planned.width, planned.height))
                .into_drawing_area();
            draw_plot(&root, &planned, bitmap, &self.gradient).map_err(|source| {
                SonoplotError::Render {
                    path: job.output_path.clone(),
                    source: Box::new(source),
                }
            })?
        };

        write_png(&job.output_path, &drawn, &buf)?;
        info!("wrote {}", job.output_path.display());
        Ok(drawn)
    }
}

fn draw_err<E>(stage: &'static str) -> impl FnOnce(DrawingAreaErrorKind<E>) -> SonoplotError
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |source| SonoplotError::Draw {
        stage,
        source: Box::new(source),
    }
}

///
/// Draw the plot described by `layout` onto `root`.  The backend is
/// generic so the same drawing code can target memory or a recorder.
///
/// # Returns
///
/// * `layout` with the y ticks replaced by the tick labels the chart
///   actually drew.
///
pub fn draw_plot<DB>(
    root: &DrawingArea<DB, Shift>,
    layout: &PlotLayout,
    bitmap: &Bitmap,
    gradient: &ColourGradient,
) -> Result<PlotLayout, SonoplotError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    fonts::register()?;
    root.fill(&WHITE).map_err(draw_err("background"))?;

    let (plot_area, bar_area) = match layout.colorbar {
        Some(_) => {
            let (left, right) = root.split_horizontally(layout.width - COLORBAR_WIDTH);
            (left, Some(right))
        }
        None => (root.clone(), None),
    };

    let e = &layout.extent;
    let mut chart = ChartBuilder::on(&plot_area)
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(e.x_min..e.x_max, FrequencyAxis::new(e, &layout.y_ticks))
        .map_err(draw_err("chart"))?;

    // The bitmap fills the whole plotting rectangle
    let (x_px, y_px) = chart.plotting_area().get_pixel_range();
    let size = (
        (x_px.end - x_px.start).max(1) as usize,
        (y_px.end - y_px.start).max(1) as usize,
    );
    let rgb = bitmap.to_rgb(gradient);
    let stretched = stretch_rgb(&rgb, (bitmap.width(), bitmap.height()), size)?;
    let image: BitMapElement<(f64, f64)> = BitMapElement::with_owned_buffer(
        (e.x_min, e.y_max),
        (size.0 as u32, size.1 as u32),
        stretched,
    )
    .ok_or_else(|| SonoplotError::Draw {
        stage: "bitmap",
        source: "stretched bitmap is smaller than the plot".into(),
    })?;
    chart
        .draw_series(std::iter::once(image))
        .map_err(draw_err("bitmap"))?;

    let drawn_ticks = RefCell::new(Vec::new());
    let x_fmt = |x: &f64| format!("{:.1}", x);
    let y_fmt = |y: &f64| {
        drawn_ticks.borrow_mut().push(*y);
        format!("{}", y)
    };
    {
        let mut mesh = chart.configure_mesh();
        mesh.disable_mesh()
            .x_labels(X_TICKS)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .label_style((FONT_FAMILY, LABEL_SIZE))
            .axis_desc_style((FONT_FAMILY, DESC_SIZE));
        if let Some(label) = layout.x_label {
            mesh.x_desc(label);
        }
        if let Some(label) = layout.y_label {
            mesh.y_desc(label);
        }
        mesh.draw().map_err(draw_err("axes"))?;
    }

    let mut y_ticks = drawn_ticks.take();
    y_ticks.sort_by(f64::total_cmp);
    y_ticks.dedup();

    if let (Some(bar), Some(area)) = (&layout.colorbar, bar_area) {
        draw_colorbar(&area, bar, gradient)?;
    }

    root.present().map_err(draw_err("output"))?;
    Ok(PlotLayout {
        y_ticks,
        ..layout.clone()
    })
}

fn draw_colorbar<DB>(
    area: &DrawingArea<DB, Shift>,
    bar: &ColorbarLayout,
    gradient: &ColourGradient,
) -> Result<(), SonoplotError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut chart = ChartBuilder::on(area)
        .margin(MARGIN)
        .margin_left(5)
        .x_label_area_size(X_LABEL_AREA)
        .right_y_label_area_size(COLORBAR_LABEL_AREA)
        .build_cartesian_2d(0f64..1f64, bar.min..bar.max)
        .map_err(draw_err("colorbar"))?;

    let step = (bar.max - bar.min) / COLORBAR_STEPS as f64;
    chart
        .draw_series((0..COLORBAR_STEPS).map(|i| {
            let lo = bar.min + step * i as f64;
            let hi = lo + step;
            let (r, g, b) = gradient.get_colour(((lo + hi) / 2.0) as f32).rgb();
            Rectangle::new([(0.0, lo), (1.0, hi)], RGBColor(r, g, b).filled())
        }))
        .map_err(draw_err("colorbar"))?;

    let fmt = |v: &f64| format!("{}", v);
    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(6)
        .y_label_formatter(&fmt)
        .label_style((FONT_FAMILY, LABEL_SIZE))
        .axis_desc_style((FONT_FAMILY, DESC_SIZE))
        .y_desc(bar.label)
        .draw()
        .map_err(draw_err("colorbar axis"))?;
    Ok(())
}

fn write_png(path: &Path, layout: &PlotLayout, rgb: &[u8]) -> Result<(), SonoplotError> {
    let encode_err = |source| SonoplotError::Encode {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(|source| SonoplotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let w = BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, layout.width, layout.height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    for (keyword, text) in layout.text_chunks() {
        encoder.add_text_chunk(keyword, text).map_err(encode_err)?;
    }

    let mut writer = encoder.write_header().map_err(encode_err)?;
    writer.write_image_data(rgb).map_err(encode_err)?;
    writer.finish().map_err(encode_err)?;
    Ok(())
}
