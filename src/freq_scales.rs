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

//! Frequency axis transforms
//!
//! This module contains the [AxisTransform] trait.  A transform maps a
//! normalised frequency position (0.0 at the bottom row of the bitmap,
//! 1.0 at the top) onto the compressed position the analyser resampled
//! it to, and back again.  `inverse(forward(x)) == x` holds for every
//! `x` in the transform's domain.
//!
//! Plots are currently drawn on a linear extent whatever the scale, the
//! transform only travels with the job so the pair stays tested.

use std::fmt;

use crate::errors::SonoplotError;

/// Base of the logarithmic frequency compression used by the analyser.
pub const LOG_BASE: f64 = 1024.0;

///
/// The frequency scale the source bitmap was rendered with.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrequencyScale {
    Linear,
    Log,
}

impl FrequencyScale {
    ///
    /// Create an instance of [AxisTransform] for this scale.
    ///
    pub fn transform(self) -> Box<dyn AxisTransform> {
        match self {
            FrequencyScale::Linear => Box::new(LinearTransform),
            FrequencyScale::Log => Box::new(LogTransform::new(LOG_BASE)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FrequencyScale::Linear => "linear",
            FrequencyScale::Log => "log",
        }
    }
}

impl fmt::Display for FrequencyScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait AxisTransform {
    /// Name used in logs and plot metadata.
    fn name(&self) -> &'static str;

    /// Normalised frequency position -> compressed position.
    fn forward(&self, x: f64) -> Result<f64, SonoplotError>;

    /// Compressed position -> normalised frequency position.
    fn inverse(&self, y: f64) -> Result<f64, SonoplotError>;
}

/// The identity transform, defined on all finite values.
pub struct LinearTransform;

impl AxisTransform for LinearTransform {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn forward(&self, x: f64) -> Result<f64, SonoplotError> {
        finite(self.name(), x)
    }

    fn inverse(&self, y: f64) -> Result<f64, SonoplotError> {
        finite(self.name(), y)
    }
}

///
/// Logarithmic compression with base `B`:
///
/// * `forward(x) = 1 - log_b(B)` where `b = B - B*x + x`
/// * `inverse(y) = (B - B^(1 / (1 - y))) / (B - 1)`
///
/// `forward` is defined for `x` in `[0, 1)`.  At `x = 1` the logarithm
/// base `b` collapses to 1, so that point is outside the domain.  The
/// image of `[0, 1)` is `(-inf, 0]`, which is the domain of `inverse`.
///
/// Both directions are evaluated as `ln_1p`/`exp_m1` of small arguments,
/// so they keep full relative precision as `x` and `y` approach 0.
///
pub struct LogTransform {
    base: f64,
    ln_base: f64,
}

impl LogTransform {
    ///
    /// # Arguments
    ///
    /// * `base` - The compression base, must be greater than 1.
    ///
    pub fn new(base: f64) -> Self {
        debug_assert!(base > 1.0);
        Self {
            base,
            ln_base: base.ln(),
        }
    }

    pub fn base(&self) -> f64 {
        self.base
    }
}

impl AxisTransform for LogTransform {
    fn name(&self) -> &'static str {
        "log"
    }

    fn forward(&self, x: f64) -> Result<f64, SonoplotError> {
        if !(0.0..1.0).contains(&x) {
            return Err(domain(self.name(), x));
        }

        // 1 - ln(B)/ln(b) == ln(b/B)/ln(b), and b/B = 1 - (B - 1)x/B
        let ln_b = ((self.base - 1.0) * (1.0 - x)).ln_1p();
        let ln_b_over_base = (-(self.base - 1.0) * x / self.base).ln_1p();
        Ok(ln_b_over_base / ln_b)
    }

    fn inverse(&self, y: f64) -> Result<f64, SonoplotError> {
        if !(y.is_finite() && y <= 0.0) {
            return Err(domain(self.name(), y));
        }

        // ln(b/B) = y ln(B) / (1 - y)
        let ratio_m1 = (self.ln_base * y / (1.0 - y)).exp_m1();
        Ok(-self.base * ratio_m1 / (self.base - 1.0))
    }
}

fn finite(scale: &'static str, value: f64) -> Result<f64, SonoplotError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(domain(scale, value))
    }
}

fn domain(scale: &'static str, value: f64) -> SonoplotError {
    SonoplotError::Domain { scale, value }
}
