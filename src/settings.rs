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

//! Plot settings and the physical extent they describe.
//!
//! The settings come from the analyser's `config.toml`.  Only the four
//! keys that calibrate the axes are read, everything else in that file
//! belongs to the analyser and is ignored here.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::errors::SonoplotError;

/// The analyser always records at 44.1 kHz.
pub const SAMPLE_RATE: f64 = 44_100.0;

pub const MIN_FREQUENCY: &str = "spectrogram.min_frequency";
pub const MAX_FREQUENCY: &str = "spectrogram.max_frequency";
pub const TIME_WIDTH: &str = "spectrogram.time_width";
pub const HOP_LEN: &str = "fft.hop_len";

/// Flat, already parsed settings keyed by dotted names, e.g.
/// `spectrogram.max_frequency`.
pub type SettingsMap = BTreeMap<String, f64>;

///
/// The resolved numeric settings.  Build it with [Settings::load] or one
/// of the TOML helpers; once built it is never changed.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub min_frequency: f64, // Lowest displayed frequency (Hz)
    pub max_frequency: f64, // Highest displayed frequency (Hz)
    pub hop_len: usize,     // Samples between two analysis windows
    pub sample_rate: f64,   // Sample rate of the analysed audio (Hz)
    pub time_width: usize,  // Number of hops in one rendered image
}

///
/// The physical rectangle, time (s) by frequency (Hz), that a bitmap is
/// stretched over.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotExtent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Settings {
    ///
    /// Validate the flat settings and resolve them.
    ///
    /// # Arguments
    ///
    ///  * `source` - The parsed key/value settings.
    ///
    pub fn load(source: &SettingsMap) -> Result<Self, SonoplotError> {
        let min_frequency = required(source, MIN_FREQUENCY)?;
        let max_frequency = required(source, MAX_FREQUENCY)?;
        let time_width = positive_integer(source, TIME_WIDTH)?;
        let hop_len = positive_integer(source, HOP_LEN)?;

        if min_frequency < 0.0 {
            return Err(SonoplotError::invalid(
                MIN_FREQUENCY,
                format!("{} Hz is below 0 Hz", min_frequency),
            ));
        }
        if max_frequency <= min_frequency {
            return Err(SonoplotError::invalid(
                MAX_FREQUENCY,
                format!(
                    "{} Hz must be above the minimum frequency of {} Hz",
                    max_frequency, min_frequency
                ),
            ));
        }
        if max_frequency > SAMPLE_RATE / 2.0 {
            warn!(
                "max_frequency {} Hz is above the Nyquist frequency of {} Hz",
                max_frequency,
                SAMPLE_RATE / 2.0
            );
        }

        Ok(Settings {
            min_frequency,
            max_frequency,
            hop_len,
            sample_rate: SAMPLE_RATE,
            time_width,
        })
    }

    /// Parse TOML text and resolve the settings from it.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, SonoplotError> {
        let table: toml::Table = text.parse().map_err(|source| SonoplotError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })?;

        let mut flat = SettingsMap::new();
        flatten("", &table, &mut flat);
        Settings::load(&flat)
    }

    /// Read a TOML settings file, normally the analyser's `config.toml`.
    pub fn from_file(path: &Path) -> Result<Self, SonoplotError> {
        let text = fs::read_to_string(path).map_err(|source| SonoplotError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Settings::from_toml_str(&text, path)
    }

    /// Length of one rendered image in seconds.
    pub fn duration(&self) -> f64 {
        self.hop_len as f64 / self.sample_rate * self.time_width as f64
    }

    pub fn extent(&self) -> PlotExtent {
        derive_extent(self)
    }
}

/// Derive the fixed plot extent shared by every render.
pub fn derive_extent(settings: &Settings) -> PlotExtent {
    PlotExtent {
        x_min: 0.0,
        x_max: settings.duration(),
        y_min: settings.min_frequency,
        y_max: settings.max_frequency,
    }
}

fn required(source: &SettingsMap, key: &str) -> Result<f64, SonoplotError> {
    let value = *source
        .get(key)
        .ok_or_else(|| SonoplotError::MissingSetting(key.to_string()))?;

    if !value.is_finite() {
        return Err(SonoplotError::invalid(key, "must be a finite number"));
    }
    Ok(value)
}

fn positive_integer(source: &SettingsMap, key: &str) -> Result<usize, SonoplotError> {
    let value = required(source, key)?;
    if value < 1.0 || value.fract() != 0.0 {
        return Err(SonoplotError::invalid(
            key,
            format!("{} is not a positive integer", value),
        ));
    }
    Ok(value as usize)
}

// Nested tables become dotted keys; strings, booleans and arrays are not
// settings this crate reads.
fn flatten(prefix: &str, table: &toml::Table, out: &mut SettingsMap) {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        match value {
            toml::Value::Table(inner) => flatten(&key, inner, out),
            toml::Value::Integer(i) => {
                out.insert(key, *i as f64);
            }
            toml::Value::Float(f) => {
                out.insert(key, *f);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn source(min: f64, max: f64, hop_len: f64, time_width: f64) -> SettingsMap {
        let mut map = SettingsMap::new();
        map.insert(MIN_FREQUENCY.to_string(), min);
        map.insert(MAX_FREQUENCY.to_string(), max);
        map.insert(HOP_LEN.to_string(), hop_len);
        map.insert(TIME_WIDTH.to_string(), time_width);
        map
    }

    #[test]
    fn test_extent_from_full_band() {
        let settings = Settings::load(&source(0.0, 22050.0, 512.0, 200.0)).unwrap();
        let extent = derive_extent(&settings);

        assert_eq!(extent.x_min, 0.0);
        assert_abs_diff_eq!(extent.x_max, 512.0 / 44100.0 * 200.0, epsilon = 1e-12);
        assert_abs_diff_eq!(extent.x_max, 2.3220, epsilon = 1e-4);
        assert_eq!(extent.y_min, 0.0);
        assert_eq!(extent.y_max, 22050.0);
        assert_eq!(settings.extent(), extent);
    }

    #[test]
    fn test_missing_max_frequency() {
        let mut map = source(0.0, 22050.0, 512.0, 200.0);
        map.remove(MAX_FREQUENCY);

        let err = Settings::load(&map).unwrap_err();
        assert!(err.is_config());
        assert!(matches!(err, SonoplotError::MissingSetting(ref key) if key == MAX_FREQUENCY));
    }

    #[test]
    fn test_rejects_inverted_band() {
        let err = Settings::load(&source(8000.0, 8000.0, 512.0, 200.0)).unwrap_err();
        assert!(matches!(err, SonoplotError::InvalidSetting { ref key, .. } if key == MAX_FREQUENCY));

        let err = Settings::load(&source(-5.0, 8000.0, 512.0, 200.0)).unwrap_err();
        assert!(matches!(err, SonoplotError::InvalidSetting { ref key, .. } if key == MIN_FREQUENCY));
    }

    #[test]
    fn test_rejects_bad_counts() {
        for (hop_len, time_width) in [(0.0, 200.0), (512.5, 200.0), (512.0, -1.0), (512.0, 0.0)] {
            let err = Settings::load(&source(5.0, 8000.0, hop_len, time_width)).unwrap_err();
            assert!(err.is_config());
        }

        let err = Settings::load(&source(5.0, f64::NAN, 512.0, 200.0)).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_from_toml() {
        let text = r#"
            [spectrogram]
            keep_states = 512
            image_resolution = 512
            min_frequency = 5.0
            max_frequency = 8000
            time_width = 512

            [fft]
            frame_len = 4096
            hop_len = 1024
        "#;

        let settings = Settings::from_toml_str(text, Path::new("config.toml")).unwrap();
        assert_eq!(settings.min_frequency, 5.0);
        assert_eq!(settings.max_frequency, 8000.0);
        assert_eq!(settings.hop_len, 1024);
        assert_eq!(settings.time_width, 512);
        assert_eq!(settings.sample_rate, SAMPLE_RATE);
    }

    #[test]
    fn test_toml_errors_are_config_errors() {
        let err = Settings::from_toml_str("[fft\nhop_len = ", Path::new("broken.toml")).unwrap_err();
        assert!(matches!(err, SonoplotError::ConfigParse { .. }));
        assert!(err.is_config());

        let err = Settings::from_file(Path::new("/definitely/not/here/config.toml")).unwrap_err();
        assert!(matches!(err, SonoplotError::ConfigRead { .. }));
    }
}
