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

use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum SonoplotError {
    #[error("setting `{0}` is missing")]
    MissingSetting(String),

    #[error("setting `{key}` is invalid: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("could not read settings from {}: {source}", path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("could not parse settings in {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("bitmap {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("could not decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: png::DecodingError,
    },

    #[error("could not encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: png::EncodingError,
    },

    #[error("unsupported bitmap {}: {reason}", path.display())]
    UnsupportedBitmap { path: PathBuf, reason: String },

    #[error("{value} is outside the domain of the {scale} frequency transform")]
    Domain { scale: &'static str, value: f64 },

    #[error("could not resize {}x{} pixels to {}x{}: {source}", from.0, from.1, to.0, to.1)]
    Resize {
        from: (usize, usize),
        to: (usize, usize),
        source: resize::Error,
    },

    #[error("drawing the {stage} failed: {source}")]
    Draw {
        stage: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("could not draw {}: {source}", path.display())]
    Render {
        path: PathBuf,
        source: Box<SonoplotError>,
    },

    #[error("the bundled label font could not be registered")]
    Font,
}

impl SonoplotError {
    /// Settings errors abort a run before anything is rendered.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            SonoplotError::MissingSetting(_)
                | SonoplotError::InvalidSetting { .. }
                | SonoplotError::ConfigRead { .. }
                | SonoplotError::ConfigParse { .. }
        )
    }

    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        SonoplotError::InvalidSetting {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
