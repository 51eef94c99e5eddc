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

//! Source spectrogram bitmaps.
//!
//! A bitmap is the analyser's rendered spectrogram: one pixel row per
//! frequency bin (highest frequency at the top) and one column per hop.
//! It is only ever read, its pixel grid is taken as is.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use resize::Pixel::RGB8;
use resize::Type::Lanczos3;
use rgb::FromSlice;

use crate::colour_gradient::ColourGradient;
use crate::errors::SonoplotError;

/// Pixel layout of a decoded bitmap, always 8 bits per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channels {
    Grey,
    GreyAlpha,
    Rgb,
    Rgba,
}

impl Channels {
    pub fn count(self) -> usize {
        match self {
            Channels::Grey => 1,
            Channels::GreyAlpha => 2,
            Channels::Rgb => 3,
            Channels::Rgba => 4,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Bitmap {
    path: PathBuf,
    width: usize,
    height: usize,
    channels: Channels,
    data: Vec<u8>,
}

impl Bitmap {
    ///
    /// Decode a PNG bitmap.  Palette, low bit depth and 16-bit images are
    /// normalised to 8 bits per channel.
    ///
    /// # Arguments
    ///
    ///  * `path` - The PNG to read.
    ///
    pub fn open(path: &Path) -> Result<Self, SonoplotError> {
        let file = File::open(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => SonoplotError::NotFound(path.to_path_buf()),
            _ => SonoplotError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let decode_err = |source| SonoplotError::Decode {
            path: path.to_path_buf(),
            source,
        };

        let mut decoder = png::Decoder::new(BufReader::new(file));
        decoder.set_transformations(png::Transformations::normalize_to_color8());
        let mut reader = decoder.read_info().map_err(decode_err)?;

        let mut data = vec![0u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut data).map_err(decode_err)?;
        data.truncate(info.buffer_size());

        let channels = match info.color_type {
            png::ColorType::Grayscale => Channels::Grey,
            png::ColorType::GrayscaleAlpha => Channels::GreyAlpha,
            png::ColorType::Rgb => Channels::Rgb,
            png::ColorType::Rgba => Channels::Rgba,
            png::ColorType::Indexed => {
                return Err(SonoplotError::UnsupportedBitmap {
                    path: path.to_path_buf(),
                    reason: "indexed colour was not expanded".to_string(),
                })
            }
        };

        Bitmap::from_raw(
            path,
            info.width as usize,
            info.height as usize,
            channels,
            data,
        )
    }

    ///
    /// Wrap pixel data that is already in memory.  Rows are stored top to
    /// bottom without padding.
    ///
    pub fn from_raw(
        path: &Path,
        width: usize,
        height: usize,
        channels: Channels,
        data: Vec<u8>,
    ) -> Result<Self, SonoplotError> {
        let unsupported = |reason: String| SonoplotError::UnsupportedBitmap {
            path: path.to_path_buf(),
            reason,
        };

        if width == 0 || height == 0 {
            return Err(unsupported(format!("{}x{} has no pixels", width, height)));
        }
        if data.len() != width * height * channels.count() {
            return Err(unsupported(format!(
                "{} bytes do not make a {}x{} {:?} image",
                data.len(),
                width,
                height,
                channels
            )));
        }

        Ok(Bitmap {
            path: path.to_path_buf(),
            width,
            height,
            channels,
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    ///
    /// Convert to display-ready RGB8.  Colour pixels are already mapped
    /// by the analyser and are kept, alpha is composited onto white.  Grey
    /// levels are read as magnitudes, `255` being the top of the
    /// gradient's range, and are mapped through `gradient`.
    ///
    pub fn to_rgb(&self, gradient: &ColourGradient) -> Vec<u8> {
        let span = gradient.max() - gradient.min();
        let grey = |level: u8| {
            let magnitude = gradient.min() + f32::from(level) / 255.0 * span;
            gradient.get_colour(magnitude).rgb()
        };

        let mut rgb = Vec::with_capacity(self.width * self.height * 3);
        for px in self.data.chunks_exact(self.channels.count()) {
            let (r, g, b, a) = match self.channels {
                Channels::Grey => {
                    let (r, g, b) = grey(px[0]);
                    (r, g, b, 255)
                }
                Channels::GreyAlpha => {
                    let (r, g, b) = grey(px[0]);
                    (r, g, b, px[1])
                }
                Channels::Rgb => (px[0], px[1], px[2], 255),
                Channels::Rgba => (px[0], px[1], px[2], px[3]),
            };
            rgb.extend_from_slice(&[over_white(r, a), over_white(g, a), over_white(b, a)]);
        }
        rgb
    }
}

fn over_white(value: u8, alpha: u8) -> u8 {
    if alpha == 255 {
        return value;
    }
    let a = f32::from(alpha) / 255.0;
    (f32::from(value) * a + 255.0 * (1.0 - a)).round() as u8
}

///
/// Stretch an RGB8 buffer to exactly `dst_w` x `dst_h` pixels, each axis
/// scaled on its own.
///
pub fn stretch_rgb(
    src: &[u8],
    (src_w, src_h): (usize, usize),
    (dst_w, dst_h): (usize, usize),
) -> Result<Vec<u8>, SonoplotError> {
    if (src_w, src_h) == (dst_w, dst_h) {
        return Ok(src.to_vec());
    }

    let resize_err = |source| SonoplotError::Resize {
        from: (src_w, src_h),
        to: (dst_w, dst_h),
        source,
    };

    let mut dst = vec![0u8; dst_w * dst_h * 3];
    let mut resizer =
        resize::new(src_w, src_h, dst_w, dst_h, RGB8, Lanczos3).map_err(resize_err)?;
    resizer
        .resize(src.as_rgb(), dst.as_rgb_mut())
        .map_err(resize_err)?;
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::BufWriter;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sonoplot-bitmap-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join("bitmap.png")
    }

    fn write_png(path: &Path, width: u32, height: u32, colour: png::ColorType, data: &[u8]) {
        let w = BufWriter::new(File::create(path).unwrap());
        let mut encoder = png::Encoder::new(w, width, height);
        encoder.set_color(colour);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
    }

    #[test]
    fn test_open_rgb() {
        let path = scratch("rgb");
        let data: Vec<u8> = (0..4 * 2 * 3).map(|i| i as u8 * 10).collect();
        write_png(&path, 4, 2, png::ColorType::Rgb, &data);

        let bitmap = Bitmap::open(&path).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (4, 2));
        assert_eq!(bitmap.channels(), Channels::Rgb);
        assert_eq!(bitmap.to_rgb(&ColourGradient::magma()), data);
    }

    #[test]
    fn test_grey_maps_through_gradient() {
        let path = scratch("grey");
        write_png(&path, 2, 1, png::ColorType::Grayscale, &[0, 255]);

        let bitmap = Bitmap::open(&path).unwrap();
        let gradient = ColourGradient::magma();
        let rgb = bitmap.to_rgb(&gradient);

        let (r0, g0, b0) = gradient.get_colour(0.0).rgb();
        let (r1, g1, b1) = gradient.get_colour(50.0).rgb();
        assert_eq!(rgb, vec![r0, g0, b0, r1, g1, b1]);
    }

    #[test]
    fn test_alpha_composites_on_white() {
        let bitmap = Bitmap::from_raw(
            Path::new("mem"),
            2,
            1,
            Channels::Rgba,
            vec![0, 0, 0, 0, 10, 20, 30, 255],
        )
        .unwrap();
        assert_eq!(
            bitmap.to_rgb(&ColourGradient::magma()),
            vec![255, 255, 255, 10, 20, 30]
        );
    }

    #[test]
    fn test_missing_and_corrupt() {
        let missing = Path::new("/no/such/dir/spectrogram.png");
        assert!(matches!(
            Bitmap::open(missing),
            Err(SonoplotError::NotFound(ref p)) if p == missing
        ));

        let path = scratch("corrupt");
        fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(
            Bitmap::open(&path),
            Err(SonoplotError::Decode { .. })
        ));
    }

    #[test]
    fn test_from_raw_checks_size() {
        assert!(Bitmap::from_raw(Path::new("mem"), 0, 3, Channels::Grey, vec![]).is_err());
        assert!(Bitmap::from_raw(Path::new("mem"), 2, 2, Channels::Rgb, vec![0; 11]).is_err());
    }

    #[test]
    fn test_stretch_to_plot_size() {
        let src = vec![128u8; 4 * 2 * 3];
        let dst = stretch_rgb(&src, (4, 2), (10, 7)).unwrap();
        assert_eq!(dst.len(), 10 * 7 * 3);
        // A flat image stays flat
        assert!(dst.iter().all(|&v| (v as i32 - 128).abs() <= 1));

        assert_eq!(stretch_rgb(&src, (4, 2), (4, 2)).unwrap(), src);

        let err = stretch_rgb(&src, (4, 2), (0, 7)).unwrap_err();
        assert!(matches!(
            err,
            SonoplotError::Resize {
                from: (4, 2),
                to: (0, 7),
                source: resize::Error::InvalidParameters,
            }
        ));
    }
}
