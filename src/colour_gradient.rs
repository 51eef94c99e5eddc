/*
 * Copyright (C) Simon Werner, 2019
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

/// Lower end of the displayed magnitude range (dB).
pub const MAGNITUDE_MIN: f32 = 0.0;
/// Upper end of the displayed magnitude range (dB).
pub const MAGNITUDE_MAX: f32 = 50.0;

/// Colours required for a PNG file, includes the alpha channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RGBAColour {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl RGBAColour {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        vec![self.r, self.g, self.b, self.a]
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

// Nine evenly spaced samples of the magma colour map.
const MAGMA: [RGBAColour; 9] = [
    RGBAColour::new(0, 0, 4, 255),
    RGBAColour::new(28, 16, 68, 255),
    RGBAColour::new(79, 18, 123, 255),
    RGBAColour::new(129, 37, 129, 255),
    RGBAColour::new(181, 54, 122, 255),
    RGBAColour::new(229, 80, 100, 255),
    RGBAColour::new(251, 135, 97, 255),
    RGBAColour::new(254, 194, 135, 255),
    RGBAColour::new(252, 253, 191, 255),
];

/// ColourGradient maps a magnitude onto a colour by interpolating
/// between evenly spaced colour stops.
#[derive(Clone, Debug)]
pub struct ColourGradient {
    colours: Vec<RGBAColour>,
    min: f32,
    max: f32,
}

impl ColourGradient {
    ///
    /// The magma palette over the fixed magnitude range, used for every
    /// plot so colours are comparable between outputs.
    ///
    pub fn magma() -> Self {
        Self {
            colours: MAGMA.to_vec(),
            min: MAGNITUDE_MIN,
            max: MAGNITUDE_MAX,
        }
    }

    pub fn get_colour(&self, value: f32) -> RGBAColour {
        if value.is_nan() || value <= self.min {
            return self.colours[0];
        }
        if value >= self.max {
            return self.colours[self.colours.len() - 1];
        }

        // Position along the stops, e.g. 2.5 is half way between stop 2 and 3
        let scaled = (value - self.min) / (self.max - self.min) * (self.colours.len() - 1) as f32;
        let i = (scaled.floor() as usize).min(self.colours.len() - 2);
        let ratio = scaled - i as f32;

        let first = self.colours[i];
        let second = self.colours[i + 1];

        RGBAColour {
            r: self.interpolate(first.r, second.r, ratio),
            g: self.interpolate(first.g, second.g, ratio),
            b: self.interpolate(first.b, second.b, ratio),
            a: 255,
        }
    }

    fn interpolate(&self, start: u8, finish: u8, ratio: f32) -> u8 {
        ((f32::from(finish) - f32::from(start)) * ratio + start as f32).round() as u8
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }
}

impl Default for ColourGradient {
    fn default() -> Self {
        Self::magma()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magma_range() {
        let gradient = ColourGradient::magma();
        assert_eq!(gradient.min(), 0.0);
        assert_eq!(gradient.max(), 50.0);

        assert_eq!(gradient.get_colour(0.0), MAGMA[0]);
        assert_eq!(gradient.get_colour(50.0), MAGMA[8]);
        assert_eq!(gradient.get_colour(25.0), MAGMA[4]);
    }

    #[test]
    fn test_out_of_range_clamps() {
        let gradient = ColourGradient::magma();
        assert_eq!(gradient.get_colour(-10.0), MAGMA[0]);
        assert_eq!(gradient.get_colour(f32::NAN), MAGMA[0]);
        assert_eq!(gradient.get_colour(120.0), MAGMA[8]);
    }

    #[test]
    fn test_interpolates_between_stops() {
        let gradient = ColourGradient::magma();
        // Half way between the first two of eight intervals
        assert_eq!(gradient.get_colour(3.125).rgb(), (14, 8, 36));
        assert_eq!(gradient.get_colour(3.125).to_vec(), vec![14, 8, 36, 255]);
    }

    #[test]
    fn test_brightness_increases() {
        let gradient = ColourGradient::magma();
        let luma = |v: f32| {
            let (r, g, b) = gradient.get_colour(v).rgb();
            r as u32 + g as u32 + b as u32
        };
        let mut last = luma(0.0);
        for step in 1..=50 {
            let next = luma(step as f32);
            assert!(next >= last, "magnitude {} got darker", step);
            last = next;
        }
    }
}
