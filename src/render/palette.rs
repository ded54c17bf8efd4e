//! Fixed color scales.

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

const VIRIDIS: [(u8, u8, u8); 5] = [
    (0x44, 0x01, 0x54),
    (0x3b, 0x52, 0x8b),
    (0x21, 0x91, 0x8c),
    (0x5e, 0xc9, 0x62),
    (0xfd, 0xe7, 0x25),
];

const SPECTRAL_R: [(u8, u8, u8); 11] = [
    (0x5e, 0x4f, 0xa2),
    (0x32, 0x88, 0xbd),
    (0x66, 0xc2, 0xa5),
    (0xab, 0xdd, 0xa4),
    (0xe6, 0xf5, 0x98),
    (0xff, 0xff, 0xbf),
    (0xfe, 0xe0, 0x8b),
    (0xfd, 0xae, 0x61),
    (0xf4, 0x6d, 0x43),
    (0xd5, 0x3e, 0x4f),
    (0x9e, 0x01, 0x42),
];

/// Color scale of a heatmap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Palette {
    /// Sequential dark purple → yellow.
    #[default]
    Viridis,
    /// Diverging blue → yellow → red.
    SpectralR,
}

impl Palette {
    fn stops(&self) -> &'static [(u8, u8, u8)] {
        match self {
            Palette::Viridis => &VIRIDIS,
            Palette::SpectralR => &SPECTRAL_R,
        }
    }

    /// Color at `t` in `[0, 1]`, linearly interpolated between anchor stops.
    /// Out-of-range and NaN inputs clamp to the low end.
    pub fn color(&self, t: f64) -> RGBColor {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let scaled = t * (stops.len() - 1) as f64;
        let lo = (scaled.floor() as usize).min(stops.len() - 2);
        let frac = scaled - lo as f64;

        let (r0, g0, b0) = stops[lo];
        let (r1, g1, b1) = stops[lo + 1];
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }
}

/// Relative luminance in `[0, 1]`, used to pick a readable text color.
pub(crate) fn luminance(color: &RGBColor) -> f64 {
    let RGBColor(r, g, b) = *color;
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(Palette::Viridis.color(0.0), RGBColor(0x44, 0x01, 0x54));
        assert_eq!(Palette::Viridis.color(1.0), RGBColor(0xfd, 0xe7, 0x25));
        assert_eq!(Palette::SpectralR.color(0.0), RGBColor(0x5e, 0x4f, 0xa2));
        assert_eq!(Palette::SpectralR.color(1.0), RGBColor(0x9e, 0x01, 0x42));
        assert_eq!(Palette::SpectralR.color(0.5), RGBColor(0xff, 0xff, 0xbf));
    }

    #[test]
    fn test_clamps() {
        assert_eq!(Palette::Viridis.color(-3.0), Palette::Viridis.color(0.0));
        assert_eq!(Palette::Viridis.color(7.0), Palette::Viridis.color(1.0));
        assert_eq!(Palette::Viridis.color(f64::NAN), Palette::Viridis.color(0.0));
    }

    #[test]
    fn test_viridis_is_brighter_at_top() {
        assert!(luminance(&Palette::Viridis.color(1.0)) > luminance(&Palette::Viridis.color(0.0)));
    }
}
