//! Intensity-to-colour lookup.

use serde::{Deserialize, Serialize};
use sidescan_error::{Result, SidescanError};

/// An 8-bit RGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub const fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }
}

/// Maps a normalized intensity to a colour.
///
/// Inputs outside `[0, 1]` are clamped; NaN reads as 0.
pub trait Colormap {
    fn color_for(&self, normalized: f64) -> Rgb;
}

impl<F: Fn(f64) -> Rgb> Colormap for F {
    fn color_for(&self, normalized: f64) -> Rgb {
        self(clamp_unit(normalized))
    }
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

fn channel(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Black to white.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grayscale;

impl Colormap for Grayscale {
    fn color_for(&self, normalized: f64) -> Rgb {
        Rgb::gray(channel(clamp_unit(normalized)))
    }
}

/// Linear interpolation between colour stops placed on `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedColormap {
    stops: Vec<(f64, Rgb)>,
}

impl InterpolatedColormap {
    /// Stops must be non-empty, finite, inside `[0, 1]`, and in ascending
    /// position order.
    pub fn new(stops: Vec<(f64, Rgb)>) -> Result<Self> {
        if stops.is_empty() {
            return Err(SidescanError::OutOfRange {
                what: "colormap stop count".to_owned(),
                value: "0".to_owned(),
            });
        }
        for (position, _) in &stops {
            if !position.is_finite() || !(0.0..=1.0).contains(position) {
                return Err(SidescanError::OutOfRange {
                    what: "colormap stop position".to_owned(),
                    value: position.to_string(),
                });
            }
        }
        if stops.windows(2).any(|pair| pair[0].0 > pair[1].0) {
            return Err(SidescanError::OutOfRange {
                what: "colormap stop order".to_owned(),
                value: "positions must ascend".to_owned(),
            });
        }
        Ok(Self { stops })
    }

    /// Copper-toned ramp commonly used for sidescan waterfalls.
    #[must_use]
    pub fn bronze() -> Self {
        Self {
            stops: vec![
                (0.0, Rgb::BLACK),
                (0.4, Rgb::new(128, 70, 27)),
                (0.8, Rgb::new(230, 180, 90)),
                (1.0, Rgb::WHITE),
            ],
        }
    }

    #[must_use]
    pub fn stops(&self) -> &[(f64, Rgb)] {
        &self.stops
    }
}

impl Colormap for InterpolatedColormap {
    fn color_for(&self, normalized: f64) -> Rgb {
        let value = clamp_unit(normalized);
        let upper = self.stops.partition_point(|(position, _)| *position < value);
        let Some(&(hi_pos, hi)) = self.stops.get(upper) else {
            return self.stops.last().map_or(Rgb::BLACK, |(_, color)| *color);
        };
        if upper == 0 {
            return hi;
        }
        let (lo_pos, lo) = self.stops[upper - 1];
        let span = hi_pos - lo_pos;
        if span <= 0.0 {
            return hi;
        }
        let t = (value - lo_pos) / span;
        let mix = |a: u8, b: u8| {
            (f64::from(a) + (f64::from(b) - f64::from(a)) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgb::new(mix(lo.r, hi.r), mix(lo.g, hi.g), mix(lo.b, hi.b))
    }
}
