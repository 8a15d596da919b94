//! Pixel-to-ground geolocation for synthesized lines.
//!
//! Pixel `x` of a line of width `w` lies `x * 2r / w - r` meters across
//! track (negative to port). The across-track offset is rotated by the
//! vehicle heading and added to the fix's local offset before displacing
//! the fix's reference position.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use sidescan_error::{Result, SidescanError};
use sidescan_types::GeoLocation;

use crate::synth::SynthesizedLine;

/// A pixel resolved to the seabed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SidescanPoint {
    /// Sample index under the pixel.
    pub index: usize,
    /// Signed across-track distance in meters, negative to port.
    pub distance: f64,
    pub location: GeoLocation,
}

fn validate(line: &SynthesizedLine, pixel_x: f64) -> Result<()> {
    if line.width == 0 {
        return Err(SidescanError::invalid_line("zero width"));
    }
    if !line.range.is_finite() || line.range <= 0.0 {
        return Err(SidescanError::invalid_line(format!("range {}", line.range)));
    }
    if !pixel_x.is_finite() {
        return Err(SidescanError::invalid_line(format!("pixel x {pixel_x}")));
    }
    let fix = &line.fix;
    let finite = [fix.latitude_rad, fix.longitude_rad, fix.x, fix.y, fix.psi]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        return Err(SidescanError::invalid_line("non-finite navigation fix"));
    }
    Ok(())
}

/// Signed slant distance of `pixel_x` from the track.
fn slant_distance(line: &SynthesizedLine, pixel_x: f64) -> f64 {
    pixel_x * (2.0 * line.range / line.width as f64) - line.range
}

/// Ground distance from slant distance by removing the altitude; zero
/// inside the water column.
fn ground_distance(slant: f64, altitude: f64) -> f64 {
    let squared = slant * slant - altitude * altitude;
    if squared > 0.0 {
        slant.signum() * squared.sqrt()
    } else {
        0.0
    }
}

fn location_at(line: &SynthesizedLine, pixel_x: f64, distance: f64) -> GeoLocation {
    let port = pixel_x < line.width as f64 / 2.0;
    let angle = -line.fix.psi + if port { PI } else { 0.0 };
    let north = distance.abs() * angle.sin();
    let east = distance.abs() * angle.cos();
    line.fix
        .reference_location()
        .displaced(line.fix.x + north, line.fix.y + east)
}

/// Geographic position of pixel column `pixel_x` on `line`.
pub fn locate(line: &SynthesizedLine, pixel_x: f64) -> Result<GeoLocation> {
    validate(line, pixel_x)?;
    Ok(location_at(line, pixel_x, slant_distance(line, pixel_x)))
}

/// Resolve pixel column `pixel_x`, optionally correcting slant range to
/// ground range with the fix's altitude.
pub fn locate_point(
    line: &SynthesizedLine,
    pixel_x: f64,
    slant_corrected: bool,
) -> Result<SidescanPoint> {
    validate(line, pixel_x)?;
    let slant = slant_distance(line, pixel_x);
    let distance = if slant_corrected {
        ground_distance(slant, line.fix.altitude)
    } else {
        slant
    };
    let index = ((pixel_x.max(0.0) * line.sample_count as f64 / line.width as f64) as usize)
        .min(line.sample_count.saturating_sub(1));
    Ok(SidescanPoint {
        index,
        distance,
        location: location_at(line, pixel_x, distance),
    })
}

/// Ground distance in meters between a pixel on one line and a pixel on
/// another, both slant-range corrected.
pub fn horizontal_distance(
    line1: &SynthesizedLine,
    pixel_x1: f64,
    line2: &SynthesizedLine,
    pixel_x2: f64,
) -> Result<f64> {
    let a = locate_point(line1, pixel_x1, true)?;
    let b = locate_point(line2, pixel_x2, true)?;
    Ok(a.location.horizontal_distance(b.location))
}

/// Height of an object from the two ends of its acoustic shadow on one
/// line: `shadow length * altitude / distance of the far end`.
pub fn shadow_height(line: &SynthesizedLine, pixel_x1: f64, pixel_x2: f64) -> Result<f64> {
    validate(line, pixel_x1)?;
    validate(line, pixel_x2)?;
    let p1 = slant_distance(line, pixel_x1);
    let p2 = slant_distance(line, pixel_x2);
    let far = p1.max(p2).abs();
    if far == 0.0 {
        return Err(SidescanError::invalid_line("shadow ends at nadir"));
    }
    Ok((p2 - p1).abs() * line.fix.altitude / far)
}
