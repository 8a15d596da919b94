//! WGS-84 local-tangent-plane helpers.
//!
//! Positions are displaced in a north/east/down frame anchored at a
//! reference latitude/longitude, going through ECEF coordinates.

use serde::{Deserialize, Serialize};

/// WGS-84 semi-major axis in meters.
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 first eccentricity squared.
pub const WGS84_E2: f64 = 0.006_694_379_990_13;

const GEODETIC_HAE_TOLERANCE: f64 = 1e-4;
const GEODETIC_MAX_ITERATIONS: usize = 32;

/// An absolute position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude_degs: f64,
    pub longitude_degs: f64,
}

impl GeoLocation {
    #[must_use]
    pub const fn new(latitude_degs: f64, longitude_degs: f64) -> Self {
        Self {
            latitude_degs,
            longitude_degs,
        }
    }

    /// Move this location by `north`/`east` meters.
    #[must_use]
    pub fn displaced(self, north: f64, east: f64) -> Self {
        let (latitude_degs, longitude_degs, _) =
            wgs84_displace(self.latitude_degs, self.longitude_degs, 0.0, north, east, 0.0);
        Self {
            latitude_degs,
            longitude_degs,
        }
    }

    /// North/east offset in meters from `self` to `other`.
    #[must_use]
    pub fn offset_to(self, other: Self) -> (f64, f64) {
        let (north, east, _) = wgs84_displacement(
            self.latitude_degs,
            self.longitude_degs,
            0.0,
            other.latitude_degs,
            other.longitude_degs,
            0.0,
        );
        (north, east)
    }

    /// Horizontal distance in meters to `other`.
    #[must_use]
    pub fn horizontal_distance(self, other: Self) -> f64 {
        let (north, east) = self.offset_to(other);
        north.hypot(east)
    }

    /// Whether both coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.latitude_degs.is_finite() && self.longitude_degs.is_finite()
    }
}

fn to_ecef(latitude_degs: f64, longitude_degs: f64, depth: f64) -> [f64; 3] {
    let lat = latitude_degs.to_radians();
    let lon = longitude_degs.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    let rn = prime_vertical_radius(sin_lat);
    [
        (rn - depth) * cos_lat * cos_lon,
        (rn - depth) * cos_lat * sin_lon,
        ((1.0 - WGS84_E2) * rn - depth) * sin_lat,
    ]
}

fn prime_vertical_radius(sin_lat: f64) -> f64 {
    WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt()
}

/// ECEF to (latitude degs, longitude degs, height above ellipsoid).
fn to_geodetic(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let p = x.hypot(y);
    let lon = y.atan2(x);
    let mut lat = (z / p).atan2(0.01);
    let mut n = prime_vertical_radius(lat.sin());
    let mut hae = p / lat.cos() - n;
    let mut old_hae = -1e-9;
    let num = z / p;

    let mut iterations = 0;
    while (hae - old_hae).abs() > GEODETIC_HAE_TOLERANCE && iterations < GEODETIC_MAX_ITERATIONS {
        old_hae = hae;
        let den = 1.0 - WGS84_E2 * n / (n + hae);
        lat = num.atan2(den);
        n = prime_vertical_radius(lat.sin());
        hae = p / lat.cos() - n;
        iterations += 1;
    }

    (lat.to_degrees(), lon.to_degrees(), hae)
}

/// Displace a reference position by `(north, east, down)` meters.
///
/// Returns `(latitude_degs, longitude_degs, depth)`.
#[must_use]
pub fn wgs84_displace(
    latitude_degs: f64,
    longitude_degs: f64,
    depth: f64,
    north: f64,
    east: f64,
    down: f64,
) -> (f64, f64, f64) {
    let mut xyz = to_ecef(latitude_degs, longitude_degs, depth);
    // Geocentric latitude.
    let phi = xyz[2].atan2(xyz[0].hypot(xyz[1]));
    let (slon, clon) = longitude_degs.to_radians().sin_cos();
    let (sphi, cphi) = phi.sin_cos();

    // NED, so some signs are flipped with respect to the ENU formula.
    xyz[0] += -slon * east - clon * sphi * north - clon * cphi * down;
    xyz[1] += clon * east - slon * sphi * north - slon * cphi * down;
    xyz[2] += cphi * north - sphi * down;

    let (lat, lon, _) = to_geodetic(xyz[0], xyz[1], xyz[2]);
    (lat, lon, depth + down)
}

/// North/east/down displacement in meters from the first position to the second.
#[must_use]
pub fn wgs84_displacement(
    latitude_degs1: f64,
    longitude_degs1: f64,
    depth1: f64,
    latitude_degs2: f64,
    longitude_degs2: f64,
    depth2: f64,
) -> (f64, f64, f64) {
    let a = to_ecef(latitude_degs1, longitude_degs1, depth1);
    let b = to_ecef(latitude_degs2, longitude_degs2, depth2);
    let (ox, oy, oz) = (b[0] - a[0], b[1] - a[1], b[2] - a[2]);

    let (slat, clat) = latitude_degs1.to_radians().sin_cos();
    let (slon, clon) = longitude_degs1.to_radians().sin_cos();

    let north = -slat * clon * ox - slat * slon * oy + clat * oz;
    let east = -slon * ox + clon * oy;
    (north, east, depth1 - depth2)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEIXOES: GeoLocation = GeoLocation::new(41.185_242, -8.706_333);

    #[test]
    fn test_zero_displacement_is_identity() {
        let moved = LEIXOES.displaced(0.0, 0.0);
        assert!((moved.latitude_degs - LEIXOES.latitude_degs).abs() < 1e-7);
        assert!((moved.longitude_degs - LEIXOES.longitude_degs).abs() < 1e-9);
    }

    #[test]
    fn test_north_displacement_increases_latitude() {
        let moved = LEIXOES.displaced(100.0, 0.0);
        assert!(moved.latitude_degs > LEIXOES.latitude_degs);
        assert!((moved.longitude_degs - LEIXOES.longitude_degs).abs() < 1e-7);
        // Roughly 111 km per degree of latitude.
        let delta_m = (moved.latitude_degs - LEIXOES.latitude_degs) * 111_000.0;
        assert!((delta_m - 100.0).abs() < 1.0, "delta_m={delta_m}");
    }

    #[test]
    fn test_east_displacement_increases_longitude() {
        let moved = LEIXOES.displaced(0.0, 50.0);
        assert!(moved.longitude_degs > LEIXOES.longitude_degs);
    }

    #[test]
    fn test_displacement_inverts_displace() {
        let moved = LEIXOES.displaced(-35.0, 72.0);
        let (north, east) = LEIXOES.offset_to(moved);
        assert!((north + 35.0).abs() < 0.01, "north={north}");
        assert!((east - 72.0).abs() < 0.01, "east={east}");
        assert!((LEIXOES.horizontal_distance(moved) - 35.0_f64.hypot(72.0)).abs() < 0.01);
    }

    #[test]
    fn test_down_component() {
        let (_, _, depth) = wgs84_displace(10.0, 10.0, 2.0, 0.0, 0.0, 3.0);
        assert!((depth - 5.0).abs() < 1e-12);
        let (_, _, down) = wgs84_displacement(10.0, 10.0, 2.0, 10.0, 10.0, 5.0);
        assert!((down + 3.0).abs() < 1e-12);
    }
}
