//! Vehicle navigation state consumed by the builder and the synthesizer.

use serde::{Deserialize, Serialize};

use crate::geo::GeoLocation;

/// A vehicle pose/velocity estimate at one instant.
///
/// The absolute position is a reference latitude/longitude (radians)
/// plus a local north/east offset in meters, as navigation filters report
/// it. Use [`NavigationFix::absolute_location`] to compose the two.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NavigationFix {
    /// Milliseconds since the Unix epoch.
    pub timestamp_millis: i64,
    /// Reference latitude in radians.
    pub latitude_rad: f64,
    /// Reference longitude in radians.
    pub longitude_rad: f64,
    /// Offset north of the reference, meters.
    pub x: f64,
    /// Offset east of the reference, meters.
    pub y: f64,
    /// Depth below the surface, meters.
    pub depth: f64,
    /// Altitude above the seabed, meters (0 when unknown).
    pub altitude: f64,
    /// Heading (yaw) in radians, clockwise from north.
    pub psi: f64,
    /// North velocity component, m/s.
    pub vx: f64,
    /// East velocity component, m/s.
    pub vy: f64,
    /// Body-frame forward speed, m/s.
    pub u: f64,
}

impl NavigationFix {
    /// Reference position without the local offset.
    #[must_use]
    pub fn reference_location(&self) -> GeoLocation {
        GeoLocation::new(self.latitude_rad.to_degrees(), self.longitude_rad.to_degrees())
    }

    /// Reference position displaced by the local `(x, y)` offset.
    #[must_use]
    pub fn absolute_location(&self) -> GeoLocation {
        self.reference_location().displaced(self.x, self.y)
    }

    /// Magnitude of the horizontal velocity vector.
    #[must_use]
    pub fn horizontal_speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }

    /// Speed used to size waterfall lines: forward speed when reported,
    /// horizontal ground speed otherwise.
    #[must_use]
    pub fn along_track_speed(&self) -> f64 {
        if self.u.is_finite() && self.u != 0.0 {
            self.u
        } else {
            self.horizontal_speed()
        }
    }

    /// Heading in degrees.
    #[must_use]
    pub fn heading_degs(&self) -> f64 {
        self.psi.to_degrees()
    }
}
