//! Teleport-target transform.
//!
//! Portal coordinates in route files are captured against a reference
//! screenshot whose resolution and orientation differ from the device. A
//! coordinate is first rescaled between the two absolute resolutions, then
//! (optionally) rotated a quarter turn from portrait into landscape:
//!
//! ```text
//! x_land = y_port
//! y_land = (W - 1) - x_port      W = post-rescale portrait width
//! ```
//!
//! The rotation covers the one orientation mismatch observed so far and is
//! not generalized to other angles.

use crate::error::Result;
use crate::types::{scale, Coord, Resolution};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalTransform {
    pub source: Resolution,
    pub destination: Resolution,
    #[serde(default = "default_rotate")]
    pub rotate: bool,
    /// Portrait width used by the rotation; defaults to the destination height.
    #[serde(default)]
    pub port_width: Option<i64>,
}

fn default_rotate() -> bool {
    true
}

impl Default for PortalTransform {
    fn default() -> Self {
        Self {
            source: Resolution::new(2848, 1276),
            destination: Resolution::new(2720, 1260),
            rotate: default_rotate(),
            port_width: None,
        }
    }
}

impl PortalTransform {
    pub fn rotation_width(&self) -> i64 {
        self.port_width.unwrap_or(self.destination.height)
    }

    pub fn apply(&self, portal: Coord) -> Result<Coord> {
        let rescaled = scale(portal, self.source, self.destination)?;
        if !self.rotate {
            return Ok(rescaled);
        }
        Ok(port_to_land(rescaled, self.rotation_width()))
    }
}

/// Rotate a portrait-frame coordinate into the landscape frame.
pub fn port_to_land(c: Coord, port_width: i64) -> Coord {
    Coord::new(c.y, (port_width - 1 - i64::from(c.x)) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> PortalTransform {
        PortalTransform {
            source: Resolution::new(2848, 1276),
            destination: Resolution::new(2772, 1272),
            rotate: true,
            port_width: Some(1272),
        }
    }

    #[test]
    fn rescale_fixture() {
        let t = PortalTransform {
            rotate: false,
            ..fixture()
        };
        assert_eq!(t.apply(Coord::new(100, 50)).unwrap(), Coord::new(97, 50));
    }

    #[test]
    fn rescale_then_rotate_fixture() {
        assert_eq!(
            fixture().apply(Coord::new(100, 50)).unwrap(),
            Coord::new(50, 1174)
        );
    }

    #[test]
    fn rotation_width_defaults_to_destination_height() {
        let t = PortalTransform {
            port_width: None,
            ..fixture()
        };
        assert_eq!(t.rotation_width(), 1272);
        assert_eq!(t.apply(Coord::new(100, 50)).unwrap(), Coord::new(50, 1174));
    }

    #[test]
    fn rotation_is_applied_after_rescale() {
        // Rotating first would have used the unscaled x (100) → y = 1171.
        let c = fixture().apply(Coord::new(100, 50)).unwrap();
        assert_ne!(c.y, 1272 - 1 - 100);
    }

    #[test]
    fn port_to_land_maps_corners() {
        assert_eq!(port_to_land(Coord::new(0, 0), 1260), Coord::new(0, 1259));
        assert_eq!(port_to_land(Coord::new(1259, 2719), 1260), Coord::new(2719, 0));
    }
}
