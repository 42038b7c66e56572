use crate::error::{CaptureError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

// ---------------------------------------------------------------------------
// Coord
// ---------------------------------------------------------------------------

/// A pixel coordinate. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Coord {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Coord> for [i32; 2] {
    fn from(c: Coord) -> Self {
        [c.x, c.y]
    }
}

impl Add<Offset> for Coord {
    type Output = Coord;

    /// Saturates at the `i32` bounds; env offsets are unbounded user input.
    fn add(self, off: Offset) -> Coord {
        Coord::new(self.x.saturating_add(off.dx), self.y.saturating_add(off.dy))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Offset
// ---------------------------------------------------------------------------

/// A pixel correction vector. Serialized as `[dx, dy]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub const ZERO: Offset = Offset { dx: 0, dy: 0 };

    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

impl From<[i32; 2]> for Offset {
    fn from([dx, dy]: [i32; 2]) -> Self {
        Self { dx, dy }
    }
}

impl From<Offset> for [i32; 2] {
    fn from(o: Offset) -> Self {
        [o.dx, o.dy]
    }
}

impl Add for Offset {
    type Output = Offset;

    fn add(self, other: Offset) -> Offset {
        Offset::new(self.dx.saturating_add(other.dx), self.dy.saturating_add(other.dy))
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Absolute screen resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: i64,
    pub height: i64,
}

impl Resolution {
    pub const fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(CaptureError::Configuration(format!(
                "invalid resolution {self}: width and height must be positive"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Rescale `coord` from the `from` frame into the `to` frame, independently
/// per axis. Halves round to even.
pub fn scale(coord: Coord, from: Resolution, to: Resolution) -> Result<Coord> {
    from.validate()?;
    to.validate()?;
    Ok(Coord::new(
        scale_axis(coord.x, from.width, to.width),
        scale_axis(coord.y, from.height, to.height),
    ))
}

fn scale_axis(value: i32, from: i64, to: i64) -> i32 {
    (f64::from(value) * to as f64 / from as f64).round_ties_even() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_addition_saturates() {
        let c = Coord::new(i32::MAX - 1, -5) + Offset::new(10, i32::MIN);
        assert_eq!(c, Coord::new(i32::MAX, i32::MIN));

        let o = Offset::new(i32::MAX, i32::MIN) + Offset::new(1, -1);
        assert_eq!(o, Offset::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn scale_is_independent_per_axis() {
        let from = Resolution::new(2772, 1284);
        let to = Resolution::new(1920, 1080);
        let c = scale(Coord::new(2280, 980), from, to).unwrap();
        assert_eq!(c, Coord::new(1579, 824));
    }

    #[test]
    fn scale_rounds_half_to_even() {
        let from = Resolution::new(4, 4);
        let to = Resolution::new(2, 2);
        assert_eq!(scale(Coord::new(1, 3), from, to).unwrap(), Coord::new(0, 2));
        assert_eq!(scale(Coord::new(5, 7), from, to).unwrap(), Coord::new(2, 4));
    }

    #[test]
    fn scale_rejects_non_positive_resolution() {
        let good = Resolution::new(100, 100);
        for bad in [Resolution::new(0, 100), Resolution::new(100, -1)] {
            assert!(matches!(
                scale(Coord::new(1, 1), good, bad),
                Err(CaptureError::Configuration(_))
            ));
            assert!(matches!(
                scale(Coord::new(1, 1), bad, good),
                Err(CaptureError::Configuration(_))
            ));
        }
    }

    #[test]
    fn coord_serializes_as_pair() {
        let json = serde_json::to_string(&Coord::new(3, -4)).unwrap();
        assert_eq!(json, "[3,-4]");
        let back: Coord = serde_json::from_str("[10, 20]").unwrap();
        assert_eq!(back, Coord::new(10, 20));
    }
}
