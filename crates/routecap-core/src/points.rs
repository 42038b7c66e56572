//! Named touch points and per-device coordinate resolution.
//!
//! Every point is declared once at the reference resolution. Resolving a
//! catalog for a device scales each point into the device frame and then
//! applies offsets from coarse to fine:
//!
//! ```text
//! GLOBAL  →  group tags (declaration order)  →  point name
//! ```
//!
//! For each key the static offset (if present) is added, then the
//! environment offset (when enabled). Both apply; neither overwrites.

use crate::error::{CaptureError, Result};
use crate::offsets::{OffsetMap, GLOBAL_KEY};
use crate::types::{scale, Coord, Offset, Resolution};
use serde::Serialize;
use std::collections::BTreeMap;

/// Resolution the standard catalog was captured at.
pub const BASE_RESOLUTION: Resolution = Resolution::new(2772, 1284);

// name, base (x, y), group tags
const STANDARD_POINTS: &[(&str, (i32, i32), &[&str])] = &[
    ("MOVE_START", (523, 800), &["MOVE"]),
    ("MOVE_END", (523, 700), &["MOVE"]),
    ("ATTACK", (2280, 980), &["ATTACK"]),
    ("JUMP", (2510, 830), &["JUMP"]),
    ("SPRINT", (2500, 1125), &["SPRINT"]),
    ("UTIL", (2060, 1120), &["UTIL"]),
    ("TURN_180_L", (550, 300), &["TURN", "TURN_180"]),
    ("TURN_180_R", (1766, 300), &["TURN", "TURN_180"]),
    ("TURN_90_R_L", (550, 300), &["TURN", "TURN_90_R"]),
    ("TURN_90_R_R", (1158, 300), &["TURN", "TURN_90_R"]),
    ("TURN_90_L_L", (1158, 300), &["TURN", "TURN_90_L"]),
    ("TURN_90_L_R", (500, 300), &["TURN", "TURN_90_L"]),
    ("TURN_45_R_L", (550, 300), &["TURN", "TURN_45_R"]),
    ("TURN_45_R_R", (854, 300), &["TURN", "TURN_45_R"]),
    ("TURN_45_L_L", (854, 300), &["TURN", "TURN_45_L"]),
    ("TURN_45_L_R", (550, 300), &["TURN", "TURN_45_L"]),
    ("TURN_30_R_L", (550, 300), &["TURN", "TURN_30_R"]),
    ("TURN_30_R_R", (753, 300), &["TURN", "TURN_30_R"]),
    ("TURN_30_L_L", (753, 300), &["TURN", "TURN_30_L"]),
    ("TURN_30_L_R", (550, 300), &["TURN", "TURN_30_L"]),
    ("TURN_135_R_L", (550, 300), &["TURN", "TURN_135_R"]),
    ("TURN_135_R_R", (1462, 300), &["TURN", "TURN_135_R"]),
    ("TURN_135_L_L", (1462, 300), &["TURN", "TURN_135_L"]),
    ("TURN_135_L_R", (550, 300), &["TURN", "TURN_135_L"]),
    ("OPEN_MAP", (400, 200), &["OPEN_MAP"]),
    ("CONFIRM_TELEPORT", (2450, 1180), &["CONFIRM_TELEPORT"]),
    ("ADJUST_GAME_TIME_P1", (175, 60), &["ADJUST_GAME_TIME"]),
    ("ADJUST_GAME_TIME_P2", (165, 870), &["ADJUST_GAME_TIME"]),
    ("ADJUST_GAME_TIME_S1", (2025, 535), &["ADJUST_GAME_TIME"]),
    ("ADJUST_GAME_TIME_S2", (2025, 635), &["ADJUST_GAME_TIME"]),
    ("ADJUST_GAME_TIME_S3", (1885, 635), &["ADJUST_GAME_TIME"]),
    ("ADJUST_GAME_TIME_S4", (1885, 565), &["ADJUST_GAME_TIME"]),
    ("ADJUST_GAME_TIME_S5", (1985, 565), &["ADJUST_GAME_TIME"]),
    ("ADJUST_GAME_TIME_P3", (2000, 1175), &["ADJUST_GAME_TIME"]),
    ("ADJUST_GAME_TIME_P4", (165, 90), &["ADJUST_GAME_TIME"]),
];

// ---------------------------------------------------------------------------
// CatalogPoint / PointCatalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPoint {
    pub name: String,
    pub base: Coord,
    /// Offset keys between `GLOBAL` and the point name, coarse to fine.
    pub groups: Vec<String>,
}

impl CatalogPoint {
    pub fn new(name: impl Into<String>, base: Coord, groups: &[&str]) -> Self {
        Self {
            name: name.into(),
            base,
            groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }

    /// Offset keys in application order.
    pub fn offset_keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(GLOBAL_KEY)
            .chain(self.groups.iter().map(String::as_str))
            .chain(std::iter::once(self.name.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct PointCatalog {
    base: Resolution,
    points: Vec<CatalogPoint>,
}

impl PointCatalog {
    pub fn new(base: Resolution, points: Vec<CatalogPoint>) -> Result<Self> {
        base.validate()?;
        Ok(Self { base, points })
    }

    /// The built-in catalog used by every device profile.
    pub fn standard() -> Self {
        let points = STANDARD_POINTS
            .iter()
            .map(|(name, (x, y), groups)| CatalogPoint::new(*name, Coord::new(*x, *y), groups))
            .collect();
        Self {
            base: BASE_RESOLUTION,
            points,
        }
    }

    pub fn base_resolution(&self) -> Resolution {
        self.base
    }

    pub fn points(&self) -> &[CatalogPoint] {
        &self.points
    }

    pub fn get(&self, name: &str) -> Option<&CatalogPoint> {
        self.points.iter().find(|p| p.name == name)
    }

    /// Resolve every point for a device of resolution `target`.
    ///
    /// `env` carries environment-sourced offsets; pass `None` to ignore them.
    /// A key absent from `env` contributes nothing.
    pub fn resolve(
        &self,
        target: Resolution,
        offsets: &OffsetMap,
        env: Option<&OffsetMap>,
    ) -> Result<ResolvedPoints> {
        self.base.validate()?;
        target.validate()?;

        let mut resolved = BTreeMap::new();
        for point in &self.points {
            let mut xy = scale(point.base, self.base, target)?;
            for key in point.offset_keys() {
                if let Some(off) = offsets.get(key) {
                    xy = xy + *off;
                }
                if let Some(env) = env {
                    xy = xy + env.get(key).copied().unwrap_or(Offset::ZERO);
                }
            }
            resolved.insert(point.name.clone(), xy);
        }

        Ok(ResolvedPoints {
            base: self.base,
            target,
            points: resolved,
        })
    }
}

// ---------------------------------------------------------------------------
// ResolvedPoints
// ---------------------------------------------------------------------------

/// Device-frame coordinates for every catalog point.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPoints {
    pub base: Resolution,
    pub target: Resolution,
    pub points: BTreeMap<String, Coord>,
}

impl ResolvedPoints {
    pub fn get(&self, name: &str) -> Result<Coord> {
        self.points
            .get(name)
            .copied()
            .ok_or_else(|| CaptureError::UnknownPoint(name.to_string()))
    }
}
