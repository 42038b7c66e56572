//! The in-game action vocabulary and its gesture sequences.
//!
//! Route files name actions by string; `GameAction::parse` turns each
//! `(name, args…)` tuple into a typed variant once, at load time, so a typo
//! fails before any recording starts. `Actions` performs a variant against a
//! device using the resolved point table for that device.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::error::{CaptureError, Result};
use crate::pacing::Pacer;
use crate::points::ResolvedPoints;
use crate::device::Device;
use crate::types::Coord;

// ---------------------------------------------------------------------------
// Turn
// ---------------------------------------------------------------------------

/// Camera turns. Each one is a horizontal swipe between two catalog points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Around,
    Right90,
    Left90,
    Right45,
    Left45,
    Right30,
    Left30,
    Right135,
    Left135,
}

impl Turn {
    pub fn all() -> &'static [Turn] {
        &[
            Turn::Around,
            Turn::Right90,
            Turn::Left90,
            Turn::Right45,
            Turn::Left45,
            Turn::Right30,
            Turn::Left30,
            Turn::Right135,
            Turn::Left135,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Turn::Around => "turn_180",
            Turn::Right90 => "turn_right_90",
            Turn::Left90 => "turn_left_90",
            Turn::Right45 => "turn_right_45",
            Turn::Left45 => "turn_left_45",
            Turn::Right30 => "turn_right_30",
            Turn::Left30 => "turn_left_30",
            Turn::Right135 => "turn_right_135",
            Turn::Left135 => "turn_left_135",
        }
    }

    /// Swipe start point, end point and duration in milliseconds.
    fn gesture(self) -> (&'static str, &'static str, u64) {
        match self {
            Turn::Around => ("TURN_180_L", "TURN_180_R", 800),
            Turn::Right90 => ("TURN_90_R_L", "TURN_90_R_R", 600),
            Turn::Left90 => ("TURN_90_L_L", "TURN_90_L_R", 600),
            Turn::Right45 => ("TURN_45_R_L", "TURN_45_R_R", 600),
            Turn::Left45 => ("TURN_45_L_L", "TURN_45_L_R", 600),
            Turn::Right30 => ("TURN_30_R_L", "TURN_30_R_R", 600),
            Turn::Left30 => ("TURN_30_L_L", "TURN_30_L_R", 600),
            Turn::Right135 => ("TURN_135_R_L", "TURN_135_R_R", 700),
            Turn::Left135 => ("TURN_135_L_L", "TURN_135_L_R", 700),
        }
    }
}

// ---------------------------------------------------------------------------
// GameAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum GameAction {
    Move(f64),
    Climb(f64),
    Swim(f64),
    Run(f64),
    Dash,
    Attack,
    HeavyAttack,
    LongAttack(f64),
    Jump,
    Util,
    LongUtil,
    Glide(f64),
    Sleep(f64),
    Turn(Turn),
    OpenMap,
    ConfirmTeleport,
    AdjustGameTime,
    Tap(Coord),
    Swipe {
        from: Coord,
        to: Coord,
        duration_ms: u64,
    },
}

impl GameAction {
    /// Parse a route step tuple. Unknown names and wrong argument shapes are
    /// both errors.
    pub fn parse(name: &str, args: &[Value]) -> Result<Self> {
        let a = Args { name, args };
        let action = match name {
            "move" => GameAction::Move(a.seconds_only()?),
            "climb" => GameAction::Climb(a.seconds_only()?),
            "swim" => GameAction::Swim(a.seconds_only()?),
            "run" => GameAction::Run(a.seconds_only()?),
            "dash" => a.none(GameAction::Dash)?,
            "attack" => a.none(GameAction::Attack)?,
            "heavy_attack" => a.none(GameAction::HeavyAttack)?,
            "long_attack" => GameAction::LongAttack(a.seconds_only()?),
            "jump" => a.none(GameAction::Jump)?,
            "util" => a.none(GameAction::Util)?,
            "long_util" => a.none(GameAction::LongUtil)?,
            "glide" => GameAction::Glide(a.seconds_only()?),
            "sleep" => GameAction::Sleep(a.seconds_only()?),
            "open_map" => a.none(GameAction::OpenMap)?,
            "confirm_teleport" => a.none(GameAction::ConfirmTeleport)?,
            "adjust_game_time" => a.none(GameAction::AdjustGameTime)?,
            "tap" => {
                a.arity(2)?;
                GameAction::Tap(Coord::new(a.int(0)?, a.int(1)?))
            }
            "swipe" => {
                a.arity(5)?;
                GameAction::Swipe {
                    from: Coord::new(a.int(0)?, a.int(1)?),
                    to: Coord::new(a.int(2)?, a.int(3)?),
                    duration_ms: u64::try_from(a.int(4)?).map_err(|_| a.malformed("negative duration"))?,
                }
            }
            other => match Turn::all().iter().find(|t| t.as_str() == other) {
                Some(turn) => a.none(GameAction::Turn(*turn))?,
                None => return Err(CaptureError::UnknownStep(other.to_string())),
            },
        };
        Ok(action)
    }

    pub fn name(&self) -> &'static str {
        match self {
            GameAction::Move(_) => "move",
            GameAction::Climb(_) => "climb",
            GameAction::Swim(_) => "swim",
            GameAction::Run(_) => "run",
            GameAction::Dash => "dash",
            GameAction::Attack => "attack",
            GameAction::HeavyAttack => "heavy_attack",
            GameAction::LongAttack(_) => "long_attack",
            GameAction::Jump => "jump",
            GameAction::Util => "util",
            GameAction::LongUtil => "long_util",
            GameAction::Glide(_) => "glide",
            GameAction::Sleep(_) => "sleep",
            GameAction::Turn(t) => t.as_str(),
            GameAction::OpenMap => "open_map",
            GameAction::ConfirmTeleport => "confirm_teleport",
            GameAction::AdjustGameTime => "adjust_game_time",
            GameAction::Tap(_) => "tap",
            GameAction::Swipe { .. } => "swipe",
        }
    }
}

impl fmt::Display for GameAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameAction::Move(s)
            | GameAction::Climb(s)
            | GameAction::Swim(s)
            | GameAction::Run(s)
            | GameAction::LongAttack(s)
            | GameAction::Glide(s)
            | GameAction::Sleep(s) => write!(f, "{}({s})", self.name()),
            GameAction::Tap(c) => write!(f, "tap{c}"),
            GameAction::Swipe {
                from,
                to,
                duration_ms,
            } => write!(f, "swipe{from}->{to} {duration_ms}ms"),
            other => f.write_str(other.name()),
        }
    }
}

struct Args<'a> {
    name: &'a str,
    args: &'a [Value],
}

impl Args<'_> {
    fn malformed(&self, reason: impl Into<String>) -> CaptureError {
        CaptureError::MalformedStep {
            name: self.name.to_string(),
            reason: reason.into(),
        }
    }

    fn arity(&self, n: usize) -> Result<()> {
        if self.args.len() != n {
            return Err(self.malformed(format!(
                "expected {n} argument(s), got {}",
                self.args.len()
            )));
        }
        Ok(())
    }

    fn none(&self, action: GameAction) -> Result<GameAction> {
        self.arity(0)?;
        Ok(action)
    }

    fn seconds_only(&self) -> Result<f64> {
        self.arity(1)?;
        let secs = self.args[0]
            .as_f64()
            .ok_or_else(|| self.malformed("seconds must be a number"))?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(self.malformed("seconds must be non-negative"));
        }
        Ok(secs)
    }

    fn int(&self, i: usize) -> Result<i32> {
        self.args[i]
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| self.malformed(format!("argument {} must be an integer", i + 1)))
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Performs actions and teleports for one device.
#[derive(Debug, Clone)]
pub struct Actions {
    points: ResolvedPoints,
    time_adjust: bool,
}

impl Actions {
    pub fn new(points: ResolvedPoints, time_adjust: bool) -> Self {
        Self {
            points,
            time_adjust,
        }
    }

    pub fn points(&self) -> &ResolvedPoints {
        &self.points
    }

    /// Whether the optional time-adjustment sequence is available.
    pub fn supports_time_adjust(&self) -> bool {
        self.time_adjust
    }

    pub fn perform(&self, action: &GameAction, device: &dyn Device, pacer: &dyn Pacer) -> Result<()> {
        match action {
            GameAction::Move(s) | GameAction::Climb(s) | GameAction::Swim(s) => {
                self.walk(*s, device)
            }
            GameAction::Run(s) => {
                self.tap("SPRINT", device)?;
                pacer.sleep(Duration::from_millis(100));
                self.walk(*s, device)
            }
            GameAction::Dash => self.tap("SPRINT", device),
            GameAction::Attack => self.tap("ATTACK", device),
            GameAction::HeavyAttack => self.hold("ATTACK", 1.0, device),
            GameAction::LongAttack(s) => self.hold("ATTACK", *s, device),
            GameAction::Jump => self.tap("JUMP", device),
            GameAction::Util => self.tap("UTIL", device),
            GameAction::LongUtil => self.hold("UTIL", 1.0, device),
            GameAction::Glide(s) => {
                self.hold("UTIL", 1.0, device)?;
                pacer.sleep(Duration::from_secs(1));
                self.tap("JUMP", device)?;
                self.walk(*s, device)
            }
            GameAction::Sleep(s) => {
                pacer.sleep_secs(*s);
                Ok(())
            }
            GameAction::Turn(turn) => {
                let (from, to, ms) = turn.gesture();
                self.drag(from, to, ms, device)
            }
            GameAction::OpenMap => self.tap("OPEN_MAP", device),
            GameAction::ConfirmTeleport => {
                self.tap("CONFIRM_TELEPORT", device)?;
                pacer.sleep(Duration::from_secs(5));
                Ok(())
            }
            GameAction::AdjustGameTime => self.adjust_game_time(device, pacer),
            GameAction::Tap(at) => device.tap(*at),
            GameAction::Swipe {
                from,
                to,
                duration_ms,
            } => device.swipe(*from, *to, Duration::from_millis(*duration_ms)),
        }
    }

    /// Open the map, pick `portal`, confirm, and wait for the load.
    pub fn teleport(&self, portal: Coord, device: &dyn Device, pacer: &dyn Pacer) -> Result<()> {
        tracing::info!(%portal, "teleport");
        self.tap("OPEN_MAP", device)?;
        pacer.sleep(Duration::from_secs(1));
        device.tap(portal)?;
        pacer.sleep(Duration::from_secs(1));
        self.perform(&GameAction::ConfirmTeleport, device, pacer)?;
        pacer.sleep(Duration::from_secs(3));
        Ok(())
    }

    fn adjust_game_time(&self, device: &dyn Device, pacer: &dyn Pacer) -> Result<()> {
        if !self.time_adjust {
            return Err(CaptureError::UnknownStep("adjust_game_time".to_string()));
        }
        self.tap("ADJUST_GAME_TIME_P1", device)?;
        pacer.sleep(Duration::from_secs(1));
        self.tap("ADJUST_GAME_TIME_P2", device)?;
        pacer.sleep(Duration::from_secs(1));

        let dial = [
            ("ADJUST_GAME_TIME_S1", "ADJUST_GAME_TIME_S2", 200),
            ("ADJUST_GAME_TIME_S2", "ADJUST_GAME_TIME_S3", 200),
            ("ADJUST_GAME_TIME_S3", "ADJUST_GAME_TIME_S4", 200),
            ("ADJUST_GAME_TIME_S4", "ADJUST_GAME_TIME_S5", 300),
        ];
        for (from, to, settle_ms) in dial {
            self.drag(from, to, 300, device)?;
            pacer.sleep(Duration::from_millis(settle_ms));
        }

        self.tap("ADJUST_GAME_TIME_P3", device)?;
        pacer.sleep(Duration::from_secs(20));
        self.tap("ADJUST_GAME_TIME_P4", device)?;
        pacer.sleep(Duration::from_secs(5));
        Ok(())
    }

    fn tap(&self, point: &str, device: &dyn Device) -> Result<()> {
        device.tap(self.points.get(point)?)
    }

    fn drag(&self, from: &str, to: &str, ms: u64, device: &dyn Device) -> Result<()> {
        device.swipe(
            self.points.get(from)?,
            self.points.get(to)?,
            Duration::from_millis(ms),
        )
    }

    fn hold(&self, point: &str, secs: f64, device: &dyn Device) -> Result<()> {
        let at = self.points.get(point)?;
        device.swipe(at, at, Duration::from_secs_f64(secs))
    }

    fn walk(&self, secs: f64, device: &dyn Device) -> Result<()> {
        device.swipe(
            self.points.get("MOVE_START")?,
            self.points.get("MOVE_END")?,
            Duration::from_secs_f64(secs),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::offsets::OffsetMap;
    use crate::points::{PointCatalog, BASE_RESOLUTION};
    use serde_json::json;
    use std::cell::RefCell;

    /// Records every gesture and delay instead of touching a device.
    #[derive(Default)]
    pub(crate) struct Log {
        pub events: RefCell<Vec<String>>,
    }

    impl Device for Log {
        fn tap(&self, at: Coord) -> Result<()> {
            self.events.borrow_mut().push(format!("tap {} {}", at.x, at.y));
            Ok(())
        }

        fn swipe(&self, from: Coord, to: Coord, duration: Duration) -> Result<()> {
            self.events.borrow_mut().push(format!(
                "swipe {} {} {} {} {}",
                from.x,
                from.y,
                to.x,
                to.y,
                duration.as_millis()
            ));
            Ok(())
        }
    }

    impl Pacer for Log {
        fn sleep(&self, duration: Duration) {
            self.events
                .borrow_mut()
                .push(format!("sleep {}", duration.as_millis()));
        }
    }

    pub(crate) fn base_actions() -> Actions {
        let points = PointCatalog::standard()
            .resolve(BASE_RESOLUTION, &OffsetMap::new(), None)
            .unwrap();
        Actions::new(points, true)
    }

    #[test]
    fn parse_known_names() {
        assert_eq!(GameAction::parse("glide", &[json!(3.5)]).unwrap(), GameAction::Glide(3.5));
        assert_eq!(GameAction::parse("jump", &[]).unwrap(), GameAction::Jump);
        assert_eq!(
            GameAction::parse("turn_left_135", &[]).unwrap(),
            GameAction::Turn(Turn::Left135)
        );
        assert_eq!(
            GameAction::parse("swipe", &[json!(1), json!(2), json!(3), json!(4), json!(500)]).unwrap(),
            GameAction::Swipe {
                from: Coord::new(1, 2),
                to: Coord::new(3, 4),
                duration_ms: 500
            }
        );
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert!(matches!(
            GameAction::parse("moonwalk", &[]),
            Err(CaptureError::UnknownStep(n)) if n == "moonwalk"
        ));
    }

    #[test]
    fn parse_rejects_bad_arguments() {
        for (name, args) in [
            ("move", vec![]),
            ("move", vec![json!("fast")]),
            ("jump", vec![json!(1)]),
            ("tap", vec![json!(1.5), json!(2)]),
            ("sleep", vec![json!(-1)]),
        ] {
            assert!(
                matches!(
                    GameAction::parse(name, &args),
                    Err(CaptureError::MalformedStep { .. })
                ),
                "{name} {args:?}"
            );
        }
    }

    #[test]
    fn names_round_trip_through_parse() {
        for turn in Turn::all() {
            let action = GameAction::Turn(*turn);
            assert_eq!(GameAction::parse(action.name(), &[]).unwrap(), action);
        }
    }

    #[test]
    fn glide_holds_util_then_jumps_then_walks() {
        let log = Log::default();
        base_actions()
            .perform(&GameAction::Glide(2.0), &log, &log)
            .unwrap();
        assert_eq!(
            *log.events.borrow(),
            [
                "swipe 2060 1120 2060 1120 1000",
                "sleep 1000",
                "tap 2510 830",
                "swipe 523 800 523 700 2000",
            ]
        );
    }

    #[test]
    fn teleport_sequence() {
        let log = Log::default();
        base_actions()
            .teleport(Coord::new(50, 1174), &log, &log)
            .unwrap();
        assert_eq!(
            *log.events.borrow(),
            [
                "tap 400 200",
                "sleep 1000",
                "tap 50 1174",
                "sleep 1000",
                "tap 2450 1180",
                "sleep 5000",
                "sleep 3000",
            ]
        );
    }

    #[test]
    fn time_adjust_unavailable_is_unknown_step() {
        let mut actions = base_actions();
        actions.time_adjust = false;
        let log = Log::default();
        let err = actions
            .perform(&GameAction::AdjustGameTime, &log, &log)
            .unwrap_err();
        assert!(matches!(err, CaptureError::UnknownStep(_)));
        assert!(log.events.borrow().is_empty());
    }
}
