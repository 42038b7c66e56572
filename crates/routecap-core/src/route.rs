//! Scripted routes.
//!
//! A route file (`{route_root}/{id}.yaml`, `.yml` or `.json`) declares the
//! portal the route starts from, an optional portal for the next route, and
//! an ordered list of step tuples:
//!
//! ```yaml
//! portal: [1180, 2140]
//! next_portal: [900, 1500]
//! steps:
//!   - [teleport]
//!   - [move, 2]
//!   - [record_start]
//!   - [glide, 6.5]
//!   - [record_stop]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::action::GameAction;
use crate::error::{CaptureError, Result};
use crate::paths;
use crate::types::Coord;

pub const RECORD_START: &str = "record_start";
pub const RECORD_STOP: &str = "record_stop";
pub const TELEPORT: &str = "teleport";

// ---------------------------------------------------------------------------
// ActionStep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ActionStep {
    RecordStart,
    RecordStop,
    Teleport,
    Action(GameAction),
}

impl ActionStep {
    pub fn parse(name: &str, args: &[Value]) -> Result<Self> {
        match name {
            RECORD_START | RECORD_STOP => {
                if !args.is_empty() {
                    return Err(CaptureError::MalformedStep {
                        name: name.to_string(),
                        reason: "takes no arguments".to_string(),
                    });
                }
                Ok(if name == RECORD_START {
                    ActionStep::RecordStart
                } else {
                    ActionStep::RecordStop
                })
            }
            // Teleport targets come from the route's portals; any
            // arguments in the tuple are informational only.
            TELEPORT => Ok(ActionStep::Teleport),
            _ => GameAction::parse(name, args).map(ActionStep::Action),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionStep::RecordStart => RECORD_START,
            ActionStep::RecordStop => RECORD_STOP,
            ActionStep::Teleport => TELEPORT,
            ActionStep::Action(a) => a.name(),
        }
    }

    /// Recording markers delimit footage but are never themselves recorded.
    pub fn is_marker(&self) -> bool {
        matches!(self, ActionStep::RecordStart | ActionStep::RecordStop)
    }
}

impl fmt::Display for ActionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStep::Action(a) => a.fmt(f),
            other => f.write_str(other.name()),
        }
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: u32,
    /// Where in-route teleports go, in reference-screenshot coordinates.
    pub portal: Coord,
    /// Start of the following route, in reference-screenshot coordinates.
    pub next_portal: Option<Coord>,
    pub steps: Vec<ActionStep>,
}

#[derive(Debug, Deserialize)]
struct RouteDoc {
    portal: Coord,
    #[serde(default)]
    next_portal: Option<Coord>,
    steps: Vec<Vec<Value>>,
}

impl Route {
    pub fn label(&self) -> String {
        paths::route_label(self.id)
    }

    /// Parse a YAML (or JSON, which is valid YAML) route document.
    pub fn parse(id: u32, text: &str) -> Result<Self> {
        let doc: RouteDoc = serde_yaml::from_str(text)?;
        let steps = doc
            .steps
            .iter()
            .enumerate()
            .map(|(i, tuple)| parse_tuple(tuple).map_err(|e| step_context(id, i, e)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            id,
            portal: doc.portal,
            next_portal: doc.next_portal,
            steps,
        })
    }

    pub fn record_starts(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, ActionStep::RecordStart))
            .count()
    }
}

fn parse_tuple(tuple: &[Value]) -> Result<ActionStep> {
    let (head, args) = tuple.split_first().ok_or_else(|| CaptureError::MalformedStep {
        name: String::new(),
        reason: "empty step".to_string(),
    })?;
    let name = head.as_str().ok_or_else(|| CaptureError::MalformedStep {
        name: head.to_string(),
        reason: "step name must be a string".to_string(),
    })?;
    ActionStep::parse(name, args)
}

fn step_context(route: u32, index: usize, err: CaptureError) -> CaptureError {
    match err {
        CaptureError::MalformedStep { name, reason } => CaptureError::MalformedStep {
            name,
            reason: format!("{reason} (route {route}, step {})", index + 1),
        },
        other => other,
    }
}

// ---------------------------------------------------------------------------
// RouteLibrary
// ---------------------------------------------------------------------------

static ROUTE_FILE_RE: OnceLock<Regex> = OnceLock::new();

fn route_file_re() -> &'static Regex {
    ROUTE_FILE_RE.get_or_init(|| Regex::new(r"^(\d+)\.(ya?ml|json)$").unwrap())
}

/// A directory of numbered route files.
#[derive(Debug, Clone)]
pub struct RouteLibrary {
    root: PathBuf,
}

impl RouteLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every route id with a file in the library, ascending.
    pub fn discover(&self) -> Result<Vec<u32>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(caps) = name.to_str().and_then(|n| route_file_re().captures(n)) else {
                continue;
            };
            if let Ok(id) = caps[1].parse::<u32>() {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    pub fn path_for(&self, id: u32) -> Result<PathBuf> {
        ["yaml", "yml", "json"]
            .iter()
            .map(|ext| self.root.join(format!("{id}.{ext}")))
            .find(|p| p.is_file())
            .ok_or(CaptureError::UnknownRoute(id))
    }

    pub fn load(&self, id: u32) -> Result<Route> {
        let path = self.path_for(id)?;
        let text = std::fs::read_to_string(&path)?;
        Route::parse(id, &text)
    }

    pub fn load_all(&self, ids: &[u32]) -> Result<Vec<Route>> {
        ids.iter().map(|id| self.load(*id)).collect()
    }
}
